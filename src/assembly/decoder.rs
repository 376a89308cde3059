//! JVM bytecode decoding.
//!
//! Decoding runs in two passes over the code array. The first pass walks the bytes, records the
//! offset of every instruction and lifts the instructions the transformer works with into
//! typed variants, with branch targets still expressed as absolute byte offsets. The second
//! pass rewrites those offsets into instruction indices and rejects targets that do not land
//! on an instruction boundary.
//!
//! An instruction is only lifted when encoding the typed variant reproduces its original bytes;
//! non-canonical forms such as `iload 1` (instead of `iload_1`) or `wide aload 5` stay
//! [`crate::assembly::Instruction::Other`]. Together with the encoder this keeps the
//! decode/encode round trip byte-exact.
//!
//! # Examples
//!
//! ```rust
//! use veinpatch::assembly::{decode, Instruction};
//! use veinpatch::classfile::{ConstantPool, ValueKind};
//!
//! // aload_0, ifnull +5, iload 1 (long form), return
//! let code = [0x2A, 0xC6, 0x00, 0x05, 0x15, 0x01, 0xB1];
//! let decoded = decode(&code, &ConstantPool::new())?;
//!
//! assert_eq!(decoded.instructions.len(), 4);
//! let this = Instruction::LoadLocal { index: 0, kind: ValueKind::Reference };
//! assert_eq!(decoded.instructions[0], this);
//! assert_eq!(decoded.instructions[1].branch_targets(), vec![3]);
//! assert!(matches!(decoded.instructions[2], Instruction::Other { .. }));
//! assert_eq!(decoded.offsets, [0, 1, 4, 6, 7]);
//! # Ok::<(), veinpatch::Error>(())
//! ```

use crate::{
    assembly::{
        encoder::encode_single,
        info::{self, opcode_info, OperandLayout},
        opcodes, Dispatch, Instruction, InstructionList,
    },
    classfile::ConstantPool,
    file::parser::Parser,
    Result,
};

/// A decoded code array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCode {
    /// The instructions in order
    pub instructions: InstructionList,
    /// Byte offset of every instruction, followed by the code length
    pub offsets: Vec<usize>,
}

impl DecodedCode {
    /// Index of the instruction starting at `offset`; the code length maps to `len()`.
    #[must_use]
    pub fn index_of(&self, offset: usize) -> Option<usize> {
        index_of(&self.offsets, offset)
    }
}

/// Index of the instruction starting at `offset` within a layout produced by the decoder or
/// encoder. The final entry (the code length) maps to the instruction count.
#[must_use]
pub fn index_of(offsets: &[usize], offset: usize) -> Option<usize> {
    offsets.binary_search(&offset).ok()
}

/// Decode a complete code array.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for reserved or undefined opcodes, instructions running
/// past the end of the array, invalid `wide` forms, malformed switches, branch targets that do
/// not start an instruction and member references to invalid constants.
pub fn decode(code: &[u8], pool: &ConstantPool) -> Result<DecodedCode> {
    let mut parser = Parser::new(code);
    let mut instructions = Vec::new();
    let mut offsets = Vec::new();

    while parser.has_more_data() {
        let offset = parser.pos();
        offsets.push(offset);
        let instruction = parser
            .transactional(|parser| decode_instruction(parser, pool))
            .map_err(|error| match error {
                crate::Error::OutOfBounds { .. } => malformed_error!(
                    "Instruction at offset {} runs past the end of the code",
                    offset
                ),
                other => other,
            })?;
        instructions.push(instruction);
    }
    offsets.push(code.len());

    for (index, instruction) in instructions.iter_mut().enumerate() {
        for target in instruction.targets_mut() {
            match index_of(&offsets, *target) {
                Some(resolved) if resolved < offsets.len() - 1 => *target = resolved,
                _ => {
                    return Err(malformed_error!(
                        "Instruction {} at offset {} branches to offset {}, not an instruction",
                        index,
                        offsets[index],
                        target
                    ))
                }
            }
        }
    }

    Ok(DecodedCode {
        instructions: InstructionList::from(instructions),
        offsets,
    })
}

fn absolute(offset: usize, delta: i64) -> Result<usize> {
    usize::try_from(offset as i64 + delta)
        .map_err(|_| malformed_error!("Branch at offset {} jumps before the code", offset))
}

/// Decode one instruction at the parser position.
///
/// Branch and switch targets in the result are absolute byte offsets; [`decode`] turns them
/// into instruction indices.
fn decode_instruction(parser: &mut Parser, pool: &ConstantPool) -> Result<Instruction> {
    let offset = parser.pos();
    let opcode = parser.read_be::<u8>()?;
    let Some(info) = opcode_info(opcode) else {
        return Err(malformed_error!(
            "Invalid opcode 0x{:02X} at offset {}",
            opcode,
            offset
        ));
    };

    let operands = match info.operands {
        OperandLayout::None => Vec::new(),
        OperandLayout::Fixed(len) => parser.read_bytes(usize::from(len))?.to_vec(),
        OperandLayout::Branch16 => {
            let delta = parser.read_be::<i16>()?;
            return Ok(Instruction::Jump {
                opcode,
                target: absolute(offset, i64::from(delta))?,
            });
        }
        OperandLayout::Branch32 => {
            let delta = parser.read_be::<i32>()?;
            return Ok(Instruction::Jump {
                opcode,
                target: absolute(offset, i64::from(delta))?,
            });
        }
        OperandLayout::TableSwitch => {
            parser.align(4)?;
            let default = absolute(offset, i64::from(parser.read_be::<i32>()?))?;
            let low = parser.read_be::<i32>()?;
            let high = parser.read_be::<i32>()?;
            if high < low {
                return Err(malformed_error!(
                    "tableswitch at offset {} has high {} below low {}",
                    offset,
                    high,
                    low
                ));
            }
            let count = (i64::from(high) - i64::from(low) + 1) as usize;
            if count > parser.remaining() / 4 {
                return Err(out_of_bounds_error!());
            }
            let mut targets = Vec::with_capacity(count);
            for _ in 0..count {
                targets.push(absolute(offset, i64::from(parser.read_be::<i32>()?))?);
            }
            return Ok(Instruction::TableSwitch {
                default,
                low,
                targets,
            });
        }
        OperandLayout::LookupSwitch => {
            parser.align(4)?;
            let default = absolute(offset, i64::from(parser.read_be::<i32>()?))?;
            let count = parser.read_be::<i32>()?;
            let count = usize::try_from(count).map_err(|_| {
                malformed_error!("lookupswitch at offset {} has {} pairs", offset, count)
            })?;
            if count > parser.remaining() / 8 {
                return Err(out_of_bounds_error!());
            }
            let mut pairs = Vec::with_capacity(count);
            for _ in 0..count {
                let key = parser.read_be::<i32>()?;
                pairs.push((key, absolute(offset, i64::from(parser.read_be::<i32>()?))?));
            }
            return Ok(Instruction::LookupSwitch { default, pairs });
        }
        OperandLayout::Wide => {
            let modified = parser.read_be::<u8>()?;
            let len = match modified {
                opcodes::IINC => 4,
                opcodes::RET => 2,
                _ if matches!(info::local_opcode(modified), Some((_, _, None))) => 2,
                _ => {
                    return Err(malformed_error!(
                        "wide at offset {} modifies 0x{:02X}",
                        offset,
                        modified
                    ))
                }
            };
            let mut operands = vec![modified];
            operands.extend_from_slice(parser.read_bytes(len)?);
            operands
        }
    };

    let raw = Instruction::Other { opcode, operands };
    if let Some(lifted) = lift(&raw, pool)? {
        let original = &parser.data()[offset..parser.pos()];
        if encode_single(&lifted, offset).is_ok_and(|bytes| bytes == original) {
            return Ok(lifted);
        }
    }
    Ok(raw)
}

/// Produce the typed form of an opaque instruction, if it has one.
fn lift(raw: &Instruction, pool: &ConstantPool) -> Result<Option<Instruction>> {
    let Instruction::Other { opcode, operands } = raw else {
        return Ok(None);
    };

    let pool_index = || u16::from_be_bytes([operands[0], operands[1]]);

    let lifted = match *opcode {
        opcodes::WIDE => match info::local_opcode(operands[0]) {
            Some((kind, store, None)) => {
                let index = u16::from_be_bytes([operands[1], operands[2]]);
                if store {
                    Instruction::StoreLocal { index, kind }
                } else {
                    Instruction::LoadLocal { index, kind }
                }
            }
            _ => return Ok(None),
        },
        opcodes::POP => Instruction::Pop,
        opcodes::POP2 => Instruction::Pop2,
        opcodes::GETSTATIC | opcodes::GETFIELD => Instruction::LoadField {
            field: pool.member_ref(pool_index())?,
            is_static: *opcode == opcodes::GETSTATIC,
        },
        opcodes::PUTSTATIC | opcodes::PUTFIELD => Instruction::StoreField {
            field: pool.member_ref(pool_index())?,
            is_static: *opcode == opcodes::PUTSTATIC,
        },
        opcodes::INVOKEVIRTUAL
        | opcodes::INVOKESPECIAL
        | opcodes::INVOKESTATIC
        | opcodes::INVOKEINTERFACE => Instruction::InvokeMethod {
            method: pool.member_ref(pool_index())?,
            dispatch: match *opcode {
                opcodes::INVOKEVIRTUAL => Dispatch::Virtual,
                opcodes::INVOKESPECIAL => Dispatch::Special,
                opcodes::INVOKESTATIC => Dispatch::Static,
                _ => Dispatch::Interface,
            },
        },
        _ => {
            if let Some(kind) = info::return_kind(*opcode) {
                Instruction::Return { kind }
            } else if let Some((kind, store, implicit)) = info::local_opcode(*opcode) {
                let index = match implicit {
                    Some(index) => index,
                    None => u16::from(operands[0]),
                };
                if store {
                    Instruction::StoreLocal { index, kind }
                } else {
                    Instruction::LoadLocal { index, kind }
                }
            } else {
                return Ok(None);
            }
        }
    };

    Ok(Some(lifted))
}
