//! JVM bytecode encoding.
//!
//! Turns an [`crate::assembly::InstructionList`] back into a code array. Encoding runs in two
//! passes: the first lays out every instruction to learn its byte offset (switch padding
//! depends on the position), the second emits bytes with branch targets resolved against
//! that layout.
//!
//! Typed local variable accesses always use their canonical form: the implicit `_<n>` opcodes
//! for slots 0-3, a one byte operand up to slot 255 and the `wide` prefix above that.
//!
//! # Examples
//!
//! ```rust
//! use veinpatch::assembly::{encode, opcodes, Instruction, InstructionList};
//! use veinpatch::classfile::ValueKind;
//!
//! let list = InstructionList::from(vec![
//!     Instruction::LoadLocal { index: 0, kind: ValueKind::Reference },
//!     Instruction::Jump { opcode: opcodes::IFNULL, target: 2 },
//!     Instruction::Return { kind: None },
//! ]);
//! let encoded = encode(&list, "run")?;
//! assert_eq!(encoded.bytes, [0x2A, 0xC6, 0x00, 0x03, 0xB1]);
//! assert_eq!(encoded.offsets, [0, 1, 4, 5]);
//! # Ok::<(), veinpatch::Error>(())
//! ```

use crate::{
    assembly::{
        info::{self, opcode_info, OperandLayout},
        opcodes, Dispatch, Instruction, InstructionList,
    },
    classfile::MethodDescriptor,
    file::io::emit_be,
    Error, Result,
};

/// Largest code array a method may have (JVMS §4.7.3).
pub const MAX_CODE_LENGTH: usize = 65535;

/// An encoded code array together with its instruction layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCode {
    /// The code array
    pub bytes: Vec<u8>,
    /// Byte offset of every instruction, followed by the total length
    pub offsets: Vec<usize>,
}

/// Number of padding bytes after a switch opcode located at `offset`.
#[must_use]
pub fn switch_padding(offset: usize) -> usize {
    (4 - (offset + 1) % 4) % 4
}

/// Size in bytes of `instruction` when placed at `offset`.
#[must_use]
pub fn encoded_len(instruction: &Instruction, offset: usize) -> usize {
    match instruction {
        Instruction::LoadLocal { index, .. } | Instruction::StoreLocal { index, .. } => {
            match *index {
                0..=3 => 1,
                4..=255 => 2,
                _ => 4,
            }
        }
        Instruction::LoadField { .. } | Instruction::StoreField { .. } => 3,
        Instruction::InvokeMethod { dispatch, .. } => match dispatch {
            Dispatch::Interface => 5,
            _ => 3,
        },
        Instruction::Pop | Instruction::Pop2 | Instruction::Return { .. } => 1,
        Instruction::Jump { opcode, .. } => match opcode_info(*opcode).map(|info| info.operands) {
            Some(OperandLayout::Branch32) => 5,
            _ => 3,
        },
        Instruction::TableSwitch { targets, .. } => {
            1 + switch_padding(offset) + 12 + 4 * targets.len()
        }
        Instruction::LookupSwitch { pairs, .. } => 1 + switch_padding(offset) + 8 + 8 * pairs.len(),
        Instruction::Other { operands, .. } => 1 + operands.len(),
    }
}

/// Encode a whole instruction list.
///
/// `method` is only used to label errors.
///
/// # Errors
/// Returns [`Error::BranchOutOfRange`] if a 16-bit branch cannot reach its target,
/// [`Error::InvalidDescriptor`] for unparseable `invokeinterface` descriptors and
/// [`Error::Malformed`] if the code array would exceed 65535 bytes or a target lies outside
/// the list.
pub fn encode(list: &InstructionList, method: &str) -> Result<EncodedCode> {
    let mut offsets = Vec::with_capacity(list.len() + 1);
    let mut offset = 0;
    for instruction in list {
        offsets.push(offset);
        offset += encoded_len(instruction, offset);
    }
    offsets.push(offset);

    if offset > MAX_CODE_LENGTH {
        return Err(malformed_error!(
            "Code of {} is {} bytes, limit is {}",
            method,
            offset,
            MAX_CODE_LENGTH
        ));
    }

    let mut bytes = Vec::with_capacity(offset);
    for (index, instruction) in list.iter().enumerate() {
        emit(&mut bytes, instruction, index, &offsets, method)?;
    }

    Ok(EncodedCode { bytes, offsets })
}

/// Encode a single instruction that carries no branch targets at `offset`.
///
/// # Errors
/// Returns an error if `instruction` is a branch or switch, or cannot be encoded.
pub(crate) fn encode_single(instruction: &Instruction, offset: usize) -> Result<Vec<u8>> {
    if !instruction.branch_targets().is_empty() {
        return Err(malformed_error!("Cannot encode {} in isolation", instruction));
    }

    let mut bytes = Vec::with_capacity(encoded_len(instruction, offset));
    emit_at(&mut bytes, instruction, 0, offset, &[], "")?;
    Ok(bytes)
}

fn emit(
    buffer: &mut Vec<u8>,
    instruction: &Instruction,
    index: usize,
    offsets: &[usize],
    method: &str,
) -> Result<()> {
    emit_at(buffer, instruction, index, offsets[index], offsets, method)
}

fn relative(
    target: usize,
    offset: usize,
    offsets: &[usize],
    method: &str,
    index: usize,
) -> Result<i64> {
    // The trailing entry of `offsets` is the end of the code, not an instruction
    match offsets.get(target) {
        Some(&target_offset) if target + 1 < offsets.len() => {
            Ok(target_offset as i64 - offset as i64)
        }
        _ => Err(malformed_error!(
            "Instruction {} in {} targets nonexistent instruction {}",
            index,
            method,
            target
        )),
    }
}

fn emit_i32(buffer: &mut Vec<u8>, value: i64, method: &str, index: usize) -> Result<()> {
    let value = i32::try_from(value).map_err(|_| Error::BranchOutOfRange {
        method: method.to_string(),
        index,
        offset: value,
    })?;
    emit_be(buffer, value);
    Ok(())
}

fn emit_local(buffer: &mut Vec<u8>, index: u16, short_base: u8, long_opcode: u8) {
    match index {
        0..=3 => buffer.push(short_base + index as u8),
        4..=255 => {
            buffer.push(long_opcode);
            buffer.push(index as u8);
        }
        _ => {
            buffer.push(opcodes::WIDE);
            buffer.push(long_opcode);
            emit_be(buffer, index);
        }
    }
}

fn emit_at(
    buffer: &mut Vec<u8>,
    instruction: &Instruction,
    index: usize,
    offset: usize,
    offsets: &[usize],
    method: &str,
) -> Result<()> {
    match instruction {
        Instruction::LoadLocal { index: slot, kind } => emit_local(
            buffer,
            *slot,
            info::load_short_opcode(*kind),
            info::load_opcode(*kind),
        ),
        Instruction::StoreLocal { index: slot, kind } => emit_local(
            buffer,
            *slot,
            info::store_short_opcode(*kind),
            info::store_opcode(*kind),
        ),
        Instruction::LoadField { field, .. } | Instruction::StoreField { field, .. } => {
            buffer.push(instruction.opcode());
            emit_be(buffer, field.index);
        }
        Instruction::InvokeMethod { method: target, dispatch } => {
            buffer.push(dispatch.opcode());
            emit_be(buffer, target.index);
            if *dispatch == Dispatch::Interface {
                let descriptor = MethodDescriptor::parse(&target.descriptor)?;
                let count = u8::try_from(descriptor.arg_slots() + 1).map_err(|_| {
                    Error::InvalidDescriptor(format!(
                        "{} takes too many argument slots",
                        target.descriptor
                    ))
                })?;
                buffer.push(count);
                buffer.push(0);
            }
        }
        Instruction::Pop | Instruction::Pop2 | Instruction::Return { .. } => {
            buffer.push(instruction.opcode());
        }
        Instruction::Jump { opcode, target } => {
            let delta = relative(*target, offset, offsets, method, index)?;
            buffer.push(*opcode);
            match opcode_info(*opcode).map(|info| info.operands) {
                Some(OperandLayout::Branch32) => emit_i32(buffer, delta, method, index)?,
                _ => {
                    let delta = i16::try_from(delta).map_err(|_| Error::BranchOutOfRange {
                        method: method.to_string(),
                        index,
                        offset: delta,
                    })?;
                    emit_be(buffer, delta);
                }
            }
        }
        Instruction::TableSwitch {
            default,
            low,
            targets,
        } => {
            buffer.push(opcodes::TABLESWITCH);
            buffer.resize(buffer.len() + switch_padding(offset), 0);
            emit_i32(buffer, relative(*default, offset, offsets, method, index)?, method, index)?;
            let high = i64::from(*low) + targets.len() as i64 - 1;
            let high = i32::try_from(high)
                .map_err(|_| malformed_error!("tableswitch in {} has too many targets", method))?;
            emit_be(buffer, *low);
            emit_be(buffer, high);
            for target in targets {
                let delta = relative(*target, offset, offsets, method, index)?;
                emit_i32(buffer, delta, method, index)?;
            }
        }
        Instruction::LookupSwitch { default, pairs } => {
            buffer.push(opcodes::LOOKUPSWITCH);
            buffer.resize(buffer.len() + switch_padding(offset), 0);
            emit_i32(buffer, relative(*default, offset, offsets, method, index)?, method, index)?;
            emit_be(buffer, pairs.len() as i32);
            for (key, target) in pairs {
                emit_be(buffer, *key);
                let delta = relative(*target, offset, offsets, method, index)?;
                emit_i32(buffer, delta, method, index)?;
            }
        }
        Instruction::Other { opcode, operands } => {
            buffer.push(*opcode);
            buffer.extend_from_slice(operands);
        }
    }
    Ok(())
}
