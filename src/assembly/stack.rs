//! Operand stack depth analysis.
//!
//! A forward worklist pass over the control flow of a method body, tracking the operand stack
//! depth in slots on entry to every reachable instruction. It yields the `max_stack` value the
//! `Code` attribute must declare, and doubles as a consistency check: popping from an empty
//! stack, reaching a merge point with two different depths or running off the end of the code
//! are all reported as errors.
//!
//! Exception handlers are entered with exactly the thrown reference on the stack. `jsr` pushes
//! its return address on the way into the subroutine; the instruction after the `jsr` is
//! reached again through `ret` with the depth the `jsr` started from.

use std::collections::VecDeque;

use crate::{
    assembly::{
        info::{opcode_info, FlowType, VARIABLE},
        opcodes, Dispatch, Instruction,
    },
    classfile::{Code, ConstantPool, FieldType, MethodDescriptor},
    Error, Result,
};

/// Result of a stack depth analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackAnalysis {
    /// Deepest stack reached anywhere in the method
    pub max_stack: u16,
    /// Depth on entry to every instruction, `None` where unreachable
    pub depths: Vec<Option<u16>>,
}

impl StackAnalysis {
    /// Analyse the body of `method`.
    ///
    /// # Errors
    /// Returns [`Error::StackUnderflow`] if an instruction pops more than the stack holds,
    /// [`Error::Consistency`] for depth mismatches and fall-through past the last instruction,
    /// and any error raised while resolving invocation descriptors.
    pub fn run(code: &Code, pool: &ConstantPool, method: &str) -> Result<StackAnalysis> {
        let instructions = code.instructions.as_slice();
        let mut depths: Vec<Option<u16>> = vec![None; instructions.len()];
        let mut queue = VecDeque::new();
        let mut max_stack = 0_u16;

        let enter = |depths: &mut Vec<Option<u16>>,
                     queue: &mut VecDeque<usize>,
                     from: usize,
                     index: usize,
                     depth: u16|
         -> Result<()> {
            match depths.get(index) {
                None => Err(consistency_error!(
                    method,
                    from,
                    "control flows past the last instruction"
                )),
                Some(None) => {
                    depths[index] = Some(depth);
                    queue.push_back(index);
                    Ok(())
                }
                Some(Some(existing)) if *existing == depth => Ok(()),
                Some(Some(existing)) => Err(consistency_error!(
                    method,
                    index,
                    "stack depth {} from instruction {} does not match {}",
                    depth,
                    from,
                    existing
                )),
            }
        };

        if instructions.is_empty() {
            return Ok(StackAnalysis {
                max_stack: 0,
                depths,
            });
        }

        enter(&mut depths, &mut queue, 0, 0, 0)?;
        for handler in &code.exception_table {
            enter(&mut depths, &mut queue, handler.start, handler.handler, 1)?;
            max_stack = max_stack.max(1);
        }

        while let Some(index) = queue.pop_front() {
            let instruction = &instructions[index];
            let depth = depths[index].unwrap_or_default();
            let (pops, pushes) = stack_effect(instruction, pool)?;

            let base = depth.checked_sub(pops).ok_or_else(|| Error::StackUnderflow {
                method: method.to_string(),
                index,
            })?;
            let after = base.checked_add(pushes).ok_or_else(|| {
                consistency_error!(method, index, "operand stack exceeds 65535 slots")
            })?;
            max_stack = max_stack.max(after);

            match instruction.flow() {
                FlowType::Sequential => enter(&mut depths, &mut queue, index, index + 1, after)?,
                FlowType::ConditionalBranch => {
                    enter(&mut depths, &mut queue, index, index + 1, after)?;
                    for target in instruction.branch_targets() {
                        enter(&mut depths, &mut queue, index, target, after)?;
                    }
                }
                FlowType::UnconditionalBranch | FlowType::Switch => {
                    for target in instruction.branch_targets() {
                        enter(&mut depths, &mut queue, index, target, after)?;
                    }
                }
                FlowType::Subroutine => {
                    for target in instruction.branch_targets() {
                        enter(&mut depths, &mut queue, index, target, after)?;
                    }
                    enter(&mut depths, &mut queue, index, index + 1, depth)?;
                }
                FlowType::SubroutineReturn | FlowType::Return | FlowType::Throw => {}
            }
        }

        Ok(StackAnalysis { max_stack, depths })
    }
}

/// Slots popped and pushed by `instruction`.
///
/// # Errors
/// Returns an error if a referenced constant or descriptor cannot be resolved.
pub fn stack_effect(instruction: &Instruction, pool: &ConstantPool) -> Result<(u16, u16)> {
    Ok(match instruction {
        Instruction::LoadLocal { kind, .. } => (0, kind.width()),
        Instruction::StoreLocal { kind, .. } => (kind.width(), 0),
        Instruction::LoadField { field, is_static } => {
            let width = FieldType::parse(&field.descriptor)?.slots();
            (u16::from(!*is_static), width)
        }
        Instruction::StoreField { field, is_static } => {
            let width = FieldType::parse(&field.descriptor)?.slots();
            (width + u16::from(!*is_static), 0)
        }
        Instruction::InvokeMethod { method, dispatch } => {
            let descriptor = MethodDescriptor::parse(&method.descriptor)?;
            let receiver = u16::from(*dispatch != Dispatch::Static);
            (descriptor.arg_slots() + receiver, descriptor.return_slots())
        }
        Instruction::Pop => (1, 0),
        Instruction::Pop2 => (2, 0),
        Instruction::Return { kind } => (kind.map_or(0, |kind| kind.width()), 0),
        Instruction::Jump { .. }
        | Instruction::TableSwitch { .. }
        | Instruction::LookupSwitch { .. } => table_effect(instruction.opcode())?,
        Instruction::Other { opcode, operands } => other_effect(*opcode, operands, pool)?,
    })
}

fn table_effect(opcode: u8) -> Result<(u16, u16)> {
    match opcode_info(opcode) {
        Some(info) if info.pops != VARIABLE && info.pushes != VARIABLE => {
            Ok((u16::from(info.pops), u16::from(info.pushes)))
        }
        _ => Err(malformed_error!(
            "No fixed stack effect for opcode 0x{:02X}",
            opcode
        )),
    }
}

fn operand_index(operands: &[u8]) -> Result<u16> {
    match operands {
        [high, low, ..] => Ok(u16::from_be_bytes([*high, *low])),
        _ => Err(malformed_error!("Missing constant pool operand")),
    }
}

fn other_effect(opcode: u8, operands: &[u8], pool: &ConstantPool) -> Result<(u16, u16)> {
    match opcode {
        opcodes::GETSTATIC | opcodes::GETFIELD | opcodes::PUTSTATIC | opcodes::PUTFIELD => {
            let field = pool.member_ref(operand_index(operands)?)?;
            let width = FieldType::parse(&field.descriptor)?.slots();
            Ok(match opcode {
                opcodes::GETSTATIC => (0, width),
                opcodes::GETFIELD => (1, width),
                opcodes::PUTSTATIC => (width, 0),
                _ => (width + 1, 0),
            })
        }
        opcodes::INVOKEVIRTUAL
        | opcodes::INVOKESPECIAL
        | opcodes::INVOKESTATIC
        | opcodes::INVOKEINTERFACE => {
            let method = pool.member_ref(operand_index(operands)?)?;
            let descriptor = MethodDescriptor::parse(&method.descriptor)?;
            let receiver = u16::from(opcode != opcodes::INVOKESTATIC);
            Ok((descriptor.arg_slots() + receiver, descriptor.return_slots()))
        }
        opcodes::INVOKEDYNAMIC => {
            let descriptor = pool.invoke_dynamic_descriptor(operand_index(operands)?)?;
            let descriptor = MethodDescriptor::parse(&descriptor)?;
            Ok((descriptor.arg_slots(), descriptor.return_slots()))
        }
        opcodes::MULTIANEWARRAY => match operands.get(2) {
            Some(dimensions) => Ok((u16::from(*dimensions), 1)),
            None => Err(malformed_error!("multianewarray without dimensions")),
        },
        opcodes::WIDE => match operands.first() {
            Some(&(opcodes::IINC | opcodes::RET)) => Ok((0, 0)),
            Some(modified) => table_effect(*modified),
            None => Err(malformed_error!("wide without an opcode")),
        },
        _ => table_effect(opcode),
    }
}
