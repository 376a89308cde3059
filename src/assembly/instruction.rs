//! JVM instruction representation.
//!
//! Instructions the transformer needs to reason about are lifted into typed variants; all
//! others are kept as [`Instruction::Other`] with their operand bytes untouched. Branch and
//! switch targets are instruction indices into the owning
//! [`crate::assembly::InstructionList`], never byte offsets, so inserting or removing
//! instructions cannot leave a stale offset behind.
//!
//! # Examples
//!
//! ```rust
//! use veinpatch::assembly::Instruction;
//! use veinpatch::classfile::ValueKind;
//!
//! let load = Instruction::LoadLocal { index: 1, kind: ValueKind::Int };
//! assert_eq!(load.to_string(), "iload_1");
//! assert_eq!(load.local_access(), Some((1, 1)));
//! ```

use std::fmt;

use strum::Display;

use crate::{
    assembly::{
        info::{self, opcode_info, FlowType, OperandLayout},
        opcodes,
    },
    classfile::ValueKind,
};

/// A resolved `Fieldref`, `Methodref` or `InterfaceMethodref` constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    /// Constant pool index of the reference
    pub index: u16,
    /// Internal name of the owning class
    pub owner: String,
    /// Member name
    pub name: String,
    /// Member descriptor
    pub descriptor: String,
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.owner, self.name, self.descriptor)
    }
}

/// Invocation kind of an [`Instruction::InvokeMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Dispatch {
    /// `invokevirtual`
    Virtual,
    /// `invokespecial`
    Special,
    /// `invokestatic`
    Static,
    /// `invokeinterface`
    Interface,
}

impl Dispatch {
    /// The opcode for this dispatch kind.
    #[must_use]
    pub fn opcode(self) -> u8 {
        match self {
            Dispatch::Virtual => opcodes::INVOKEVIRTUAL,
            Dispatch::Special => opcodes::INVOKESPECIAL,
            Dispatch::Static => opcodes::INVOKESTATIC,
            Dispatch::Interface => opcodes::INVOKEINTERFACE,
        }
    }
}

/// A single decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `<x>load`, `<x>load_<n>`
    LoadLocal {
        /// Local variable slot
        index: u16,
        /// Kind of the loaded value
        kind: ValueKind,
    },
    /// `<x>store`, `<x>store_<n>`
    StoreLocal {
        /// Local variable slot
        index: u16,
        /// Kind of the stored value
        kind: ValueKind,
    },
    /// `getfield`, `getstatic`
    LoadField {
        /// The accessed field
        field: MemberRef,
        /// `getstatic` when set
        is_static: bool,
    },
    /// `putfield`, `putstatic`
    StoreField {
        /// The accessed field
        field: MemberRef,
        /// `putstatic` when set
        is_static: bool,
    },
    /// `invokevirtual`, `invokespecial`, `invokestatic`, `invokeinterface`
    InvokeMethod {
        /// The invoked method
        method: MemberRef,
        /// Invocation kind
        dispatch: Dispatch,
    },
    /// `pop`
    Pop,
    /// `pop2`
    Pop2,
    /// `<x>return`, `return`
    Return {
        /// Kind of the returned value, `None` for `return`
        kind: Option<ValueKind>,
    },
    /// Conditional and unconditional branches, `jsr`, `goto_w` and `jsr_w`
    Jump {
        /// The branch opcode
        opcode: u8,
        /// Index of the target instruction
        target: usize,
    },
    /// `tableswitch`
    TableSwitch {
        /// Index of the default target
        default: usize,
        /// Lowest matched value
        low: i32,
        /// Targets for `low..=low + targets.len() - 1`
        targets: Vec<usize>,
    },
    /// `lookupswitch`
    LookupSwitch {
        /// Index of the default target
        default: usize,
        /// Sorted match values and their targets
        pairs: Vec<(i32, usize)>,
    },
    /// Any other instruction, operand bytes preserved verbatim
    Other {
        /// The opcode
        opcode: u8,
        /// Operand bytes following the opcode
        operands: Vec<u8>,
    },
}

impl Instruction {
    /// The opcode this instruction encodes to.
    #[must_use]
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::LoadLocal { index, kind } => match u8::try_from(*index) {
                Ok(short @ 0..=3) => info::load_short_opcode(*kind) + short,
                _ => info::load_opcode(*kind),
            },
            Instruction::StoreLocal { index, kind } => match u8::try_from(*index) {
                Ok(short @ 0..=3) => info::store_short_opcode(*kind) + short,
                _ => info::store_opcode(*kind),
            },
            Instruction::LoadField { is_static, .. } => {
                if *is_static {
                    opcodes::GETSTATIC
                } else {
                    opcodes::GETFIELD
                }
            }
            Instruction::StoreField { is_static, .. } => {
                if *is_static {
                    opcodes::PUTSTATIC
                } else {
                    opcodes::PUTFIELD
                }
            }
            Instruction::InvokeMethod { dispatch, .. } => dispatch.opcode(),
            Instruction::Pop => opcodes::POP,
            Instruction::Pop2 => opcodes::POP2,
            Instruction::Return { kind } => info::return_opcode(*kind),
            Instruction::Jump { opcode, .. } | Instruction::Other { opcode, .. } => *opcode,
            Instruction::TableSwitch { .. } => opcodes::TABLESWITCH,
            Instruction::LookupSwitch { .. } => opcodes::LOOKUPSWITCH,
        }
    }

    /// Assembler mnemonic.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        opcode_info(self.opcode()).map_or("<invalid>", |info| info.mnemonic)
    }

    /// Control flow behaviour.
    #[must_use]
    pub fn flow(&self) -> FlowType {
        let opcode = match self {
            // `wide` takes the flow of the instruction it widens
            Instruction::Other {
                opcode: opcodes::WIDE,
                operands,
            } => operands.first().copied().unwrap_or(opcodes::WIDE),
            _ => self.opcode(),
        };
        opcode_info(opcode).map_or(FlowType::Sequential, |info| info.flow)
    }

    /// Whether this is a `nop`.
    #[must_use]
    pub fn is_nop(&self) -> bool {
        matches!(self, Instruction::Other { opcode: opcodes::NOP, .. })
    }

    /// Indices this instruction may transfer control to, excluding fall-through.
    #[must_use]
    pub fn branch_targets(&self) -> Vec<usize> {
        match self {
            Instruction::Jump { target, .. } => vec![*target],
            Instruction::TableSwitch {
                default, targets, ..
            } => std::iter::once(*default)
                .chain(targets.iter().copied())
                .collect(),
            Instruction::LookupSwitch { default, pairs } => std::iter::once(*default)
                .chain(pairs.iter().map(|(_, target)| *target))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Mutable access to every branch target.
    pub fn targets_mut(&mut self) -> Vec<&mut usize> {
        match self {
            Instruction::Jump { target, .. } => vec![target],
            Instruction::TableSwitch {
                default, targets, ..
            } => std::iter::once(default).chain(targets.iter_mut()).collect(),
            Instruction::LookupSwitch { default, pairs } => std::iter::once(default)
                .chain(pairs.iter_mut().map(|(_, target)| target))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The local variable slot touched by this instruction and the number of slots it spans.
    ///
    /// Covers typed loads and stores as well as the forms kept opaque: long-form accesses to
    /// slots 0-3, `iinc`, `ret` and every `wide` variant.
    #[must_use]
    pub fn local_access(&self) -> Option<(u16, u16)> {
        match self {
            Instruction::LoadLocal { index, kind } | Instruction::StoreLocal { index, kind } => {
                Some((*index, kind.width()))
            }
            Instruction::Other { opcode, operands } => match *opcode {
                opcodes::IINC | opcodes::RET => Some((u16::from(*operands.first()?), 1)),
                opcodes::WIDE => {
                    let modified = *operands.first()?;
                    let index = u16::from_be_bytes([*operands.get(1)?, *operands.get(2)?]);
                    match modified {
                        opcodes::IINC | opcodes::RET => Some((index, 1)),
                        _ => info::local_opcode(modified).map(|(kind, _, _)| (index, kind.width())),
                    }
                }
                _ => {
                    let (kind, _, implicit) = info::local_opcode(*opcode)?;
                    let index = match implicit {
                        Some(index) => index,
                        None => u16::from(*operands.first()?),
                    };
                    Some((index, kind.width()))
                }
            },
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.mnemonic();
        match self {
            Instruction::LoadLocal { index, .. } | Instruction::StoreLocal { index, .. } => {
                if *index <= 3 {
                    write!(f, "{mnemonic}")
                } else {
                    write!(f, "{mnemonic} {index}")
                }
            }
            Instruction::LoadField { field, .. } | Instruction::StoreField { field, .. } => {
                write!(f, "{mnemonic} {}.{} : {}", field.owner, field.name, field.descriptor)
            }
            Instruction::InvokeMethod { method, .. } => write!(f, "{mnemonic} {method}"),
            Instruction::Jump { target, .. } => write!(f, "{mnemonic} -> #{target}"),
            Instruction::TableSwitch {
                default,
                low,
                targets,
            } => {
                write!(f, "{mnemonic} {low}..")?;
                for target in targets {
                    write!(f, " #{target}")?;
                }
                write!(f, " default #{default}")
            }
            Instruction::LookupSwitch { default, pairs } => {
                write!(f, "{mnemonic}")?;
                for (key, target) in pairs {
                    write!(f, " {key}: #{target}")?;
                }
                write!(f, " default #{default}")
            }
            Instruction::Other { operands, .. } => {
                write!(f, "{mnemonic}")?;
                if opcode_info(self.opcode()).map(|info| info.operands) != Some(OperandLayout::None)
                {
                    for byte in operands {
                        write!(f, " {byte:02X}")?;
                    }
                }
                Ok(())
            }
            Instruction::Pop | Instruction::Pop2 | Instruction::Return { .. } => {
                write!(f, "{mnemonic}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, descriptor: &str) -> MemberRef {
        MemberRef {
            index: 7,
            owner: "a/B".into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    #[test]
    fn canonical_opcodes() {
        #[rustfmt::skip]
        let cases = [
            (Instruction::LoadLocal { index: 0, kind: ValueKind::Reference }, opcodes::ALOAD_0),
            (Instruction::LoadLocal { index: 4, kind: ValueKind::Int }, opcodes::ILOAD),
            (Instruction::StoreLocal { index: 3, kind: ValueKind::Double }, opcodes::DSTORE_3),
            (Instruction::StoreLocal { index: 300, kind: ValueKind::Long }, opcodes::LSTORE),
            (Instruction::Return { kind: None }, opcodes::RETURN),
            (Instruction::Return { kind: Some(ValueKind::Float) }, opcodes::FRETURN),
            (Instruction::Pop2, opcodes::POP2),
        ];
        for (instruction, opcode) in cases {
            assert_eq!(instruction.opcode(), opcode, "{instruction}");
        }

        let get = Instruction::LoadField {
            field: member("x", "I"),
            is_static: true,
        };
        assert_eq!(get.opcode(), opcodes::GETSTATIC);
        assert_eq!(get.to_string(), "getstatic a/B.x : I");
    }

    #[test]
    fn targets() {
        let mut switch = Instruction::LookupSwitch {
            default: 9,
            pairs: vec![(1, 4), (5, 6)],
        };
        assert_eq!(switch.branch_targets(), vec![9, 4, 6]);
        for target in switch.targets_mut() {
            *target += 1;
        }
        assert_eq!(switch.branch_targets(), vec![10, 5, 7]);
        assert!(Instruction::Pop.branch_targets().is_empty());
    }

    #[test]
    fn local_access_of_opaque_forms() {
        let long_form = Instruction::Other {
            opcode: opcodes::DLOAD,
            operands: vec![2],
        };
        assert_eq!(long_form.local_access(), Some((2, 2)));

        let iinc = Instruction::Other {
            opcode: opcodes::IINC,
            operands: vec![5, 1],
        };
        assert_eq!(iinc.local_access(), Some((5, 1)));

        let wide = Instruction::Other {
            opcode: opcodes::WIDE,
            operands: vec![opcodes::LSTORE, 0x01, 0x00],
        };
        assert_eq!(wide.local_access(), Some((256, 2)));

        let nop = Instruction::Other {
            opcode: opcodes::NOP,
            operands: vec![],
        };
        assert!(nop.is_nop());
        assert_eq!(nop.local_access(), None);
    }

    #[test]
    fn display() {
        let invoke = Instruction::InvokeMethod {
            method: member("run", "()V"),
            dispatch: Dispatch::Interface,
        };
        assert_eq!(invoke.to_string(), "invokeinterface a/B.run ()V");
        assert_eq!(
            Instruction::Jump {
                opcode: opcodes::GOTO,
                target: 3
            }
            .to_string(),
            "goto -> #3"
        );
        assert_eq!(
            Instruction::Other {
                opcode: opcodes::BIPUSH,
                operands: vec![0x10]
            }
            .to_string(),
            "bipush 10"
        );
    }
}
