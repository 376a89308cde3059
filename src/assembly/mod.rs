//! JVM bytecode instructions: decoding, encoding and stack analysis.
//!
//! # Key Components
//!
//! - [`crate::assembly::Instruction`] - A single instruction, typed where the transformer needs it
//! - [`crate::assembly::InstructionList`] - An index-addressed instruction sequence
//! - [`crate::assembly::decode`] / [`crate::assembly::encode`] - Byte-exact code array conversion
//! - [`crate::assembly::StackAnalysis`] - Operand stack depth analysis for `max_stack`
//! - [`crate::assembly::opcodes`] - Opcode constants
//! - [`crate::assembly::info`] - Per-opcode metadata table

mod decoder;
mod encoder;
pub mod info;
mod instruction;
mod list;
pub mod opcodes;
mod stack;

pub use decoder::{decode, index_of, DecodedCode};
pub use encoder::{encode, encoded_len, switch_padding, EncodedCode, MAX_CODE_LENGTH};
pub use info::{FlowType, OpcodeInfo, OperandLayout};
pub use instruction::{Dispatch, Instruction, MemberRef};
pub use list::InstructionList;
pub use stack::{stack_effect, StackAnalysis};
