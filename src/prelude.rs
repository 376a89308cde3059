//! # veinpatch Prelude
//!
//! The most commonly used types and traits of the library. Import this module to get quick
//! access to everything needed to load, inspect and patch a class.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all veinpatch operations
pub use crate::Error;

/// The result type used throughout veinpatch
pub use crate::Result;

/// Low-level input and parsing
pub use crate::{File, Parser};

// ================================================================================================
// Class File Model
// ================================================================================================

/// Parsed class files and their parts
pub use crate::classfile::{
    ClassFile, Code, ConstantPool, Field, FieldType, Method, MethodDescriptor, ValueKind,
};

// ================================================================================================
// Instructions
// ================================================================================================

/// Instructions and their analysis
pub use crate::assembly::{Dispatch, Instruction, InstructionList, MemberRef, StackAnalysis};

// ================================================================================================
// Transformation
// ================================================================================================

/// Name mapping
pub use crate::mapping::{IdentityRemapper, MemberRemapper, NameResolver, SrgRemapper};

/// The transformer and its configuration
pub use crate::transform::{
    patch_class, ClassTransformer, PatchReport, TransformerConfig, VeinMinerTransformer,
};
