// Copyright 2025 portablejim
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # veinpatch
//!
//! A patcher for compiled JVM class files that wires the VeinMiner handler into Minecraft's
//! `ItemInWorldManager`. It parses a class file into a structural model, finds
//! `uncheckedTryHarvestBlock` by its canonical or SRG name, splices a call to
//! `VeinMiner.blockMined` behind the method's call to `tryHarvestBlock`, recomputes the
//! method's `max_stack` and `max_locals`, and writes the class back out.
//!
//! ## Features
//!
//! - **Byte-exact round trip** - An unpatched class is written back byte for byte
//! - **Index-addressed instructions** - Branch targets, exception ranges, line numbers and stack
//!   map frames follow the instructions they refer to when code is inserted or removed
//! - **Deobfuscation aware** - Canonical names are translated to SRG names for obfuscated
//!   classes, and raw member names can be mapped through an SRG file
//! - **All or nothing** - A failed patch leaves the class model untouched
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use veinpatch::prelude::*;
//!
//! let bytes = std::fs::read("ItemInWorldManager.class")?;
//! let patched = patch_class(&bytes, false)?;
//! std::fs::write("ItemInWorldManager.class", patched)?;
//! # Ok::<(), veinpatch::Error>(())
//! ```
//!
//! ### Inspecting a class
//!
//! ```rust,no_run
//! use veinpatch::ClassFile;
//! use std::path::Path;
//!
//! let class = ClassFile::from_path(Path::new("ItemInWorldManager.class"))?;
//! for method in &class.methods {
//!     if let Some(code) = method.code() {
//!         let count = code.instructions.len();
//!         println!("{}{}: {count} instructions", method.name, method.descriptor);
//!         for instruction in &code.instructions {
//!             println!("    {instruction}");
//!         }
//!     }
//! }
//! # Ok::<(), veinpatch::Error>(())
//! ```
//!
//! ### Hooking into a class loader
//!
//! ```rust,no_run
//! use veinpatch::{ClassTransformer, VeinMinerTransformer, mapping::SrgRemapper};
//! use std::path::Path;
//!
//! let transformer = VeinMinerTransformer::new()
//!     .with_remapper(SrgRemapper::from_path(Path::new("joined.srg"))?);
//!
//! let bytes = std::fs::read("sq.class")?;
//! let patched = transformer.transform("sq", "net.minecraft.item.ItemInWorldManager", bytes)?;
//! # Ok::<(), veinpatch::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - `file` - Input bytes behind a memory-mapped or in-memory backend, and the parser cursor
//! - [`classfile`] - Constant pool, descriptors, fields, methods and `Code` attributes
//! - [`assembly`] - Instruction decoding, encoding and stack depth analysis
//! - [`mapping`] - Canonical to SRG name resolution
//! - [`transform`] - Locating, splicing and re-encoding the target method
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result`]. Nothing is retried: the shape of a given class
//! file is fixed, so the caller decides whether to load an unpatched class or abort.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use veinpatch::prelude::*;
///
/// let class = ClassFile::from_mem(&std::fs::read("ItemInWorldManager.class")?)?;
/// let resolver = NameResolver::obfuscated();
/// println!("{}", resolver.resolve("uncheckedTryHarvestBlock"));
/// # Ok::<(), veinpatch::Error>(())
/// ```
pub mod prelude;

/// JVM bytecode instructions.
///
/// Decoding turns a code array into an [`assembly::InstructionList`], in which branch
/// targets are instruction indices. Encoding recomputes every offset, switch padding and branch
/// width, so inserting or removing instructions never leaves a stale offset behind.
///
/// # Examples
///
/// ```rust,no_run
/// use veinpatch::{assembly::decode, classfile::ConstantPool};
///
/// let pool = ConstantPool::new();
/// let decoded = decode(&[0x2A, 0xB1], &pool)?; // aload_0, return
/// for instruction in &decoded.instructions {
///     println!("{instruction}");
/// }
/// # Ok::<(), veinpatch::Error>(())
/// ```
pub mod assembly;

/// The class file model.
///
/// [`ClassFile`] is parsed from bytes and written back with every length prefix and offset
/// table recomputed.
pub mod classfile;

/// Canonical and SRG name mapping.
pub mod mapping;

/// The `ItemInWorldManager` transformation.
pub mod transform;

/// `veinpatch` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust,no_run
/// use veinpatch::{ClassFile, Result};
///
/// fn load(path: &str) -> Result<ClassFile> {
///     ClassFile::from_path(std::path::Path::new(path))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `veinpatch` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use veinpatch::{patch_class, Error};
///
/// match patch_class(&std::fs::read("ItemInWorldManager.class")?, true) {
///     Ok(bytes) => println!("patched, {} bytes", bytes.len()),
///     Err(Error::MethodNotFound { class, method }) => println!("{class} has no {method}"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {message}"),
///     Err(e) => println!("Error: {e}"),
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
pub use error::Error;

/// The parsed class file.
pub use classfile::ClassFile;

/// Loaded input bytes and the parser cursor.
pub use file::{parser::Parser, File};

/// The transformation entry points.
pub use transform::{
    patch_class, ClassTransformer, PatchReport, TransformerConfig, VeinMinerTransformer,
};
