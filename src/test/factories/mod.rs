//! Factories producing class file bytes for unit tests.
//!
//! No binary fixtures are shipped, every class used by the tests is assembled here.

mod classfile;

pub use classfile::*;
