//! Raw input access for class files.
//!
//! This module abstracts over where class file bytes come from. A class can be memory-mapped
//! from disk or handed over as an owned buffer (the usual case inside a class-loading hook);
//! both are exposed through the [`crate::file::Backend`] trait so the parsers above never care.
//!
//! # Key Components
//!
//! - [`crate::file::File`] - Loaded input bytes behind a backend
//! - [`crate::file::Backend`] - Trait for different data sources (disk files, memory buffers)
//! - [`crate::file::parser::Parser`] - Cursor used by every decoder in the crate
//! - [`crate::file::io`] - Big-endian read and write helpers
//!
//! # Examples
//!
//! ```rust,no_run
//! use veinpatch::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("ItemInWorldManager.class"))?;
//! println!("{} bytes", file.len());
//! # Ok::<(), veinpatch::Error>(())
//! ```

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error::Empty, Result};
use memory::Memory;
use physical::Physical;

/// Backend trait for class file data sources.
///
/// Only [`Backend::data`] is required; ranges and lengths are derived from it.
pub trait Backend: Send + Sync {
    /// Borrow all bytes.
    fn data(&self) -> &[u8];

    /// Borrow `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data().get(offset..end))
            .ok_or_else(|| out_of_bounds_error!())
    }

    /// Length of the data in bytes.
    fn len(&self) -> usize {
        self.data().len()
    }
}

/// Input bytes of a single class file.
pub struct File {
    data: Box<dyn Backend>,
}

impl File {
    /// Memory-map a class file from disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped, and
    /// [`crate::Error::Empty`] for empty files.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Wrap an owned buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        Ok(File {
            data: Box::new(data),
        })
    }

    /// Length of the input in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the input is empty. Always false for a successfully loaded file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Borrow all input bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Borrow `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the input.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }
}
