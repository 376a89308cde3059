//! Memory-mapped backend for class files on disk.

use super::Backend;
use crate::{Error::FileError, Result};

use memmap2::Mmap;
use std::{fs, path::Path};

/// Read-only memory map of a file.
#[derive(Debug)]
pub struct Physical {
    map: Mmap,
}

impl Physical {
    /// Open and map `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path).map_err(FileError)?;
        // SAFETY: read-only map; class files are not rewritten while being patched
        let map = unsafe { Mmap::map(&file) }.map_err(FileError)?;
        Ok(Physical { map })
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        &self.map
    }
}
