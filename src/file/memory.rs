//! In-memory backend for class bytes handed over by a class-loading hook.

use super::Backend;

/// Owned byte buffer backend.
#[derive(Debug)]
pub struct Memory(Vec<u8>);

impl Memory {
    /// Take ownership of `data`.
    pub fn new(data: Vec<u8>) -> Memory {
        Memory(data)
    }
}

impl Backend for Memory {
    fn data(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_are_bounds_checked() {
        let mut data = vec![0xCC_u8; 64];
        data[10] = 0xBB;
        data[11] = 0xBB;

        let memory = Memory::new(data);

        assert_eq!(memory.len(), 64);
        assert_eq!(memory.data_slice(10, 2).unwrap(), &[0xBB, 0xBB]);
        assert_eq!(memory.data_slice(64, 0).unwrap(), &[] as &[u8]);
        assert!(memory.data_slice(usize::MAX, 2).is_err());
        assert!(memory.data_slice(0, 65).is_err());
    }
}
