//! Low-level byte order and safe reading/writing utilities for class file parsing.
//!
//! Class files are big-endian throughout (JVMS §4), so this module only provides the big-endian
//! half of a byte order toolkit: bounds-checked reads from byte slices, in-place writes into
//! byte slices (used to back-patch length prefixes), and appends onto growable output buffers.
//!
//! # Key Components
//!
//! - [`crate::file::io::ClassIO`] - Trait implemented by every primitive the format uses
//! - [`crate::file::io::read_be`] / [`crate::file::io::read_be_at`] - Bounds-checked reads
//! - [`crate::file::io::write_be`] / [`crate::file::io::write_be_at`] - In-place writes
//! - [`crate::file::io::emit_be`] - Append to an output buffer
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use veinpatch::file::io::{read_be_at, emit_be};
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x32];
//! let mut offset = 0;
//!
//! let magic: u32 = read_be_at(&data, &mut offset)?;
//! let major: u16 = read_be_at(&data, &mut offset)?;
//! assert_eq!(magic, 0xCAFE_BABE);
//! assert_eq!(major, 50);
//!
//! let mut out = Vec::new();
//! emit_be(&mut out, magic);
//! assert_eq!(out, [0xCA, 0xFE, 0xBA, 0xBE]);
//! # Ok::<(), veinpatch::Error>(())
//! ```
//!
//! # Error Handling
//!
//! All reading and writing functions return [`crate::Result<T>`] and fail with
//! [`crate::Error::OutOfBounds`] if the buffer is too short.

use crate::Result;

/// Trait for primitive types that can be read from and written to big-endian byte buffers.
pub trait ClassIO: Sized {
    /// Fixed-size byte array representation of the type
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Decode a value from its big-endian representation
    fn from_be_bytes(bytes: Self::Bytes) -> Self;

    /// Encode a value into its big-endian representation
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_class_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ClassIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )*
    };
}

impl_class_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Safely reads a value of type `T` in big-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is shorter than `T`.
pub fn read_be<T: ClassIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_be_at(data, &mut offset)
}

/// Safely reads a value of type `T` in big-endian byte order at `offset`, advancing it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_be_at<T: ClassIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;

    Ok(T::from_be_bytes(read))
}

/// Writes `value` in big-endian byte order to the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is shorter than `T`.
pub fn write_be<T: ClassIO>(data: &mut [u8], value: T) -> Result<()> {
    let mut offset = 0_usize;
    write_be_at(data, &mut offset, value)
}

/// Writes `value` in big-endian byte order at `offset`, advancing it.
///
/// Used to back-patch length prefixes once the size of the data behind them is known.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn write_be_at<T: ClassIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let bytes = value.to_be_bytes();
    let bytes = bytes.as_ref();

    let Some(end) = offset.checked_add(bytes.len()) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    data[*offset..end].copy_from_slice(bytes);
    *offset = end;
    Ok(())
}

/// Appends `value` in big-endian byte order to an output buffer.
pub fn emit_be<T: ClassIO>(buffer: &mut Vec<u8>, value: T) {
    buffer.extend_from_slice(value.to_be_bytes().as_ref());
}

/// Reserves a big-endian `u32` length prefix and returns its position for [`patch_len_u32`].
pub fn reserve_len_u32(buffer: &mut Vec<u8>) -> usize {
    let position = buffer.len();
    buffer.extend_from_slice(&[0; 4]);
    position
}

/// Back-patches a length prefix reserved with [`reserve_len_u32`] with the number of bytes
/// written after it.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the section grew beyond `u32::MAX` bytes.
pub fn patch_len_u32(buffer: &mut [u8], position: usize) -> Result<()> {
    let len = buffer.len() - position - 4;
    let len = u32::try_from(len).map_err(|_| malformed_error!("Section too large - {}", len))?;
    let mut offset = position;
    write_be_at(buffer, &mut offset, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_be_u8() {
        let result = read_be::<u8>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x01);
    }

    #[test]
    fn read_be_u16() {
        let result = read_be::<u16>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0102);
    }

    #[test]
    fn read_be_i16_negative() {
        let result = read_be::<i16>(&[0xFF, 0xFE]).unwrap();
        assert_eq!(result, -2);
    }

    #[test]
    fn read_be_u32() {
        let result = read_be::<u32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0102_0304);
    }

    #[test]
    fn read_be_u64() {
        let result = read_be::<u64>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0102_0304_0506_0708);
    }

    #[test]
    fn class_header_reads_and_emits() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x32];
        let mut offset = 0;

        let magic: u32 = read_be_at(&data, &mut offset).unwrap();
        let major: u16 = read_be_at(&data, &mut offset).unwrap();
        assert_eq!(magic, 0xCAFE_BABE);
        assert_eq!(major, 50);

        let mut out = Vec::new();
        emit_be(&mut out, magic);
        assert_eq!(out, [0xCA, 0xFE, 0xBA, 0xBE]);
    }

    #[test]
    fn read_be_at_advances() {
        let mut offset = 0;
        assert_eq!(read_be_at::<u16>(&TEST_BUFFER, &mut offset).unwrap(), 0x0102);
        assert_eq!(read_be_at::<u16>(&TEST_BUFFER, &mut offset).unwrap(), 0x0304);
        assert_eq!(offset, 4);
    }

    #[test]
    fn read_be_out_of_bounds() {
        let mut offset = 6;
        let result = read_be_at::<u32>(&TEST_BUFFER, &mut offset);
        assert!(matches!(result, Err(crate::Error::OutOfBounds { .. })));
        assert_eq!(offset, 6);

        let mut offset = usize::MAX;
        assert!(read_be_at::<u8>(&TEST_BUFFER, &mut offset).is_err());
    }

    #[test]
    fn write_be_at_roundtrip() {
        let mut data = [0u8; 6];
        let mut offset = 0;
        write_be_at(&mut data, &mut offset, 0xCAFE_u16).unwrap();
        write_be_at(&mut data, &mut offset, 0xBABE_0001_u32).unwrap();
        assert_eq!(data, [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x01]);
        assert_eq!(offset, 6);

        assert!(write_be(&mut data[5..], 1_u16).is_err());
    }

    #[test]
    fn length_prefix_backpatch() {
        let mut buffer = vec![0xAA];
        let position = reserve_len_u32(&mut buffer);
        buffer.extend_from_slice(&[1, 2, 3]);
        patch_len_u32(&mut buffer, position).unwrap();
        assert_eq!(buffer, [0xAA, 0, 0, 0, 3, 1, 2, 3]);
    }

    #[test]
    fn emit_be_floats() {
        let mut buffer = Vec::new();
        emit_be(&mut buffer, 1.0_f32);
        assert_eq!(buffer, [0x3F, 0x80, 0x00, 0x00]);
    }
}
