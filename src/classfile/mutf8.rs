//! Modified UTF-8 as used by `CONSTANT_Utf8` entries (JVMS §4.4.7).
//!
//! Differs from standard UTF-8 in two places: NUL is encoded as `C0 80`, and supplementary
//! characters are encoded as a surrogate pair of two three-byte sequences.

use std::borrow::Cow;

use crate::Result;

/// Decode modified UTF-8 into a string, borrowing when the input is plain ASCII.
///
/// Unpaired surrogates decode to U+FFFD.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for truncated sequences, raw NUL bytes or four-byte forms.
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    if bytes.iter().all(|&b| b != 0 && b < 0x80) {
        // ASCII without NUL is identical in both encodings
        return Ok(Cow::Borrowed(
            std::str::from_utf8(bytes).map_err(|e| malformed_error!("Invalid Utf8 - {}", e))?,
        ));
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut cursor = 0;
    while cursor < bytes.len() {
        let first = bytes[cursor];
        let continuation = |at: usize| -> Result<u16> {
            match bytes.get(at) {
                Some(&b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
                _ => Err(malformed_error!("Truncated modified Utf8 sequence at {}", at)),
            }
        };

        match first {
            0x01..=0x7F => {
                units.push(u16::from(first));
                cursor += 1;
            }
            0xC0..=0xDF => {
                let second = continuation(cursor + 1)?;
                units.push((u16::from(first & 0x1F) << 6) | second);
                cursor += 2;
            }
            0xE0..=0xEF => {
                let second = continuation(cursor + 1)?;
                let third = continuation(cursor + 2)?;
                units.push((u16::from(first & 0x0F) << 12) | (second << 6) | third);
                cursor += 3;
            }
            _ => {
                return Err(malformed_error!(
                    "Invalid modified Utf8 byte 0x{:02X} at {}",
                    first,
                    cursor
                ))
            }
        }
    }

    Ok(Cow::Owned(
        char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
    ))
}

/// Encode a string as modified UTF-8.
#[must_use]
pub fn encode(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_borrowed() {
        let decoded = decode(b"net/minecraft/world/World").unwrap();
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded, "net/minecraft/world/World");
    }

    #[test]
    fn nul_uses_two_bytes() {
        assert_eq!(encode("a\0b"), vec![b'a', 0xC0, 0x80, b'b']);
        assert_eq!(decode(&[b'a', 0xC0, 0x80, b'b']).unwrap(), "a\0b");
    }

    #[test]
    fn supplementary_uses_surrogates() {
        let encoded = encode("\u{1F600}");
        assert_eq!(encoded, vec![0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]);
        assert_eq!(decode(&encoded).unwrap(), "\u{1F600}");
    }

    #[test]
    fn two_and_three_byte_forms() {
        let value = "é€";
        assert_eq!(decode(&encode(value)).unwrap(), value);
    }

    #[test]
    fn rejects_invalid_bytes() {
        assert!(decode(&[0x00]).is_err());
        assert!(decode(&[0xF0, 0x9F, 0x98, 0x80]).is_err());
        assert!(decode(&[0xC3]).is_err());
        assert!(decode(&[0xE2, 0x82]).is_err());
    }
}
