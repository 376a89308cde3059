//! Attributes kept as opaque bytes.

use crate::{
    classfile::ConstantPool,
    file::{
        io::{emit_be, patch_len_u32, reserve_len_u32},
        parser::Parser,
    },
    Result,
};

/// An attribute whose contents are not interpreted (JVMS §4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    /// Index of the `Utf8` attribute name
    pub name_index: u16,
    /// The attribute body, without the six byte header
    pub info: Vec<u8>,
}

impl RawAttribute {
    /// Parse the attribute header and body.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the body runs past the input.
    pub fn parse(parser: &mut Parser) -> Result<RawAttribute> {
        let name_index = parser.read_be::<u16>()?;
        let len = parser.read_be::<u32>()?;
        let info = parser.read_bytes(len as usize)?.to_vec();
        Ok(RawAttribute { name_index, info })
    }

    /// Serialize header and body.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the body exceeds `u32::MAX` bytes.
    pub fn write(&self, buffer: &mut Vec<u8>) -> Result<()> {
        let len = u32::try_from(self.info.len())
            .map_err(|_| malformed_error!("Attribute too large - {}", self.info.len()))?;
        emit_be(buffer, self.name_index);
        emit_be(buffer, len);
        buffer.extend_from_slice(&self.info);
        Ok(())
    }

    /// Resolve the attribute name.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `name_index` is not a `Utf8` entry.
    pub fn name<'a>(&self, pool: &'a ConstantPool) -> Result<std::borrow::Cow<'a, str>> {
        pool.utf8(self.name_index)
    }
}

/// Parse a `u2` attribute count followed by the attributes, dispatching each one on its name.
///
/// `f` receives the attribute name, its name index and its body. It returns `None` for
/// attributes it does not interpret, which are then kept raw through `raw`.
pub(crate) fn parse_attributes<T, F, R>(
    parser: &mut Parser,
    pool: &ConstantPool,
    mut f: F,
    raw: R,
) -> Result<Vec<T>>
where
    F: FnMut(&str, u16, &[u8]) -> Result<Option<T>>,
    R: Fn(RawAttribute) -> T,
{
    parser.read_table(|parser| {
        let attribute = RawAttribute::parse(parser)?;
        let name = pool.utf8(attribute.name_index)?;
        match f(&name, attribute.name_index, &attribute.info)? {
            Some(parsed) => Ok(parsed),
            None => Ok(raw(attribute)),
        }
    })
}

/// Write an attribute header, let `f` emit the body, then back-patch the length.
pub(crate) fn write_attribute<F>(buffer: &mut Vec<u8>, name_index: u16, f: F) -> Result<()>
where
    F: FnOnce(&mut Vec<u8>) -> Result<()>,
{
    emit_be(buffer, name_index);
    let position = reserve_len_u32(buffer);
    f(buffer)?;
    patch_len_u32(buffer, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_roundtrip() {
        let data = [0x00, 0x05, 0x00, 0x00, 0x00, 0x02, 0xAB, 0xCD];
        let mut parser = Parser::new(&data);
        let attribute = RawAttribute::parse(&mut parser).unwrap();

        assert_eq!(attribute.name_index, 5);
        assert_eq!(attribute.info, vec![0xAB, 0xCD]);

        let mut out = Vec::new();
        attribute.write(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn truncated_body() {
        let data = [0x00, 0x05, 0x00, 0x00, 0x00, 0x09, 0xAB];
        let mut parser = Parser::new(&data);
        assert!(RawAttribute::parse(&mut parser).is_err());
    }
}
