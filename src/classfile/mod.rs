//! In-memory model of a JVM class file (JVMS §4).
//!
//! [`ClassFile::from_mem`] parses a complete class file; [`ClassFile::to_bytes`] writes it back,
//! recomputing every length prefix and every offset table. For a class that has not been
//! modified the output is byte-for-byte identical to the input.
//!
//! Only `Code` attributes (and the line number, local variable and stack map tables inside them)
//! are decoded. Everything else is carried as [`RawAttribute`] bytes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use veinpatch::classfile::ClassFile;
//!
//! let bytes = std::fs::read("ItemInWorldManager.class")?;
//! let class = ClassFile::from_mem(&bytes)?;
//!
//! println!("{}", class.name()?);
//! for method in &class.methods {
//!     println!("  {}{}", method.name, method.descriptor);
//! }
//! assert_eq!(class.to_bytes()?, bytes);
//! # Ok::<(), veinpatch::Error>(())
//! ```

mod attributes;
mod code;
mod constpool;
mod descriptor;
mod flags;
pub mod mutf8;
mod stackmap;

use std::{borrow::Cow, path::Path};

pub use attributes::RawAttribute;
pub use code::{Code, CodeAttribute, ExceptionHandler, LineNumber, LocalVariable};
pub use constpool::{tag, Constant, ConstantPool};
pub use descriptor::{FieldType, MethodDescriptor, ValueKind};
pub use flags::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
pub use stackmap::{FrameKind, StackMapFrame, VerificationType};

use crate::{
    classfile::attributes::{parse_attributes, write_attribute},
    file::{io::emit_be, parser::Parser, File},
    Result,
};

/// The class file magic number.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// A field declared by the class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Access flags
    pub access: FieldAccessFlags,
    /// `Utf8` name constant
    pub name_index: u16,
    /// `Utf8` descriptor constant
    pub descriptor_index: u16,
    /// Decoded name
    pub name: String,
    /// Decoded descriptor
    pub descriptor: String,
    /// Attributes, uninterpreted
    pub attributes: Vec<RawAttribute>,
}

/// An attribute of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodAttribute {
    /// The decoded `Code` attribute
    Code {
        /// Attribute name constant
        name_index: u16,
        /// The method body
        code: Box<Code>,
    },
    /// Anything else, kept verbatim
    Other(RawAttribute),
}

/// A method declared by the class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Access flags
    pub access: MethodAccessFlags,
    /// `Utf8` name constant
    pub name_index: u16,
    /// `Utf8` descriptor constant
    pub descriptor_index: u16,
    /// Decoded name
    pub name: String,
    /// Decoded descriptor
    pub descriptor: String,
    /// Attributes in file order
    pub attributes: Vec<MethodAttribute>,
}

impl Method {
    /// The method body, `None` for abstract and native methods.
    #[must_use]
    pub fn code(&self) -> Option<&Code> {
        self.attributes.iter().find_map(|attribute| match attribute {
            MethodAttribute::Code { code, .. } => Some(code.as_ref()),
            MethodAttribute::Other(_) => None,
        })
    }

    /// Mutable access to the method body.
    pub fn code_mut(&mut self) -> Option<&mut Code> {
        self.attributes
            .iter_mut()
            .find_map(|attribute| match attribute {
                MethodAttribute::Code { code, .. } => Some(code.as_mut()),
                MethodAttribute::Other(_) => None,
            })
    }

    /// Whether the method is static.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(MethodAccessFlags::STATIC)
    }

    /// Slots occupied by the parameters, including the receiver of instance methods.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidDescriptor`] if the descriptor cannot be parsed.
    pub fn parameter_slots(&self) -> Result<u16> {
        let descriptor = MethodDescriptor::parse(&self.descriptor)?;
        Ok(descriptor.arg_slots() + u16::from(!self.is_static()))
    }
}

/// A parsed class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    /// Minor version
    pub minor_version: u16,
    /// Major version
    pub major_version: u16,
    /// The constant pool
    pub pool: ConstantPool,
    /// Access flags
    pub access: ClassAccessFlags,
    /// `Class` constant of this class
    pub this_class: u16,
    /// `Class` constant of the superclass, 0 for `java/lang/Object`
    pub super_class: u16,
    /// `Class` constants of the implemented interfaces
    pub interfaces: Vec<u16>,
    /// Declared fields in file order
    pub fields: Vec<Field>,
    /// Declared methods in file order
    pub methods: Vec<Method>,
    /// Class attributes, uninterpreted
    pub attributes: Vec<RawAttribute>,
}

impl ClassFile {
    /// Parse a class file held in memory.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for empty input and [`crate::Error::Malformed`] for a bad
    /// magic number, truncation, invalid constants or code, and trailing bytes.
    pub fn from_mem(data: &[u8]) -> Result<ClassFile> {
        if data.is_empty() {
            return Err(crate::Error::Empty);
        }

        let mut parser = Parser::new(data);
        Self::parse(&mut parser).map_err(|error| match error {
            crate::Error::OutOfBounds { .. } => malformed_error!(
                "Class file truncated - {} bytes",
                data.len()
            ),
            other => other,
        })
    }

    /// Load and parse a class file from disk through a memory mapping.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, and otherwise the same
    /// errors as [`ClassFile::from_mem`].
    pub fn from_path(path: &Path) -> Result<ClassFile> {
        let file = File::from_file(path)?;
        Self::from_mem(file.data())
    }

    fn parse(parser: &mut Parser) -> Result<ClassFile> {
        let magic = parser.read_be::<u32>()?;
        if magic != MAGIC {
            return Err(malformed_error!("Invalid magic 0x{:08X}", magic));
        }

        let minor_version = parser.read_be::<u16>()?;
        let major_version = parser.read_be::<u16>()?;
        let pool = ConstantPool::parse(parser)?;
        let access = ClassAccessFlags::from_bits_retain(parser.read_be::<u16>()?);
        let this_class = parser.read_be::<u16>()?;
        pool.class_name(this_class)?;
        let super_class = parser.read_be::<u16>()?;
        if super_class != 0 {
            pool.class_name(super_class)?;
        }
        let interfaces = parser.read_table(|parser| parser.read_be::<u16>())?;

        let fields = parser.read_table(|parser| {
            let access = FieldAccessFlags::from_bits_retain(parser.read_be::<u16>()?);
            let name_index = parser.read_be::<u16>()?;
            let descriptor_index = parser.read_be::<u16>()?;
            Ok(Field {
                access,
                name_index,
                descriptor_index,
                name: pool.utf8(name_index)?.into_owned(),
                descriptor: pool.utf8(descriptor_index)?.into_owned(),
                attributes: parser.read_table(RawAttribute::parse)?,
            })
        })?;

        let methods = parser.read_table(|parser| {
            let access = MethodAccessFlags::from_bits_retain(parser.read_be::<u16>()?);
            let name_index = parser.read_be::<u16>()?;
            let descriptor_index = parser.read_be::<u16>()?;
            let attributes = parse_attributes(
                parser,
                &pool,
                |name, name_index, body| match name {
                    "Code" => Ok(Some(MethodAttribute::Code {
                        name_index,
                        code: Box::new(Code::parse(body, &pool)?),
                    })),
                    _ => Ok(None),
                },
                MethodAttribute::Other,
            )?;
            Ok(Method {
                access,
                name_index,
                descriptor_index,
                name: pool.utf8(name_index)?.into_owned(),
                descriptor: pool.utf8(descriptor_index)?.into_owned(),
                attributes,
            })
        })?;

        let attributes = parser.read_table(RawAttribute::parse)?;

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} trailing bytes after the class file",
                parser.remaining()
            ));
        }

        Ok(ClassFile {
            minor_version,
            major_version,
            pool,
            access,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Serialize the class file.
    ///
    /// # Errors
    /// Returns an error if a method body cannot be encoded, see [`crate::assembly::encode`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        emit_be(&mut buffer, MAGIC);
        emit_be(&mut buffer, self.minor_version);
        emit_be(&mut buffer, self.major_version);
        self.pool.write(&mut buffer)?;
        emit_be(&mut buffer, self.access.bits());
        emit_be(&mut buffer, self.this_class);
        emit_be(&mut buffer, self.super_class);

        emit_be(&mut buffer, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            emit_be(&mut buffer, *interface);
        }

        emit_be(&mut buffer, self.fields.len() as u16);
        for field in &self.fields {
            emit_be(&mut buffer, field.access.bits());
            emit_be(&mut buffer, field.name_index);
            emit_be(&mut buffer, field.descriptor_index);
            emit_be(&mut buffer, field.attributes.len() as u16);
            for attribute in &field.attributes {
                attribute.write(&mut buffer)?;
            }
        }

        emit_be(&mut buffer, self.methods.len() as u16);
        for method in &self.methods {
            emit_be(&mut buffer, method.access.bits());
            emit_be(&mut buffer, method.name_index);
            emit_be(&mut buffer, method.descriptor_index);
            emit_be(&mut buffer, method.attributes.len() as u16);
            for attribute in &method.attributes {
                match attribute {
                    MethodAttribute::Code { name_index, code } => {
                        write_attribute(&mut buffer, *name_index, |buffer| {
                            code.write(buffer, &method.name)
                        })?;
                    }
                    MethodAttribute::Other(raw) => raw.write(&mut buffer)?,
                }
            }
        }

        emit_be(&mut buffer, self.attributes.len() as u16);
        for attribute in &self.attributes {
            attribute.write(&mut buffer)?;
        }

        Ok(buffer)
    }

    /// Internal name of this class.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `this_class` does not name a class.
    pub fn name(&self) -> Result<Cow<'_, str>> {
        self.pool.class_name(self.this_class)
    }

    /// First field with the given name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Position of the first method with the given name (and descriptor, if given).
    #[must_use]
    pub fn method_position(&self, name: &str, descriptor: Option<&str>) -> Option<usize> {
        self.methods.iter().position(|method| {
            method.name == name
                && descriptor.map_or(true, |descriptor| method.descriptor == descriptor)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembly::{Dispatch, Instruction},
        test::factories::item_in_world_manager,
        Error,
    };

    #[test]
    fn factory_class_roundtrips() {
        let bytes = item_in_world_manager().build();
        let class = ClassFile::from_mem(&bytes).unwrap();

        assert_eq!(class.name().unwrap(), "net/minecraft/item/ItemInWorldManager");
        assert_eq!(class.fields.len(), 2);
        assert_eq!(class.to_bytes().unwrap(), bytes);

        let index = class.method_position("uncheckedTryHarvestBlock", None).unwrap();
        let code = class.methods[index].code().unwrap();
        match &code.instructions[4] {
            Instruction::InvokeMethod { method, dispatch } => {
                assert_eq!(*dispatch, Dispatch::Virtual);
                assert_eq!(method.name, "tryHarvestBlock");
            }
            other => panic!("expected the anchor call, found {other:?}"),
        }
        assert_eq!(code.instructions[5], Instruction::Pop);
    }

    #[test]
    fn parameter_slots() {
        let class = ClassFile::from_mem(&item_in_world_manager().build()).unwrap();
        let index = class.method_position("tryHarvestBlock", Some("(III)Z")).unwrap();
        assert_eq!(class.methods[index].parameter_slots().unwrap(), 4);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(ClassFile::from_mem(&[]), Err(Error::Empty)));
        assert!(matches!(
            ClassFile::from_mem(&[0xCA, 0xFE, 0xBA, 0xBF, 0, 0, 0, 50]),
            Err(Error::Malformed { .. })
        ));

        let bytes = item_in_world_manager().build();
        for len in [4, 10, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                matches!(ClassFile::from_mem(&bytes[..len]), Err(Error::Malformed { .. })),
                "truncated to {len}"
            );
        }

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(matches!(
            ClassFile::from_mem(&trailing),
            Err(Error::Malformed { .. })
        ));
    }
}
