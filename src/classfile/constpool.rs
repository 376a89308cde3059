//! The class file constant pool (JVMS §4.4).
//!
//! Entries are stored exactly as they appear in the file so that an untouched pool serializes
//! back to identical bytes. `Long` and `Double` entries occupy two indices; the second one is
//! kept as an empty slot. UTF-8 entries keep their raw modified UTF-8 bytes and are decoded on
//! access.
//!
//! The pool also offers get-or-insert helpers for the handful of entry kinds the transformer
//! needs to reference from newly emitted instructions.
//!
//! # Examples
//!
//! ```rust
//! use veinpatch::classfile::ConstantPool;
//!
//! let mut pool = ConstantPool::new();
//! let owner = "portablejim/veinminer/VeinMiner";
//! let field = pool.field_ref(owner, "instance", "Lportablejim/veinminer/VeinMiner;")?;
//! let again = pool.field_ref(owner, "instance", "Lportablejim/veinminer/VeinMiner;")?;
//! assert_eq!(field, again);
//!
//! let member = pool.member_ref(field)?;
//! assert_eq!(member.name, "instance");
//! # Ok::<(), veinpatch::Error>(())
//! ```

use std::borrow::Cow;

use strum::IntoStaticStr;

use crate::{
    assembly::MemberRef,
    classfile::mutf8,
    file::{io::emit_be, parser::Parser},
    Error, Result,
};

/// Tag values of constant pool entries.
pub mod tag {
    /// `CONSTANT_Utf8`
    pub const UTF8: u8 = 1;
    /// `CONSTANT_Integer`
    pub const INTEGER: u8 = 3;
    /// `CONSTANT_Float`
    pub const FLOAT: u8 = 4;
    /// `CONSTANT_Long`
    pub const LONG: u8 = 5;
    /// `CONSTANT_Double`
    pub const DOUBLE: u8 = 6;
    /// `CONSTANT_Class`
    pub const CLASS: u8 = 7;
    /// `CONSTANT_String`
    pub const STRING: u8 = 8;
    /// `CONSTANT_Fieldref`
    pub const FIELD_REF: u8 = 9;
    /// `CONSTANT_Methodref`
    pub const METHOD_REF: u8 = 10;
    /// `CONSTANT_InterfaceMethodref`
    pub const INTERFACE_METHOD_REF: u8 = 11;
    /// `CONSTANT_NameAndType`
    pub const NAME_AND_TYPE: u8 = 12;
    /// `CONSTANT_MethodHandle`
    pub const METHOD_HANDLE: u8 = 15;
    /// `CONSTANT_MethodType`
    pub const METHOD_TYPE: u8 = 16;
    /// `CONSTANT_Dynamic`
    pub const DYNAMIC: u8 = 17;
    /// `CONSTANT_InvokeDynamic`
    pub const INVOKE_DYNAMIC: u8 = 18;
    /// `CONSTANT_Module`
    pub const MODULE: u8 = 19;
    /// `CONSTANT_Package`
    pub const PACKAGE: u8 = 20;
}

/// A single constant pool entry.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum Constant {
    /// Raw modified UTF-8 bytes
    Utf8(Vec<u8>),
    /// 32-bit integer
    Integer(i32),
    /// 32-bit float, kept as its bit pattern
    Float(u32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit float, kept as its bit pattern
    Double(u64),
    /// Class or interface, by internal name
    Class {
        /// Index of the `Utf8` name
        name_index: u16,
    },
    /// String literal
    String {
        /// Index of the `Utf8` value
        string_index: u16,
    },
    /// Field reference
    FieldRef {
        /// Index of the owning `Class`
        class_index: u16,
        /// Index of the `NameAndType`
        name_and_type_index: u16,
    },
    /// Class method reference
    MethodRef {
        /// Index of the owning `Class`
        class_index: u16,
        /// Index of the `NameAndType`
        name_and_type_index: u16,
    },
    /// Interface method reference
    InterfaceMethodRef {
        /// Index of the owning `Class`
        class_index: u16,
        /// Index of the `NameAndType`
        name_and_type_index: u16,
    },
    /// Name and descriptor pair
    NameAndType {
        /// Index of the `Utf8` name
        name_index: u16,
        /// Index of the `Utf8` descriptor
        descriptor_index: u16,
    },
    /// Method handle
    MethodHandle {
        /// Reference kind (1-9)
        reference_kind: u8,
        /// Index of the referenced member
        reference_index: u16,
    },
    /// Method type
    MethodType {
        /// Index of the `Utf8` descriptor
        descriptor_index: u16,
    },
    /// Dynamically computed constant
    Dynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method_attr_index: u16,
        /// Index of the `NameAndType`
        name_and_type_index: u16,
    },
    /// Dynamically computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method_attr_index: u16,
        /// Index of the `NameAndType`
        name_and_type_index: u16,
    },
    /// Module
    Module {
        /// Index of the `Utf8` name
        name_index: u16,
    },
    /// Package
    Package {
        /// Index of the `Utf8` name
        name_index: u16,
    },
}

impl Constant {
    /// The tag byte this entry is written with.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Constant::Utf8(_) => tag::UTF8,
            Constant::Integer(_) => tag::INTEGER,
            Constant::Float(_) => tag::FLOAT,
            Constant::Long(_) => tag::LONG,
            Constant::Double(_) => tag::DOUBLE,
            Constant::Class { .. } => tag::CLASS,
            Constant::String { .. } => tag::STRING,
            Constant::FieldRef { .. } => tag::FIELD_REF,
            Constant::MethodRef { .. } => tag::METHOD_REF,
            Constant::InterfaceMethodRef { .. } => tag::INTERFACE_METHOD_REF,
            Constant::NameAndType { .. } => tag::NAME_AND_TYPE,
            Constant::MethodHandle { .. } => tag::METHOD_HANDLE,
            Constant::MethodType { .. } => tag::METHOD_TYPE,
            Constant::Dynamic { .. } => tag::DYNAMIC,
            Constant::InvokeDynamic { .. } => tag::INVOKE_DYNAMIC,
            Constant::Module { .. } => tag::MODULE,
            Constant::Package { .. } => tag::PACKAGE,
        }
    }

    /// Whether the entry occupies two pool indices.
    #[must_use]
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    fn parse(parser: &mut Parser) -> Result<Constant> {
        let tag = parser.read_be::<u8>()?;
        let constant = match tag {
            tag::UTF8 => {
                let len = parser.read_be::<u16>()?;
                Constant::Utf8(parser.read_bytes(usize::from(len))?.to_vec())
            }
            tag::INTEGER => Constant::Integer(parser.read_be::<i32>()?),
            tag::FLOAT => Constant::Float(parser.read_be::<u32>()?),
            tag::LONG => Constant::Long(parser.read_be::<i64>()?),
            tag::DOUBLE => Constant::Double(parser.read_be::<u64>()?),
            tag::CLASS => Constant::Class {
                name_index: parser.read_be::<u16>()?,
            },
            tag::STRING => Constant::String {
                string_index: parser.read_be::<u16>()?,
            },
            tag::FIELD_REF => Constant::FieldRef {
                class_index: parser.read_be::<u16>()?,
                name_and_type_index: parser.read_be::<u16>()?,
            },
            tag::METHOD_REF => Constant::MethodRef {
                class_index: parser.read_be::<u16>()?,
                name_and_type_index: parser.read_be::<u16>()?,
            },
            tag::INTERFACE_METHOD_REF => Constant::InterfaceMethodRef {
                class_index: parser.read_be::<u16>()?,
                name_and_type_index: parser.read_be::<u16>()?,
            },
            tag::NAME_AND_TYPE => Constant::NameAndType {
                name_index: parser.read_be::<u16>()?,
                descriptor_index: parser.read_be::<u16>()?,
            },
            tag::METHOD_HANDLE => Constant::MethodHandle {
                reference_kind: parser.read_be::<u8>()?,
                reference_index: parser.read_be::<u16>()?,
            },
            tag::METHOD_TYPE => Constant::MethodType {
                descriptor_index: parser.read_be::<u16>()?,
            },
            tag::DYNAMIC => Constant::Dynamic {
                bootstrap_method_attr_index: parser.read_be::<u16>()?,
                name_and_type_index: parser.read_be::<u16>()?,
            },
            tag::INVOKE_DYNAMIC => Constant::InvokeDynamic {
                bootstrap_method_attr_index: parser.read_be::<u16>()?,
                name_and_type_index: parser.read_be::<u16>()?,
            },
            tag::MODULE => Constant::Module {
                name_index: parser.read_be::<u16>()?,
            },
            tag::PACKAGE => Constant::Package {
                name_index: parser.read_be::<u16>()?,
            },
            _ => {
                return Err(malformed_error!(
                    "Unknown constant pool tag {} at offset {}",
                    tag,
                    parser.pos() - 1
                ))
            }
        };

        Ok(constant)
    }

    fn write(&self, buffer: &mut Vec<u8>) -> Result<()> {
        buffer.push(self.tag());
        match self {
            Constant::Utf8(bytes) => {
                let len = u16::try_from(bytes.len())
                    .map_err(|_| malformed_error!("Utf8 constant too long - {}", bytes.len()))?;
                emit_be(buffer, len);
                buffer.extend_from_slice(bytes);
            }
            Constant::Integer(value) => emit_be(buffer, *value),
            Constant::Float(bits) => emit_be(buffer, *bits),
            Constant::Long(value) => emit_be(buffer, *value),
            Constant::Double(bits) => emit_be(buffer, *bits),
            Constant::Class { name_index: index }
            | Constant::String {
                string_index: index,
            }
            | Constant::MethodType {
                descriptor_index: index,
            }
            | Constant::Module { name_index: index }
            | Constant::Package { name_index: index } => emit_be(buffer, *index),
            Constant::FieldRef {
                class_index: first,
                name_and_type_index: second,
            }
            | Constant::MethodRef {
                class_index: first,
                name_and_type_index: second,
            }
            | Constant::InterfaceMethodRef {
                class_index: first,
                name_and_type_index: second,
            }
            | Constant::NameAndType {
                name_index: first,
                descriptor_index: second,
            }
            | Constant::Dynamic {
                bootstrap_method_attr_index: first,
                name_and_type_index: second,
            }
            | Constant::InvokeDynamic {
                bootstrap_method_attr_index: first,
                name_and_type_index: second,
            } => {
                emit_be(buffer, *first);
                emit_be(buffer, *second);
            }
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                buffer.push(*reference_kind);
                emit_be(buffer, *reference_index);
            }
        }
        Ok(())
    }
}

/// The constant pool of a class file.
///
/// Index 0 and the upper half of every `Long`/`Double` are empty slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<Option<Constant>>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        ConstantPool {
            entries: vec![None],
        }
    }

    /// Parse `constant_pool_count` followed by the entries, then validate cross references.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unknown tags or references to the wrong entry kind.
    pub fn parse(parser: &mut Parser) -> Result<ConstantPool> {
        let count = parser.read_be::<u16>()?;
        if count == 0 {
            return Err(malformed_error!("constant_pool_count must be at least 1"));
        }

        let mut entries = Vec::with_capacity(usize::from(count));
        entries.push(None);
        while entries.len() < usize::from(count) {
            let constant = Constant::parse(parser)?;
            let wide = constant.is_wide();
            entries.push(Some(constant));
            if wide {
                if entries.len() >= usize::from(count) {
                    return Err(malformed_error!(
                        "Long or Double constant in the last pool slot {}",
                        entries.len() - 1
                    ));
                }
                entries.push(None);
            }
        }

        let pool = ConstantPool { entries };
        pool.validate()?;
        Ok(pool)
    }

    /// Serialize `constant_pool_count` followed by the entries.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if an entry cannot be represented.
    pub fn write(&self, buffer: &mut Vec<u8>) -> Result<()> {
        emit_be(buffer, self.count());
        for constant in self.entries.iter().flatten() {
            constant.write(buffer)?;
        }
        Ok(())
    }

    /// `constant_pool_count`, i.e. one more than the highest valid index.
    #[must_use]
    pub fn count(&self) -> u16 {
        // push() keeps the length within u16
        self.entries.len() as u16
    }

    /// Iterate over `(index, constant)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|c| (index as u16, c)))
    }

    /// Look up an entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for index 0, empty slots and out-of-range indices.
    pub fn get(&self, index: u16) -> Result<&Constant> {
        match self.entries.get(usize::from(index)) {
            Some(Some(constant)) => Ok(constant),
            _ => Err(malformed_error!("Invalid constant pool index {}", index)),
        }
    }

    /// Decode a `Utf8` entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` is not a valid `Utf8` entry.
    pub fn utf8(&self, index: u16) -> Result<Cow<'_, str>> {
        match self.get(index)? {
            Constant::Utf8(bytes) => mutf8::decode(bytes),
            other => Err(unexpected(index, "Utf8", other)),
        }
    }

    /// Internal name of a `Class` entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` is not a valid `Class` entry.
    pub fn class_name(&self, index: u16) -> Result<Cow<'_, str>> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            other => Err(unexpected(index, "Class", other)),
        }
    }

    /// Name and descriptor of a `NameAndType` entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` is not a valid `NameAndType` entry.
    pub fn name_and_type(&self, index: u16) -> Result<(Cow<'_, str>, Cow<'_, str>)> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            other => Err(unexpected(index, "NameAndType", other)),
        }
    }

    /// Resolve a `Fieldref`, `Methodref` or `InterfaceMethodref` entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` is not a member reference.
    pub fn member_ref(&self, index: u16) -> Result<MemberRef> {
        match self.get(index)? {
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            }
            | Constant::MethodRef {
                class_index,
                name_and_type_index,
            }
            | Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => {
                let (name, descriptor) = self.name_and_type(*name_and_type_index)?;
                Ok(MemberRef {
                    index,
                    owner: self.class_name(*class_index)?.into_owned(),
                    name: name.into_owned(),
                    descriptor: descriptor.into_owned(),
                })
            }
            other => Err(unexpected(index, "member reference", other)),
        }
    }

    /// Descriptor of the call site behind an `InvokeDynamic` entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` is not an `InvokeDynamic` entry.
    pub fn invoke_dynamic_descriptor(&self, index: u16) -> Result<Cow<'_, str>> {
        match self.get(index)? {
            Constant::InvokeDynamic {
                name_and_type_index,
                ..
            } => Ok(self.name_and_type(*name_and_type_index)?.1),
            other => Err(unexpected(index, "InvokeDynamic", other)),
        }
    }

    /// Append an entry and return its index.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolFull`] when the pool cannot grow any further.
    pub fn push(&mut self, constant: Constant) -> Result<u16> {
        let needed = if constant.is_wide() { 2 } else { 1 };
        if self.entries.len() + needed > usize::from(u16::MAX) {
            return Err(Error::ConstantPoolFull);
        }

        let index = self.entries.len() as u16;
        let wide = constant.is_wide();
        self.entries.push(Some(constant));
        if wide {
            self.entries.push(None);
        }
        Ok(index)
    }

    fn find_or_push(&mut self, constant: Constant) -> Result<u16> {
        if let Some((index, _)) = self.iter().find(|(_, existing)| **existing == constant) {
            return Ok(index);
        }
        self.push(constant)
    }

    /// Index of a `Utf8` entry holding `value`, adding it if absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolFull`] when the pool cannot grow any further.
    pub fn utf8_index(&mut self, value: &str) -> Result<u16> {
        self.find_or_push(Constant::Utf8(mutf8::encode(value)))
    }

    /// Index of a `Class` entry for `name`, adding it if absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolFull`] when the pool cannot grow any further.
    pub fn class_index(&mut self, name: &str) -> Result<u16> {
        let name_index = self.utf8_index(name)?;
        self.find_or_push(Constant::Class { name_index })
    }

    /// Index of a `NameAndType` entry, adding it if absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolFull`] when the pool cannot grow any further.
    pub fn name_and_type_index(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name_index = self.utf8_index(name)?;
        let descriptor_index = self.utf8_index(descriptor)?;
        self.find_or_push(Constant::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    /// Index of a `Fieldref` entry, adding it and its dependencies if absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolFull`] when the pool cannot grow any further.
    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.class_index(owner)?;
        let name_and_type_index = self.name_and_type_index(name, descriptor)?;
        self.find_or_push(Constant::FieldRef {
            class_index,
            name_and_type_index,
        })
    }

    /// Index of a `Methodref` entry, adding it and its dependencies if absent.
    ///
    /// # Errors
    /// Returns [`crate::Error::ConstantPoolFull`] when the pool cannot grow any further.
    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.class_index(owner)?;
        let name_and_type_index = self.name_and_type_index(name, descriptor)?;
        self.find_or_push(Constant::MethodRef {
            class_index,
            name_and_type_index,
        })
    }

    fn expect_tag(&self, index: u16, expected: u8, from: u16) -> Result<()> {
        let constant = self.get(index).map_err(|_| {
            malformed_error!("Constant {} refers to invalid index {}", from, index)
        })?;
        if constant.tag() != expected {
            return Err(malformed_error!(
                "Constant {} refers to {} ({}), expected tag {}",
                from,
                index,
                <&'static str>::from(constant),
                expected
            ));
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (index, constant) in self.iter() {
            match constant {
                Constant::Class { name_index }
                | Constant::Module { name_index }
                | Constant::Package { name_index } => {
                    self.expect_tag(*name_index, tag::UTF8, index)?;
                }
                Constant::String { string_index } => {
                    self.expect_tag(*string_index, tag::UTF8, index)?;
                }
                Constant::MethodType { descriptor_index } => {
                    self.expect_tag(*descriptor_index, tag::UTF8, index)?;
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    self.expect_tag(*name_index, tag::UTF8, index)?;
                    self.expect_tag(*descriptor_index, tag::UTF8, index)?;
                }
                Constant::FieldRef {
                    class_index,
                    name_and_type_index,
                }
                | Constant::MethodRef {
                    class_index,
                    name_and_type_index,
                }
                | Constant::InterfaceMethodRef {
                    class_index,
                    name_and_type_index,
                } => {
                    self.expect_tag(*class_index, tag::CLASS, index)?;
                    self.expect_tag(*name_and_type_index, tag::NAME_AND_TYPE, index)?;
                }
                Constant::Dynamic {
                    name_and_type_index,
                    ..
                }
                | Constant::InvokeDynamic {
                    name_and_type_index,
                    ..
                } => {
                    self.expect_tag(*name_and_type_index, tag::NAME_AND_TYPE, index)?;
                }
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    if !(1..=9).contains(reference_kind) {
                        return Err(malformed_error!(
                            "MethodHandle {} has invalid reference kind {}",
                            index,
                            reference_kind
                        ));
                    }
                    self.get(*reference_index)?;
                }
                Constant::Utf8(_)
                | Constant::Integer(_)
                | Constant::Float(_)
                | Constant::Long(_)
                | Constant::Double(_) => {}
            }
        }
        Ok(())
    }
}

fn unexpected(index: u16, expected: &str, found: &Constant) -> Error {
    malformed_error!(
        "Constant {} is {}, expected {}",
        index,
        <&'static str>::from(found),
        expected
    )
}
