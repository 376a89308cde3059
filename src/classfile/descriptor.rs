//! Field and method descriptors (JVMS §4.3).
//!
//! # Examples
//!
//! ```rust
//! use veinpatch::classfile::{MethodDescriptor, ValueKind};
//!
//! let descriptor = MethodDescriptor::parse("(Lnet/minecraft/world/World;IIJ)Z")?;
//! assert_eq!(descriptor.params.len(), 4);
//! assert_eq!(descriptor.arg_slots(), 5);
//! assert_eq!(descriptor.return_kind(), Some(ValueKind::Int));
//! assert_eq!(descriptor.to_string(), "(Lnet/minecraft/world/World;IIJ)Z");
//! # Ok::<(), veinpatch::Error>(())
//! ```

use std::fmt;

use strum::Display;

use crate::{Error, Result};

/// The computational category a value occupies on the operand stack or in a local slot.
///
/// `boolean`, `byte`, `char`, `short` and `int` all collapse to [`ValueKind::Int`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    /// `int` and its narrower relatives
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// Object or array reference
    Reference,
}

impl ValueKind {
    /// Number of slots the value occupies.
    #[must_use]
    pub fn width(self) -> u16 {
        match self {
            ValueKind::Long | ValueKind::Double => 2,
            _ => 1,
        }
    }
}

/// A parsed field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `B`
    Byte,
    /// `C`
    Char,
    /// `D`
    Double,
    /// `F`
    Float,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `S`
    Short,
    /// `Z`
    Boolean,
    /// `L<internal name>;`
    Object(String),
    /// `[<component>`
    Array(Box<FieldType>),
}

impl FieldType {
    /// Parse a complete field descriptor.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDescriptor`] if `descriptor` is not exactly one field type.
    pub fn parse(descriptor: &str) -> Result<FieldType> {
        let (field, rest) = Self::parse_prefix(descriptor)?;
        if !rest.is_empty() {
            return Err(Error::InvalidDescriptor(descriptor.to_string()));
        }
        Ok(field)
    }

    fn parse_prefix(input: &str) -> Result<(FieldType, &str)> {
        let invalid = || Error::InvalidDescriptor(input.to_string());

        let mut chars = input.chars();
        let first = chars.next().ok_or_else(invalid)?;
        let rest = chars.as_str();
        let field = match first {
            'B' => FieldType::Byte,
            'C' => FieldType::Char,
            'D' => FieldType::Double,
            'F' => FieldType::Float,
            'I' => FieldType::Int,
            'J' => FieldType::Long,
            'S' => FieldType::Short,
            'Z' => FieldType::Boolean,
            'L' => {
                let end = rest.find(';').ok_or_else(invalid)?;
                if end == 0 {
                    return Err(invalid());
                }
                return Ok((FieldType::Object(rest[..end].to_string()), &rest[end + 1..]));
            }
            '[' => {
                let (component, rest) = Self::parse_prefix(rest)?;
                return Ok((FieldType::Array(Box::new(component)), rest));
            }
            _ => return Err(invalid()),
        };
        Ok((field, rest))
    }

    /// The stack/local category of values of this type.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldType::Byte
            | FieldType::Char
            | FieldType::Int
            | FieldType::Short
            | FieldType::Boolean => ValueKind::Int,
            FieldType::Long => ValueKind::Long,
            FieldType::Float => ValueKind::Float,
            FieldType::Double => ValueKind::Double,
            FieldType::Object(_) | FieldType::Array(_) => ValueKind::Reference,
        }
    }

    /// Number of slots a value of this type occupies.
    #[must_use]
    pub fn slots(&self) -> u16 {
        self.kind().width()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Byte => write!(f, "B"),
            FieldType::Char => write!(f, "C"),
            FieldType::Double => write!(f, "D"),
            FieldType::Float => write!(f, "F"),
            FieldType::Int => write!(f, "I"),
            FieldType::Long => write!(f, "J"),
            FieldType::Short => write!(f, "S"),
            FieldType::Boolean => write!(f, "Z"),
            FieldType::Object(name) => write!(f, "L{name};"),
            FieldType::Array(component) => write!(f, "[{component}"),
        }
    }
}

/// A parsed method descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Parameter types in declaration order
    pub params: Vec<FieldType>,
    /// Return type, `None` for `V`
    pub ret: Option<FieldType>,
}

impl MethodDescriptor {
    /// Parse a method descriptor.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDescriptor`] if `descriptor` does not follow the grammar.
    pub fn parse(descriptor: &str) -> Result<MethodDescriptor> {
        let invalid = || Error::InvalidDescriptor(descriptor.to_string());

        let mut rest = descriptor.strip_prefix('(').ok_or_else(invalid)?;
        let mut params = Vec::new();
        while !rest.starts_with(')') {
            if rest.is_empty() {
                return Err(invalid());
            }
            let (param, remaining) = FieldType::parse_prefix(rest).map_err(|_| invalid())?;
            params.push(param);
            rest = remaining;
        }
        rest = &rest[1..];

        let ret = if rest == "V" {
            None
        } else {
            Some(FieldType::parse(rest).map_err(|_| invalid())?)
        };

        Ok(MethodDescriptor { params, ret })
    }

    /// Slots taken by the parameters, excluding any receiver.
    #[must_use]
    pub fn arg_slots(&self) -> u16 {
        self.params.iter().map(FieldType::slots).sum()
    }

    /// Slots pushed by the return value (0 for void).
    #[must_use]
    pub fn return_slots(&self) -> u16 {
        self.ret.as_ref().map_or(0, FieldType::slots)
    }

    /// Kind of the return value, `None` for void.
    #[must_use]
    pub fn return_kind(&self) -> Option<ValueKind> {
        self.ret.as_ref().map(FieldType::kind)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for param in &self.params {
            write!(f, "{param}")?;
        }
        match &self.ret {
            Some(ret) => write!(f, "){ret}"),
            None => write!(f, ")V"),
        }
    }
}
