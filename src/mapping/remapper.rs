//! Member name remapping relative to the owning class.
//!
//! Resolution through [`crate::mapping::NameResolver`] only says which SRG name is expected.
//! Whether a raw member name in a class file *is* that SRG name depends on the class that
//! declares it, which is what a [`MemberRemapper`] answers.

use std::{collections::HashMap, path::Path};

use crate::{file::File, Error, Result};

/// Maps raw member names found in class files to their SRG names.
pub trait MemberRemapper: Send + Sync {
    /// SRG name of method `name` with `descriptor` declared by `owner`.
    fn map_method_name<'a>(&'a self, owner: &str, name: &'a str, descriptor: &str) -> &'a str;

    /// SRG name of field `name` with `descriptor` declared by `owner`.
    fn map_field_name<'a>(&'a self, owner: &str, name: &'a str, descriptor: &str) -> &'a str;
}

/// Remapper for classes whose member names are already in their final form.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRemapper;

impl MemberRemapper for IdentityRemapper {
    fn map_method_name<'a>(&'a self, _owner: &str, name: &'a str, _descriptor: &str) -> &'a str {
        name
    }

    fn map_field_name<'a>(&'a self, _owner: &str, name: &'a str, _descriptor: &str) -> &'a str {
        name
    }
}

/// Remapper backed by an SRG mapping file.
///
/// Understands the four SRG record kinds:
///
/// ```text
/// PK: ./ net/minecraft/src
/// CL: sq net/minecraft/item/ItemInWorldManager
/// FD: sq/a net/minecraft/item/ItemInWorldManager/field_73092_a
/// MD: sq/d (III)Z net/minecraft/item/ItemInWorldManager/func_73084_b (III)Z
/// ```
///
/// Lookups are keyed by the obfuscated owner, name and (for methods) descriptor. Members that
/// are not listed map to themselves.
#[derive(Debug, Clone, Default)]
pub struct SrgRemapper {
    classes: HashMap<String, String>,
    fields: HashMap<String, HashMap<String, String>>,
    methods: HashMap<String, HashMap<String, HashMap<String, String>>>,
}

impl SrgRemapper {
    /// Parse SRG mapping text.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMapping`] for unknown record kinds, wrong field counts and
    /// member paths without an owner.
    pub fn parse(text: &str) -> Result<SrgRemapper> {
        let mut remapper = SrgRemapper::default();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let invalid = |message: &str| Error::InvalidMapping {
                line: number + 1,
                message: message.to_string(),
            };

            let mut parts = line.split_whitespace();
            let kind = parts.next().ok_or_else(|| invalid("empty record"))?;
            let values: Vec<&str> = parts.collect();

            match (kind, values.as_slice()) {
                ("PK:", [_, _]) => {}
                ("CL:", [obfuscated, named]) => {
                    remapper
                        .classes
                        .insert((*obfuscated).to_string(), (*named).to_string());
                }
                ("FD:", [obfuscated, named]) => {
                    let (owner, name) = split_member(obfuscated)
                        .ok_or_else(|| invalid("field path has no owner"))?;
                    let (_, srg) =
                        split_member(named).ok_or_else(|| invalid("field path has no owner"))?;
                    remapper
                        .fields
                        .entry(owner.to_string())
                        .or_default()
                        .insert(name.to_string(), srg.to_string());
                }
                ("MD:", [obfuscated, descriptor, named, _]) => {
                    let (owner, name) = split_member(obfuscated)
                        .ok_or_else(|| invalid("method path has no owner"))?;
                    let (_, srg) =
                        split_member(named).ok_or_else(|| invalid("method path has no owner"))?;
                    remapper
                        .methods
                        .entry(owner.to_string())
                        .or_default()
                        .entry(name.to_string())
                        .or_default()
                        .insert((*descriptor).to_string(), srg.to_string());
                }
                ("PK:" | "CL:" | "FD:" | "MD:", _) => {
                    return Err(invalid(&format!(
                        "wrong number of values for {kind} ({})",
                        values.len()
                    )));
                }
                _ => return Err(invalid(&format!("unknown record kind {kind}"))),
            }
        }

        Ok(remapper)
    }

    /// Load and parse an SRG mapping file.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be read, [`Error::Malformed`] if it is
    /// not UTF-8, and otherwise the same errors as [`SrgRemapper::parse`].
    pub fn from_path(path: &Path) -> Result<SrgRemapper> {
        let file = File::from_file(path)?;
        let text = std::str::from_utf8(file.data())
            .map_err(|error| malformed_error!("Mapping file is not UTF-8 - {}", error))?;
        Self::parse(text)
    }

    /// Named form of an obfuscated class, if listed.
    #[must_use]
    pub fn map_class_name(&self, obfuscated: &str) -> Option<&str> {
        self.classes.get(obfuscated).map(String::as_str)
    }

    /// Number of mapped classes, fields and methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
            + self.fields.values().map(HashMap::len).sum::<usize>()
            + self
                .methods
                .values()
                .flat_map(HashMap::values)
                .map(HashMap::len)
                .sum::<usize>()
    }

    /// Whether no mapping was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MemberRemapper for SrgRemapper {
    fn map_method_name<'a>(&'a self, owner: &str, name: &'a str, descriptor: &str) -> &'a str {
        self.methods
            .get(owner)
            .and_then(|names| names.get(name))
            .and_then(|descriptors| descriptors.get(descriptor))
            .map_or(name, String::as_str)
    }

    fn map_field_name<'a>(&'a self, owner: &str, name: &'a str, _descriptor: &str) -> &'a str {
        self.fields
            .get(owner)
            .and_then(|names| names.get(name))
            .map_or(name, String::as_str)
    }
}

fn split_member(path: &str) -> Option<(&str, &str)> {
    path.rsplit_once('/')
        .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPINGS: &str = "\
# ItemInWorldManager
PK: ./ net/minecraft/src
CL: sq net/minecraft/item/ItemInWorldManager
FD: sq/a net/minecraft/item/ItemInWorldManager/field_73092_a
FD: sq/b net/minecraft/item/ItemInWorldManager/field_73090_b
MD: sq/d (III)Z net/minecraft/item/ItemInWorldManager/func_73084_b (III)Z
MD: sq/d (IIII)Z net/minecraft/item/ItemInWorldManager/func_73082_a (IIII)Z
";

    #[test]
    fn identity_passes_through() {
        assert_eq!(IdentityRemapper.map_method_name("sq", "d", "(III)Z"), "d");
        assert_eq!(IdentityRemapper.map_field_name("sq", "a", "Lxe;"), "a");
    }

    #[test]
    fn parses_records() {
        let remapper = SrgRemapper::parse(MAPPINGS).unwrap();
        assert_eq!(remapper.len(), 5);
        assert_eq!(
            remapper.map_class_name("sq"),
            Some("net/minecraft/item/ItemInWorldManager")
        );
        assert_eq!(remapper.map_field_name("sq", "a", "Lyc;"), "field_73092_a");
        assert_eq!(remapper.map_field_name("sq", "b", "Ljc;"), "field_73090_b");
    }

    #[test]
    fn methods_are_keyed_by_descriptor() {
        let remapper = SrgRemapper::parse(MAPPINGS).unwrap();
        assert_eq!(remapper.map_method_name("sq", "d", "(III)Z"), "func_73084_b");
        assert_eq!(remapper.map_method_name("sq", "d", "(IIII)Z"), "func_73082_a");
        assert_eq!(remapper.map_method_name("sq", "d", "()V"), "d");
        assert_eq!(remapper.map_method_name("other", "d", "(III)Z"), "d");
    }

    #[test]
    fn rejects_bad_lines() {
        for (text, line) in [
            ("XX: a b", 1),
            ("CL: a", 1),
            ("\n\nFD: noowner net/Foo/field_1", 3),
            ("MD: a/b (I)V c/d", 1),
        ] {
            match SrgRemapper::parse(text) {
                Err(Error::InvalidMapping { line: reported, .. }) => assert_eq!(reported, line),
                other => panic!("{text:?} parsed as {other:?}"),
            }
        }
    }

    #[test]
    fn empty_text() {
        let remapper = SrgRemapper::parse("\n# nothing\n").unwrap();
        assert!(remapper.is_empty());
    }
}
