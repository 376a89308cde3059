//! Canonical to runtime name resolution.

use std::collections::HashMap;

use crate::mapping::srg::srg_names;

/// Translates the canonical names the transformation is written against into the names
/// present in the class being patched.
///
/// The mode is fixed at construction. In canonical mode every name resolves to itself; in
/// obfuscated mode names found in the SRG table resolve to their SRG form and everything else
/// passes through unchanged.
///
/// # Examples
///
/// ```rust
/// use veinpatch::mapping::NameResolver;
///
/// assert_eq!(NameResolver::canonical().resolve("theWorld"), "theWorld");
/// assert_eq!(NameResolver::obfuscated().resolve("theWorld"), "field_73092_a");
/// assert_eq!(NameResolver::obfuscated().resolve("blockMined"), "blockMined");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NameResolver {
    obfuscated: bool,
    table: &'static HashMap<&'static str, &'static str>,
}

impl NameResolver {
    /// Create a resolver for a class in obfuscated (`true`) or canonical (`false`) form.
    #[must_use]
    pub fn new(obfuscated: bool) -> Self {
        NameResolver {
            obfuscated,
            table: srg_names(),
        }
    }

    /// A resolver that maps every name to itself.
    #[must_use]
    pub fn canonical() -> Self {
        Self::new(false)
    }

    /// A resolver that applies the SRG table.
    #[must_use]
    pub fn obfuscated() -> Self {
        Self::new(true)
    }

    /// Whether the SRG table is applied.
    #[must_use]
    pub fn is_obfuscated(&self) -> bool {
        self.obfuscated
    }

    /// The runtime name for `canonical`.
    #[must_use]
    pub fn resolve<'a>(&self, canonical: &'a str) -> &'a str {
        if !self.obfuscated {
            return canonical;
        }
        self.table.get(canonical).copied().unwrap_or(canonical)
    }

    /// The canonical name for a runtime name, the reverse of [`NameResolver::resolve`].
    #[must_use]
    pub fn canonical_name<'a>(&self, actual: &'a str) -> &'a str {
        if !self.obfuscated {
            return actual;
        }
        self.table
            .iter()
            .find_map(|(canonical, srg)| (*srg == actual).then_some(*canonical))
            .unwrap_or(actual)
    }
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::canonical()
    }
}
