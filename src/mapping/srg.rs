//! The built-in canonical to SRG name table.

use std::{collections::HashMap, sync::OnceLock};

/// Canonical names used by the transformation and their SRG counterparts.
pub const BUILTIN_MAPPINGS: [(&str, &str); 4] = [
    ("uncheckedTryHarvestBlock", "func_73082_a"),
    ("tryHarvestBlock", "func_73084_b"),
    ("theWorld", "field_73092_a"),
    ("thisPlayerMP", "field_73090_b"),
];

static SRG_NAMES: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

/// The process-wide lookup table, built on first use.
pub fn srg_names() -> &'static HashMap<&'static str, &'static str> {
    SRG_NAMES.get_or_init(|| BUILTIN_MAPPINGS.into_iter().collect())
}
