//! Name mapping between canonical (MCP) names and the names present at runtime.
//!
//! Classes are loaded either in canonical form, where members carry their readable names, or
//! in obfuscated form, where they carry SRG names such as `func_73084_b`. The transformation is
//! written against canonical names and translates them on the way in.
//!
//! # Key Components
//!
//! - [`crate::mapping::NameResolver`] - Canonical name to expected runtime name
//! - [`crate::mapping::MemberRemapper`] - Raw member name to SRG name, relative to its owner
//! - [`crate::mapping::SrgRemapper`] - Remapper loaded from SRG mapping text
//! - [`crate::mapping::BUILTIN_MAPPINGS`] - The fixed canonical to SRG table

mod remapper;
mod resolver;
mod srg;

pub use remapper::{IdentityRemapper, MemberRemapper, SrgRemapper};
pub use resolver::NameResolver;
pub use srg::{srg_names, BUILTIN_MAPPINGS};
