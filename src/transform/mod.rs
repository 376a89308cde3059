//! The `ItemInWorldManager` transformation.
//!
//! [`VeinMinerTransformer`] wires the VeinMiner handler into
//! `ItemInWorldManager.uncheckedTryHarvestBlock`, right after its call to `tryHarvestBlock`:
//!
//! 1. [`locator::find_method`] and [`locator::find_anchor_instruction`] find the method and the
//!    call, resolving canonical names for obfuscated classes
//! 2. [`splicer::splice`] captures the call's result in a fresh local, emits the handler call
//!    and removes the `pop` that used to discard the result
//! 3. [`reencode::reencode`] recomputes `max_stack` and `max_locals`
//!
//! Steps 2 and 3 run on copies of the method body and of the constant pool. The copies replace
//! the originals only when every step succeeded, so a failed patch leaves the [`ClassFile`]
//! exactly as it was.
//!
//! # Examples
//!
//! ```rust,no_run
//! use veinpatch::prelude::*;
//!
//! let bytes = std::fs::read("ItemInWorldManager.class")?;
//! let transformer = VeinMinerTransformer::new();
//!
//! // A class-loading hook hands over the raw and the deobfuscated class name.
//! let patched = transformer.transform("sq", "net.minecraft.item.ItemInWorldManager", bytes)?;
//! std::fs::write("ItemInWorldManager.patched.class", patched)?;
//! # Ok::<(), veinpatch::Error>(())
//! ```

mod config;
pub mod locator;
pub mod reencode;
pub mod splicer;

pub use config::TransformerConfig;

use log::{debug, info, warn};

use crate::{
    classfile::ClassFile,
    mapping::{IdentityRemapper, MemberRemapper, NameResolver},
    transform::splicer::{FieldTypeMap, Injection},
    Result,
};

/// A transformation applied to classes while they are loaded.
pub trait ClassTransformer: Send + Sync {
    /// Transform the class `bytes`.
    ///
    /// `name` is the name the class is stored under, `transformed_name` its deobfuscated
    /// binary name. Classes the transformer is not interested in are returned unchanged.
    ///
    /// # Errors
    /// Returns the error that aborted the transformation. The caller decides whether to load
    /// the class unpatched.
    fn transform(&self, name: &str, transformed_name: &str, bytes: Vec<u8>) -> Result<Vec<u8>>;
}

/// Summary of a successful patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    /// Internal name of the patched class
    pub class: String,
    /// Raw name of the patched method
    pub method: String,
    /// Descriptor of the patched method
    pub descriptor: String,
    /// Index of the anchor call
    pub anchor: usize,
    /// Local slot holding the captured result
    pub slot: u16,
    /// Number of inserted instructions
    pub inserted: usize,
    /// Index of the removed `pop`, before removal
    pub removed: usize,
    /// `max_stack` after patching
    pub max_stack: u16,
    /// `max_locals` after patching
    pub max_locals: u16,
}

/// Injects the VeinMiner `blockMined` call into `ItemInWorldManager`.
pub struct VeinMinerTransformer {
    config: TransformerConfig,
    remapper: Box<dyn MemberRemapper>,
}

impl VeinMinerTransformer {
    /// A transformer with the default configuration and no member remapping.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransformerConfig::default())
    }

    /// A transformer with a custom configuration.
    #[must_use]
    pub fn with_config(config: TransformerConfig) -> Self {
        VeinMinerTransformer {
            config,
            remapper: Box::new(IdentityRemapper),
        }
    }

    /// Replace the member remapper, for example with an [`crate::mapping::SrgRemapper`].
    #[must_use]
    pub fn with_remapper(mut self, remapper: impl MemberRemapper + 'static) -> Self {
        self.remapper = Box::new(remapper);
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Patch `class` in place.
    ///
    /// `obfuscated` selects whether canonical names are translated to SRG names.
    ///
    /// # Errors
    /// Returns [`crate::Error::MethodNotFound`], [`crate::Error::AnchorNotFound`],
    /// [`crate::Error::UnresolvedFieldType`], [`crate::Error::Consistency`] or
    /// [`crate::Error::StackUnderflow`] when the class does not have the expected shape. On
    /// error `class` is unchanged.
    pub fn patch(&self, class: &mut ClassFile, obfuscated: bool) -> Result<PatchReport> {
        let config = &self.config;
        let resolver = NameResolver::new(obfuscated);
        let remapper = self.remapper.as_ref();
        let owner = class.name()?.into_owned();
        debug!(
            "Patching {} ({} names)",
            owner,
            if obfuscated { "obfuscated" } else { "canonical" }
        );

        let fields = FieldTypeMap::scan(
            class,
            remapper,
            &[
                resolver.resolve(&config.world_field),
                resolver.resolve(&config.player_field),
            ],
        )?;

        let position = locator::find_method(class, &resolver, remapper, &config.target_method)?;
        let method = &class.methods[position];
        let anchor =
            locator::find_anchor_instruction(method, &resolver, remapper, &config.anchor_callee)?;

        let Some(original) = method.code() else {
            return Err(consistency_error!(method.name, anchor, "method has no code"));
        };
        let mut code = original.clone();
        let mut pool = class.pool.clone();

        let injection = Injection {
            config,
            resolver: &resolver,
            owner: &owner,
            fields: &fields,
        };
        let splice = splicer::splice(&mut code, &mut pool, method, anchor, &injection)?;
        let maxima = reencode::reencode(&mut code, &pool, method)?;

        let report = PatchReport {
            class: owner,
            method: method.name.clone(),
            descriptor: method.descriptor.clone(),
            anchor,
            slot: splice.slot,
            inserted: splice.inserted.len(),
            removed: splice.removed,
            max_stack: maxima.max_stack,
            max_locals: maxima.max_locals,
        };

        if let Some(target) = class.methods[position].code_mut() {
            *target = code;
        }
        class.pool = pool;

        info!(
            "Patched {}.{}{}: handler call after instruction {}, result in local {}",
            report.class, report.method, report.descriptor, report.anchor, report.slot
        );
        Ok(report)
    }
}

impl Default for VeinMinerTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassTransformer for VeinMinerTransformer {
    fn transform(&self, name: &str, transformed_name: &str, bytes: Vec<u8>) -> Result<Vec<u8>> {
        if !self.config.is_target(transformed_name) {
            return Ok(bytes);
        }

        let obfuscated = name != transformed_name;
        let result = ClassFile::from_mem(&bytes).and_then(|mut class| {
            self.patch(&mut class, obfuscated)?;
            class.to_bytes()
        });
        if let Err(error) = &result {
            warn!("Could not patch {} ({}): {}", transformed_name, name, error);
        }
        result
    }
}

/// Parse, patch with the default configuration and re-serialize a class.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if `bytes` is not a class file, and otherwise the same
/// errors as [`VeinMinerTransformer::patch`].
pub fn patch_class(bytes: &[u8], obfuscated: bool) -> Result<Vec<u8>> {
    let mut class = ClassFile::from_mem(bytes)?;
    VeinMinerTransformer::new().patch(&mut class, obfuscated)?;
    class.to_bytes()
}
