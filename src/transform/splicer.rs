//! Splicing the handler call into the target method.
//!
//! Given the anchor call, whose result the original code throws away with a `pop`, the splicer
//! rewrites
//!
//! ```text
//! invokevirtual tryHarvestBlock
//! pop
//! ```
//!
//! into
//!
//! ```text
//! invokevirtual tryHarvestBlock
//! istore <slot>
//! getstatic VeinMiner.instance
//! aload_0
//! getfield theWorld
//! aload_0
//! getfield thisPlayerMP
//! iload_1
//! iload_2
//! iload_3
//! iload <slot>
//! invokevirtual VeinMiner.blockMined
//! ```
//!
//! The `istore` consumes the value the `pop` used to discard, so the `pop` has to go.

use std::{collections::HashMap, ops::Range};

use log::debug;

use crate::{
    assembly::{Dispatch, Instruction, MemberRef},
    classfile::{ClassFile, Code, ConstantPool, FieldType, Method, MethodDescriptor, ValueKind},
    mapping::{MemberRemapper, NameResolver},
    transform::TransformerConfig,
    Error, Result,
};

/// A field of the patched class read by the injected code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedField {
    /// Raw name as declared in the class
    pub name: String,
    /// Field descriptor
    pub descriptor: String,
}

/// Descriptors of the fields the injected code reads, keyed by resolved name.
///
/// Built fresh from the class's field list for every patch run.
#[derive(Debug, Clone, Default)]
pub struct FieldTypeMap {
    fields: HashMap<String, RecordedField>,
}

impl FieldTypeMap {
    /// Record every field of `class` whose remapped name is one of `wanted`.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the class name cannot be read.
    pub fn scan(
        class: &ClassFile,
        remapper: &dyn MemberRemapper,
        wanted: &[&str],
    ) -> Result<FieldTypeMap> {
        let owner = class.name()?;
        let mut fields = HashMap::new();

        for field in &class.fields {
            let mapped = remapper.map_field_name(&owner, &field.name, &field.descriptor);
            if wanted.contains(&mapped) {
                debug!("Field {} ({}) has type {}", mapped, field.name, field.descriptor);
                fields
                    .entry(mapped.to_string())
                    .or_insert_with(|| RecordedField {
                        name: field.name.clone(),
                        descriptor: field.descriptor.clone(),
                    });
            }
        }

        Ok(FieldTypeMap { fields })
    }

    /// The field recorded under `resolved`.
    ///
    /// # Errors
    /// Returns [`Error::UnresolvedFieldType`] if the scan did not see it.
    pub fn get(&self, resolved: &str) -> Result<&RecordedField> {
        self.fields
            .get(resolved)
            .ok_or_else(|| Error::UnresolvedFieldType(resolved.to_string()))
    }

    /// Number of recorded fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Everything the splicer needs to know besides the method itself.
#[derive(Debug, Clone, Copy)]
pub struct Injection<'a> {
    /// Transformation constants
    pub config: &'a TransformerConfig,
    /// Resolver for the class's naming mode
    pub resolver: &'a NameResolver,
    /// Internal name of the patched class
    pub owner: &'a str,
    /// Field descriptors recorded from the class
    pub fields: &'a FieldTypeMap,
}

/// What a successful splice did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    /// Local variable slot holding the captured result
    pub slot: u16,
    /// Kind of the captured result
    pub kind: ValueKind,
    /// Indices of the inserted instructions, after the removal
    pub inserted: Range<usize>,
    /// Index the removed `pop` occupied before it was removed
    pub removed: usize,
}

/// Splice the handler call after the call at `anchor`.
///
/// `code` and `pool` are modified in place; callers wanting all-or-nothing semantics pass
/// scratch copies and keep them only on success.
///
/// # Errors
/// - [`Error::Consistency`] if the anchor is not a call returning an `int`-like value, if the
///   method is static or does not take three leading `int` parameters, if no local slot is
///   left, or if the instruction after the injected call (ignoring `nop`s) is not an
///   unreferenced `pop`
/// - [`Error::UnresolvedFieldType`] if a context field was not recorded
/// - [`Error::ConstantPoolFull`] if the new references do not fit
pub fn splice(
    code: &mut Code,
    pool: &mut ConstantPool,
    method: &Method,
    anchor: usize,
    injection: &Injection,
) -> Result<Splice> {
    let name = method.name.as_str();

    let callee = match code.instructions.get(anchor) {
        Some(Instruction::InvokeMethod { method: callee, .. }) => callee,
        Some(other) => {
            return Err(consistency_error!(name, anchor, "anchor is {}, not a call", other))
        }
        None => return Err(consistency_error!(name, anchor, "anchor is out of range")),
    };
    let kind = match MethodDescriptor::parse(&callee.descriptor)?.return_kind() {
        Some(ValueKind::Int) => ValueKind::Int,
        other => {
            return Err(consistency_error!(
                name,
                anchor,
                "{} returns {}, expected a boolean",
                callee,
                other.map_or_else(|| "void".to_string(), |kind| kind.to_string())
            ))
        }
    };

    if method.is_static() {
        return Err(consistency_error!(name, anchor, "method has no receiver"));
    }
    let descriptor = MethodDescriptor::parse(&method.descriptor)?;
    if descriptor.params.len() < 3
        || !descriptor.params[..3]
            .iter()
            .all(|param| param.kind() == ValueKind::Int)
    {
        return Err(consistency_error!(
            name,
            anchor,
            "{} does not start with three int coordinates",
            method.descriptor
        ));
    }

    let slot = code.local_watermark(method.parameter_slots()?);
    if slot.checked_add(kind.width()).is_none() {
        return Err(consistency_error!(name, anchor, "no free local variable slot"));
    }
    debug!("Captured result of {} goes to local {}", callee, slot);

    let sequence = injected_sequence(pool, slot, kind, injection)?;
    let count = sequence.len();
    let start = anchor + 1;
    code.insert(start, sequence);

    let mut index = start + count;
    loop {
        match code.instructions.get(index) {
            Some(instruction) if instruction.is_nop() => index += 1,
            Some(Instruction::Pop) => break,
            Some(other) => {
                return Err(consistency_error!(
                    name,
                    index,
                    "expected pop after the injected call, found {}",
                    other
                ))
            }
            None => {
                return Err(consistency_error!(
                    name,
                    index,
                    "method ends before the pop after the injected call"
                ))
            }
        }
    }
    code.remove(index, name)?;
    debug!("Removed pop at instruction {}", index);

    Ok(Splice {
        slot,
        kind,
        inserted: start..start + count,
        removed: index,
    })
}

fn injected_sequence(
    pool: &mut ConstantPool,
    slot: u16,
    kind: ValueKind,
    injection: &Injection,
) -> Result<Vec<Instruction>> {
    let config = injection.config;
    let world = injection
        .fields
        .get(injection.resolver.resolve(&config.world_field))?;
    let player = injection
        .fields
        .get(injection.resolver.resolve(&config.player_field))?;

    let handler_type = config.handler_type();
    let handler_descriptor = config.handler_descriptor(&world.descriptor, &player.descriptor);
    // Both context fields have to be references for the handler descriptor to be valid.
    for field in [world, player] {
        if FieldType::parse(&field.descriptor)?.kind() != ValueKind::Reference {
            return Err(Error::InvalidDescriptor(field.descriptor.clone()));
        }
    }

    let instance = field_ref(pool, &config.handler_class, &config.handler_field, &handler_type)?;
    let world_ref = field_ref(pool, injection.owner, &world.name, &world.descriptor)?;
    let player_ref = field_ref(pool, injection.owner, &player.name, &player.descriptor)?;
    let handler = MemberRef {
        index: pool.method_ref(&config.handler_class, &config.handler_method, &handler_descriptor)?,
        owner: config.handler_class.clone(),
        name: config.handler_method.clone(),
        descriptor: handler_descriptor,
    };

    let receiver = Instruction::LoadLocal {
        index: 0,
        kind: ValueKind::Reference,
    };
    let coordinate = |index| Instruction::LoadLocal {
        index,
        kind: ValueKind::Int,
    };

    Ok(vec![
        Instruction::StoreLocal { index: slot, kind },
        Instruction::LoadField {
            field: instance,
            is_static: true,
        },
        receiver.clone(),
        Instruction::LoadField {
            field: world_ref,
            is_static: false,
        },
        receiver,
        Instruction::LoadField {
            field: player_ref,
            is_static: false,
        },
        coordinate(1),
        coordinate(2),
        coordinate(3),
        Instruction::LoadLocal { index: slot, kind },
        Instruction::InvokeMethod {
            method: handler,
            dispatch: Dispatch::Virtual,
        },
    ])
}

fn field_ref(
    pool: &mut ConstantPool,
    owner: &str,
    name: &str,
    descriptor: &str,
) -> Result<MemberRef> {
    Ok(MemberRef {
        index: pool.field_ref(owner, name, descriptor)?,
        owner: owner.to_string(),
        name: name.to_string(),
        descriptor: descriptor.to_string(),
    })
}
