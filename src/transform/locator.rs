//! Finding the method to patch and the call inside it.

use log::debug;

use crate::{
    assembly::Instruction,
    classfile::{ClassFile, Method},
    mapping::{MemberRemapper, NameResolver},
    Error, Result,
};

/// Position of the method named `canonical` in `class.methods`.
///
/// Each method's raw name is mapped through `remapper` with the class as owner and compared
/// against the resolved name. The first match wins.
///
/// # Errors
/// Returns [`Error::MethodNotFound`] if no method matches, and [`Error::Malformed`] if the class
/// name cannot be read.
pub fn find_method(
    class: &ClassFile,
    resolver: &NameResolver,
    remapper: &dyn MemberRemapper,
    canonical: &str,
) -> Result<usize> {
    let owner = class.name()?;
    let expected = resolver.resolve(canonical);

    let position = class
        .methods
        .iter()
        .position(|method| {
            remapper.map_method_name(&owner, &method.name, &method.descriptor) == expected
        })
        .ok_or_else(|| Error::MethodNotFound {
            class: owner.to_string(),
            method: expected.to_string(),
        })?;

    debug!(
        "Located {}.{}{} as method #{}",
        owner, class.methods[position].name, class.methods[position].descriptor, position
    );
    Ok(position)
}

/// Index of the first call to `canonical_callee` in `method`.
///
/// Every [`Instruction::InvokeMethod`] is mapped with its own owner and descriptor, since the
/// callee may be declared by a different class than the one being patched. The scan stops at
/// the end of the instruction list.
///
/// # Errors
/// Returns [`Error::AnchorNotFound`] if the method has no body or never makes the call.
pub fn find_anchor_instruction(
    method: &Method,
    resolver: &NameResolver,
    remapper: &dyn MemberRemapper,
    canonical_callee: &str,
) -> Result<usize> {
    let expected = resolver.resolve(canonical_callee);
    let not_found = || Error::AnchorNotFound {
        method: method.name.clone(),
        callee: expected.to_string(),
    };

    let code = method.code().ok_or_else(not_found)?;
    let index = code
        .instructions
        .iter()
        .position(|instruction| match instruction {
            Instruction::InvokeMethod { method: callee, .. } => {
                remapper.map_method_name(&callee.owner, &callee.name, &callee.descriptor)
                    == expected
            }
            _ => false,
        })
        .ok_or_else(not_found)?;

    debug!("Anchor call to {} at instruction {}", expected, index);
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mapping::{IdentityRemapper, SrgRemapper},
        test::factories::{item_in_world_manager, ClassBuilder},
    };

    #[test]
    fn finds_canonical_method() {
        let class = ClassFile::from_mem(&item_in_world_manager().build()).unwrap();
        let resolver = NameResolver::canonical();

        let position =
            find_method(&class, &resolver, &IdentityRemapper, "uncheckedTryHarvestBlock").unwrap();
        assert_eq!(class.methods[position].name, "uncheckedTryHarvestBlock");

        let anchor = find_anchor_instruction(
            &class.methods[position],
            &resolver,
            &IdentityRemapper,
            "tryHarvestBlock",
        )
        .unwrap();
        assert_eq!(anchor, 4);
    }

    #[test]
    fn finds_srg_method() {
        let class = ClassFile::from_mem(&item_in_world_manager().srg_names().build()).unwrap();
        let resolver = NameResolver::obfuscated();

        let position =
            find_method(&class, &resolver, &IdentityRemapper, "uncheckedTryHarvestBlock").unwrap();
        assert_eq!(class.methods[position].name, "func_73082_a");
        assert!(find_anchor_instruction(
            &class.methods[position],
            &resolver,
            &IdentityRemapper,
            "tryHarvestBlock"
        )
        .is_ok());
    }

    #[test]
    fn remaps_raw_names_per_owner() {
        let class =
            ClassFile::from_mem(&item_in_world_manager().obfuscated_names().build()).unwrap();
        let owner = "net/minecraft/item/ItemInWorldManager";
        let records = [
            format!("MD: {owner}/d (III)V {owner}/func_73082_a (III)V"),
            format!("MD: {owner}/c (III)Z {owner}/func_73084_b (III)Z"),
        ];
        let remapper = SrgRemapper::parse(&records.join("\n")).unwrap();
        let resolver = NameResolver::obfuscated();

        let position =
            find_method(&class, &resolver, &remapper, "uncheckedTryHarvestBlock").unwrap();
        assert_eq!(class.methods[position].name, "d");
        let anchor = find_anchor_instruction(
            &class.methods[position],
            &resolver,
            &remapper,
            "tryHarvestBlock",
        )
        .unwrap();
        assert_eq!(anchor, 4);

        // Without the mapping the raw names never match.
        assert!(matches!(
            find_method(&class, &resolver, &IdentityRemapper, "uncheckedTryHarvestBlock"),
            Err(Error::MethodNotFound { .. })
        ));
    }

    #[test]
    fn missing_method() {
        let class = ClassFile::from_mem(&item_in_world_manager().build()).unwrap();
        match find_method(
            &class,
            &NameResolver::obfuscated(),
            &IdentityRemapper,
            "uncheckedTryHarvestBlock",
        ) {
            Err(Error::MethodNotFound { class, method }) => {
                assert_eq!(class, "net/minecraft/item/ItemInWorldManager");
                assert_eq!(method, "func_73082_a");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_anchor() {
        let class =
            ClassFile::from_mem(&item_in_world_manager().without_anchor().build()).unwrap();
        let resolver = NameResolver::canonical();
        let position =
            find_method(&class, &resolver, &IdentityRemapper, "uncheckedTryHarvestBlock").unwrap();
        let method = &class.methods[position];
        match find_anchor_instruction(method, &resolver, &IdentityRemapper, "tryHarvestBlock") {
            Err(Error::AnchorNotFound { callee, .. }) => assert_eq!(callee, "tryHarvestBlock"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn abstract_method_has_no_anchor() {
        let bytes = ClassBuilder::new("a/Abstract")
            .abstract_method("run", "()V")
            .build();
        let class = ClassFile::from_mem(&bytes).unwrap();
        let resolver = NameResolver::canonical();
        assert!(matches!(
            find_anchor_instruction(&class.methods[0], &resolver, &IdentityRemapper, "x"),
            Err(Error::AnchorNotFound { .. })
        ));
    }
}
