//! End to end patching of assembled `ItemInWorldManager` classes.

mod common;

use common::{
    Shape, CANONICAL, OBFUSCATED, PLAYER_TYPE, SQ_MAPPINGS, SRG, TARGET_BINARY_NAME,
    TARGET_CLASS, WORLD_TYPE,
};
use veinpatch::{
    assembly::{Dispatch, Instruction, MemberRef, StackAnalysis},
    classfile::{Code, ValueKind},
    mapping::{NameResolver, SrgRemapper, BUILTIN_MAPPINGS},
    patch_class, ClassFile, ClassTransformer, Error, VeinMinerTransformer,
};

fn target_code<'a>(class: &'a ClassFile, name: &str) -> &'a Code {
    let position = class.method_position(name, Some("(III)V")).unwrap();
    class.methods[position].code().unwrap()
}

fn field(instruction: Option<&Instruction>) -> &MemberRef {
    match instruction {
        Some(Instruction::LoadField { field, .. }) => field,
        other => panic!("expected a field load, found {other:?}"),
    }
}

/// Depth on entry to every return of `name`.
///
/// The crate's own test helpers are `cfg(test)` inside the library and not visible here.
fn return_depths(class: &ClassFile, name: &str) -> Vec<Option<u16>> {
    let code = target_code(class, name);
    let analysis = StackAnalysis::run(code, &class.pool, name).unwrap();
    code.instructions
        .iter()
        .zip(analysis.depths)
        .filter(|(instruction, _)| matches!(instruction, Instruction::Return { .. }))
        .map(|(_, depth)| depth)
        .collect()
}

#[test]
fn injects_block_mined_after_the_harvest_call() {
    let patched = patch_class(&Shape::default().build(), false).unwrap();
    let class = ClassFile::from_mem(&patched).unwrap();
    let code = target_code(&class, CANONICAL.target);
    let int = |index| Instruction::LoadLocal {
        index,
        kind: ValueKind::Int,
    };
    let this = Instruction::LoadLocal {
        index: 0,
        kind: ValueKind::Reference,
    };

    assert_eq!(code.instructions.len(), 17);
    assert!(matches!(
        code.instructions.get(4),
        Some(Instruction::InvokeMethod { method, .. }) if method.name == CANONICAL.anchor
    ));
    assert_eq!(
        code.instructions.get(5),
        Some(&Instruction::StoreLocal {
            index: 4,
            kind: ValueKind::Int
        })
    );

    match code.instructions.get(6) {
        Some(Instruction::LoadField { field, is_static }) => {
            assert!(*is_static);
            assert_eq!(field.owner, "portablejim/veinminer/VeinMiner");
            assert_eq!(field.name, "instance");
            assert_eq!(field.descriptor, "Lportablejim/veinminer/VeinMiner;");
        }
        other => panic!("expected the handler instance, found {other:?}"),
    }
    assert_eq!(code.instructions.get(7), Some(&this));
    let world = field(code.instructions.get(8));
    assert_eq!(
        (world.owner.as_str(), world.name.as_str(), world.descriptor.as_str()),
        (TARGET_CLASS, CANONICAL.world, WORLD_TYPE)
    );
    assert_eq!(code.instructions.get(9), Some(&this));
    let player = field(code.instructions.get(10));
    assert_eq!(
        (player.owner.as_str(), player.name.as_str(), player.descriptor.as_str()),
        (TARGET_CLASS, CANONICAL.player, PLAYER_TYPE)
    );
    assert_eq!(code.instructions.get(11), Some(&int(1)));
    assert_eq!(code.instructions.get(12), Some(&int(2)));
    assert_eq!(code.instructions.get(13), Some(&int(3)));
    assert_eq!(code.instructions.get(14), Some(&int(4)));

    match code.instructions.get(15) {
        Some(Instruction::InvokeMethod { method, dispatch }) => {
            assert_eq!(*dispatch, Dispatch::Virtual);
            assert_eq!(method.owner, "portablejim/veinminer/VeinMiner");
            assert_eq!(method.name, "blockMined");
            assert_eq!(
                method.descriptor,
                format!("({WORLD_TYPE}{PLAYER_TYPE}IIIZ)V")
            );
        }
        other => panic!("expected blockMined, found {other:?}"),
    }
    assert_eq!(
        code.instructions.get(16),
        Some(&Instruction::Return { kind: None })
    );
    assert!(!code.instructions.iter().any(|i| *i == Instruction::Pop));

    assert!(code.max_stack >= 7);
    assert_eq!(code.max_locals, 5);
}

#[test]
fn obfuscated_classes_use_srg_names() {
    let patched = patch_class(&Shape::named(SRG).build(), true).unwrap();
    let class = ClassFile::from_mem(&patched).unwrap();
    let code = target_code(&class, SRG.target);

    assert_eq!(field(code.instructions.get(8)).name, SRG.world);
    assert_eq!(field(code.instructions.get(10)).name, SRG.player);
    assert_eq!(code.instructions.len(), 17);
}

#[test]
fn transformer_detects_obfuscation_from_names() {
    let transformer = VeinMinerTransformer::new();
    let bytes = Shape::named(SRG).build();

    let patched = transformer
        .transform("sq", TARGET_BINARY_NAME, bytes.clone())
        .unwrap();
    assert_ne!(patched, bytes);

    assert!(matches!(
        transformer.transform(TARGET_BINARY_NAME, TARGET_BINARY_NAME, bytes),
        Err(Error::MethodNotFound { .. })
    ));
}

#[test]
fn other_classes_pass_through() {
    let transformer = VeinMinerTransformer::new();
    let bytes = vec![0xDE, 0xAD];
    assert_eq!(
        transformer
            .transform("a", "net.minecraft.block.Block", bytes.clone())
            .unwrap(),
        bytes
    );
}

#[test]
fn raw_names_are_mapped_through_srg_records() {
    let transformer =
        VeinMinerTransformer::new().with_remapper(SrgRemapper::parse(SQ_MAPPINGS).unwrap());
    let shape = Shape {
        class: "sq",
        ..Shape::named(OBFUSCATED)
    };

    let patched = transformer
        .transform("sq", TARGET_BINARY_NAME, shape.build())
        .unwrap();
    let class = ClassFile::from_mem(&patched).unwrap();
    let code = target_code(&class, OBFUSCATED.target);

    let world = field(code.instructions.get(8));
    assert_eq!((world.owner.as_str(), world.name.as_str()), ("sq", "a"));
    let player = field(code.instructions.get(10));
    assert_eq!((player.owner.as_str(), player.name.as_str()), ("sq", "b"));
}

#[test]
fn missing_anchor_fails_every_time_without_changes() {
    let shape = Shape {
        called: Some("destroyBlock"),
        ..Shape::default()
    };
    let bytes = shape.build();
    let mut class = ClassFile::from_mem(&bytes).unwrap();
    let before = class.clone();
    let transformer = VeinMinerTransformer::new();

    for _ in 0..2 {
        match transformer.patch(&mut class, false) {
            Err(Error::AnchorNotFound { method, callee }) => {
                assert_eq!(method, CANONICAL.target);
                assert_eq!(callee, CANONICAL.anchor);
            }
            other => panic!("expected AnchorNotFound, found {other:?}"),
        }
        assert_eq!(class, before);
    }
    assert_eq!(class.to_bytes().unwrap(), bytes);
}

#[test]
fn each_naming_mode_patches_a_fresh_copy() {
    let original = ClassFile::from_mem(&Shape::default().build()).unwrap();
    let transformer = VeinMinerTransformer::new();

    let mut canonical = original.clone();
    assert!(transformer.patch(&mut canonical, false).is_ok());
    assert_ne!(canonical, original);

    let mut srg = original.clone();
    assert!(matches!(
        transformer.patch(&mut srg, true),
        Err(Error::MethodNotFound { .. })
    ));
    assert_eq!(srg, original);

    // A second patch of an already patched class finds no pop after the anchor
    let patched = canonical.clone();
    assert!(matches!(
        transformer.patch(&mut canonical, false),
        Err(Error::Consistency { .. })
    ));
    assert_eq!(canonical, patched);
}

#[test]
fn captured_result_gets_a_fresh_slot() {
    let shape = Shape {
        max_locals: 6,
        ..Shape::default()
    };
    let mut class = ClassFile::from_mem(&shape.build()).unwrap();
    let report = VeinMinerTransformer::new()
        .patch(&mut class, false)
        .unwrap();

    assert_eq!(report.slot, 6);
    assert_eq!(report.max_locals, 7);
    let code = target_code(&class, CANONICAL.target);
    assert_eq!(
        code.instructions.get(5),
        Some(&Instruction::StoreLocal {
            index: 6,
            kind: ValueKind::Int
        })
    );
}

#[test]
fn stack_depth_at_returns_is_unchanged() {
    for guarded in [false, true] {
        let shape = Shape {
            guarded,
            ..Shape::default()
        };
        let before = ClassFile::from_mem(&shape.build()).unwrap();
        let after = ClassFile::from_mem(&patch_class(&shape.build(), false).unwrap()).unwrap();

        assert_eq!(
            return_depths(&before, CANONICAL.target),
            return_depths(&after, CANONICAL.target)
        );
    }
}

#[test]
fn guard_branch_still_reaches_the_return() {
    let shape = Shape {
        guarded: true,
        ..Shape::default()
    };
    let class = ClassFile::from_mem(&patch_class(&shape.build(), false).unwrap()).unwrap();
    let code = target_code(&class, CANONICAL.target);

    let last = code.instructions.len() - 1;
    assert_eq!(
        code.instructions.get(2),
        Some(&Instruction::Jump {
            opcode: 0xC6,
            target: last
        })
    );
    assert_eq!(
        code.instructions.get(last),
        Some(&Instruction::Return { kind: None })
    );
}

#[test]
fn resolver_translates_only_known_names() {
    let canonical = NameResolver::canonical();
    let obfuscated = NameResolver::obfuscated();

    for (name, srg) in BUILTIN_MAPPINGS {
        assert_eq!(canonical.resolve(name), name);
        assert_eq!(obfuscated.resolve(name), srg);
        assert_eq!(obfuscated.canonical_name(srg), name);
    }
    for unknown in ["blockMined", "func_00000_x", ""] {
        assert_eq!(canonical.resolve(unknown), unknown);
        assert_eq!(obfuscated.resolve(unknown), unknown);
    }
}
