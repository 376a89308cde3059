#![no_main]

use libfuzzer_sys::fuzz_target;
use veinpatch::{ClassFile, VeinMinerTransformer};

fuzz_target!(|data: &[u8]| {
    let Ok(original) = ClassFile::from_mem(data) else {
        return;
    };
    let transformer = VeinMinerTransformer::new();
    for obfuscated in [false, true] {
        let mut class = original.clone();
        if transformer.patch(&mut class, obfuscated).is_err() {
            assert_eq!(class, original);
        }
    }
});
