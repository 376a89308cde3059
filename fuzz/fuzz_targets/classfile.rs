#![no_main]

use libfuzzer_sys::fuzz_target;
use veinpatch::ClassFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(class) = ClassFile::from_mem(data) {
        if let Ok(bytes) = class.to_bytes() {
            let reparsed = ClassFile::from_mem(&bytes).expect("written class must parse");
            assert_eq!(reparsed, class);
        }
    }
});
