#![no_main]

use libfuzzer_sys::fuzz_target;
use publicizer::{publicize, walker::flatten_all, Module};

fuzz_target!(|data: &[u8]| {
    if let Ok(mut module) = Module::from_mem(data.to_vec()) {
        let types = flatten_all(&module);
        publicize(&mut module, &types);
        if let Ok(rewritten) = module.to_bytes() {
            assert_eq!(rewritten.len(), data.len());
            let _ = Module::from_mem(rewritten);
        }
    }
});
