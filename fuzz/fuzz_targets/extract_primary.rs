#![no_main]

use libfuzzer_sys::fuzz_target;
use sbomrelay_classifier::{extract_primary, pretty_print};

fuzz_target!(|data: &[u8]| {
    let _ = extract_primary(data);
    if let Ok(body) = pretty_print(data) {
        assert!(body.ends_with('\n'));
    }
});
