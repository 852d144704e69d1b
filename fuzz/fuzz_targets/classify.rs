#![no_main]

use libfuzzer_sys::fuzz_target;
use sbomrelay_classifier::{classify, is_sbom};

fuzz_target!(|data: &[u8]| {
    let first = classify(data);
    // 감지는 결정적이어야 한다
    assert_eq!(first, classify(data));
    assert_eq!(first.format.is_known(), is_sbom(data));
});
