#![no_main]

use std::path::Path;

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use sbomrelay_classifier::{Processor, output_path};

/// 퍼저용 구조적 레코드 입력
#[derive(Arbitrary, Debug)]
struct FuzzRecord {
    repo_name: String,
    path: String,
    data: Vec<u8>,
}

fuzz_target!(|input: FuzzRecord| {
    let root = Path::new("/fuzz-out");
    // 허용된 이름은 항상 출력 디렉토리 안에 머물러야 한다
    if let Ok(target) = output_path(root, &input.repo_name) {
        assert!(target.starts_with(root), "escaped: {}", target.display());
    }

    let processor = Processor::default();
    if let Ok(doc) = processor.process(&Bytes::from(input.data), &input.repo_name, &input.path) {
        assert!(doc.format.is_known());
        assert!(!doc.filename.is_empty());
    }
});
