//! 폴더 감시 통합 테스트

use std::collections::BTreeSet;
use std::time::Duration;

use sbomrelay_adapters::{Adapter, AdapterSettings, FolderAdapter, FolderConfig};
use sbomrelay_core::context::TransferContext;
use sbomrelay_core::types::AdapterRole;

const CDX: &str = r#"{"bomFormat":"CycloneDX","specVersion":"1.6","metadata":{"component":{"name":"watched","version":"1.2.3"}}}"#;

fn watch_adapter(root: &std::path::Path, recursive: bool) -> Adapter {
    Adapter::Folder(FolderAdapter::new(
        AdapterRole::Input,
        FolderConfig::new(root).recursive(recursive).watch(true),
        AdapterSettings::default(),
    ))
}

#[tokio::test]
async fn cancel_before_events_ends_stream() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = TransferContext::new();
    let mut iter = watch_adapter(dir.path(), false).fetch(&ctx).await.unwrap();

    ctx.cancel();
    let next = tokio::time::timeout(Duration::from_secs(5), iter.next(&ctx))
        .await
        .expect("next should return promptly after cancel");
    assert!(next.unwrap().is_none());
    assert!(iter.next(&ctx).await.unwrap().is_none());
    assert_eq!(iter.yielded(), 0);

    tokio::time::timeout(Duration::from_secs(5), iter.close())
        .await
        .expect("producer task should exit");
}

#[tokio::test]
async fn written_sbom_is_emitted() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = TransferContext::new();
    let mut iter = watch_adapter(dir.path(), false).fetch(&ctx).await.unwrap();

    let target = dir.path().join("new.json");
    std::fs::write(dir.path().join("ignored.txt"), "not an sbom").unwrap();
    std::fs::write(&target, CDX).unwrap();

    let record = tokio::time::timeout(Duration::from_secs(10), iter.next(&ctx))
        .await
        .expect("record should arrive after write")
        .unwrap()
        .expect("stream should still be open");
    assert_eq!(record.path, "new.json");
    assert_eq!(record.namespace, "watched");
    assert_eq!(record.version.as_deref(), Some("1.2.3"));

    ctx.cancel();
    tokio::time::timeout(Duration::from_secs(5), iter.close())
        .await
        .expect("producer task should exit");
}

#[tokio::test]
async fn recursive_watch_follows_new_directories() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = TransferContext::new();
    let mut iter = watch_adapter(dir.path(), true).fetch(&ctx).await.unwrap();

    let nested = dir.path().join("nested");
    std::fs::create_dir(&nested).unwrap();
    // 새 디렉토리가 감시 목록에 들어갈 시간을 줌
    tokio::time::sleep(Duration::from_millis(300)).await;
    std::fs::write(nested.join("deep.json"), CDX).unwrap();

    let record = tokio::time::timeout(Duration::from_secs(10), iter.next(&ctx))
        .await
        .expect("record should arrive from nested directory")
        .unwrap()
        .expect("stream should still be open");
    assert_eq!(record.path, "nested/deep.json");

    iter.close().await;
}

#[tokio::test]
async fn stalled_consumer_backpressures_without_losing_records() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = TransferContext::new();
    let settings = AdapterSettings {
        watch_buffer_capacity: 2,
        ..AdapterSettings::default()
    };
    let adapter = Adapter::Folder(FolderAdapter::new(
        AdapterRole::Input,
        FolderConfig::new(dir.path()).watch(true),
        settings,
    ));
    let mut iter = adapter.fetch(&ctx).await.unwrap();

    // 버퍼 용량보다 많이 쓰고, 첫 next 전에 생산자가 가득 찬 버퍼에서 멈추게 둠
    let expected: BTreeSet<String> = (0..8).map(|i| format!("sbom-{i}.json")).collect();
    for name in &expected {
        std::fs::write(dir.path().join(name), CDX).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    // 같은 파일이 여러 번 나올 수 있으므로 경로 집합으로 비교
    let mut seen = BTreeSet::new();
    while seen != expected {
        let record = tokio::time::timeout(Duration::from_secs(10), iter.next(&ctx))
            .await
            .expect("buffered records should keep flowing")
            .unwrap()
            .expect("stream should still be open");
        seen.insert(record.path);
    }

    // 다시 버퍼를 채운 상태에서 취소
    for i in 0..6 {
        std::fs::write(dir.path().join(format!("late-{i}.json")), CDX).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(300)).await;
    ctx.cancel();

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while iter.next(&ctx).await.unwrap().is_some() {}
    })
    .await;
    assert!(drained.is_ok(), "stream should end promptly after cancel");
    tokio::time::timeout(Duration::from_secs(5), iter.close())
        .await
        .expect("blocked producer should exit on cancel");
}
