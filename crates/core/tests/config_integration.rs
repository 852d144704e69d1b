//! sbomrelay.toml 통합 설정 테스트
//!
//! - sbomrelay.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use std::io::Write;

use sbomrelay_core::config::SbomRelayConfig;
use sbomrelay_core::error::{ConfigError, SbomRelayError};
use sbomrelay_core::types::ProcessingMode;

const EXAMPLE: &str = include_str!("../../../sbomrelay.toml.example");

// =============================================================================
// sbomrelay.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_and_validates() {
    let config = SbomRelayConfig::parse(EXAMPLE).expect("example config should parse");
    config
        .validate()
        .expect("example config should pass validation");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.transfer.mode(), ProcessingMode::Sequential);
}

#[test]
fn example_config_matches_code_defaults() {
    let from_file = SbomRelayConfig::parse(EXAMPLE).expect("should parse");
    let from_code = SbomRelayConfig::default();

    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);
    assert_eq!(
        from_file.transfer.processing_mode,
        from_code.transfer.processing_mode
    );
    assert_eq!(
        from_file.transfer.parallel_workers,
        from_code.transfer.parallel_workers
    );
    assert_eq!(
        from_file.transfer.watch_buffer_capacity,
        from_code.transfer.watch_buffer_capacity
    );
    assert_eq!(from_file.transfer.output_dir, from_code.transfer.output_dir);
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_general_only() {
    let toml = r#"
[general]
log_level = "debug"
log_format = "json"
"#;
    let config = SbomRelayConfig::parse(toml).expect("should parse");
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.transfer.parallel_workers, 4);
}

#[test]
fn partial_config_transfer_only() {
    let toml = r#"
[transfer]
processing_mode = "parallel"
output_dir = "/tmp/sboms"
"#;
    let config = SbomRelayConfig::parse(toml).expect("should parse");
    assert_eq!(config.transfer.mode(), ProcessingMode::Parallel);
    assert_eq!(
        config.transfer.output_dir().as_deref(),
        Some(std::path::Path::new("/tmp/sboms"))
    );
    assert_eq!(config.general.log_level, "info");
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "info"
"#;

    let original = std::env::var("SBOMRELAY_GENERAL_LOG_LEVEL").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SBOMRELAY_GENERAL_LOG_LEVEL", "error");
    }

    let mut config = SbomRelayConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.general.log_level.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SBOMRELAY_GENERAL_LOG_LEVEL", val),
            None => std::env::remove_var("SBOMRELAY_GENERAL_LOG_LEVEL"),
        }
    }

    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_override_numeric_field() {
    let original = std::env::var("SBOMRELAY_TRANSFER_WATCH_BUFFER_CAPACITY").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SBOMRELAY_TRANSFER_WATCH_BUFFER_CAPACITY", "32");
    }

    let mut config = SbomRelayConfig::default();
    config.apply_env_overrides();
    let result = config.transfer.watch_buffer_capacity;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SBOMRELAY_TRANSFER_WATCH_BUFFER_CAPACITY", val),
            None => std::env::remove_var("SBOMRELAY_TRANSFER_WATCH_BUFFER_CAPACITY"),
        }
    }

    assert_eq!(result, 32);
}

#[tokio::test]
#[serial_test::serial]
async fn load_applies_env_and_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[transfer]\nparallel_workers = 2").expect("write");

    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SBOMRELAY_TRANSFER_PARALLEL_WORKERS", "0");
    }
    let result = SbomRelayConfig::load(file.path()).await;
    // SAFETY: 테스트 정리
    unsafe {
        std::env::remove_var("SBOMRELAY_TRANSFER_PARALLEL_WORKERS");
    }

    // 환경변수가 파일 값을 덮어쓴 뒤 검증에 걸려야 함
    let err = result.unwrap_err();
    assert!(err.to_string().contains("parallel_workers"));
}

// =============================================================================
// 에러 케이스
// =============================================================================

#[test]
fn empty_and_comment_only_parse_with_defaults() {
    for input in ["", "   \n\t\n", "# just a comment\n# another\n"] {
        let config = SbomRelayConfig::parse(input).expect("should parse");
        assert_eq!(config.transfer.parallel_workers, 4);
    }
}

#[test]
fn malformed_toml_returns_parse_error() {
    let err = SbomRelayConfig::parse("[transfer\nparallel_workers = ").unwrap_err();
    assert!(matches!(
        err,
        SbomRelayError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn wrong_type_for_numeric_field() {
    let toml = r#"
[transfer]
parallel_workers = "many"
"#;
    assert!(SbomRelayConfig::parse(toml).is_err());
}

#[test]
fn unknown_section_is_ignored() {
    let toml = r#"
[general]
log_level = "warn"

[future_section]
key = "value"
"#;
    let config = SbomRelayConfig::parse(toml).expect("unknown sections should be ignored");
    assert_eq!(config.general.log_level, "warn");
}

#[tokio::test]
async fn from_file_nonexistent_returns_file_not_found() {
    let result = SbomRelayConfig::from_file("/tmp/sbomrelay_test_nonexistent_12345.toml").await;
    assert!(matches!(
        result.unwrap_err(),
        SbomRelayError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
async fn load_example_config_from_disk() {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let example_path = format!("{}/../../sbomrelay.toml.example", manifest_dir);

    let config = SbomRelayConfig::from_file(&example_path)
        .await
        .expect("example file should load");
    assert_eq!(config.transfer.watch_buffer_capacity, 10);
}

#[test]
fn example_config_serialize_roundtrip() {
    let config = SbomRelayConfig::parse(EXAMPLE).expect("should parse");
    let serialized = toml::to_string_pretty(&config).expect("should serialize");
    let reparsed = SbomRelayConfig::parse(&serialized).expect("should reparse");
    reparsed.validate().expect("should validate");

    assert_eq!(
        config.transfer.processing_mode,
        reparsed.transfer.processing_mode
    );
}
