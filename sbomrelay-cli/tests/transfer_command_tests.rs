//! Integration tests for `sbomrelay transfer`.
//!
//! Runs the built binary against temporary folder trees and checks the
//! report output and exit codes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const CDX: &str = r#"{"bomFormat":"CycloneDX","specVersion":"1.5","metadata":{"component":{"name":"alpha-app","version":"0.9.1"}},"components":[]}"#;
const SPDX_TAG: &str = "SPDXVersion: SPDX-2.3\nDataLicense: CC0-1.0\nPackageName: beta\n";

fn sbomrelay(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sbomrelay"))
        .arg("--config")
        .arg(config_dir.join("sbomrelay.toml"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("SBOMRELAY_TRANSFER_PROCESSING_MODE")
        .env_remove("SBOMRELAY_TRANSFER_OUTPUT_DIR")
        .output()
        .expect("should run sbomrelay binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_report_mode_lists_sboms() {
    // Given: A folder with one CycloneDX file, one SPDX tag-value file and noise
    let temp_dir = TempDir::new().expect("should create temp dir");
    let input = temp_dir.path().join("in");
    fs::create_dir(&input).expect("should create input dir");
    fs::write(input.join("a.json"), CDX).expect("should write sbom");
    fs::write(input.join("b.spdx"), SPDX_TAG).expect("should write sbom");
    fs::write(input.join("notes.txt"), "hello").expect("should write noise");
    let input_arg = input.display().to_string();

    // When: Transferring without an output adapter
    let output = sbomrelay(
        temp_dir.path(),
        &["transfer", "--input-adapter", "folder", "--in-folder-path", &input_arg],
    );

    // Then: Both SBOMs are reported
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("a.json [cyclonedx-json 1.5] alpha-app@0.9.1"), "{out}");
    assert!(out.contains("b.spdx [spdx-tag SPDX-2.3]"), "{out}");
    assert!(out.contains("Total SBOMs: 2"), "{out}");
    assert!(!out.contains("notes.txt"), "{out}");
}

#[test]
fn test_folder_to_folder_copies_files() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let input = temp_dir.path().join("in");
    let dest = temp_dir.path().join("out");
    fs::create_dir_all(input.join("nested")).expect("should create input dirs");
    fs::write(input.join("nested").join("a.json"), CDX).expect("should write sbom");
    let input_arg = input.display().to_string();
    let dest_arg = dest.display().to_string();

    let output = sbomrelay(
        temp_dir.path(),
        &[
            "transfer",
            "--input-adapter",
            "folder",
            "--in-folder-path",
            &input_arg,
            "--in-folder-recursive",
            "--output-adapter",
            "folder",
            "--out-folder-path",
            &dest_arg,
        ],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let copied = fs::read_to_string(dest.join("nested").join("a.json")).expect("should be copied");
    assert_eq!(copied, CDX);
    assert!(stdout(&output).contains("Uploaded: 1"));
}

#[test]
fn test_dry_run_does_not_write() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let input = temp_dir.path().join("in");
    let dest = temp_dir.path().join("out");
    fs::create_dir(&input).expect("should create input dir");
    fs::write(input.join("a.json"), CDX).expect("should write sbom");
    let input_arg = input.display().to_string();
    let dest_arg = dest.display().to_string();

    let output = sbomrelay(
        temp_dir.path(),
        &[
            "transfer",
            "--input-adapter",
            "folder",
            "--in-folder-path",
            &input_arg,
            "--output-adapter",
            "folder",
            "--out-folder-path",
            &dest_arg,
            "--dry-run",
        ],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!dest.join("a.json").exists(), "dry run must not write");
    assert!(stdout(&output).contains("-> "));
}

#[test]
fn test_json_output_is_summary_only() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let input = temp_dir.path().join("in");
    fs::create_dir(&input).expect("should create input dir");
    fs::write(input.join("a.json"), CDX).expect("should write sbom");
    let input_arg = input.display().to_string();

    let output = sbomrelay(
        temp_dir.path(),
        &[
            "--output",
            "json",
            "transfer",
            "--input-adapter",
            "folder",
            "--in-folder-path",
            &input_arg,
        ],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be one JSON document");
    assert_eq!(summary["input"].as_str(), Some("folder"));
    assert_eq!(summary["records"].as_u64(), Some(1));
    assert!(summary["output"].is_null());
}

#[test]
fn test_missing_flags_exit_code_2() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let output = sbomrelay(
        temp_dir.path(),
        &["transfer", "--input-adapter", "s3", "--in-s3-region", "us-east-1"],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(
        stderr(&output).contains("missing required flags: --in-s3-bucket-name, --in-s3-prefix"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn test_unreadable_root_exit_code_3() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let missing = temp_dir.path().join("missing").display().to_string();

    let output = sbomrelay(
        temp_dir.path(),
        &["transfer", "--input-adapter", "folder", "--in-folder-path", &missing],
    );

    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
}

#[test]
fn test_invalid_config_file_exit_code_2() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("sbomrelay.toml"),
        "[transfer]\nparallel_workers = 0\n",
    )
    .expect("should write config");
    let input = temp_dir.path().display().to_string();

    let output = sbomrelay(
        temp_dir.path(),
        &["transfer", "--input-adapter", "folder", "--in-folder-path", &input],
    );

    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("transfer.parallel_workers"));
}
