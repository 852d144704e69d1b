//! `sbomrelay config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use sbomrelay_core::config::SbomRelayConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// 표시 가능한 설정 섹션
const SECTIONS: [&str; 2] = ["general", "transfer"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load and validate the configuration file, reporting any errors.
///
/// Unlike `transfer`, a missing file is reported as invalid here.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match SbomRelayConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Display the effective configuration (file + env overrides + defaults).
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = SbomRelayConfig::load(config_path).await?;
    let report = build_report(&config_path.display().to_string(), &config, section)?;
    writer.render(&report)?;

    Ok(())
}

/// 설정 전체 또는 한 섹션을 TOML로 직렬화한 리포트를 만듭니다.
fn build_report(
    source: &str,
    config: &SbomRelayConfig,
    section: Option<String>,
) -> Result<ConfigReport, CliError> {
    let config_toml = match section.as_deref() {
        None => toml::to_string_pretty(config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("transfer") => toml::to_string_pretty(&config.transfer),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                other,
                SECTIONS.join(", ")
            )));
        }
    }
    .unwrap_or_else(|e| format!("(serialization error: {})", e));

    Ok(ConfigReport {
        source: source.to_owned(),
        section,
        config_toml,
    })
}

/// Configuration display report.
///
/// The `config_toml` field is only used for text rendering.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(report: &impl Render) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_build_report_full_config() {
        let config = SbomRelayConfig::default();
        let report = build_report("sbomrelay.toml", &config, None).expect("full report");
        assert!(report.section.is_none());
        assert!(report.config_toml.contains("[general]"));
        assert!(report.config_toml.contains("[transfer]"));
        assert!(report.config_toml.contains("processing_mode = \"sequential\""));
    }

    #[test]
    fn test_build_report_transfer_section() {
        let config = SbomRelayConfig::default();
        let report = build_report("sbomrelay.toml", &config, Some("transfer".to_owned()))
            .expect("section report");
        assert_eq!(report.section.as_deref(), Some("transfer"));
        assert!(report.config_toml.contains("parallel_workers = 4"));
        assert!(!report.config_toml.contains("log_level"));
    }

    #[test]
    fn test_build_report_unknown_section() {
        let config = SbomRelayConfig::default();
        let err = build_report("sbomrelay.toml", &config, Some("storage".to_owned()))
            .err()
            .expect("unknown section should fail");
        assert!(err.to_string().contains("unknown section: storage"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_config_report_render_text_specific_section() {
        let report = ConfigReport {
            source: "/etc/sbomrelay.toml".to_owned(),
            section: Some("general".to_owned()),
            config_toml: "log_level = \"info\"\n".to_owned(),
        };
        let output = render(&report);
        assert!(output.contains("[general]"), "should show section name");
        assert!(output.contains("log_level"), "should show config content");
    }

    #[test]
    fn test_config_report_json_skips_toml_body() {
        let report = ConfigReport {
            source: "test.toml".to_owned(),
            section: Some("transfer".to_owned()),
            config_toml: "parallel_workers = 4".to_owned(),
        };

        let json = serde_json::to_string(&report).expect("JSON serialization should succeed");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("should parse JSON");
        assert_eq!(parsed["source"].as_str(), Some("test.toml"));
        assert_eq!(parsed["section"].as_str(), Some("transfer"));
        assert!(parsed.get("config_toml").is_none());
    }

    #[test]
    fn test_config_validation_report_invalid() {
        let report = ConfigValidationReport {
            source: "bad.toml".to_owned(),
            valid: false,
            errors: vec!["invalid config value for 'transfer.parallel_workers'".to_owned()],
        };
        let output = render(&report);
        assert!(output.contains("INVALID"));
        assert!(output.contains("transfer.parallel_workers"));
    }

    #[tokio::test]
    async fn test_validate_missing_file_is_config_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let writer = OutputWriter::new(crate::cli::OutputFormat::Json);
        let err = execute_validate(&dir.path().join("missing.toml"), &writer)
            .await
            .expect_err("missing file is invalid");
        assert_eq!(err.exit_code(), 2);
    }
}
