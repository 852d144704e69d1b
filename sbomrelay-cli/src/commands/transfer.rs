//! `sbomrelay transfer` command handler
//!
//! 플래그 검증은 어떤 I/O보다 먼저 끝납니다. 검증을 통과하면 입력 어댑터의 스트림을
//! 출력 어댑터(또는 리포터)로 흘려 보내고, Ctrl-C는 전송 컨텍스트를 취소합니다.

use std::io::Write;

use clap::ArgMatches;
use tracing::{info, warn};

use sbomrelay_adapters::flags::reject_unused_role;
use sbomrelay_adapters::{
    Adapter, AdapterSettings, DryRunReporter, TransferOptions, TransferSummary, transfer,
};
use sbomrelay_classifier::Processor;
use sbomrelay_core::config::SbomRelayConfig;
use sbomrelay_core::context::TransferContext;
use sbomrelay_core::types::AdapterRole;

use crate::cli::{OutputFormat, TransferArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `transfer` command.
///
/// `adapter_flags` are the matches of the `transfer` subcommand, which carry the
/// runtime-registered `--in-*` / `--out-*` flags.
pub async fn execute(
    args: TransferArgs,
    adapter_flags: &ArgMatches,
    config: SbomRelayConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let plan = TransferPlan::build(&args, adapter_flags, config)?;

    let ctx = TransferContext::new();
    let interrupt = spawn_interrupt_handler(ctx.clone());

    // JSON 모드에서는 stdout을 요약 JSON 전용으로 남겨 둡니다
    let report_out: Box<dyn Write + Send> = match writer.format() {
        OutputFormat::Text => Box::new(std::io::stdout()),
        OutputFormat::Json => Box::new(std::io::stderr()),
    };
    let result = plan.run(&ctx, report_out).await;
    interrupt.abort();

    let summary = result?;
    writer.render(&summary)?;
    Ok(())
}

/// Ctrl-C를 받으면 컨텍스트를 취소합니다.
fn spawn_interrupt_handler(ctx: TransferContext) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("interrupt received, cancelling transfer");
                ctx.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for interrupt"),
        }
    })
}

/// CLI 인자 오버라이드를 설정에 반영하고 다시 검증합니다.
fn apply_overrides(
    mut config: SbomRelayConfig,
    args: &TransferArgs,
) -> Result<SbomRelayConfig, CliError> {
    if let Some(ref mode) = args.processing_mode {
        config.transfer.processing_mode = mode.clone();
    }
    if let Some(workers) = args.parallel_workers {
        config.transfer.parallel_workers = workers;
    }
    if let Some(ref dir) = args.output_dir {
        config.transfer.output_dir = dir.display().to_string();
    }
    config.transfer.validate()?;
    Ok(config)
}

/// 검증을 마친 전송 계획
struct TransferPlan {
    input: Adapter,
    output: Option<Adapter>,
    options: TransferOptions,
    processor: Processor,
    verbose: bool,
}

impl TransferPlan {
    /// 설정과 플래그로 어댑터를 만듭니다. I/O는 하지 않습니다.
    fn build(
        args: &TransferArgs,
        adapter_flags: &ArgMatches,
        config: SbomRelayConfig,
    ) -> Result<Self, CliError> {
        let config = apply_overrides(config, args)?;
        let settings = AdapterSettings::from(&config.transfer);

        let input = Adapter::parse_and_validate(
            args.input_adapter,
            AdapterRole::Input,
            adapter_flags,
            settings.clone(),
        )?;
        let output = match args.output_adapter {
            Some(kind) => Some(Adapter::parse_and_validate(
                kind,
                AdapterRole::Output,
                adapter_flags,
                settings,
            )?),
            None => {
                reject_unused_role(adapter_flags, AdapterRole::Output)?;
                None
            }
        };

        Ok(Self {
            input,
            output,
            options: TransferOptions {
                dry_run: args.dry_run,
            },
            processor: Processor::new(config.transfer.output_dir()),
            verbose: args.verbose,
        })
    }

    async fn run<W: Write + Send>(
        self,
        ctx: &TransferContext,
        report_out: W,
    ) -> Result<TransferSummary, CliError> {
        info!(
            input = self.input.name(),
            output = self.output.as_ref().map(Adapter::name).unwrap_or("-"),
            dry_run = self.options.dry_run,
            "starting transfer"
        );
        let mut reporter = DryRunReporter::new(self.processor, self.verbose, report_out);
        let summary = transfer(
            ctx,
            &self.input,
            self.output.as_ref(),
            self.options,
            &mut reporter,
        )
        .await?;
        Ok(summary)
    }
}

impl Render for TransferSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let route = match self.output {
            Some(ref output) => format!("{} -> {}", self.input, output),
            None => format!("{} (report)", self.input),
        };
        if self.dry_run {
            writeln!(w, "Transfer: {} {}", route.bold(), "[dry run]".yellow())?;
        } else {
            writeln!(w, "Transfer: {}", route.bold())?;
        }
        writeln!(w, "  Run ID:   {}", self.run_id)?;
        writeln!(w, "  Records:  {}", self.records)?;
        if self.output.is_some() && !self.dry_run {
            writeln!(w, "  Uploaded: {}", self.uploaded.to_string().green())?;
            if self.skipped > 0 {
                writeln!(w, "  Skipped:  {}", self.skipped.to_string().yellow())?;
            }
        }
        if self.written > 0 {
            writeln!(w, "  Written:  {}", self.written)?;
        }
        for (format, count) in &self.by_format {
            writeln!(w, "    {:<16} {}", format, count)?;
        }
        writeln!(w, "  Duration: {:.2}s", self.duration_secs)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Commands, try_parse_from};

    const CDX: &[u8] = br#"{"bomFormat":"CycloneDX","specVersion":"1.5","metadata":{"component":{"name":"app","version":"2.0.0"}},"components":[]}"#;

    fn parse(args: &[&str]) -> (TransferArgs, ArgMatches) {
        let argv = std::iter::once("sbomrelay")
            .chain(std::iter::once("transfer"))
            .chain(args.iter().copied());
        let (cli, matches) = try_parse_from(argv).expect("parse succeeded");
        let Commands::Transfer(args) = cli.command else {
            panic!("expected Transfer command");
        };
        let sub = matches
            .subcommand_matches("transfer")
            .expect("transfer matches")
            .clone();
        (args, sub)
    }

    fn build(args: &[&str]) -> Result<TransferPlan, CliError> {
        let (args, flags) = parse(args);
        TransferPlan::build(&args, &flags, SbomRelayConfig::default())
    }

    #[test]
    fn test_missing_input_flags_exit_code_2() {
        let err = build(&["--input-adapter", "s3", "--in-s3-region", "us-east-1"])
            .err()
            .expect("missing flags");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.to_string(),
            "missing required flags: --in-s3-bucket-name, --in-s3-prefix"
        );
    }

    #[test]
    fn test_foreign_flags_rejected() {
        let err = build(&[
            "--input-adapter",
            "folder",
            "--in-folder-path",
            "/data",
            "--in-s3-prefix",
            "sboms",
        ])
        .err()
        .expect("foreign flag");
        assert_eq!(err.to_string(), "invalid input adapter flag usage: --in-s3-prefix");
    }

    #[test]
    fn test_output_flags_without_output_adapter_rejected() {
        let err = build(&[
            "--input-adapter",
            "folder",
            "--in-folder-path",
            "/data",
            "--out-folder-path",
            "/out",
        ])
        .err()
        .expect("stray output flag");
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("--out-folder-path"));
    }

    #[test]
    fn test_cli_overrides_config() {
        let (args, _) = parse(&[
            "--input-adapter",
            "folder",
            "--processing-mode",
            "parallel",
            "--parallel-workers",
            "2",
        ]);
        let config = apply_overrides(SbomRelayConfig::default(), &args).expect("valid overrides");
        assert_eq!(config.transfer.processing_mode, "parallel");
        assert_eq!(config.transfer.parallel_workers, 2);
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let (args, _) = parse(&["--input-adapter", "folder", "--parallel-workers", "0"]);
        let err = apply_overrides(SbomRelayConfig::default(), &args)
            .err()
            .expect("zero workers rejected");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_folder_to_folder_transfer() {
        let src = tempfile::tempdir().expect("src dir");
        let dst = tempfile::tempdir().expect("dst dir");
        std::fs::write(src.path().join("app.json"), CDX).expect("write sbom");

        let src_path = src.path().display().to_string();
        let dst_path = dst.path().display().to_string();
        let plan = build(&[
            "--input-adapter",
            "folder",
            "--in-folder-path",
            &src_path,
            "--output-adapter",
            "folder",
            "--out-folder-path",
            &dst_path,
        ])
        .expect("valid plan");

        let summary = plan
            .run(&TransferContext::new(), Vec::new())
            .await
            .expect("transfer succeeds");
        assert_eq!(summary.uploaded, 1);
        assert_eq!(
            std::fs::read(dst.path().join("app.json")).expect("copied"),
            CDX
        );
    }

    #[tokio::test]
    async fn test_report_mode_writes_output_dir() {
        let src = tempfile::tempdir().expect("src dir");
        let out = tempfile::tempdir().expect("out dir");
        std::fs::write(src.path().join("app.json"), CDX).expect("write sbom");

        let src_path = src.path().display().to_string();
        let out_path = out.path().display().to_string();
        let plan = build(&[
            "--input-adapter",
            "folder",
            "--in-folder-path",
            &src_path,
            "--output-dir",
            &out_path,
        ])
        .expect("valid plan");

        let summary = plan
            .run(&TransferContext::new(), Vec::new())
            .await
            .expect("report succeeds");
        assert_eq!(summary.records, 1);
        assert_eq!(summary.written, 1);
        assert!(out.path().join("app.sbom.json").exists());
    }

    #[tokio::test]
    async fn test_unreadable_root_exit_code_3() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("missing").display().to_string();
        let plan = build(&["--input-adapter", "folder", "--in-folder-path", &missing])
            .expect("valid plan");

        let err = plan
            .run(&TransferContext::new(), Vec::new())
            .await
            .expect_err("missing root");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_summary_render_text() {
        colored::control::set_override(false);
        let summary = TransferSummary {
            run_id: "run-1".to_owned(),
            input: "folder".to_owned(),
            output: Some("s3".to_owned()),
            dry_run: false,
            records: 3,
            uploaded: 2,
            skipped: 1,
            written: 0,
            by_format: Default::default(),
            duration_secs: 0.5,
        };
        let mut buffer = Vec::new();
        summary.render_text(&mut buffer).expect("render");
        let text = String::from_utf8(buffer).expect("utf-8");
        assert!(text.contains("Transfer: folder -> s3"));
        assert!(text.contains("Uploaded: 2"));
        assert!(text.contains("Skipped:  1"));
        assert!(text.contains("Duration: 0.50s"));

        let json = serde_json::to_value(&summary).expect("json");
        assert_eq!(json["uploaded"].as_u64(), Some(2));
        assert_eq!(json["output"].as_str(), Some("s3"));
    }
}
