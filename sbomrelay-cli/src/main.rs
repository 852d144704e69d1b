//! sbomrelay -- SBOM 전송 명령줄 도구

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use anyhow::Result;
use tracing::{error, info};

use sbomrelay_core::config::SbomRelayConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> Result<()> {
    let (cli, matches) = cli::try_parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit());

    // 로깅 설정을 위해 먼저 읽고, 실패는 명령 단계에서 보고합니다
    let loaded = SbomRelayConfig::load_or_default(&cli.config).await;
    let mut general = loaded
        .as_ref()
        .map(|config| config.general.clone())
        .unwrap_or_default();
    if let Some(ref level) = cli.log_level {
        general.log_level = level.clone();
    }
    logging::init_tracing(&general)?;
    sbomrelay_core::metrics::describe_all();

    info!(config = %cli.config.display(), "sbomrelay starting");

    if let Err(e) = run(cli, &matches, loaded).await {
        error!(error = %e, exit_code = e.exit_code(), "command failed");
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}

async fn run(
    cli: Cli,
    matches: &clap::ArgMatches,
    loaded: Result<SbomRelayConfig, sbomrelay_core::SbomRelayError>,
) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Transfer(args) => {
            let config = loaded?;
            let adapter_flags = matches
                .subcommand_matches("transfer")
                .ok_or_else(|| CliError::Command("transfer arguments missing".to_owned()))?;
            commands::transfer::execute(args, adapter_flags, config, &writer).await
        }
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
