//! CLI argument parsing using clap derive API
//!
//! The derive structs describe the fixed surface. Adapter flags
//! (`--in-folder-path`, `--out-s3-bucket-name`, ...) are registered at runtime on
//! the `transfer` subcommand by [`command`], since which of them are required
//! depends on the selected `--input-adapter` / `--output-adapter`.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use sbomrelay_adapters::{AdapterKind, register_all};

/// sbomrelay -- move SBOM documents between folders and object stores.
///
/// Use `sbomrelay <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "sbomrelay", version, about, long_about = None)]
pub struct Cli {
    /// Path to the sbomrelay.toml configuration file.
    #[arg(short, long, global = true, default_value = "sbomrelay.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format for command results.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read SBOMs from an input adapter and hand them to an output adapter.
    Transfer(TransferArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- transfer ----

/// Transfer SBOMs between adapters.
#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Input adapter to read SBOMs from.
    #[arg(long, value_enum)]
    pub input_adapter: AdapterKind,

    /// Output adapter to send SBOMs to (omit to only report what was found).
    #[arg(long, value_enum)]
    pub output_adapter: Option<AdapterKind>,

    /// Report what would be transferred without uploading anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Pretty-print each SBOM body in the report.
    #[arg(short, long)]
    pub verbose: bool,

    /// Override processing mode (sequential, parallel).
    #[arg(long, value_parser = ["sequential", "parallel"])]
    pub processing_mode: Option<String>,

    /// Override the number of parallel workers.
    #[arg(long)]
    pub parallel_workers: Option<usize>,

    /// Also write every classified SBOM to this directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

// ---- config ----

/// Manage sbomrelay configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, transfer).
        #[arg(long)]
        section: Option<String>,
    },
}

/// 어댑터 플래그까지 등록된 전체 명령
pub fn command() -> clap::Command {
    Cli::command().mut_subcommand("transfer", register_all)
}

/// 인자를 파싱해 derive 구조체와 원본 매치를 함께 돌려줍니다.
///
/// 어댑터 플래그는 derive 구조체에 없으므로 `transfer` 서브커맨드의 [`ArgMatches`]에서 읽습니다.
pub fn try_parse_from<I, T>(args: I) -> Result<(Cli, ArgMatches), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    Ok((cli, matches))
}
