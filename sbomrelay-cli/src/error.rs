//! CLI-specific error types and exit code mapping

use sbomrelay_adapters::AdapterError;
use sbomrelay_core::error::{AdapterFailure, SbomRelayError};

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Adapter flags missing or misused.
    #[error("{0}")]
    Flags(String),

    /// Input source cannot be opened (missing bucket, unreadable root).
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Nothing passed classification.
    #[error("{0}")]
    NoSbomsFound(String),

    /// Interrupted by Ctrl-C.
    #[error("cancelled")]
    Cancelled,

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | General / command error                  |
    /// | 2    | Configuration or flag error              |
    /// | 3    | Input source unavailable                 |
    /// | 4    | No SBOMs found                           |
    /// | 10   | IO error                                 |
    /// | 130  | Cancelled (Ctrl-C)                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Flags(_) => 2,
            Self::SourceUnavailable(_) => 3,
            Self::NoSbomsFound(_) => 4,
            Self::Io(_) => 10,
            Self::Cancelled => 130,
            Self::Command(_) | Self::JsonSerialize(_) => 1,
        }
    }
}

impl From<SbomRelayError> for CliError {
    fn from(e: SbomRelayError) -> Self {
        match e {
            SbomRelayError::Config(e) => Self::Config(e.to_string()),
            SbomRelayError::Adapter(AdapterFailure::Flags(msg)) => Self::Flags(msg),
            SbomRelayError::Adapter(AdapterFailure::SourceUnavailable(msg)) => {
                Self::SourceUnavailable(msg)
            }
            SbomRelayError::Adapter(AdapterFailure::NoSbomsFound(location)) => {
                Self::NoSbomsFound(format!("no sboms found at {location}"))
            }
            SbomRelayError::Adapter(AdapterFailure::Cancelled) => Self::Cancelled,
            SbomRelayError::Io(e) => Self::Io(e),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<AdapterError> for CliError {
    fn from(e: AdapterError) -> Self {
        match e {
            AdapterError::Report(io) => Self::Io(io),
            // 플래그 에러 메시지는 사용자에게 그대로 보여 줍니다
            e if e.is_config() => Self::Flags(e.to_string()),
            e if e.is_source_unavailable() => Self::SourceUnavailable(e.to_string()),
            e => SbomRelayError::from(e).into(),
        }
    }
}
