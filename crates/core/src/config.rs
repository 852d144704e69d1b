//! 설정 관리: sbomrelay.toml 파싱 및 런타임 설정
//!
//! [`SbomRelayConfig`]는 CLI와 어댑터가 공유하는 최상위 설정 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SBOMRELAY_TRANSFER_PARALLEL_WORKERS=8` 형식)
//! 3. 설정 파일 (`sbomrelay.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), sbomrelay_core::error::SbomRelayError> {
//! use sbomrelay_core::config::SbomRelayConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SbomRelayConfig::load("sbomrelay.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SbomRelayConfig::parse("[transfer]\nprocessing_mode = \"parallel\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, SbomRelayError};
use crate::types::ProcessingMode;

/// 병렬 워커 수 상한
pub const MAX_PARALLEL_WORKERS: usize = 64;

/// 감시 버퍼 용량 상한
pub const MAX_WATCH_BUFFER_CAPACITY: usize = 1024;

/// sbomrelay 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SbomRelayConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 전송 설정
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl SbomRelayConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SbomRelayError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에서 시작하는 [`load`](Self::load)
    ///
    /// 파일이 존재하지만 파싱에 실패하면 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SbomRelayError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(SbomRelayError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SbomRelayError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SbomRelayError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SbomRelayError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SbomRelayError> {
        toml::from_str(toml_str).map_err(|e| {
            SbomRelayError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SBOMRELAY_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "SBOMRELAY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SBOMRELAY_GENERAL_LOG_FORMAT");

        override_string(
            &mut self.transfer.processing_mode,
            "SBOMRELAY_TRANSFER_PROCESSING_MODE",
        );
        override_usize(
            &mut self.transfer.parallel_workers,
            "SBOMRELAY_TRANSFER_PARALLEL_WORKERS",
        );
        override_usize(
            &mut self.transfer.watch_buffer_capacity,
            "SBOMRELAY_TRANSFER_WATCH_BUFFER_CAPACITY",
        );
        override_string(&mut self.transfer.output_dir, "SBOMRELAY_TRANSFER_OUTPUT_DIR");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SbomRelayError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        self.transfer.validate()
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 전송 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// 처리 모드 (sequential, parallel)
    pub processing_mode: String,
    /// parallel 모드의 워커 수
    pub parallel_workers: usize,
    /// 폴더 감시 버퍼 용량
    pub watch_buffer_capacity: usize,
    /// 프로세서 출력 디렉토리 (빈 문자열이면 쓰지 않음)
    pub output_dir: String,
}

impl TransferConfig {
    /// 처리 모드를 enum으로 반환합니다.
    ///
    /// `validate()`를 통과한 설정이라면 항상 올바른 값이며,
    /// 그렇지 않으면 `Sequential`로 처리합니다.
    pub fn mode(&self) -> ProcessingMode {
        ProcessingMode::from_str_loose(&self.processing_mode).unwrap_or_default()
    }

    /// 출력 디렉토리 (설정된 경우)
    pub fn output_dir(&self) -> Option<PathBuf> {
        if self.output_dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.output_dir))
        }
    }

    /// 전송 설정의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SbomRelayError> {
        if ProcessingMode::from_str_loose(&self.processing_mode).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "transfer.processing_mode".to_owned(),
                reason: "must be one of: sequential, parallel".to_owned(),
            }
            .into());
        }

        if self.parallel_workers == 0 || self.parallel_workers > MAX_PARALLEL_WORKERS {
            return Err(ConfigError::InvalidValue {
                field: "transfer.parallel_workers".to_owned(),
                reason: format!("must be between 1 and {MAX_PARALLEL_WORKERS}"),
            }
            .into());
        }

        if self.watch_buffer_capacity == 0 || self.watch_buffer_capacity > MAX_WATCH_BUFFER_CAPACITY
        {
            return Err(ConfigError::InvalidValue {
                field: "transfer.watch_buffer_capacity".to_owned(),
                reason: format!("must be between 1 and {MAX_WATCH_BUFFER_CAPACITY}"),
            }
            .into());
        }

        if self.output_dir.contains("..") {
            return Err(ConfigError::InvalidValue {
                field: "transfer.output_dir".to_owned(),
                reason: "path traversal ('..') is not allowed".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            processing_mode: "sequential".to_owned(),
            parallel_workers: 4,
            watch_buffer_capacity: 10,
            output_dir: String::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}
