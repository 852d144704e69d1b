//! 프로세서: 레코드 하나를 분류하고 선택적으로 디스크에 저장
//!
//! 분류는 스펙 버전까지만 읽으며 전체 디코드는 하지 않습니다.
//! `format == Unknown` 문서를 쓰지 않는 것은 호출자의 책임입니다.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use metrics::counter;
use sbomrelay_core::metrics as m;
use sbomrelay_core::types::{SbomDocument, UNKNOWN_FILENAME};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::detect::classify;
use crate::error::ClassifierError;

/// 출력 파일 확장자
pub const OUTPUT_SUFFIX: &str = ".sbom.json";

/// 디렉토리 생성 권한
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
/// 파일 생성 권한
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// 레코드 프로세서
#[derive(Debug, Clone, Default)]
pub struct Processor {
    output_dir: Option<PathBuf>,
}

impl Processor {
    /// 새 프로세서를 생성합니다. `output_dir`가 `None`이면 `write`는 아무것도 하지 않습니다.
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self { output_dir }
    }

    /// 설정된 출력 디렉토리
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// 바이트를 분류해 문서를 만듭니다.
    ///
    /// - 빈 입력: [`ClassifierError::EmptyContent`]
    /// - 빈 경로는 `"N/A"`로 대체
    /// - 감지 실패: [`ClassifierError::UnknownFormat`]
    pub fn process(
        &self,
        data: &Bytes,
        repo_name: &str,
        path: &str,
    ) -> Result<SbomDocument, ClassifierError> {
        let filename = if path.is_empty() {
            UNKNOWN_FILENAME.to_owned()
        } else {
            path.to_owned()
        };

        if data.is_empty() {
            return Err(ClassifierError::EmptyContent { path: filename });
        }

        let found = classify(data);
        if !found.format.is_known() {
            return Err(ClassifierError::UnknownFormat { path: filename });
        }

        counter!(m::DOCUMENTS_PROCESSED_TOTAL, m::LABEL_FORMAT => found.format.as_str())
            .increment(1);
        debug!(
            repo = repo_name,
            path = %filename,
            format = %found.format,
            spec_version = %found.spec_version,
            "document classified"
        );

        Ok(SbomDocument {
            format: found.format,
            spec_version: found.spec_version,
            filename,
            data: data.clone(),
        })
    }

    /// 문서를 `<output_dir>/<repo_name>.sbom.json`에 씁니다.
    ///
    /// 출력 디렉토리가 없으면 `Ok(None)`입니다.
    pub async fn write(
        &self,
        doc: &SbomDocument,
        repo_name: &str,
    ) -> Result<Option<PathBuf>, ClassifierError> {
        let Some(dir) = &self.output_dir else {
            return Ok(None);
        };

        let target = output_path(dir, repo_name)?;
        write_bytes(&target, &doc.data).await?;
        Ok(Some(target))
    }
}

/// 바이트를 `target`에 그대로 씁니다.
///
/// 상위 디렉토리는 0755, 파일은 0644로 생성하며 기존 파일은 덮어씁니다.
pub async fn write_bytes(target: &Path, data: &[u8]) -> Result<(), ClassifierError> {
    if let Some(parent) = target.parent() {
        create_dirs(parent).await?;
    }

    let io_err = |source| ClassifierError::Io {
        path: target.display().to_string(),
        source,
    };
    let mut file = open_for_write(target).await.map_err(io_err)?;
    file.write_all(data).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;

    debug!(path = %target.display(), bytes = data.len(), "payload written");
    Ok(())
}

/// 저장소 이름으로 출력 경로를 만듭니다.
///
/// 빈 이름은 `<dir>/.sbom.json`이 됩니다. `..`나 절대 경로 성분은 거부합니다.
pub fn output_path(dir: &Path, repo_name: &str) -> Result<PathBuf, ClassifierError> {
    let escapes = Path::new(repo_name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ClassifierError::InvalidOutputName(repo_name.to_owned()));
    }
    Ok(dir.join(format!("{repo_name}{OUTPUT_SUFFIX}")))
}

async fn create_dirs(path: &Path) -> Result<(), ClassifierError> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder
        .create(path)
        .await
        .map_err(|source| ClassifierError::Io {
            path: path.display().to_string(),
            source,
        })
}

async fn open_for_write(path: &Path) -> std::io::Result<tokio::fs::File> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);
    options.open(path).await
}
