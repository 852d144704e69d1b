//! 어댑터 플래그 등록/검증
//!
//! 모든 어댑터 플래그는 `--{in|out}-{kind}-{name}` 형태입니다.
//! 어떤 어댑터가 선택될지는 파싱 후에야 알 수 있으므로, 모든 플래그를 선택 사항으로
//! 등록해 두고 필수 여부는 [`validate`]에서 직접 검사합니다.
//!
//! # 검증 순서
//!
//! 1. 같은 역할 접두사를 가진 다른 어댑터 종류의 플래그 → `InvalidFlagUsage`
//! 2. 필수 플래그 누락(빈 값 포함) → `MissingFlags` (쉼표로 나열)

use std::fmt;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueEnum};
use sbomrelay_core::types::AdapterRole;

use crate::error::AdapterError;

/// 어댑터 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum AdapterKind {
    /// 로컬 디렉토리
    Folder,
    /// S3 호환 오브젝트 스토어
    S3,
}

impl AdapterKind {
    /// 모든 어댑터 종류
    pub const ALL: [AdapterKind; 2] = [AdapterKind::Folder, AdapterKind::S3];

    /// 플래그 이름에 쓰이는 종류 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::S3 => "s3",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 플래그 하나의 정의
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    /// `--` 없는 긴 이름
    pub name: &'static str,
    /// 도움말
    pub help: &'static str,
    /// 해당 어댑터 선택 시 필수 여부
    pub required: bool,
    /// 값 없는 스위치 여부
    pub switch: bool,
}

impl FlagSpec {
    const fn value(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            required: true,
            switch: false,
        }
    }

    const fn switch(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            required: false,
            switch: true,
        }
    }

    /// `--name` 형태
    pub fn long(&self) -> String {
        format!("--{}", self.name)
    }
}

// 플래그 이름
pub const IN_FOLDER_PATH: &str = "in-folder-path";
pub const IN_FOLDER_RECURSIVE: &str = "in-folder-recursive";
pub const IN_FOLDER_WATCH: &str = "in-folder-watch";
pub const OUT_FOLDER_PATH: &str = "out-folder-path";
pub const IN_S3_BUCKET_NAME: &str = "in-s3-bucket-name";
pub const IN_S3_REGION: &str = "in-s3-region";
pub const IN_S3_PREFIX: &str = "in-s3-prefix";
pub const OUT_S3_BUCKET_NAME: &str = "out-s3-bucket-name";
pub const OUT_S3_REGION: &str = "out-s3-region";
pub const OUT_S3_PREFIX: &str = "out-s3-prefix";

const IN_FOLDER_FLAGS: &[FlagSpec] = &[
    FlagSpec::value(IN_FOLDER_PATH, "Input folder to read SBOMs from"),
    FlagSpec::switch(IN_FOLDER_RECURSIVE, "Descend into subdirectories"),
    FlagSpec::switch(IN_FOLDER_WATCH, "Watch the folder for changes instead of scanning once"),
];

const OUT_FOLDER_FLAGS: &[FlagSpec] = &[FlagSpec::value(
    OUT_FOLDER_PATH,
    "Output folder to write SBOMs to",
)];

const IN_S3_FLAGS: &[FlagSpec] = &[
    FlagSpec::value(IN_S3_BUCKET_NAME, "Input S3 bucket name"),
    FlagSpec::value(IN_S3_REGION, "Input S3 bucket region"),
    FlagSpec::value(IN_S3_PREFIX, "Key prefix to list SBOMs under"),
];

const OUT_S3_FLAGS: &[FlagSpec] = &[
    FlagSpec::value(OUT_S3_BUCKET_NAME, "Output S3 bucket name"),
    FlagSpec::value(OUT_S3_REGION, "Output S3 bucket region"),
    FlagSpec::value(OUT_S3_PREFIX, "Key prefix to upload SBOMs under"),
];

/// 어댑터 종류/역할의 플래그 목록
pub fn flag_specs(kind: AdapterKind, role: AdapterRole) -> &'static [FlagSpec] {
    match (kind, role) {
        (AdapterKind::Folder, AdapterRole::Input) => IN_FOLDER_FLAGS,
        (AdapterKind::Folder, AdapterRole::Output) => OUT_FOLDER_FLAGS,
        (AdapterKind::S3, AdapterRole::Input) => IN_S3_FLAGS,
        (AdapterKind::S3, AdapterRole::Output) => OUT_S3_FLAGS,
    }
}

/// 한 어댑터의 플래그를 명령에 등록합니다.
pub fn add_flags(cmd: Command, kind: AdapterKind, role: AdapterRole) -> Command {
    let heading = match role {
        AdapterRole::Input => "Input adapter",
        AdapterRole::Output => "Output adapter",
    };
    flag_specs(kind, role).iter().fold(cmd, |cmd, spec| {
        let arg = Arg::new(spec.name)
            .long(spec.name)
            .help(spec.help)
            .help_heading(heading);
        let arg = if spec.switch {
            arg.action(ArgAction::SetTrue)
        } else {
            arg.value_name("VALUE").action(ArgAction::Set)
        };
        cmd.arg(arg)
    })
}

/// 모든 어댑터의 플래그를 등록합니다.
///
/// [`validate`]는 다른 종류의 플래그 사용 여부도 확인하므로 전체 등록이 전제입니다.
pub fn register_all(cmd: Command) -> Command {
    let mut cmd = cmd;
    for role in [AdapterRole::Input, AdapterRole::Output] {
        for kind in AdapterKind::ALL {
            cmd = add_flags(cmd, kind, role);
        }
    }
    cmd
}

/// 명령줄에서 직접 지정했는지
fn supplied(matches: &ArgMatches, name: &str) -> bool {
    matches!(matches.value_source(name), Some(ValueSource::CommandLine))
}

/// 값 플래그. 비어 있거나 공백뿐이면 `None`입니다.
pub fn value(matches: &ArgMatches, name: &str) -> Option<String> {
    matches
        .try_get_one::<String>(name)
        .ok()
        .flatten()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// 스위치 플래그
pub fn switch(matches: &ArgMatches, name: &str) -> bool {
    matches
        .try_get_one::<bool>(name)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

/// 선택된 어댑터의 플래그 사용을 검증합니다.
pub fn validate(
    matches: &ArgMatches,
    kind: AdapterKind,
    role: AdapterRole,
) -> Result<(), AdapterError> {
    let foreign: Vec<String> = AdapterKind::ALL
        .into_iter()
        .filter(|other| *other != kind)
        .flat_map(|other| flag_specs(other, role))
        .filter(|spec| supplied(matches, spec.name))
        .map(FlagSpec::long)
        .collect();
    if !foreign.is_empty() {
        return Err(AdapterError::InvalidFlagUsage {
            role,
            flags: foreign,
        });
    }

    let missing: Vec<String> = flag_specs(kind, role)
        .iter()
        .filter(|spec| spec.required && value(matches, spec.name).is_none())
        .map(FlagSpec::long)
        .collect();
    if !missing.is_empty() {
        return Err(AdapterError::MissingFlags(missing));
    }
    Ok(())
}

/// 어댑터가 선택되지 않은 역할의 플래그가 쓰였으면 거부합니다.
pub fn reject_unused_role(matches: &ArgMatches, role: AdapterRole) -> Result<(), AdapterError> {
    let stray: Vec<String> = AdapterKind::ALL
        .into_iter()
        .flat_map(|kind| flag_specs(kind, role))
        .filter(|spec| supplied(matches, spec.name))
        .map(FlagSpec::long)
        .collect();
    if stray.is_empty() {
        Ok(())
    } else {
        Err(AdapterError::InvalidFlagUsage { role, flags: stray })
    }
}
