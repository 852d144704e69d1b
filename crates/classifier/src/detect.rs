//! 형식 감지: 내용만으로 SBOM 방언과 스펙 버전을 판별
//!
//! probe는 [`PROBES`]에 적힌 순서대로 시도하며 처음 성공한 결과를 사용합니다.
//! 비용이 낮은 JSON 디코드가 먼저, 선형 스캔인 tag-value가 마지막입니다.
//!
//! 잘못된 입력은 모든 probe에서 실패할 뿐이며, 감지는 에러를 반환하지 않습니다.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use sbomrelay_core::types::SbomFormat;
use serde_json::Value;

/// 감지 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// 감지된 형식
    pub format: SbomFormat,
    /// 본문에서 추출한 스펙 버전 (없으면 빈 문자열)
    pub spec_version: String,
}

impl Classification {
    /// 감지 실패 결과
    pub fn unknown() -> Self {
        Self {
            format: SbomFormat::Unknown,
            spec_version: String::new(),
        }
    }

    fn new(format: SbomFormat, spec_version: impl Into<String>) -> Self {
        Self {
            format,
            spec_version: spec_version.into(),
        }
    }
}

/// 단일 probe: 자기 형식이 맞으면 `Some`
pub type Probe = fn(&[u8]) -> Option<Classification>;

/// probe 순서 (첫 성공이 이김)
pub const PROBES: &[(&str, Probe)] = &[
    ("json", probe_json),
    ("xml", probe_xml),
    ("tag-value", probe_tag_value),
];

/// 바이트 덩어리를 분류합니다.
///
/// 결정적입니다: 같은 입력은 항상 같은 결과를 냅니다.
pub fn classify(data: &[u8]) -> Classification {
    for (name, probe) in PROBES {
        if let Some(found) = probe(data) {
            tracing::trace!(probe = name, format = %found.format, "probe matched");
            return found;
        }
    }
    Classification::unknown()
}

/// 알려진 SBOM 형식인지 확인합니다.
pub fn is_sbom(data: &[u8]) -> bool {
    classify(data).format.is_known()
}

// --- JSON ---

const CYCLONEDX_BOM_FORMAT: &str = "CycloneDX";
const SPDX_REF_PREFIX: &str = "SPDXRef-";

/// JSON probe: `bomFormat == "CycloneDX"` 또는 `SPDXID`가 `SPDXRef-`로 시작
pub fn probe_json(data: &[u8]) -> Option<Classification> {
    let value: Value = serde_json::from_slice(data).ok()?;
    let obj = value.as_object()?;

    let is_cyclonedx = obj
        .get("bomFormat")
        .and_then(Value::as_str)
        .is_some_and(|f| f.eq_ignore_ascii_case(CYCLONEDX_BOM_FORMAT));
    if is_cyclonedx {
        return Some(Classification::new(
            SbomFormat::CycloneDxJson,
            string_field(&value, "specVersion"),
        ));
    }

    let is_spdx = obj
        .get("SPDXID")
        .and_then(Value::as_str)
        .is_some_and(|id| id.starts_with(SPDX_REF_PREFIX));
    if is_spdx {
        return Some(Classification::new(
            SbomFormat::SpdxJson,
            string_field(&value, "spdxVersion"),
        ));
    }

    None
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

// --- XML ---

const CYCLONEDX_ROOT: &[u8] = b"bom";

/// XML probe: 문서 전체가 well-formed이고 루트 요소가 `bom`
///
/// 루트 이름은 네임스페이스 접두사를 떼고 비교합니다 (`cdx:bom`도 허용).
pub fn probe_xml(data: &[u8]) -> Option<Classification> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();
    let mut depth: usize = 0;
    // Some((is_bom, version))
    let mut root: Option<(bool, String)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if depth == 0 {
                    if root.is_some() {
                        return None;
                    }
                    root = Some(inspect_root(&e)?);
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 {
                    if root.is_some() {
                        return None;
                    }
                    root = Some(inspect_root(&e)?);
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.checked_sub(1)?;
            }
            Ok(Event::Text(t)) => {
                // 루트 밖의 공백이 아닌 텍스트는 XML 문서가 아님
                if depth == 0 && !t.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
        buf.clear();
    }

    if depth != 0 {
        return None;
    }
    match root {
        Some((true, version)) => Some(Classification::new(SbomFormat::CycloneDxXml, version)),
        _ => None,
    }
}

fn inspect_root(e: &BytesStart<'_>) -> Option<(bool, String)> {
    let is_bom = e.local_name().as_ref() == CYCLONEDX_ROOT;
    let version = match e.try_get_attribute("version") {
        Ok(Some(attr)) => attr.unescape_value().ok()?.into_owned(),
        Ok(None) => String::new(),
        Err(_) => return None,
    };
    Some((is_bom, version))
}

// --- tag-value ---

const SPDX_VERSION_TAG: &str = "SPDXVersion:";
const SPDX_LICENSE_TAG: &str = "SPDX-License-Identifier:";

/// tag-value probe: 줄이 `SPDXVersion:` 또는 `SPDX-License-Identifier:`로 시작
///
/// 앞쪽 공백만 허용합니다. 소스 코드 주석 속 `// SPDX-License-Identifier:`는 매칭하지 않습니다.
pub fn probe_tag_value(data: &[u8]) -> Option<Classification> {
    let text = String::from_utf8_lossy(data);
    let mut matched = false;
    let mut version: Option<&str> = None;

    for line in text.lines() {
        let line = line.trim_start();
        if let Some(rest) = line.strip_prefix(SPDX_VERSION_TAG) {
            matched = true;
            if version.is_none() {
                version = Some(rest.trim());
            }
        } else if line.starts_with(SPDX_LICENSE_TAG) {
            matched = true;
        }
    }

    matched.then(|| Classification::new(SbomFormat::SpdxTag, version.unwrap_or_default()))
}
