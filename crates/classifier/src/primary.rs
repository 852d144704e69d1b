//! 주 컴포넌트 추출: SBOM이 "무엇에 대한" 문서인지
//!
//! - CycloneDX: `metadata.component.{name, version}`
//! - SPDX: `SPDXRef-DOCUMENT`의 `DESCRIBES` 관계가 가리키는 패키지의 `{name, versionInfo}`
//!
//! 어느 쪽에서도 이름을 얻지 못하면 [`ClassifierError::PrimaryNotFound`]입니다.
//! 파일 이름 기반 대체값은 호출자(어댑터)의 몫입니다.

use sbomrelay_core::types::PrimaryComponent;
use serde_json::Value;

use crate::error::ClassifierError;

const SPDX_DOCUMENT_ID: &str = "SPDXRef-DOCUMENT";
const DESCRIBES: &str = "DESCRIBES";

/// JSON 형태의 SBOM 본문에서 주 컴포넌트를 추출합니다.
pub fn extract_primary(data: &[u8]) -> Result<PrimaryComponent, ClassifierError> {
    let doc: Value =
        serde_json::from_slice(data).map_err(|_| ClassifierError::PrimaryNotFound)?;

    cyclonedx_primary(&doc)
        .or_else(|| spdx_primary(&doc))
        .ok_or(ClassifierError::PrimaryNotFound)
}

fn cyclonedx_primary(doc: &Value) -> Option<PrimaryComponent> {
    let component = doc.pointer("/metadata/component")?;
    let name = non_empty_str(component, "name")?;
    Some(PrimaryComponent {
        name: name.to_owned(),
        version: str_or_empty(component, "version"),
    })
}

fn spdx_primary(doc: &Value) -> Option<PrimaryComponent> {
    let relationships = doc.get("relationships")?.as_array()?;
    let packages = doc.get("packages")?.as_array()?;

    relationships
        .iter()
        .filter(|rel| {
            rel.get("spdxElementId").and_then(Value::as_str) == Some(SPDX_DOCUMENT_ID)
                && rel
                    .get("relationshipType")
                    .and_then(Value::as_str)
                    .is_some_and(|t| t.to_uppercase() == DESCRIBES)
        })
        .filter_map(|rel| rel.get("relatedSpdxElement").and_then(Value::as_str))
        .find_map(|target| {
            let package = packages
                .iter()
                .find(|p| p.get("SPDXID").and_then(Value::as_str) == Some(target))?;
            let name = non_empty_str(package, "name")?;
            Some(PrimaryComponent {
                name: name.to_owned(),
                version: str_or_empty(package, "versionInfo"),
            })
        })
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn str_or_empty(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}
