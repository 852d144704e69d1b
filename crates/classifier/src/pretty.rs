//! verbose 출력용 pretty-print

use serde_json::Value;

use crate::error::ClassifierError;

/// 본문을 JSON으로 디코드한 뒤 2칸 들여쓰기로 다시 인코딩합니다 (끝에 개행 포함).
///
/// JSON이 아닌 본문은 [`ClassifierError::PrettyPrint`]를 반환하며, 치명적인지는 호출자가 정합니다.
/// 키 순서는 원본 순서를 유지하므로 같은 입력에 여러 번 적용해도 결과가 같습니다.
pub fn pretty_print(data: &[u8]) -> Result<String, ClassifierError> {
    let value: Value =
        serde_json::from_slice(data).map_err(|e| ClassifierError::PrettyPrint(e.to_string()))?;
    let mut out =
        serde_json::to_string_pretty(&value).map_err(|e| ClassifierError::PrettyPrint(e.to_string()))?;
    out.push('\n');
    Ok(out)
}
