//! 오브젝트 스토어 어댑터 설정

/// S3 어댑터 설정
///
/// `prefix`는 항상 `/`로 끝나도록 정규화됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    /// 버킷 이름
    pub bucket: String,
    /// 리전
    pub region: String,
    /// 키 접두사 (`/`로 끝남)
    pub prefix: String,
}

impl S3Config {
    /// 설정을 만들고 접두사를 정규화합니다.
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            prefix: normalize_prefix(prefix.into()),
        }
    }

    /// 레코드 네임스페이스 (`bucket-prefix`)
    pub fn namespace(&self) -> String {
        format!("{}-{}", self.bucket, self.prefix)
    }

    /// 로그/에러용 위치 (`s3://bucket/prefix`)
    pub fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.prefix)
    }

    /// 오브젝트 키에서 접두사를 뗀 상대 키
    pub fn relative_key<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(self.prefix.as_str()).unwrap_or(key)
    }

    /// 상대 경로를 전체 오브젝트 키로 바꿉니다.
    pub fn object_key(&self, rel: &str) -> String {
        format!("{}{}", self.prefix, rel.trim_start_matches('/'))
    }
}

/// 접두사가 `/`로 끝나도록 보정합니다.
pub fn normalize_prefix(mut prefix: String) -> String {
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix
}
