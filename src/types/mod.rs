//! Common Types Module
//!
//! 애플리케이션 전반에서 사용되는 공통 타입 정의

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// 성공/실패 envelope
///
/// `data`는 성공 시에만, `error`는 실패 시에만 직렬화됨
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// 한 번의 갱신 시도 결과 (업스트림 payload 그대로)
pub type FetchOutcome = Envelope<Value>;

/// 캐시된 스냅샷
///
/// 한 번 발행되면 변경되지 않음 (새 스냅샷으로 교체만 가능)
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub outcome: FetchOutcome,
    pub last_update: DateTime<Utc>,
}

impl Snapshot {
    /// `lastUpdate` 직렬화 형식 (밀리초, `Z` 접미사)
    pub fn last_update_iso(&self) -> String {
        to_iso_millis(&self.last_update)
    }
}

/// `2024-01-15T10:30:00.123Z` 형태
pub fn to_iso_millis(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
