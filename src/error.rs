//! Error Handling Module
//!
//! Provides type-safe error handling with proper HTTP status code mapping.
//! Uses thiserror for domain errors and integrates with tracing for structured logging.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API 에러 타입
///
/// HTTP 레이어가 직접 만드는 에러는 503 (데이터 없음) 뿐이며,
/// 업스트림 실패는 에러가 아니라 `success: false` 스냅샷으로 전달됨
#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 503 Service Unavailable ============
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// API 에러 응답 구조 (`{ success: false, message }` envelope)
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ServiceUnavailable(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        let body = ErrorResponse {
            success: false,
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// 업스트림 가격 API 에러
///
/// Fetcher 경계에서 모두 실패 envelope로 변환되며 갱신 루프까지 전파되지 않음
#[derive(Debug, Error)]
pub enum FetchError {
    /// non-2xx 응답
    #[error("API responded with status: {0}")]
    Status(u16),

    /// DNS, 연결 실패, 타임아웃, body 읽기 실패
    #[error("{0}")]
    Transport(String),

    /// JSON 파싱 실패
    #[error("{0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// 피드백 API Gateway 에러
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Request failed with status {0}")]
    Status(u16),

    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}
