//! Crypto Price Endpoint
//!
//! 캐시된 스냅샷을 그대로 반환. 요청마다 메모리 읽기만 수행하며 업스트림을 호출하지 않음.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{error::ApiError, types::FetchOutcome, AppState};

pub const NOT_YET_AVAILABLE: &str = "Data not yet available. Please try again in a moment.";

/// 가격 응답 (`{ success, data?, error?, lastUpdate }`)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoResponse {
    #[serde(flatten)]
    pub outcome: FetchOutcome,
    /// 마지막 갱신 시도 시각 (ISO-8601, 밀리초)
    pub last_update: String,
}

/// GET /api/crypto
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": { "bitcoin": { "usd": 43000.5, "usd_24h_change": 1.2 } },
///   "lastUpdate": "2024-01-15T10:30:00.123Z"
/// }
/// ```
///
/// 첫 갱신 전에는 503 `{ "success": false, "message": "..." }`
pub async fn get_crypto(State(state): State<AppState>) -> Result<Json<CryptoResponse>, ApiError> {
    let snapshot = state
        .snapshots
        .latest()
        .ok_or_else(|| ApiError::ServiceUnavailable(NOT_YET_AVAILABLE.to_string()))?;

    Ok(Json(CryptoResponse {
        outcome: snapshot.outcome.clone(),
        last_update: snapshot.last_update_iso(),
    }))
}
