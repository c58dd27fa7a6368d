//! Health Check Endpoint
//!
//! 로드밸런서 / App Runner liveness check 용. 데이터 유무와 상관없이 항상 200.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{types::to_iso_millis, AppState};

/// Health check 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// 스냅샷이 한 번이라도 발행되었는지
    pub data_available: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: to_iso_millis(&chrono::Utc::now()),
        data_available: state.snapshots.is_available(),
    })
}
