//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//! - `/health` - 헬스 체크
//! - `/api/crypto` - 캐시된 가격 스냅샷

pub mod crypto;
pub mod health;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// 라우터 생성
///
/// # Route Structure
///
/// ```text
/// GET  /health       - 서버 상태 확인
/// GET  /api/crypto   - 가격 스냅샷 조회
/// ```
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))

        // Price snapshot
        .route("/api/crypto", get(crypto::get_crypto))

        // 미들웨어
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        // 상태 주입
        .with_state(state)
}

/// CORS 설정
///
/// - 프로덕션: `ALLOWED_ORIGINS`에 지정된 도메인만, GET만 허용
/// - 그 외: 모든 origin 허용
fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.is_production() {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([axum::http::Method::GET])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
