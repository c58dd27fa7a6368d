//! Crypto Price API Library
//!
//! # Overview
//!
//! 서드파티 가격 API를 주기적으로 조회해 메모리에 캐시하고 그대로 재제공하는 백엔드.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌────────────────┐
//! │ Refresh Loop │────▶│ PriceSource │────▶│  Upstream API  │
//! └──────┬───────┘     └─────────────┘     └────────────────┘
//!        │ publish
//!        ▼
//! ┌──────────────┐ latest ┌────────────┐
//! │   Snapshot   │───────▶│   Routes   │────▶ client
//! └──────────────┘        └────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: 업스트림 조회, 스냅샷 캐시, 갱신 루프, 피드백 클라이언트
//! - `types`: 공통 타입 정의
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crypto_price_api::{config::Config, routes, services, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let source = services::from_config(&config.upstream, config.upstream_timeout)?;
//!     let (writer, reader) = services::snapshot_channel();
//!     let refresher = services::spawn_refresh_loop(source, writer, config.refresh_interval);
//!
//!     // ... 서버 시작
//!     refresher.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use config::Config;
pub use error::{ApiError, FeedbackError, FetchError};
pub use services::{PriceSource, RefreshHandle, SnapshotReader};

/// 애플리케이션 전역 상태
///
/// 핸들러는 스냅샷을 읽기만 함 (발행은 Refresh Loop 전용)
#[derive(Clone)]
pub struct AppState {
    pub snapshots: SnapshotReader,
    pub config: Arc<Config>,
}
