//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `PriceSource`: 업스트림 가격 API (CoinGecko / Token API)
//! - `SnapshotWriter` / `SnapshotReader`: 스냅샷 캐시
//! - `RefreshHandle`: 주기적 갱신 루프
//! - `FeedbackClient`: 피드백 API Gateway 클라이언트

mod price_source;
mod snapshot;
mod refresher;
pub mod feedback;

pub use price_source::{
    build_http_client, fetch_outcome, from_config, CoinGeckoSource, PriceSource, TokenApiSource,
};
pub use snapshot::{snapshot_channel, SnapshotReader, SnapshotWriter};
pub use refresher::{refresh_once, spawn_refresh_loop, RefreshHandle};
pub use feedback::{FeedbackBoard, FeedbackClient, FeedbackList, GatewayPayload};
