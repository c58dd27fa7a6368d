//! Snapshot Cache
//!
//! 단일 writer / 다중 reader 스냅샷 슬롯
//!
//! # Architecture
//! ```text
//! ┌──────────────┐  publish   ┌──────────────────────────┐  latest   ┌──────────────┐
//! │ Refresh Loop │───────────▶│ watch<Option<Arc<Snap>>> │──────────▶│ HTTP Handler │
//! │   (Writer)   │            │     (single slot)        │           │   (Reader)   │
//! └──────────────┘            └──────────────────────────┘           └──────────────┘
//! ```
//!
//! 새 스냅샷은 불변 `Arc`로 만들어 통째로 교체하므로 reader가 반쯤 쓰인 값을 볼 일이 없음.

use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound, Utc};
use tokio::sync::watch;

use crate::types::{FetchOutcome, Snapshot};

/// 스냅샷 채널 생성 (초기 상태: 비어 있음)
pub fn snapshot_channel() -> (SnapshotWriter, SnapshotReader) {
    let (tx, rx) = watch::channel(None);
    (SnapshotWriter { tx }, SnapshotReader { rx })
}

/// 스냅샷 발행 권한 (Refresh Loop 전용)
#[derive(Debug)]
pub struct SnapshotWriter {
    tx: watch::Sender<Option<Arc<Snapshot>>>,
}

impl SnapshotWriter {
    /// 결과를 새 스냅샷으로 발행
    ///
    /// `last_update`는 밀리초 단위이며 직전 스냅샷보다 항상 큼.
    /// `&mut self`이므로 동시에 두 번 발행될 수 없음
    pub fn publish(&mut self, outcome: FetchOutcome) -> Arc<Snapshot> {
        self.publish_at(outcome, Utc::now())
    }

    fn publish_at(&mut self, outcome: FetchOutcome, now: DateTime<Utc>) -> Arc<Snapshot> {
        let mut last_update = truncate_millis(now);
        if let Some(previous) = self.tx.borrow().as_ref() {
            if last_update <= previous.last_update {
                last_update = previous.last_update + Duration::milliseconds(1);
            }
        }

        let snapshot = Arc::new(Snapshot {
            outcome,
            last_update,
        });
        self.tx.send_replace(Some(snapshot.clone()));
        snapshot
    }

    /// 이 writer에 연결된 reader 생성
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// 스냅샷 조회 핸들 (복제 가능, non-blocking)
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Option<Arc<Snapshot>>>,
}

impl SnapshotReader {
    /// 현재 스냅샷 (아직 없으면 `None`)
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.rx.borrow().clone()
    }

    /// 한 번이라도 발행되었는지
    pub fn is_available(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// 다음 발행까지 대기
    ///
    /// writer가 drop되면 `None`
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }
}

fn truncate_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::milliseconds(1)).unwrap_or(at)
}
