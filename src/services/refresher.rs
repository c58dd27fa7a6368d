//! Refresh Loop
//!
//! 주기적으로 업스트림을 조회해 스냅샷을 발행하는 백그라운드 태스크
//!
//! # Behavior
//!
//! - 시작 즉시 1회 갱신, 이후 고정 주기 (기본 5000ms)
//! - tick마다 fetch를 별도 태스크로 실행 → 느린 fetch가 다음 tick을 막지 않음 (중첩 허용)
//! - fetch 결과는 채널로 루프 태스크에 돌아오고, writer를 소유한 루프만 발행
//! - backoff / jitter 없음, 실패도 그대로 스냅샷으로 발행
//! - `RefreshHandle::shutdown()`으로 타이머 정지 (진행 중인 fetch 결과는 버림)

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::price_source::{fetch_outcome, PriceSource};
use super::snapshot::SnapshotWriter;
use crate::types::{FetchOutcome, Snapshot};

/// 갱신 1회: fetch → publish
pub async fn refresh_once(source: &dyn PriceSource, writer: &mut SnapshotWriter) -> Arc<Snapshot> {
    let outcome = fetch_outcome(source).await;
    publish(writer, outcome)
}

fn publish(writer: &mut SnapshotWriter, outcome: FetchOutcome) -> Arc<Snapshot> {
    let snapshot = writer.publish(outcome);

    tracing::info!(
        success = snapshot.outcome.success,
        "[{}] Crypto data updated",
        snapshot.last_update_iso()
    );

    snapshot
}

/// 갱신 루프 시작
pub fn spawn_refresh_loop(
    source: Arc<dyn PriceSource>,
    mut writer: SnapshotWriter,
    period: Duration,
) -> RefreshHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 루프가 sender를 하나 들고 있으므로 recv()는 None을 반환하지 않음
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
        // 핸들이 drop되면 detach 상태로 프로세스 종료까지 계속 실행
        let mut detached = false;

        tracing::debug!(source = source.name(), period_ms = period.as_millis() as u64, "Refresh loop started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed(), if !detached => {
                    if changed.is_ok() {
                        break;
                    }
                    detached = true;
                }
                Some(outcome) = outcome_rx.recv() => {
                    publish(&mut writer, outcome);
                }
                _ = ticker.tick() => {
                    let source = source.clone();
                    let outcome_tx = outcome_tx.clone();
                    tokio::spawn(async move {
                        let outcome = fetch_outcome(source.as_ref()).await;
                        // 루프가 이미 종료됐으면 결과는 버림
                        let _ = outcome_tx.send(outcome);
                    });
                }
            }
        }

        tracing::info!("Refresh loop stopped");
    });

    RefreshHandle { shutdown_tx, task }
}

/// 갱신 루프 핸들
///
/// drop해도 루프는 멈추지 않음 (detach)
pub struct RefreshHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// 타이머를 멈추고 루프 종료까지 대기
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "Refresh loop task ended abnormally");
        }
    }

    /// 대기 없이 루프 중단
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
