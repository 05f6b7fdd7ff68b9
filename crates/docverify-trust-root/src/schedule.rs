//! Periodic trust root refresh

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::store::{RefreshOutcome, TrustAnchorStore};

/// Refresh `store` every `period` until the returned task is aborted.
///
/// The first tick is skipped because callers perform the startup refresh
/// themselves. Ticks missed while a refresh runs are dropped, not replayed.
pub fn spawn_refresh_task(store: Arc<TrustAnchorStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;

        loop {
            interval.tick().await;
            match store.refresh().await {
                Ok(RefreshOutcome::Updated { count, version }) => {
                    tracing::info!("scheduled refresh loaded {} roots (version {})", count, version)
                }
                Ok(RefreshOutcome::Retained { reason }) => {
                    tracing::warn!("scheduled refresh kept previous roots: {}", reason)
                }
                Ok(RefreshOutcome::Skipped) => {
                    tracing::debug!("scheduled refresh skipped, previous run still active")
                }
                Err(e) => tracing::error!("scheduled refresh failed: {}", e),
            }
        }
    })
}
