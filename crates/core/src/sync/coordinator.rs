//! Polling coordinator: owns the authoritative snapshot and serializes
//! refresh-and-mutate sequences.
//!
//! The coordinator never runs two refreshes concurrently: a refresh that
//! arrives while one is in flight is skipped, and the trailing refresh of a
//! mutation coalesces with whatever refresh is already running. Mutation
//! failures propagate to the caller and suppress the trailing refresh so a
//! failed write never masquerades as a successful sync.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use listonic_domain::{ItemPatch, Result, ShoppingItem, Snapshot};
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::sync::ports::ShoppingListOps;

/// Refresh failure classification for the host.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Credentials are no longer usable; the host should prompt for
    /// re-entry instead of retrying on its normal schedule.
    #[error("Re-authentication required: {0}")]
    AuthRequired(String),

    /// Transient failure; the host may retry on its normal schedule. The
    /// last good snapshot stays visible.
    #[error("Refresh failed: {0}")]
    UpdateFailed(String),
}

/// Outcome of the most recent refresh attempt, published to subscribers
/// after every attempt.
#[derive(Debug, Clone, Default)]
pub struct RefreshStatus {
    /// Timestamp of the last successful refresh, if any.
    pub last_success: Option<DateTime<Utc>>,
    /// Whether the most recent attempt succeeded.
    pub last_attempt_ok: bool,
}

/// Owns the snapshot, drives refreshes, and write-through mutations.
pub struct SyncCoordinator {
    ops: Arc<dyn ShoppingListOps>,
    snapshot: RwLock<Snapshot>,
    /// In-progress guard: a second refresh must not start while one is in
    /// flight.
    refresh_gate: Mutex<()>,
    poll_interval: RwLock<Duration>,
    status_tx: watch::Sender<RefreshStatus>,
}

impl SyncCoordinator {
    /// Create a coordinator with an empty snapshot.
    pub fn new(ops: Arc<dyn ShoppingListOps>, poll_interval: Duration) -> Self {
        let (status_tx, _) = watch::channel(RefreshStatus::default());
        Self {
            ops,
            snapshot: RwLock::new(Snapshot::default()),
            refresh_gate: Mutex::new(()),
            poll_interval: RwLock::new(poll_interval),
            status_tx,
        }
    }

    /// Current snapshot (cloned; the authoritative copy stays internal).
    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// Outcome of the most recent refresh attempt.
    pub fn status(&self) -> RefreshStatus {
        self.status_tx.borrow().clone()
    }

    /// Subscribe to refresh outcomes. A value is published after every
    /// refresh attempt, successful or not.
    pub fn subscribe(&self) -> watch::Receiver<RefreshStatus> {
        self.status_tx.subscribe()
    }

    pub async fn poll_interval(&self) -> Duration {
        *self.poll_interval.read().await
    }

    /// Change the poll interval; takes effect on the next scheduled tick.
    pub async fn set_poll_interval(&self, interval: Duration) {
        *self.poll_interval.write().await = interval;
        info!(interval_secs = interval.as_secs(), "poll interval updated");
    }

    /// Fetch all lists and replace the snapshot wholesale.
    ///
    /// Skips silently when a refresh is already in flight. On failure the
    /// previous snapshot is left untouched and the failure class tells the
    /// host whether to re-collect credentials or simply try again later.
    pub async fn refresh(&self) -> std::result::Result<(), RefreshError> {
        let Ok(_guard) = self.refresh_gate.try_lock() else {
            debug!("refresh already in flight, skipping");
            return Ok(());
        };

        match self.ops.get_lists().await {
            Ok(lists) => {
                let snapshot = Snapshot::from_lists(lists);
                debug!(lists = snapshot.len(), "refresh complete");
                *self.snapshot.write().await = snapshot;
                self.status_tx.send_replace(RefreshStatus {
                    last_success: Some(Utc::now()),
                    last_attempt_ok: true,
                });
                Ok(())
            }
            Err(err) => {
                let last_success = self.status_tx.borrow().last_success;
                self.status_tx.send_replace(RefreshStatus { last_success, last_attempt_ok: false });
                if err.is_auth() {
                    Err(RefreshError::AuthRequired(err.to_string()))
                } else {
                    Err(RefreshError::UpdateFailed(err.to_string()))
                }
            }
        }
    }

    /// Add an item, then refresh.
    pub async fn add_item(
        &self,
        list_id: i64,
        name: &str,
        quantity: Option<&str>,
        unit: Option<&str>,
    ) -> Result<ShoppingItem> {
        let item = self.ops.add_item(list_id, name, quantity, unit).await?;
        self.refresh_after_mutation().await;
        Ok(item)
    }

    /// Apply a sparse update, then refresh. Prior item state is taken from
    /// the snapshot so the returned item reflects full state whenever the
    /// item is known locally.
    pub async fn update_item(
        &self,
        list_id: i64,
        item_id: i64,
        patch: ItemPatch,
    ) -> Result<ShoppingItem> {
        let prior = self.snapshot.read().await.item(list_id, item_id).cloned();
        let item = self.ops.update_item(list_id, item_id, patch, prior).await?;
        self.refresh_after_mutation().await;
        Ok(item)
    }

    /// Mark an item checked, then refresh.
    pub async fn check_item(&self, list_id: i64, item_id: i64) -> Result<ShoppingItem> {
        let prior = self.snapshot.read().await.item(list_id, item_id).cloned();
        let item = self.ops.check_item(list_id, item_id, prior).await?;
        self.refresh_after_mutation().await;
        Ok(item)
    }

    /// Mark an item unchecked, then refresh.
    pub async fn uncheck_item(&self, list_id: i64, item_id: i64) -> Result<ShoppingItem> {
        let prior = self.snapshot.read().await.item(list_id, item_id).cloned();
        let item = self.ops.uncheck_item(list_id, item_id, prior).await?;
        self.refresh_after_mutation().await;
        Ok(item)
    }

    /// Delete an item, then refresh.
    pub async fn delete_item(&self, list_id: i64, item_id: i64) -> Result<()> {
        self.ops.delete_item(list_id, item_id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Delete several items with a single trailing refresh. A failed delete
    /// aborts the batch and suppresses the refresh.
    pub async fn delete_items(&self, list_id: i64, item_ids: &[i64]) -> Result<()> {
        for &item_id in item_ids {
            self.ops.delete_item(list_id, item_id).await?;
        }
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Trailing refresh after a successful mutation. Failures are recorded
    /// in the published status rather than propagated: the mutation itself
    /// succeeded, and the host observes refresh health via `subscribe`.
    async fn refresh_after_mutation(&self) {
        match self.refresh().await {
            Ok(()) => {}
            Err(RefreshError::AuthRequired(msg)) => {
                error!(%msg, "post-mutation refresh requires re-authentication");
            }
            Err(RefreshError::UpdateFailed(msg)) => {
                warn!(%msg, "post-mutation refresh failed");
            }
        }
    }
}
