//! Interval-based poll scheduler.
//!
//! Drives the coordinator's refresh on a timer. The interval is re-read
//! from the coordinator before every tick, so runtime interval changes
//! take effect at the next tick without a restart. Refresh failures are
//! logged and the loop keeps going; overlap protection lives in the
//! coordinator, not here.

use std::sync::Arc;
use std::time::Duration;

use listonic_core::{RefreshError, SyncCoordinator};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Periodic refresh driver with start/stop lifecycle.
pub struct PollScheduler {
    coordinator: Arc<SyncCoordinator>,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl PollScheduler {
    pub fn new(coordinator: Arc<SyncCoordinator>) -> Self {
        Self {
            coordinator,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler.
    ///
    /// Spawns a background task that refreshes on the coordinator's poll
    /// interval.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler is already running.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!("Starting poll scheduler");

        // A fresh token supports restart after stop.
        self.cancellation_token = CancellationToken::new();
        let coordinator = Arc::clone(&self.coordinator);
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::poll_loop(coordinator, cancel).await;
        });
        *self.task_handle.lock().await = Some(handle);

        info!("Poll scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully.
    ///
    /// Cancels the background task and awaits completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler is not running.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping poll scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::StopTimeout { duration: join_timeout, source })??;
        }

        info!("Poll scheduler stopped");
        Ok(())
    }

    /// Check if the scheduler is running.
    ///
    /// A scheduler is considered running if it has an active task handle
    /// that hasn't finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn poll_loop(coordinator: Arc<SyncCoordinator>, cancel: CancellationToken) {
        loop {
            let interval = coordinator.poll_interval().await;
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Poll loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    match coordinator.refresh().await {
                        Ok(()) => {}
                        Err(RefreshError::AuthRequired(msg)) => {
                            error!(%msg, "Scheduled refresh requires re-authentication");
                        }
                        Err(RefreshError::UpdateFailed(msg)) => {
                            warn!(%msg, "Scheduled refresh failed");
                        }
                    }
                }
            }
        }
    }
}

/// Ensure the background task stops when the scheduler is dropped.
impl Drop for PollScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            warn!("PollScheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
