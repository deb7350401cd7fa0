//! Periodic sweep of expired refresh tokens
//!
//! Expired rows are already invisible to lookups; the sweep only keeps the
//! table from growing without bound.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::RefreshTokenRepository;

/// Service for deleting expired refresh tokens in the background
pub struct RefreshTokenCleanupService<R: RefreshTokenRepository + 'static> {
    repository: Arc<R>,
    interval: Duration,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl<R: RefreshTokenRepository + 'static> RefreshTokenCleanupService<R> {
    /// Create a new cleanup service running every `interval`
    pub fn new(repository: Arc<R>, interval: Duration) -> Self {
        Self {
            repository,
            interval,
            task: Mutex::new(None),
        }
    }

    /// Run a single cleanup cycle
    pub async fn run_cleanup(&self) -> Result<CleanupResult, DomainError> {
        let expired_tokens_deleted = self.repository.delete_expired().await?;
        if expired_tokens_deleted > 0 {
            info!(deleted = expired_tokens_deleted, "Deleted expired refresh tokens");
        }
        Ok(CleanupResult {
            expired_tokens_deleted,
        })
    }

    /// Start the sweep as a background task; a no-op if already running
    ///
    /// # Returns
    /// * `Err(DomainError::Validation)` - The interval is zero
    pub async fn start(self: &Arc<Self>) -> Result<(), DomainError> {
        if self.interval.is_zero() {
            return Err(DomainError::validation(
                "refresh token cleanup interval must be positive",
            ));
        }

        let mut slot = self.task.lock().await;
        if slot.is_some() {
            warn!("Refresh token cleanup already running");
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let service = Arc::clone(self);

        let handle = tokio::spawn(async move {
            info!(
                interval_secs = service.interval.as_secs(),
                "Refresh token cleanup started"
            );
            let mut ticker = tokio::time::interval(service.interval);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = service.run_cleanup().await {
                            error!(error = %e, "Refresh token cleanup cycle failed");
                        }
                    }
                }
            }
        });

        *slot = Some((cancel, handle));
        Ok(())
    }

    /// Stop the background task and wait for it to exit
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        if let Some((cancel, handle)) = task {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "Refresh token cleanup task ended abnormally");
            }
        }
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupResult {
    /// Number of expired refresh tokens deleted
    pub expired_tokens_deleted: u64,
}
