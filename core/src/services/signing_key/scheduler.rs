//! Background rotation of the active signing key

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::SigningKeyRepository;

use super::manager::SigningKeyManager;

struct RotationTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs [`SigningKeyManager::rotate`] at 80% of the rotation period
///
/// One task at most: `start` fails while a task is running. `stop` cancels
/// the timer and waits for an in-flight rotation to finish.
pub struct KeyRotationScheduler<K: SigningKeyRepository + 'static> {
    manager: Arc<SigningKeyManager<K>>,
    task: Mutex<Option<RotationTask>>,
}

impl<K: SigningKeyRepository + 'static> KeyRotationScheduler<K> {
    pub fn new(manager: Arc<SigningKeyManager<K>>) -> Self {
        Self {
            manager,
            task: Mutex::new(None),
        }
    }

    /// Ensure a valid key exists, then spawn the rotation timer
    ///
    /// # Returns
    /// * `Ok(())` - Timer started
    /// * `Err(DomainError::BusinessRule)` - A timer is already running
    /// * `Err(DomainError)` - The initial key could not be ensured
    pub async fn start(&self) -> Result<(), DomainError> {
        let mut slot = self.task.lock().await;
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            return Err(DomainError::BusinessRule {
                message: "key rotation scheduler is already running".to_string(),
            });
        }

        self.manager.ensure_valid_key().await?;

        let interval = self.manager.config().rotation_interval();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let manager = Arc::clone(&self.manager);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; the key was just ensured.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("Key rotation scheduler shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        match manager.rotate().await {
                            Ok(key) => info!(key_id = %key.key_id, "Scheduled key rotation completed"),
                            Err(e) => error!(error = %e, "Scheduled key rotation failed, retrying next tick"),
                        }
                    }
                }
            }
        });

        info!(interval_secs = interval.as_secs(), "Key rotation scheduler started");
        *slot = Some(RotationTask { cancel, handle });
        Ok(())
    }

    /// Cancel the timer and wait for the task to exit
    ///
    /// A rotation already running completes first. Calling `stop` when the
    /// scheduler was never started is a no-op.
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        let Some(task) = task else {
            return;
        };

        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            warn!(error = %e, "Key rotation task ended abnormally");
        }
        info!("Key rotation scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }
}
