//! LedgerPruner - background removal of old processed-event records.
//!
//! Stripe stops redelivering an event after a few days, so ledger rows
//! older than the retention window no longer protect anything.
//!
//! ## Graceful Shutdown
//!
//! The loop listens on a watch channel and returns once `true` is sent.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time;

use crate::domain::foundation::DomainError;
use crate::ports::WebhookEventRepository;

pub struct LedgerPruner {
    ledger: Arc<dyn WebhookEventRepository>,
    retention: chrono::Duration,
    interval: Duration,
}

impl LedgerPruner {
    pub fn new(
        ledger: Arc<dyn WebhookEventRepository>,
        retention: chrono::Duration,
        interval: Duration,
    ) -> Self {
        Self {
            ledger,
            retention,
            interval,
        }
    }

    /// Deletes records processed before `now - retention`.
    pub async fn prune_once(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let cutoff = now - self.retention;
        let removed = self.ledger.delete_before(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, cutoff = %cutoff, "Pruned processed webhook events");
        }
        Ok(removed)
    }

    /// Run the pruning loop until shutdown is signalled.
    ///
    /// Failed runs are logged and retried on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::debug!("Ledger pruner stopping");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(err) = self.prune_once(Utc::now()).await {
                        tracing::warn!(error = %err, "Ledger pruning failed");
                    }
                }
            }
        }
    }
}
