//! Webhook processor - short-circuits payment events already handled.
//!
//! ## Design
//!
//! 1. Check the ledger for the event id
//! 2. Dispatch to the reconciliation engine
//! 3. Record the outcome, but only when dispatch succeeded
//!
//! Failures are left unrecorded so the sender's retry runs the event again.
//! The engine is idempotent on its own; the ledger only saves the
//! session lookup and record loads on exact redeliveries.

use std::sync::Arc;

use crate::domain::payment::{ReconcileError, StripeEvent};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository};

use super::dispatcher::{DispatchOutcome, WebhookDispatcher};

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookResult {
    Processed(DispatchOutcome),
    /// Event id already in the ledger.
    AlreadyProcessed,
}

pub struct IdempotentWebhookProcessor {
    ledger: Arc<dyn WebhookEventRepository>,
    dispatcher: Arc<dyn WebhookDispatcher>,
}

impl IdempotentWebhookProcessor {
    pub fn new(
        ledger: Arc<dyn WebhookEventRepository>,
        dispatcher: Arc<dyn WebhookDispatcher>,
    ) -> Self {
        Self { ledger, dispatcher }
    }

    /// Process a webhook event at most once per successful attempt.
    pub async fn process(&self, event: &StripeEvent) -> Result<WebhookResult, ReconcileError> {
        if self.ledger.find_by_event_id(&event.id).await?.is_some() {
            tracing::info!(event_id = %event.id, event_type = %event.event_type, "Event already processed");
            return Ok(WebhookResult::AlreadyProcessed);
        }

        let outcome = match self.dispatcher.dispatch(event).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    retryable = err.is_retryable(),
                    error = %err,
                    "Payment event processing failed"
                );
                return Err(err);
            }
        };

        let payload = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
        let record = match outcome.ignored_reason() {
            None => WebhookEventRecord::processed(&event.id, &event.event_type, payload),
            Some(reason) => WebhookEventRecord::ignored(&event.id, &event.event_type, reason, payload),
        };

        // The work is already committed; a ledger hiccup only costs a
        // redundant replay later.
        match self.ledger.save(record).await {
            Ok(SaveResult::Inserted) => Ok(WebhookResult::Processed(outcome)),
            Ok(SaveResult::AlreadyExists) => Ok(WebhookResult::AlreadyProcessed),
            Err(err) => {
                tracing::warn!(event_id = %event.id, error = %err, "Failed to record processed event");
                Ok(WebhookResult::Processed(outcome))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryWebhookEventRepository;
    use crate::domain::payment::StripeEventBuilder;
    use crate::ports::LedgerOutcome;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // ══════════════════════════════════════════════════════════════
    // Test Infrastructure
    // ══════════════════════════════════════════════════════════════

    /// Dispatcher that counts calls and replays scripted results.
    struct ScriptedDispatcher {
        calls: AtomicU32,
        results: Mutex<Vec<Result<DispatchOutcome, ReconcileError>>>,
    }

    impl ScriptedDispatcher {
        fn new(results: Vec<Result<DispatchOutcome, ReconcileError>>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                results: Mutex::new(results),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WebhookDispatcher for ScriptedDispatcher {
        async fn dispatch(&self, _event: &StripeEvent) -> Result<DispatchOutcome, ReconcileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                Ok(DispatchOutcome::Unhandled("scripted".to_string()))
            } else {
                results.remove(0)
            }
        }
    }

    fn unhandled() -> Result<DispatchOutcome, ReconcileError> {
        Ok(DispatchOutcome::Unhandled("customer.created".to_string()))
    }

    // ══════════════════════════════════════════════════════════════
    // Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn first_delivery_is_dispatched_and_recorded() {
        let ledger = InMemoryWebhookEventRepository::new();
        let dispatcher = Arc::new(ScriptedDispatcher::new(vec![unhandled()]));
        let processor = IdempotentWebhookProcessor::new(Arc::new(ledger.clone()), dispatcher.clone());
        let event = StripeEventBuilder::new().id("evt_1").build();

        let result = processor.process(&event).await.unwrap();

        assert!(matches!(result, WebhookResult::Processed(_)));
        assert_eq!(dispatcher.call_count(), 1);
        let record = ledger.find_by_event_id("evt_1").await.unwrap().unwrap();
        assert_eq!(record.outcome, LedgerOutcome::Ignored);
    }

    #[tokio::test]
    async fn redelivery_is_short_circuited() {
        let ledger = InMemoryWebhookEventRepository::new();
        let dispatcher = Arc::new(ScriptedDispatcher::new(vec![unhandled(), unhandled()]));
        let processor = IdempotentWebhookProcessor::new(Arc::new(ledger), dispatcher.clone());
        let event = StripeEventBuilder::new().id("evt_dup").build();

        processor.process(&event).await.unwrap();
        let second = processor.process(&event).await.unwrap();

        assert_eq!(second, WebhookResult::AlreadyProcessed);
        assert_eq!(dispatcher.call_count(), 1);
    }

    #[tokio::test]
    async fn failure_is_not_recorded_and_retry_runs_again() {
        let ledger = InMemoryWebhookEventRepository::new();
        let dispatcher = Arc::new(ScriptedDispatcher::new(vec![
            Err(ReconcileError::SessionNotFound("pi_1".to_string())),
            unhandled(),
        ]));
        let processor = IdempotentWebhookProcessor::new(Arc::new(ledger.clone()), dispatcher.clone());
        let event = StripeEventBuilder::new().id("evt_retry").build();

        let first = processor.process(&event).await;
        assert!(first.is_err());
        assert!(ledger.is_empty().await);

        let second = processor.process(&event).await.unwrap();
        assert!(matches!(second, WebhookResult::Processed(_)));
        assert_eq!(dispatcher.call_count(), 2);
    }

    #[tokio::test]
    async fn different_events_are_processed_independently() {
        let ledger = InMemoryWebhookEventRepository::new();
        let dispatcher = Arc::new(ScriptedDispatcher::new(vec![]));
        let processor = IdempotentWebhookProcessor::new(Arc::new(ledger.clone()), dispatcher.clone());

        processor
            .process(&StripeEventBuilder::new().id("evt_a").build())
            .await
            .unwrap();
        processor
            .process(&StripeEventBuilder::new().id("evt_b").build())
            .await
            .unwrap();

        assert_eq!(dispatcher.call_count(), 2);
        assert_eq!(ledger.len().await, 2);
    }
}
