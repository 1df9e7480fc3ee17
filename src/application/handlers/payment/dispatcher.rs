//! Routes verified payment events to the reconciliation engine.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::payment::{PaymentEventKind, ReconcileError, StripeEvent};

use super::reconciliation_engine::{ReconcileOutcome, ReconciliationEngine};

/// What dispatching an event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Reconciled(ReconcileOutcome),
    /// Event type with no handler. Acknowledged without action.
    Unhandled(String),
}

impl DispatchOutcome {
    /// Reason to record when nothing was written, `None` if state changed.
    pub fn ignored_reason(&self) -> Option<String> {
        match self {
            DispatchOutcome::Reconciled(outcome) if outcome.changed_state() => None,
            DispatchOutcome::Reconciled(ReconcileOutcome::AlreadySettled { status, .. }) => {
                Some(format!("purchase already {}", status))
            }
            DispatchOutcome::Reconciled(ReconcileOutcome::Unresolved { reason }) => {
                Some(reason.clone())
            }
            DispatchOutcome::Reconciled(_) => None,
            DispatchOutcome::Unhandled(tag) => Some(format!("unhandled event type {}", tag)),
        }
    }
}

/// Dispatches a verified event to its handler.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    async fn dispatch(&self, event: &StripeEvent) -> Result<DispatchOutcome, ReconcileError>;
}

pub struct PaymentEventDispatcher {
    engine: Arc<ReconciliationEngine>,
}

impl PaymentEventDispatcher {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl WebhookDispatcher for PaymentEventDispatcher {
    async fn dispatch(&self, event: &StripeEvent) -> Result<DispatchOutcome, ReconcileError> {
        match event.kind() {
            PaymentEventKind::PaymentIntentSucceeded => self
                .engine
                .handle_payment_succeeded(event)
                .await
                .map(DispatchOutcome::Reconciled),
            PaymentEventKind::PaymentIntentFailed => self
                .engine
                .handle_payment_failed(event)
                .await
                .map(DispatchOutcome::Reconciled),
            PaymentEventKind::Unhandled(tag) => {
                tracing::debug!(event_id = %event.id, event_type = %tag, "Unhandled event type");
                Ok(DispatchOutcome::Unhandled(tag))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::adapters::stripe::MockCheckoutSessions;
    use crate::domain::foundation::PurchaseId;
    use crate::domain::payment::StripeEventBuilder;
    use crate::domain::purchase::PurchaseStatus;

    fn dispatcher(sessions: Arc<MockCheckoutSessions>) -> PaymentEventDispatcher {
        let store = InMemoryStore::new();
        let engine = ReconciliationEngine::new(
            sessions,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        );
        PaymentEventDispatcher::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn unhandled_type_is_acknowledged_without_lookup() {
        let sessions = Arc::new(MockCheckoutSessions::new());
        let dispatcher = dispatcher(sessions.clone());
        let event = StripeEventBuilder::new().event_type("customer.created").build();

        let outcome = dispatcher.dispatch(&event).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Unhandled("customer.created".to_string()));
        assert!(sessions.calls().is_empty());
    }

    #[tokio::test]
    async fn succeeded_type_reaches_engine() {
        let sessions = Arc::new(MockCheckoutSessions::new());
        let dispatcher = dispatcher(sessions.clone());
        let event = StripeEventBuilder::new().build();

        let err = dispatcher.dispatch(&event).await.unwrap_err();

        assert!(matches!(err, ReconcileError::SessionNotFound(_)));
        assert_eq!(sessions.calls(), vec!["pi_test_123".to_string()]);
    }

    #[tokio::test]
    async fn failed_type_reaches_engine() {
        let sessions = Arc::new(MockCheckoutSessions::new());
        let dispatcher = dispatcher(sessions);
        let event = StripeEventBuilder::new()
            .event_type("payment_intent.payment_failed")
            .build();

        let outcome = dispatcher.dispatch(&event).await.unwrap();

        assert!(matches!(
            outcome,
            DispatchOutcome::Reconciled(ReconcileOutcome::Unresolved { .. })
        ));
    }

    #[test]
    fn ignored_reason_only_for_no_ops() {
        let completed = DispatchOutcome::Reconciled(ReconcileOutcome::Completed {
            purchase_id: PurchaseId::new("p1").unwrap(),
            added_student_to_course: true,
            added_course_to_user: true,
        });
        let settled = DispatchOutcome::Reconciled(ReconcileOutcome::AlreadySettled {
            purchase_id: PurchaseId::new("p1").unwrap(),
            status: PurchaseStatus::Completed,
        });

        assert_eq!(completed.ignored_reason(), None);
        assert_eq!(settled.ignored_reason().as_deref(), Some("purchase already completed"));
        assert!(DispatchOutcome::Unhandled("x".to_string()).ignored_reason().is_some());
    }
}
