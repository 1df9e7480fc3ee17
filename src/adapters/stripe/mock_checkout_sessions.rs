//! Mock checkout session lookup for testing.
//!
//! Supports:
//! - Pre-configured sessions per payment intent
//! - Error injection
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{CheckoutSession, CheckoutSessionLookup, PaymentError, PURCHASE_ID_METADATA_KEY};

#[derive(Default)]
pub struct MockCheckoutSessions {
    inner: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    sessions: HashMap<String, Vec<CheckoutSession>>,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Payment intent ids looked up, in order.
    calls: Vec<String>,
}

impl MockCheckoutSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a session for `payment_intent_id`, with `purchaseId`
    /// metadata when `purchase_id` is given.
    pub fn add_session(&self, payment_intent_id: &str, session_id: &str, purchase_id: Option<&str>) {
        let mut metadata = HashMap::new();
        if let Some(purchase_id) = purchase_id {
            metadata.insert(PURCHASE_ID_METADATA_KEY.to_string(), purchase_id.to_string());
        }
        self.state()
            .sessions
            .entry(payment_intent_id.to_string())
            .or_default()
            .push(CheckoutSession {
                id: session_id.to_string(),
                metadata,
            });
    }

    /// Makes the next lookup fail with `error`.
    pub fn fail_next(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl CheckoutSessionLookup for MockCheckoutSessions {
    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Vec<CheckoutSession>, PaymentError> {
        let mut state = self.state();
        state.calls.push(payment_intent_id.to_string());

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(state
            .sessions
            .get(payment_intent_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_registered_sessions() {
        let mock = MockCheckoutSessions::new();
        mock.add_session("pi_1", "cs_1", Some("p1"));

        let sessions = mock.find_by_payment_intent("pi_1").await.unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].purchase_id(), Some("p1"));
        assert!(mock.find_by_payment_intent("pi_other").await.unwrap().is_empty());
        assert_eq!(mock.calls(), vec!["pi_1".to_string(), "pi_other".to_string()]);
    }

    #[tokio::test]
    async fn injected_error_is_returned_once() {
        let mock = MockCheckoutSessions::new();
        mock.fail_next(PaymentError::network("boom"));

        assert!(mock.find_by_payment_intent("pi_1").await.is_err());
        assert!(mock.find_by_payment_intent("pi_1").await.is_ok());
    }
}
