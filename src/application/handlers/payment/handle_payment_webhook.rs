//! HandlePaymentWebhookHandler - verifies a Stripe delivery and processes it.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::payment::{ReconcileError, StripeWebhookVerifier};
use crate::domain::webhook::VerificationError;

use super::idempotent_processor::{IdempotentWebhookProcessor, WebhookResult};

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

#[derive(Debug, Error)]
pub enum PaymentWebhookError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

pub struct HandlePaymentWebhookHandler {
    verifier: Arc<StripeWebhookVerifier>,
    processor: Arc<IdempotentWebhookProcessor>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: Arc<StripeWebhookVerifier>,
        processor: Arc<IdempotentWebhookProcessor>,
    ) -> Self {
        Self {
            verifier,
            processor,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<WebhookResult, PaymentWebhookError> {
        // 1. Verify webhook signature and parse event
        let event = self
            .verifier
            .verify(&cmd.payload, &cmd.signature)
            .map_err(|e| {
                tracing::warn!(error = %e, "Payment webhook signature verification failed");
                e
            })?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            "Received payment webhook"
        );

        // 2. Process once
        Ok(self.processor.process(&event).await?)
    }
}
