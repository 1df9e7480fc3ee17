//! HTTP handlers for the webhook endpoints.
//!
//! Both endpoints take the body as raw `Bytes`; signatures are computed over
//! the exact bytes received.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, PaymentWebhookError,
    SyncIdentityCommand, SyncIdentityHandler,
};
use crate::domain::identity::{SVIX_ID_HEADER, SVIX_SIGNATURE_HEADER, SVIX_TIMESTAMP_HEADER};
use crate::domain::payment::STRIPE_SIGNATURE_HEADER;
use crate::domain::webhook::VerificationError;

use super::dto::{ErrorResponse, IdentityFailureResponse, ReceivedResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub payment_webhook: Arc<HandlePaymentWebhookHandler>,
    pub identity_sync: Arc<SyncIdentityHandler>,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /payment-webhook - Handle Stripe payment events
pub async fn handle_payment_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, PaymentWebhookApiError> {
    let signature = header(&headers, STRIPE_SIGNATURE_HEADER)
        .ok_or(VerificationError::MissingHeader(STRIPE_SIGNATURE_HEADER))
        .map_err(PaymentWebhookError::from)?;

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let result = state.payment_webhook.handle(cmd).await?;
    tracing::debug!(result = ?result, "Payment webhook acknowledged");

    Ok((StatusCode::OK, Json(ReceivedResponse::ok())))
}

/// POST /identity-webhook - Mirror identity provider user events
///
/// Always answers 200; failures are reported in the body.
pub async fn handle_identity_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let cmd = SyncIdentityCommand {
        payload: body.to_vec(),
        svix_id: header(&headers, SVIX_ID_HEADER),
        svix_timestamp: header(&headers, SVIX_TIMESTAMP_HEADER),
        svix_signature: header(&headers, SVIX_SIGNATURE_HEADER),
    };

    match state.identity_sync.handle(cmd).await {
        Ok(outcome) => {
            tracing::info!(outcome = ?outcome, "Identity webhook processed");
            (StatusCode::OK, Json(serde_json::json!({}))).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Identity webhook rejected");
            (StatusCode::OK, Json(IdentityFailureResponse::new(err.to_string()))).into_response()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts payment webhook failures to HTTP responses.
#[derive(Debug)]
pub struct PaymentWebhookApiError(PaymentWebhookError);

impl From<PaymentWebhookError> for PaymentWebhookApiError {
    fn from(err: PaymentWebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PaymentWebhookApiError {
    fn into_response(self) -> Response {
        match self.0 {
            PaymentWebhookError::Verification(err) => {
                (StatusCode::BAD_REQUEST, format!("Webhook Error: {}", err)).into_response()
            }
            PaymentWebhookError::Reconcile(err) => {
                let status = err.status_code();
                if status == StatusCode::BAD_REQUEST {
                    tracing::error!(error = %err, "Payment event rejected as invalid");
                }
                (status, Json(ErrorResponse::new(err.to_string()))).into_response()
            }
        }
    }
}
