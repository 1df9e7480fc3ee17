//! Axum router configuration for webhook endpoints.

use axum::{routing::post, Router};

use super::handlers::{handle_identity_webhook, handle_payment_webhook, WebhookAppState};

/// Create the webhook router.
///
/// Webhooks carry no user authentication; each is verified by signature.
///
/// # Routes
/// - `POST /identity-webhook` - Identity provider user events
/// - `POST /payment-webhook` - Stripe payment events
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new()
        .route("/identity-webhook", post(handle_identity_webhook))
        .route("/payment-webhook", post(handle_payment_webhook))
}
