//! HTTP adapter for webhook endpoints.
//!
//! - `POST /identity-webhook` - Mirror identity provider user events
//! - `POST /payment-webhook` - Reconcile Stripe payment events

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::WebhookAppState;
pub use routes::webhook_routes;
