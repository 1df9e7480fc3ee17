//! Payment module - Stripe events, signature verification and reconciliation errors.

mod errors;
mod stripe_event;
mod webhook_verifier;

pub use errors::ReconcileError;
pub use stripe_event::{PaymentEventKind, StripeEvent, StripeEventData};
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier, STRIPE_SIGNATURE_HEADER};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
