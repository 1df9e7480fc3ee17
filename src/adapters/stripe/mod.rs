//! Stripe adapters.
//!
//! - `StripeCheckoutClient` - REST lookup of checkout sessions by payment intent
//! - `MockCheckoutSessions` - configurable stand-in for tests and local runs
//!
//! # Security
//!
//! The API key is held as `secrecy::SecretString` and only exposed when the
//! request's basic-auth header is built.

mod checkout_client;
mod mock_checkout_sessions;

pub use checkout_client::{StripeCheckoutClient, StripeConfig};
pub use mock_checkout_sessions::MockCheckoutSessions;
