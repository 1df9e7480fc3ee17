//! Application layer - command handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::identity::{SyncIdentityCommand, SyncIdentityHandler, SyncOutcome};
pub use handlers::payment::{
    DispatchOutcome, HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
    IdempotentWebhookProcessor, LedgerPruner, PaymentEventDispatcher, PaymentWebhookError,
    ReconcileOutcome, ReconciliationEngine, WebhookDispatcher, WebhookResult,
};
