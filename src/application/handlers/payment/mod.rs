//! Payment webhook handling: verification, idempotency and reconciliation.

mod dispatcher;
mod handle_payment_webhook;
mod idempotent_processor;
mod ledger_pruner;
mod reconciliation_engine;

pub use dispatcher::{DispatchOutcome, PaymentEventDispatcher, WebhookDispatcher};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, PaymentWebhookError,
};
pub use idempotent_processor::{IdempotentWebhookProcessor, WebhookResult};
pub use ledger_pruner::LedgerPruner;
pub use reconciliation_engine::{ReconcileOutcome, ReconciliationEngine};
