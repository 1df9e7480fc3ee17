//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `UserRepository`, `CourseRepository`, `PurchaseRepository` - Record CRUD
//! - `EnrollmentStore` - Completes a purchase and its enrollment as one unit
//! - `WebhookEventRepository` - Processed payment webhook ledger
//!
//! ## Provider Ports
//!
//! - `CheckoutSessionLookup` - Finds the checkout session behind a payment intent

mod checkout_sessions;
mod course_repository;
mod enrollment_store;
mod purchase_repository;
mod user_repository;
mod webhook_event_repository;

pub use checkout_sessions::{
    CheckoutSession, CheckoutSessionLookup, PaymentError, PaymentErrorCode,
    PURCHASE_ID_METADATA_KEY,
};
pub use course_repository::CourseRepository;
pub use enrollment_store::{CommitOutcome, EnrollmentCommit, EnrollmentStore};
pub use purchase_repository::PurchaseRepository;
pub use user_repository::UserRepository;
pub use webhook_event_repository::{
    LedgerOutcome, SaveResult, WebhookEventRecord, WebhookEventRepository,
};
