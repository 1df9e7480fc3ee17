//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresUserRepository` - Users mirrored from the identity provider
//! - `PostgresCourseRepository` - Course enrollment lists
//! - `PostgresPurchaseRepository` - Purchases with version checks
//! - `PostgresEnrollmentStore` - Transactional enrollment commit
//! - `PostgresWebhookEventRepository` - Processed payment event ledger

mod course_repository;
mod enrollment_store;
mod purchase_repository;
mod user_repository;
mod webhook_event_repository;

pub use course_repository::PostgresCourseRepository;
pub use enrollment_store::PostgresEnrollmentStore;
pub use purchase_repository::PostgresPurchaseRepository;
pub use user_repository::PostgresUserRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

fn db_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, err))
}

/// A stored value that no longer passes domain validation.
fn corrupt_row(column: &str, err: ValidationError) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid value in {}: {}", column, err),
    )
}
