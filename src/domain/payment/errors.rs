//! Reconciliation error types.
//!
//! Every failure the payment webhook can surface after the signature has been
//! verified. The HTTP status of each variant drives the sender's retry
//! behavior: 4xx other than 409 is terminal, 409 and 5xx are redelivered.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{CourseId, DomainError, ErrorCode, PurchaseId, UserId};

/// Errors that occur while reconciling a payment event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Event is structurally invalid (e.g. no payment intent id).
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// No checkout session references the payment intent.
    #[error("No checkout session found for payment intent {0}")]
    SessionNotFound(String),

    /// The checkout session carries no purchase reference.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    #[error("Purchase not found: {0}")]
    PurchaseNotFound(PurchaseId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),

    /// Another delivery changed the purchase first.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Payment provider call failed.
    #[error("Payment provider error: {0}")]
    Provider(String),

    /// Store operation failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ReconcileError {
    /// Returns true if the sender should redeliver the event.
    ///
    /// Lookup failures are retried because the checkout flow that creates
    /// sessions and purchases may not have finished writing yet.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ReconcileError::MalformedEvent(_) | ReconcileError::MissingMetadata(_)
        )
    }

    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Bad request - don't retry
            ReconcileError::MalformedEvent(_) | ReconcileError::MissingMetadata(_) => {
                StatusCode::BAD_REQUEST
            }

            // Referential gaps and races - retry
            ReconcileError::SessionNotFound(_)
            | ReconcileError::PurchaseNotFound(_)
            | ReconcileError::UserNotFound(_)
            | ReconcileError::CourseNotFound(_)
            | ReconcileError::ConcurrentModification(_) => StatusCode::CONFLICT,

            ReconcileError::Provider(_) | ReconcileError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DomainError> for ReconcileError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ConcurrentModification => {
                ReconcileError::ConcurrentModification(err.message().to_string())
            }
            _ => ReconcileError::Storage(err.to_string()),
        }
    }
}
