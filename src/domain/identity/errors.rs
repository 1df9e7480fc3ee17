use thiserror::Error;

use crate::domain::foundation::{DomainError, ValidationError};
use crate::domain::webhook::VerificationError;

/// Errors raised while mirroring an identity event.
///
/// All of them are reported to the sender as `{success: false, message}`
/// with a 200 status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentitySyncError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("Malformed identity event: {0}")]
    MalformedEvent(String),

    #[error("User {0} has no email address")]
    MissingEmail(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<ValidationError> for IdentitySyncError {
    fn from(err: ValidationError) -> Self {
        IdentitySyncError::MalformedEvent(err.to_string())
    }
}

impl From<DomainError> for IdentitySyncError {
    fn from(err: DomainError) -> Self {
        IdentitySyncError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_error_message_passes_through() {
        let err: IdentitySyncError = VerificationError::SignatureMismatch.into();
        assert_eq!(
            err.to_string(),
            "No signatures found matching the expected signature for payload"
        );
    }

    #[test]
    fn validation_error_is_malformed_event() {
        let err: IdentitySyncError = ValidationError::empty_field("data.id").into();
        assert!(matches!(err, IdentitySyncError::MalformedEvent(_)));
    }
}
