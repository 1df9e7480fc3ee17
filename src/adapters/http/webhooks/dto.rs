//! HTTP DTOs for the webhook endpoints.

use serde::{Deserialize, Serialize};

/// Acknowledgement for an accepted payment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedResponse {
    pub received: bool,
}

impl ReceivedResponse {
    pub fn ok() -> Self {
        Self { received: true }
    }
}

/// Failure body for payment events that passed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Failure body for the identity webhook. Sent with a 200 status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityFailureResponse {
    pub success: bool,
    pub message: String,
}

impl IdentityFailureResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
