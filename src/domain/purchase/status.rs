//! Purchase status state machine.
//!
//! A purchase starts `Pending` when the checkout session is created and is
//! settled exactly once by the payment outcome. Settled states are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Payment status of a course purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Checkout session created, payment outcome not yet known.
    Pending,

    /// Payment succeeded and the buyer is enrolled.
    Completed,

    /// Payment failed. No enrollment.
    Failed,
}

impl PurchaseStatus {
    /// Returns true if transition from self to target is valid.
    pub fn can_transition_to(&self, target: &Self) -> bool {
        use PurchaseStatus::*;
        matches!((self, target), (Pending, Completed) | (Pending, Failed))
    }

    /// Performs transition with validation, returning error if invalid.
    pub fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "status",
                format!("Cannot transition from {} to {}", self, target),
            ))
        }
    }

    /// Completed and failed purchases never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PurchaseStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PurchaseStatus::Pending),
            "completed" => Ok(PurchaseStatus::Completed),
            "failed" => Ok(PurchaseStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown value '{}'", other),
            )),
        }
    }
}
