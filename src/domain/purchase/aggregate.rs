//! Purchase aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, PurchaseId, Timestamp, UserId, ValidationError};

use super::PurchaseStatus;

/// A buyer's purchase of a single course.
///
/// `version` is the optimistic-concurrency token. It is owned by the store:
/// repositories compare it on write and bump it after a successful update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub course_id: CourseId,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub status: PurchaseStatus,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Purchase {
    /// Creates a purchase awaiting its payment outcome.
    pub fn pending(
        id: PurchaseId,
        user_id: UserId,
        course_id: CourseId,
        amount: i64,
        currency: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            course_id,
            amount,
            currency: currency.into(),
            status: PurchaseStatus::Pending,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn complete(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(PurchaseStatus::Completed)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(PurchaseStatus::Failed)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == PurchaseStatus::Pending
    }
}
