//! Enrollment store port.
//!
//! Completing a purchase touches three records: the course's student set,
//! the user's course set and the purchase status. Implementations apply all
//! three as one unit where the backend allows it. Where it does not, each
//! step must be safe to repeat so that a redelivered event finishes the job.

use async_trait::async_trait;

use crate::domain::foundation::{CourseId, DomainError, PurchaseId, UserId};
use crate::domain::purchase::PurchaseStatus;

/// Request to complete a pending purchase and enroll its buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentCommit {
    pub purchase_id: PurchaseId,
    pub user_id: UserId,
    pub course_id: CourseId,
    /// Purchase version observed when the records were loaded.
    pub expected_version: i64,
}

/// Result of a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed {
        added_student_to_course: bool,
        added_course_to_user: bool,
        version: i64,
    },
    /// Someone else settled the purchase first. Nothing was written.
    AlreadySettled(PurchaseStatus),
}

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Adds the user to the course and the course to the user (each only if
    /// missing), then marks the purchase completed.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` if the purchase is still pending but its
    ///   version moved past `expected_version`
    /// - `PurchaseNotFound` / `UserNotFound` / `CourseNotFound` if a record
    ///   vanished after it was loaded
    /// - `DatabaseError` on persistence failure
    async fn commit_enrollment(
        &self,
        commit: &EnrollmentCommit,
    ) -> Result<CommitOutcome, DomainError>;
}
