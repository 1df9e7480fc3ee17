//! Pure decision logic for applying a payment outcome to a purchase.
//!
//! The engine loads the records, asks these functions what to do, and hands
//! the resulting plan to the store. Keeping the decisions here lets the
//! replay and ordering rules be tested without any I/O.

use crate::domain::course::Course;
use crate::domain::user::User;

use super::{Purchase, PurchaseStatus};

/// What a payment-succeeded event should do to a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SucceededPlan {
    /// Replay of an already applied success. Nothing to write.
    AlreadyCompleted,
    /// The purchase was settled as failed earlier. Terminal, left untouched.
    AlreadyFailed,
    /// Enroll (adding only the sides that are missing) and complete.
    Enroll(EnrollmentPlan),
}

/// Which halves of the joint enrollment still have to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentPlan {
    pub add_student_to_course: bool,
    pub add_course_to_user: bool,
}

impl EnrollmentPlan {
    /// Both sides already hold the enrollment; only the status changes.
    pub fn is_status_only(&self) -> bool {
        !self.add_student_to_course && !self.add_course_to_user
    }
}

/// What a payment-failed event should do to a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedPlan {
    MarkFailed,
    /// Already settled (completed or failed). Terminal states are one-way.
    AlreadySettled(PurchaseStatus),
}

pub fn plan_succeeded(purchase: &Purchase, user: &User, course: &Course) -> SucceededPlan {
    match purchase.status {
        PurchaseStatus::Completed => SucceededPlan::AlreadyCompleted,
        PurchaseStatus::Failed => SucceededPlan::AlreadyFailed,
        PurchaseStatus::Pending => SucceededPlan::Enroll(EnrollmentPlan {
            add_student_to_course: !course.has_student(&user.id),
            add_course_to_user: !user.is_enrolled_in(&course.id),
        }),
    }
}

pub fn plan_failed(purchase: &Purchase) -> FailedPlan {
    if purchase.status.is_terminal() {
        FailedPlan::AlreadySettled(purchase.status)
    } else {
        FailedPlan::MarkFailed
    }
}
