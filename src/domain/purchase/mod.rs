//! Purchase lifecycle: the record a payment outcome settles.

mod aggregate;
mod reconciliation;
mod status;

pub use aggregate::Purchase;
pub use reconciliation::{plan_failed, plan_succeeded, EnrollmentPlan, FailedPlan, SucceededPlan};
pub use status::PurchaseStatus;
