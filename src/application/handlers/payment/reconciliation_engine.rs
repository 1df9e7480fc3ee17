//! ReconciliationEngine - applies payment outcomes to purchases.
//!
//! Resolution path for every payment event:
//!
//! ```text
//! data.object.id -> checkout session -> metadata.purchaseId -> Purchase -> User, Course
//! ```
//!
//! A succeeded payment completes a pending purchase and enrolls the buyer on
//! both sides. A failed payment marks a pending purchase failed. Completed
//! and failed purchases are terminal and never change again.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, PurchaseId};
use crate::domain::payment::{ReconcileError, StripeEvent};
use crate::domain::purchase::{
    plan_failed, plan_succeeded, FailedPlan, Purchase, PurchaseStatus, SucceededPlan,
};
use crate::ports::{
    CheckoutSessionLookup, CommitOutcome, CourseRepository, EnrollmentCommit, EnrollmentStore,
    PurchaseRepository, UserRepository, PURCHASE_ID_METADATA_KEY,
};

/// What reconciliation did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Purchase moved pending -> completed.
    Completed {
        purchase_id: PurchaseId,
        added_student_to_course: bool,
        added_course_to_user: bool,
    },
    /// Purchase moved pending -> failed.
    MarkedFailed { purchase_id: PurchaseId },
    /// Purchase was already settled; nothing written.
    AlreadySettled {
        purchase_id: PurchaseId,
        status: PurchaseStatus,
    },
    /// Failed payment that could not be tied to a purchase.
    Unresolved { reason: String },
}

impl ReconcileOutcome {
    /// True if this delivery wrote anything.
    pub fn changed_state(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::Completed { .. } | ReconcileOutcome::MarkedFailed { .. }
        )
    }
}

/// Orchestrates the payment state machine.
pub struct ReconciliationEngine {
    sessions: Arc<dyn CheckoutSessionLookup>,
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    enrollments: Arc<dyn EnrollmentStore>,
}

impl ReconciliationEngine {
    pub fn new(
        sessions: Arc<dyn CheckoutSessionLookup>,
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        enrollments: Arc<dyn EnrollmentStore>,
    ) -> Self {
        Self {
            sessions,
            users,
            courses,
            purchases,
            enrollments,
        }
    }

    /// Handles `payment_intent.succeeded`.
    ///
    /// Every lookup failure is an error so the sender redelivers; the
    /// checkout flow may not have finished writing its records yet.
    pub async fn handle_payment_succeeded(
        &self,
        event: &StripeEvent,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let purchase = self.resolve_purchase(event).await?;

        let user = self
            .users
            .find_by_id(&purchase.user_id)
            .await?
            .ok_or_else(|| ReconcileError::UserNotFound(purchase.user_id.clone()))?;
        let course = self
            .courses
            .find_by_id(&purchase.course_id)
            .await?
            .ok_or_else(|| ReconcileError::CourseNotFound(purchase.course_id.clone()))?;

        let plan = match plan_succeeded(&purchase, &user, &course) {
            SucceededPlan::AlreadyCompleted => {
                tracing::info!(
                    event_id = %event.id,
                    purchase_id = %purchase.id,
                    "Purchase already completed, skipping replay"
                );
                return Ok(settled(purchase.id, PurchaseStatus::Completed));
            }
            SucceededPlan::AlreadyFailed => {
                tracing::warn!(
                    event_id = %event.id,
                    purchase_id = %purchase.id,
                    "Payment succeeded for a purchase already marked failed, leaving it failed"
                );
                return Ok(settled(purchase.id, PurchaseStatus::Failed));
            }
            SucceededPlan::Enroll(plan) => plan,
        };

        tracing::debug!(
            event_id = %event.id,
            purchase_id = %purchase.id,
            add_student_to_course = plan.add_student_to_course,
            add_course_to_user = plan.add_course_to_user,
            status_only = plan.is_status_only(),
            "Committing enrollment"
        );

        let commit = EnrollmentCommit {
            purchase_id: purchase.id.clone(),
            user_id: purchase.user_id.clone(),
            course_id: purchase.course_id.clone(),
            expected_version: purchase.version,
        };
        let outcome = self
            .enrollments
            .commit_enrollment(&commit)
            .await
            .map_err(|e| store_error(e, &commit))?;

        match outcome {
            CommitOutcome::Committed {
                added_student_to_course,
                added_course_to_user,
                version,
            } => {
                tracing::info!(
                    event_id = %event.id,
                    purchase_id = %commit.purchase_id,
                    user_id = %commit.user_id,
                    course_id = %commit.course_id,
                    version,
                    "Purchase completed"
                );
                Ok(ReconcileOutcome::Completed {
                    purchase_id: commit.purchase_id,
                    added_student_to_course,
                    added_course_to_user,
                })
            }
            CommitOutcome::AlreadySettled(PurchaseStatus::Pending) => {
                Err(ReconcileError::ConcurrentModification(format!(
                    "purchase {} reported settled while pending",
                    commit.purchase_id
                )))
            }
            CommitOutcome::AlreadySettled(status) => {
                tracing::info!(
                    event_id = %event.id,
                    purchase_id = %commit.purchase_id,
                    status = %status,
                    "Purchase settled by a concurrent delivery"
                );
                Ok(settled(commit.purchase_id, status))
            }
        }
    }

    /// Handles `payment_intent.payment_failed`.
    ///
    /// A failure that cannot be tied to a purchase is acknowledged without
    /// action.
    pub async fn handle_payment_failed(
        &self,
        event: &StripeEvent,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let mut purchase = match self.resolve_purchase(event).await {
            Ok(purchase) => purchase,
            Err(
                err @ (ReconcileError::SessionNotFound(_)
                | ReconcileError::MissingMetadata(_)
                | ReconcileError::PurchaseNotFound(_)),
            ) => {
                tracing::info!(event_id = %event.id, reason = %err, "Failed payment not tied to a purchase");
                return Ok(ReconcileOutcome::Unresolved {
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        };

        match plan_failed(&purchase) {
            FailedPlan::AlreadySettled(status) => {
                tracing::info!(
                    event_id = %event.id,
                    purchase_id = %purchase.id,
                    status = %status,
                    "Purchase already settled, ignoring failed payment"
                );
                Ok(settled(purchase.id, status))
            }
            FailedPlan::MarkFailed => {
                purchase
                    .fail()
                    .map_err(|e| ReconcileError::Storage(e.to_string()))?;
                let version = self.purchases.save(&purchase).await?;

                tracing::info!(
                    event_id = %event.id,
                    purchase_id = %purchase.id,
                    version,
                    "Purchase marked failed"
                );
                Ok(ReconcileOutcome::MarkedFailed {
                    purchase_id: purchase.id,
                })
            }
        }
    }

    /// Steps shared by both handlers: payment intent -> session -> purchase.
    async fn resolve_purchase(&self, event: &StripeEvent) -> Result<Purchase, ReconcileError> {
        let payment_intent_id = event.payment_intent_id().ok_or_else(|| {
            ReconcileError::MalformedEvent("data.object.id is missing".to_string())
        })?;

        let sessions = self
            .sessions
            .find_by_payment_intent(payment_intent_id)
            .await?;
        let session = sessions.first().ok_or_else(|| {
            tracing::error!(
                event_id = %event.id,
                payment_intent_id,
                "No checkout session found for payment intent"
            );
            ReconcileError::SessionNotFound(payment_intent_id.to_string())
        })?;

        let purchase_id = session.purchase_id().ok_or_else(|| {
            tracing::error!(
                event_id = %event.id,
                session_id = %session.id,
                "Checkout session has no purchase reference"
            );
            ReconcileError::MissingMetadata(PURCHASE_ID_METADATA_KEY)
        })?;
        let purchase_id = PurchaseId::new(purchase_id)
            .map_err(|e| ReconcileError::MalformedEvent(e.to_string()))?;

        self.purchases
            .find_by_id(&purchase_id)
            .await?
            .ok_or(ReconcileError::PurchaseNotFound(purchase_id))
    }
}

fn settled(purchase_id: PurchaseId, status: PurchaseStatus) -> ReconcileOutcome {
    ReconcileOutcome::AlreadySettled {
        purchase_id,
        status,
    }
}

/// Maps an enrollment store failure onto the record it concerns.
fn store_error(err: DomainError, commit: &EnrollmentCommit) -> ReconcileError {
    match err.code {
        ErrorCode::PurchaseNotFound => ReconcileError::PurchaseNotFound(commit.purchase_id.clone()),
        ErrorCode::UserNotFound => ReconcileError::UserNotFound(commit.user_id.clone()),
        ErrorCode::CourseNotFound => ReconcileError::CourseNotFound(commit.course_id.clone()),
        _ => err.into(),
    }
}
