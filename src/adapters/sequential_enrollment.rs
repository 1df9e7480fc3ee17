//! Enrollment commit for stores without multi-record transactions.
//!
//! This is the fallback `EnrollmentStore` for repository backends that can
//! only save one record at a time. The Postgres and in-memory stores commit
//! atomically and do not need it.
//!
//! Writes the course side, then the user side, then the purchase status.
//! Each side is written only if it is missing, and the status write is the
//! last step, so an interrupted commit leaves the purchase pending and a
//! redelivered event finishes it without duplicating entries.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::purchase::PurchaseStatus;
use crate::ports::{
    CommitOutcome, CourseRepository, EnrollmentCommit, EnrollmentStore, PurchaseRepository,
    UserRepository,
};

pub struct SequentialEnrollmentStore {
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    purchases: Arc<dyn PurchaseRepository>,
}

impl SequentialEnrollmentStore {
    pub fn new(
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        purchases: Arc<dyn PurchaseRepository>,
    ) -> Self {
        Self {
            users,
            courses,
            purchases,
        }
    }
}

#[async_trait]
impl EnrollmentStore for SequentialEnrollmentStore {
    async fn commit_enrollment(
        &self,
        commit: &EnrollmentCommit,
    ) -> Result<CommitOutcome, DomainError> {
        let mut purchase = self
            .purchases
            .find_by_id(&commit.purchase_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::PurchaseNotFound, commit.purchase_id.to_string())
            })?;
        if purchase.status != PurchaseStatus::Pending {
            return Ok(CommitOutcome::AlreadySettled(purchase.status));
        }
        if purchase.version != commit.expected_version {
            return Err(DomainError::conflict(format!(
                "purchase {} is at version {}, commit expected {}",
                commit.purchase_id, purchase.version, commit.expected_version
            )));
        }

        let mut course = self
            .courses
            .find_by_id(&commit.course_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(ErrorCode::CourseNotFound, commit.course_id.to_string())
            })?;
        let added_student_to_course = course.enroll_student(commit.user_id.clone());
        if added_student_to_course {
            self.courses.save(&course).await?;
        }

        let mut user = self
            .users
            .find_by_id(&commit.user_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, commit.user_id.to_string()))?;
        let added_course_to_user = user.enroll(commit.course_id.clone());
        if added_course_to_user {
            self.users.save(&user).await?;
        }

        purchase.complete()?;
        let version = self.purchases.save(&purchase).await?;

        Ok(CommitOutcome::Committed {
            added_student_to_course,
            added_course_to_user,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::course::Course;
    use crate::domain::foundation::{CourseId, PurchaseId, UserId};
    use crate::domain::purchase::Purchase;
    use crate::domain::user::{User, UserProfile};

    fn ids() -> (PurchaseId, UserId, CourseId) {
        (
            PurchaseId::new("p1").unwrap(),
            UserId::new("u1").unwrap(),
            CourseId::new("c1").unwrap(),
        )
    }

    async fn setup() -> (InMemoryStore, SequentialEnrollmentStore) {
        let (purchase_id, user_id, course_id) = ids();
        let store = InMemoryStore::new();
        store
            .insert_user(User::new(
                user_id.clone(),
                UserProfile {
                    email: "u1@example.com".to_string(),
                    name: "U One".to_string(),
                    image_url: String::new(),
                },
            ))
            .await;
        store.insert_course(Course::new(course_id.clone(), "Rust 101")).await;
        store
            .insert_purchase(Purchase::pending(purchase_id, user_id, course_id, 1000, "usd"))
            .await;

        let sequential = SequentialEnrollmentStore::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        );
        (store, sequential)
    }

    fn commit() -> EnrollmentCommit {
        let (purchase_id, user_id, course_id) = ids();
        EnrollmentCommit {
            purchase_id,
            user_id,
            course_id,
            expected_version: 0,
        }
    }

    #[tokio::test]
    async fn commits_all_three_writes() {
        let (store, sequential) = setup().await;

        let outcome = sequential.commit_enrollment(&commit()).await.unwrap();

        assert!(matches!(outcome, CommitOutcome::Committed { version: 1, .. }));
        assert_eq!(
            store.purchase("p1").await.unwrap().status,
            PurchaseStatus::Completed
        );
        assert!(store
            .user("u1")
            .await
            .unwrap()
            .is_enrolled_in(&CourseId::new("c1").unwrap()));
    }

    #[tokio::test]
    async fn resumes_after_partial_enrollment() {
        let (store, sequential) = setup().await;
        // Earlier attempt wrote the course side only.
        let mut course = store.course("c1").await.unwrap();
        course.enroll_student(UserId::new("u1").unwrap());
        store.insert_course(course).await;

        let outcome = sequential.commit_enrollment(&commit()).await.unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                added_student_to_course: false,
                added_course_to_user: true,
                version: 1,
            }
        );
        assert_eq!(store.course("c1").await.unwrap().enrolled_students.len(), 1);
    }

    #[tokio::test]
    async fn replay_is_a_no_op() {
        let (store, sequential) = setup().await;
        sequential.commit_enrollment(&commit()).await.unwrap();

        let outcome = sequential.commit_enrollment(&commit()).await.unwrap();

        assert_eq!(outcome, CommitOutcome::AlreadySettled(PurchaseStatus::Completed));
        assert_eq!(store.user("u1").await.unwrap().enrolled_courses.len(), 1);
    }
}
