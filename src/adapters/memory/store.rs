//! In-memory record store.
//!
//! One `RwLock` guards users, courses and purchases together, so
//! `commit_enrollment` runs as a single critical section. Used by tests and
//! local runs without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::course::Course;
use crate::domain::foundation::{CourseId, DomainError, ErrorCode, PurchaseId, Timestamp, UserId};
use crate::domain::purchase::{Purchase, PurchaseStatus};
use crate::domain::user::{User, UserProfileUpdate};
use crate::ports::{
    CommitOutcome, CourseRepository, EnrollmentCommit, EnrollmentStore, PurchaseRepository,
    UserRepository,
};

#[derive(Default)]
struct Records {
    users: HashMap<UserId, User>,
    courses: HashMap<CourseId, Course>,
    purchases: HashMap<PurchaseId, Purchase>,
}

/// Shared in-memory implementation of every record port.
///
/// Cloning is cheap and every clone sees the same records.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<Records>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Seeding and inspection ===

    pub async fn insert_user(&self, user: User) {
        self.records.write().await.users.insert(user.id.clone(), user);
    }

    pub async fn insert_course(&self, course: Course) {
        self.records
            .write()
            .await
            .courses
            .insert(course.id.clone(), course);
    }

    pub async fn insert_purchase(&self, purchase: Purchase) {
        self.records
            .write()
            .await
            .purchases
            .insert(purchase.id.clone(), purchase);
    }

    pub async fn user(&self, id: &str) -> Option<User> {
        let id = UserId::new(id).ok()?;
        self.records.read().await.users.get(&id).cloned()
    }

    pub async fn course(&self, id: &str) -> Option<Course> {
        let id = CourseId::new(id).ok()?;
        self.records.read().await.courses.get(&id).cloned()
    }

    pub async fn purchase(&self, id: &str) -> Option<Purchase> {
        let id = PurchaseId::new(id).ok()?;
        self.records.read().await.purchases.get(&id).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &User) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        if records.users.contains_key(&user.id) {
            return Err(DomainError::conflict(format!("user {} already exists", user.id)));
        }
        records.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &UserProfileUpdate,
    ) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        match records.users.get_mut(id) {
            Some(user) => {
                user.apply_profile(update);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        Ok(self.records.write().await.users.remove(id).is_some())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.records.read().await.users.get(id).cloned())
    }

    async fn save(&self, user: &User) -> Result<(), DomainError> {
        self.records
            .write()
            .await
            .users
            .insert(user.id.clone(), user.clone());
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for InMemoryStore {
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, DomainError> {
        Ok(self.records.read().await.courses.get(id).cloned())
    }

    async fn save(&self, course: &Course) -> Result<(), DomainError> {
        self.records
            .write()
            .await
            .courses
            .insert(course.id.clone(), course.clone());
        Ok(())
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryStore {
    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError> {
        Ok(self.records.read().await.purchases.get(id).cloned())
    }

    async fn save(&self, purchase: &Purchase) -> Result<i64, DomainError> {
        let mut records = self.records.write().await;
        match records.purchases.get_mut(&purchase.id) {
            None => {
                records
                    .purchases
                    .insert(purchase.id.clone(), purchase.clone());
                Ok(purchase.version)
            }
            Some(stored) if stored.version != purchase.version => Err(DomainError::conflict(
                format!(
                    "purchase {} is at version {}, write expected {}",
                    purchase.id, stored.version, purchase.version
                ),
            )),
            Some(stored) => {
                *stored = purchase.clone();
                stored.version += 1;
                Ok(stored.version)
            }
        }
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryStore {
    async fn commit_enrollment(
        &self,
        commit: &EnrollmentCommit,
    ) -> Result<CommitOutcome, DomainError> {
        let mut guard = self.records.write().await;
        let records = &mut *guard;

        let purchase = records.purchases.get(&commit.purchase_id).ok_or_else(|| {
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
        if !records.users.contains_key(&commit.user_id) {
            return Err(DomainError::new(
                ErrorCode::UserNotFound,
                commit.user_id.to_string(),
            ));
        }
        let course = records.courses.get_mut(&commit.course_id).ok_or_else(|| {
            DomainError::new(ErrorCode::CourseNotFound, commit.course_id.to_string())
        })?;

        // All lookups passed; nothing below can fail, so the writes land together.
        let added_student_to_course = course.enroll_student(commit.user_id.clone());
        let added_course_to_user = match records.users.get_mut(&commit.user_id) {
            Some(user) => user.enroll(commit.course_id.clone()),
            None => false,
        };

        let version = match records.purchases.get_mut(&commit.purchase_id) {
            Some(purchase) => {
                purchase.complete()?;
                purchase.version += 1;
                purchase.version
            }
            None => commit.expected_version,
        };

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
    use crate::domain::user::UserProfile;

    fn profile() -> UserProfile {
        UserProfile {
            email: "u1@example.com".to_string(),
            name: "U One".to_string(),
            image_url: String::new(),
        }
    }

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_user(User::new(UserId::new("u1").unwrap(), profile()))
            .await;
        store
            .insert_course(Course::new(CourseId::new("c1").unwrap(), "Rust 101"))
            .await;
        store
            .insert_purchase(Purchase::pending(
                PurchaseId::new("p1").unwrap(),
                UserId::new("u1").unwrap(),
                CourseId::new("c1").unwrap(),
                4999,
                "usd",
            ))
            .await;
        store
    }

    fn commit(expected_version: i64) -> EnrollmentCommit {
        EnrollmentCommit {
            purchase_id: PurchaseId::new("p1").unwrap(),
            user_id: UserId::new("u1").unwrap(),
            course_id: CourseId::new("c1").unwrap(),
            expected_version,
        }
    }

    #[tokio::test]
    async fn commit_enrolls_both_sides_and_completes() {
        let store = seeded().await;

        let outcome = store.commit_enrollment(&commit(0)).await.unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                added_student_to_course: true,
                added_course_to_user: true,
                version: 1,
            }
        );
        let purchase = store.purchase("p1").await.unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Completed);
        assert_eq!(store.course("c1").await.unwrap().enrolled_students.len(), 1);
        assert_eq!(store.user("u1").await.unwrap().enrolled_courses.len(), 1);
    }

    #[tokio::test]
    async fn second_commit_sees_settled_purchase() {
        let store = seeded().await;
        store.commit_enrollment(&commit(0)).await.unwrap();

        let outcome = store.commit_enrollment(&commit(0)).await.unwrap();

        assert_eq!(outcome, CommitOutcome::AlreadySettled(PurchaseStatus::Completed));
        assert_eq!(store.course("c1").await.unwrap().enrolled_students.len(), 1);
    }

    #[tokio::test]
    async fn commit_with_stale_version_conflicts() {
        let store = seeded().await;

        let err = store.commit_enrollment(&commit(7)).await.unwrap_err();

        assert!(err.is_conflict());
        assert!(store.purchase("p1").await.unwrap().is_pending());
    }

    #[tokio::test]
    async fn commit_without_course_writes_nothing() {
        let store = InMemoryStore::new();
        store
            .insert_user(User::new(UserId::new("u1").unwrap(), profile()))
            .await;
        store
            .insert_purchase(Purchase::pending(
                PurchaseId::new("p1").unwrap(),
                UserId::new("u1").unwrap(),
                CourseId::new("c1").unwrap(),
                100,
                "usd",
            ))
            .await;

        let err = store.commit_enrollment(&commit(0)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::CourseNotFound);
        assert!(store.user("u1").await.unwrap().enrolled_courses.is_empty());
        assert!(store.purchase("p1").await.unwrap().is_pending());
    }

    #[tokio::test]
    async fn purchase_save_checks_version() {
        let store = seeded().await;
        let mut purchase = store.purchase("p1").await.unwrap();
        purchase.fail().unwrap();

        let version = PurchaseRepository::save(&store, &purchase).await.unwrap();
        assert_eq!(version, 1);

        let err = PurchaseRepository::save(&store, &purchase).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_user() {
        let store = seeded().await;
        let user = User::new(UserId::new("u1").unwrap(), profile());

        assert!(store.create(&user).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_users() {
        let store = InMemoryStore::new();
        let id = UserId::new("ghost").unwrap();

        assert!(!store
            .update_profile(&id, &UserProfileUpdate::default())
            .await
            .unwrap());
        assert!(!store.delete(&id).await.unwrap());
    }
}
