//! PostgreSQL implementation of EnrollmentStore.
//!
//! The purchase row is locked with `FOR UPDATE` first, so two deliveries of
//! the same payment serialize on it. Enrollment arrays are appended only when
//! the id is absent. Everything commits in one transaction or not at all.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::purchase::PurchaseStatus;
use crate::ports::{CommitOutcome, EnrollmentCommit, EnrollmentStore};

use super::{corrupt_row, db_error};

pub struct PostgresEnrollmentStore {
    pool: PgPool,
}

impl PostgresEnrollmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentStore for PostgresEnrollmentStore {
    async fn commit_enrollment(
        &self,
        commit: &EnrollmentCommit,
    ) -> Result<CommitOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("start enrollment transaction", e))?;

        let locked: Option<(String, i64)> =
            sqlx::query_as("SELECT status, version FROM purchases WHERE id = $1 FOR UPDATE")
                .bind(commit.purchase_id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_error("lock purchase", e))?;

        let (status, version) = locked.ok_or_else(|| {
            DomainError::new(ErrorCode::PurchaseNotFound, commit.purchase_id.to_string())
        })?;
        let status: PurchaseStatus = status
            .parse()
            .map_err(|e| corrupt_row("purchases.status", e))?;

        // Dropping `tx` without commit rolls back and releases the lock.
        if status != PurchaseStatus::Pending {
            return Ok(CommitOutcome::AlreadySettled(status));
        }
        if version != commit.expected_version {
            return Err(DomainError::conflict(format!(
                "purchase {} is at version {}, commit expected {}",
                commit.purchase_id, version, commit.expected_version
            )));
        }

        let user_exists: Option<(bool,)> =
            sqlx::query_as("SELECT true FROM users WHERE id = $1 FOR UPDATE")
                .bind(commit.user_id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_error("lock user", e))?;
        if user_exists.is_none() {
            return Err(DomainError::new(
                ErrorCode::UserNotFound,
                commit.user_id.to_string(),
            ));
        }

        let course_exists: Option<(bool,)> =
            sqlx::query_as("SELECT true FROM courses WHERE id = $1 FOR UPDATE")
                .bind(commit.course_id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_error("lock course", e))?;
        if course_exists.is_none() {
            return Err(DomainError::new(
                ErrorCode::CourseNotFound,
                commit.course_id.to_string(),
            ));
        }

        let added_student_to_course = sqlx::query(
            r#"
            UPDATE courses
            SET enrolled_students = array_append(enrolled_students, $2)
            WHERE id = $1 AND NOT ($2 = ANY(enrolled_students))
            "#,
        )
        .bind(commit.course_id.as_str())
        .bind(commit.user_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("enroll student in course", e))?
        .rows_affected()
            > 0;

        let added_course_to_user = sqlx::query(
            r#"
            UPDATE users
            SET enrolled_courses = array_append(enrolled_courses, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(enrolled_courses))
            "#,
        )
        .bind(commit.user_id.as_str())
        .bind(commit.course_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("add course to user", e))?
        .rows_affected()
            > 0;

        let (version,): (i64,) = sqlx::query_as(
            r#"
            UPDATE purchases
            SET status = $2, version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING version
            "#,
        )
        .bind(commit.purchase_id.as_str())
        .bind(PurchaseStatus::Completed.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("complete purchase", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit enrollment transaction", e))?;

        Ok(CommitOutcome::Committed {
            added_student_to_course,
            added_course_to_user,
            version,
        })
    }
}
