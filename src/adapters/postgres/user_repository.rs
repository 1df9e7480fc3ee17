//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{CourseId, DomainError, Timestamp, UserId};
use crate::domain::user::{User, UserProfileUpdate};
use crate::ports::UserRepository;

use super::{corrupt_row, db_error};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    image_url: String,
    enrolled_courses: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let enrolled_courses = row
            .enrolled_courses
            .into_iter()
            .map(CourseId::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| corrupt_row("users.enrolled_courses", e))?;

        Ok(User {
            id: UserId::new(row.id).map_err(|e| corrupt_row("users.id", e))?,
            email: row.email,
            name: row.name,
            image_url: row.image_url,
            enrolled_courses,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn course_ids(user: &User) -> Vec<String> {
    user.enrolled_courses
        .iter()
        .map(|id| id.as_str().to_string())
        .collect()
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, image_url, enrolled_courses, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image_url)
        .bind(course_ids(user))
        .bind(user.created_at.as_datetime())
        .bind(user.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return DomainError::conflict(format!("user {} already exists", user.id));
                }
            }
            db_error("create user", e)
        })?;

        Ok(())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &UserProfileUpdate,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                name = COALESCE($3, name),
                image_url = COALESCE($4, image_url),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(&update.email)
        .bind(&update.name)
        .bind(&update.image_url)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update user profile", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete user", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, email, name, image_url, enrolled_courses, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find user", e))?;

        row.map(User::try_from).transpose()
    }

    async fn save(&self, user: &User) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, image_url, enrolled_courses, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                image_url = EXCLUDED.image_url,
                enrolled_courses = EXCLUDED.enrolled_courses,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image_url)
        .bind(course_ids(user))
        .bind(user.created_at.as_datetime())
        .bind(user.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save user", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(enrolled: Vec<&str>) -> UserRow {
        UserRow {
            id: "user_1".to_string(),
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            image_url: String::new(),
            enrolled_courses: enrolled.into_iter().map(str::to_string).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_user() {
        let user = User::try_from(row(vec!["c1", "c2"])).unwrap();

        assert_eq!(user.id.as_str(), "user_1");
        assert_eq!(user.enrolled_courses.len(), 2);
    }

    #[test]
    fn blank_course_id_is_reported_as_corrupt() {
        let err = User::try_from(row(vec!["c1", ""])).unwrap_err();

        assert!(err.message().contains("users.enrolled_courses"));
    }
}
