//! PostgreSQL implementation of CourseRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::course::Course;
use crate::domain::foundation::{CourseId, DomainError, UserId};
use crate::ports::CourseRepository;

use super::{corrupt_row, db_error};

pub struct PostgresCourseRepository {
    pool: PgPool,
}

impl PostgresCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: String,
    title: String,
    enrolled_students: Vec<String>,
}

impl TryFrom<CourseRow> for Course {
    type Error = DomainError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        let enrolled_students = row
            .enrolled_students
            .into_iter()
            .map(UserId::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| corrupt_row("courses.enrolled_students", e))?;

        Ok(Course {
            id: CourseId::new(row.id).map_err(|e| corrupt_row("courses.id", e))?,
            title: row.title,
            enrolled_students,
        })
    }
}

#[async_trait]
impl CourseRepository for PostgresCourseRepository {
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, DomainError> {
        let row: Option<CourseRow> =
            sqlx::query_as("SELECT id, title, enrolled_students FROM courses WHERE id = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find course", e))?;

        row.map(Course::try_from).transpose()
    }

    async fn save(&self, course: &Course) -> Result<(), DomainError> {
        let students: Vec<String> = course
            .enrolled_students
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO courses (id, title, enrolled_students)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                enrolled_students = EXCLUDED.enrolled_students
            "#,
        )
        .bind(course.id.as_str())
        .bind(&course.title)
        .bind(students)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save course", e))?;

        Ok(())
    }
}
