use async_trait::async_trait;

use crate::domain::course::Course;
use crate::domain::foundation::{CourseId, DomainError};

/// Persistence for courses. Only the enrollment side is written here;
/// course authoring lives elsewhere.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, DomainError>;

    /// Writes the full record, inserting it if absent.
    async fn save(&self, course: &Course) -> Result<(), DomainError>;
}
