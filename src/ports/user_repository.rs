//! User repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::user::{User, UserProfileUpdate};

/// Persistence for mirrored users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` if a user with the same id already exists
    /// - `DatabaseError` on persistence failure
    async fn create(&self, user: &User) -> Result<(), DomainError>;

    /// Applies a partial profile update.
    ///
    /// Returns `false` if no such user exists. Enrollments are never touched.
    async fn update_profile(
        &self,
        id: &UserId,
        update: &UserProfileUpdate,
    ) -> Result<bool, DomainError>;

    /// Deletes the user. Returns `false` if no such user exists.
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Writes the full record, inserting it if absent.
    async fn save(&self, user: &User) -> Result<(), DomainError>;
}
