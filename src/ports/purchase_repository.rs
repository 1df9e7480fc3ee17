//! Purchase repository port.
//!
//! Purchases are written with optimistic concurrency: every write carries the
//! version that was read, and the store rejects it if another writer got
//! there first.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PurchaseId};
use crate::domain::purchase::Purchase;

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError>;

    /// Inserts the purchase if absent, otherwise updates it when the stored
    /// version equals `purchase.version`.
    ///
    /// Returns the version now stored (unchanged for inserts, bumped by one
    /// for updates).
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` if the stored version differs
    /// - `DatabaseError` on persistence failure
    async fn save(&self, purchase: &Purchase) -> Result<i64, DomainError>;
}
