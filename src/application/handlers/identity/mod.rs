//! Identity webhook handling.

mod sync_identity;

pub use sync_identity::{SyncIdentityCommand, SyncIdentityHandler, SyncOutcome};
