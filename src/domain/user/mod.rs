//! User module - local user records mirrored from the identity provider.

mod aggregate;

pub use aggregate::{User, UserProfile, UserProfileUpdate};
