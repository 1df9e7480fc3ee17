//! Identity module - user events from the auth provider and their Svix signatures.

mod errors;
mod identity_event;
mod svix_verifier;

pub use errors::IdentitySyncError;
pub use identity_event::{ClerkEmailAddress, ClerkUser, DeletedUser, IdentityEvent};
pub use svix_verifier::{
    SvixHeaders, SvixWebhookVerifier, SVIX_ID_HEADER, SVIX_SIGNATURE_HEADER, SVIX_TIMESTAMP_HEADER,
};
