//! SyncIdentity - mirrors identity provider user events into local users.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::identity::{
    IdentityEvent, IdentitySyncError, SvixHeaders, SvixWebhookVerifier, SVIX_ID_HEADER,
    SVIX_SIGNATURE_HEADER, SVIX_TIMESTAMP_HEADER,
};
use crate::domain::user::{User, UserProfile, UserProfileUpdate};
use crate::domain::webhook::VerificationError;
use crate::ports::UserRepository;

/// Command carrying one identity webhook delivery.
#[derive(Debug, Clone, Default)]
pub struct SyncIdentityCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    pub svix_id: Option<String>,
    pub svix_timestamp: Option<String>,
    pub svix_signature: Option<String>,
}

impl SyncIdentityCommand {
    fn headers(&self) -> Result<SvixHeaders<'_>, VerificationError> {
        Ok(SvixHeaders {
            id: required(&self.svix_id, SVIX_ID_HEADER)?,
            timestamp: required(&self.svix_timestamp, SVIX_TIMESTAMP_HEADER)?,
            signature: required(&self.svix_signature, SVIX_SIGNATURE_HEADER)?,
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, VerificationError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(VerificationError::MissingHeader(name))
}

/// What the sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created(UserId),
    /// `user.created` for a user that already existed; profile refreshed.
    Refreshed(UserId),
    Updated(UserId),
    Deleted(UserId),
    /// Update or delete for a user that is not mirrored locally.
    NotFound(UserId),
    Ignored(String),
}

pub struct SyncIdentityHandler {
    verifier: Arc<SvixWebhookVerifier>,
    users: Arc<dyn UserRepository>,
}

impl SyncIdentityHandler {
    pub fn new(verifier: Arc<SvixWebhookVerifier>, users: Arc<dyn UserRepository>) -> Self {
        Self { verifier, users }
    }

    pub async fn handle(&self, cmd: SyncIdentityCommand) -> Result<SyncOutcome, IdentitySyncError> {
        // 1. Verify signature over the raw body
        self.verifier.verify(&cmd.payload, cmd.headers()?)?;

        // 2. Parse and apply
        let event = IdentityEvent::from_slice(&cmd.payload)?;
        tracing::info!(event_type = event.event_type(), "Received identity webhook");

        let outcome = match event {
            IdentityEvent::UserCreated(data) => {
                let id = data.user_id()?;
                self.upsert(id, data.profile()?).await?
            }
            IdentityEvent::UserUpdated(data) => {
                let id = data.user_id()?;
                if self.users.update_profile(&id, &data.profile_update()).await? {
                    SyncOutcome::Updated(id)
                } else {
                    SyncOutcome::NotFound(id)
                }
            }
            IdentityEvent::UserDeleted(data) => {
                let id = UserId::new(&data.id)?;
                if self.users.delete(&id).await? {
                    SyncOutcome::Deleted(id)
                } else {
                    SyncOutcome::NotFound(id)
                }
            }
            IdentityEvent::Other(tag) => SyncOutcome::Ignored(tag),
        };

        tracing::debug!(outcome = ?outcome, "Identity event applied");
        Ok(outcome)
    }

    /// Creates the user, or refreshes its profile if it already exists.
    /// Enrollments on an existing record are kept.
    async fn upsert(&self, id: UserId, profile: UserProfile) -> Result<SyncOutcome, IdentitySyncError> {
        let update = UserProfileUpdate::from(profile.clone());

        if self.users.update_profile(&id, &update).await? {
            return Ok(SyncOutcome::Refreshed(id));
        }

        let user = User::new(id, profile);
        match self.users.create(&user).await {
            Ok(()) => Ok(SyncOutcome::Created(user.id)),
            // Lost a race with a concurrent delivery for the same user.
            Err(err) if err.is_conflict() => {
                self.users.update_profile(&user.id, &update).await?;
                Ok(SyncOutcome::Refreshed(user.id))
            }
            Err(err) => Err(err.into()),
        }
    }
}
