//! Identity provider (Clerk) user events.

use serde::Deserialize;

use crate::domain::foundation::UserId;
use crate::domain::user::{UserProfile, UserProfileUpdate};

use super::IdentitySyncError;

/// One entry of a Clerk user's `email_addresses` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClerkEmailAddress {
    #[serde(default)]
    pub id: Option<String>,
    pub email_address: String,
}

/// The `data` object of `user.created` / `user.updated`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClerkUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ClerkUser {
    pub fn user_id(&self) -> Result<UserId, IdentitySyncError> {
        Ok(UserId::new(&self.id)?)
    }

    /// The primary address, falling back to the first listed one.
    pub fn primary_email(&self) -> Option<&str> {
        let primary = self.primary_email_address_id.as_deref().and_then(|primary_id| {
            self.email_addresses
                .iter()
                .find(|e| e.id.as_deref() == Some(primary_id))
        });

        primary
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.as_str())
    }

    /// Non-empty first and last name joined by a space.
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Full profile for a newly created user. An email is required.
    pub fn profile(&self) -> Result<UserProfile, IdentitySyncError> {
        let email = self
            .primary_email()
            .ok_or_else(|| IdentitySyncError::MissingEmail(self.id.clone()))?;

        Ok(UserProfile {
            email: email.to_string(),
            name: self.display_name(),
            image_url: self.image_url.clone().unwrap_or_default(),
        })
    }

    /// Partial update carrying only the fields the event actually provides.
    pub fn profile_update(&self) -> UserProfileUpdate {
        let name = self.display_name();
        UserProfileUpdate {
            email: self.primary_email().map(str::to_string),
            name: (!name.is_empty()).then_some(name),
            image_url: self.image_url.clone(),
        }
    }
}

/// The `data` object of `user.deleted`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeletedUser {
    pub id: String,
}

/// A parsed identity event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    UserCreated(ClerkUser),
    UserUpdated(ClerkUser),
    UserDeleted(DeletedUser),
    /// Any other event type; acknowledged without action.
    Other(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl IdentityEvent {
    /// Parses the raw webhook body.
    pub fn from_slice(payload: &[u8]) -> Result<Self, IdentitySyncError> {
        let envelope: Envelope = serde_json::from_slice(payload)
            .map_err(|e| IdentitySyncError::MalformedEvent(e.to_string()))?;

        let event = match envelope.event_type.as_str() {
            "user.created" => IdentityEvent::UserCreated(parse_data(envelope.data)?),
            "user.updated" => IdentityEvent::UserUpdated(parse_data(envelope.data)?),
            "user.deleted" => IdentityEvent::UserDeleted(parse_data(envelope.data)?),
            _ => IdentityEvent::Other(envelope.event_type),
        };
        Ok(event)
    }

    pub fn event_type(&self) -> &str {
        match self {
            IdentityEvent::UserCreated(_) => "user.created",
            IdentityEvent::UserUpdated(_) => "user.updated",
            IdentityEvent::UserDeleted(_) => "user.deleted",
            IdentityEvent::Other(tag) => tag,
        }
    }
}

fn parse_data<T: serde::de::DeserializeOwned>(data: serde_json::Value) -> Result<T, IdentitySyncError> {
    serde_json::from_value(data).map_err(|e| IdentitySyncError::MalformedEvent(e.to_string()))
}
