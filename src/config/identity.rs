//! Identity provider webhook configuration

use secrecy::SecretString;
use serde::Deserialize;

use crate::domain::identity::SvixWebhookVerifier;

use super::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// Svix signing secret (`whsec_<base64>`)
    pub webhook_secret: String,
}

impl IdentityConfig {
    pub fn webhook_secret(&self) -> SecretString {
        SecretString::new(self.webhook_secret.clone())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("IDENTITY__WEBHOOK_SECRET"));
        }
        // Same decoding the verifier does at startup
        SvixWebhookVerifier::new(&self.webhook_secret())
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidIdentityWebhookSecret(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret() {
        assert_eq!(
            IdentityConfig::default().validate(),
            Err(ValidationError::MissingRequired("IDENTITY__WEBHOOK_SECRET"))
        );
    }

    #[test]
    fn test_secret_must_decode() {
        let config = IdentityConfig {
            webhook_secret: "whsec_***not-base64***".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidIdentityWebhookSecret(_))
        ));
    }

    #[test]
    fn test_valid_secret() {
        let config = IdentityConfig {
            webhook_secret: "whsec_aWRlbnRpdHktd2ViaG9vay10ZXN0LWtleQ==".to_string(),
        };
        assert!(config.validate().is_ok());
    }
}
