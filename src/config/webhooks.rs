//! Processed-event ledger configuration

use chrono::Duration;
use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhooksConfig {
    /// Days a processed payment event id is remembered
    #[serde(default = "default_retention_days")]
    pub ledger_retention_days: u32,

    /// Interval between ledger pruning runs in seconds
    #[serde(default = "default_cleanup_interval")]
    pub ledger_cleanup_interval_secs: u64,
}

impl WebhooksConfig {
    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.ledger_retention_days))
    }

    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ledger_cleanup_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ledger_retention_days == 0 {
            return Err(ValidationError::InvalidLedgerRetention);
        }
        if self.ledger_cleanup_interval_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            ledger_retention_days: default_retention_days(),
            ledger_cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

// Stripe retries for up to three days.
fn default_retention_days() -> u32 {
    30
}

fn default_cleanup_interval() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention() {
        let config = WebhooksConfig {
            ledger_retention_days: 7,
            ..Default::default()
        };
        assert_eq!(config.retention(), Duration::days(7));
        assert_eq!(config.cleanup_interval(), std::time::Duration::from_secs(3600));
    }

    #[test]
    fn test_zero_retention_is_rejected() {
        let config = WebhooksConfig {
            ledger_retention_days: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidLedgerRetention));
    }
}
