//! WebhookEventRepository port - ledger of payment webhook events already handled.
//!
//! Stripe may deliver the same event more than once (timeouts, non-2xx
//! responses, lost acknowledgements). Events that were processed or
//! deliberately ignored are recorded here so an exact redelivery is answered
//! without running reconciliation again. Failed attempts are never recorded;
//! the sender's retry must re-run them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// How a recorded event was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    /// Handler ran and changed (or confirmed) state.
    Processed,
    /// Acknowledged without action (unhandled type, soft no-op).
    Ignored,
}

impl LedgerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerOutcome::Processed => "processed",
            LedgerOutcome::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processed" => Some(LedgerOutcome::Processed),
            "ignored" => Some(LedgerOutcome::Ignored),
            _ => None,
        }
    }
}

/// Record of a handled webhook event.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEventRecord {
    /// Stripe event ID (evt_xxx format).
    pub event_id: String,

    /// Type tag (e.g., "payment_intent.succeeded").
    pub event_type: String,

    pub processed_at: DateTime<Utc>,

    pub outcome: LedgerOutcome,

    /// Why the event was ignored, if it was.
    pub note: Option<String>,

    /// Original event payload for auditing.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    pub fn processed(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: LedgerOutcome::Processed,
            note: None,
            payload,
        }
    }

    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: LedgerOutcome::Ignored,
            note: Some(reason.into()),
            payload,
        }
    }
}

/// Result of attempting to save a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First time seeing this event.
    Inserted,
    /// Another delivery recorded it first.
    AlreadyExists,
}

/// Port for the processed-event ledger.
///
/// Implementations should use a PRIMARY KEY on event_id so concurrent
/// deliveries cannot both insert.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Saves a record with `ON CONFLICT DO NOTHING` semantics.
    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Deletes records processed before `cutoff`. Returns the number deleted.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_record_has_no_note() {
        let record = WebhookEventRecord::processed(
            "evt_123",
            "payment_intent.succeeded",
            serde_json::json!({"id": "evt_123"}),
        );

        assert_eq!(record.event_id, "evt_123");
        assert_eq!(record.outcome, LedgerOutcome::Processed);
        assert!(record.note.is_none());
    }

    #[test]
    fn ignored_record_includes_reason() {
        let record = WebhookEventRecord::ignored(
            "evt_456",
            "charge.refunded",
            "unhandled event type",
            serde_json::json!({}),
        );

        assert_eq!(record.outcome, LedgerOutcome::Ignored);
        assert_eq!(record.note.as_deref(), Some("unhandled event type"));
    }

    #[test]
    fn outcome_parses_its_own_labels() {
        for outcome in [LedgerOutcome::Processed, LedgerOutcome::Ignored] {
            assert_eq!(LedgerOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(LedgerOutcome::parse("failed"), None);
    }
}
