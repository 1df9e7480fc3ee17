//! Stripe webhook event types.
//!
//! Only the fields reconciliation reads are captured; the rest of Stripe's
//! event schema is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Stripe webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type tag (e.g. "payment_intent.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (a PaymentIntent for the events we handle).
    pub object: serde_json::Value,
}

/// Event types the reconciliation engine reacts to.
///
/// Every other tag lands in `Unhandled` and is acknowledged without action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    PaymentIntentSucceeded,
    PaymentIntentFailed,
    Unhandled(String),
}

impl PaymentEventKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentFailed,
            other => Self::Unhandled(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentFailed => "payment_intent.payment_failed",
            Self::Unhandled(tag) => tag,
        }
    }
}

impl StripeEvent {
    pub fn kind(&self) -> PaymentEventKind {
        PaymentEventKind::from_tag(&self.event_type)
    }

    /// Id of the PaymentIntent carried in `data.object`, if present and non-empty.
    pub fn payment_intent_id(&self) -> Option<&str> {
        self.data
            .object
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|id| !id.trim().is_empty())
    }
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    object: serde_json::Value,
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "payment_intent.succeeded".to_string(),
            object: serde_json::json!({ "id": "pi_test_123", "object": "payment_intent" }),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: chrono::Utc::now().timestamp(),
            data: StripeEventData {
                object: self.object,
            },
            livemode: false,
            api_version: Some("2024-06-20".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_payment_intent_event() {
        let json = r#"{
            "id": "evt_3Pabc",
            "object": "event",
            "type": "payment_intent.succeeded",
            "created": 1717000000,
            "data": { "object": { "id": "pi_3Pabc", "object": "payment_intent", "amount": 4999 } },
            "livemode": false,
            "api_version": "2024-06-20",
            "pending_webhooks": 1
        }"#;

        let event: StripeEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "evt_3Pabc");
        assert_eq!(event.kind(), PaymentEventKind::PaymentIntentSucceeded);
        assert_eq!(event.payment_intent_id(), Some("pi_3Pabc"));
    }

    #[test]
    fn deserialize_tolerates_missing_optional_fields() {
        let json = r#"{"id":"evt_1","type":"charge.refunded","data":{"object":{}}}"#;

        let event: StripeEvent = serde_json::from_str(json).unwrap();

        assert!(event.api_version.is_none());
        assert!(!event.livemode);
        assert_eq!(event.kind(), PaymentEventKind::Unhandled("charge.refunded".to_string()));
    }

    #[test]
    fn failed_tag_maps_to_failed_kind() {
        assert_eq!(
            PaymentEventKind::from_tag("payment_intent.payment_failed"),
            PaymentEventKind::PaymentIntentFailed
        );
    }

    #[test]
    fn kind_as_str_round_trips() {
        for tag in [
            "payment_intent.succeeded",
            "payment_intent.payment_failed",
            "customer.created",
        ] {
            assert_eq!(PaymentEventKind::from_tag(tag).as_str(), tag);
        }
    }

    #[test]
    fn payment_intent_id_missing_or_blank_is_none() {
        let missing = StripeEventBuilder::new().object(json!({})).build();
        let blank = StripeEventBuilder::new().object(json!({ "id": "  " })).build();
        let numeric = StripeEventBuilder::new().object(json!({ "id": 42 })).build();

        assert_eq!(missing.payment_intent_id(), None);
        assert_eq!(blank.payment_intent_id(), None);
        assert_eq!(numeric.payment_intent_id(), None);
    }
}
