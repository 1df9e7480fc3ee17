//! Stripe webhook signature verification.
//!
//! Stripe signs `"<timestamp>." ++ <raw body>` with HMAC-SHA256 and sends the
//! result in the `Stripe-Signature` header. The body must be the exact bytes
//! received on the wire: verifying a re-serialized JSON value is wrong even
//! when it looks identical.

use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::Timestamp;
use crate::domain::webhook::{
    check_timestamp, constant_time_eq, hmac_sha256, VerificationError, DEFAULT_TOLERANCE_SECS,
};

use super::stripe_event::StripeEvent;

/// Header carrying the signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// All v1 signatures. Several are present while a secret is being rolled.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<hex>[,v1=<hex>][,v0=<legacy>]`
    pub fn parse(header: &str) -> Result<Self, VerificationError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part.trim().split_once('=').ok_or_else(|| {
                VerificationError::MalformedHeader("expected key=value pairs".to_string())
            })?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        VerificationError::MalformedHeader("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    let signature = hex::decode(value).map_err(|_| {
                        VerificationError::MalformedHeader("invalid v1 signature hex".to_string())
                    })?;
                    v1_signatures.push(signature);
                }
                // v0 and unknown schemes are ignored for forward compatibility
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| VerificationError::MalformedHeader("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(VerificationError::MalformedHeader(
                "no signatures found with expected scheme v1".to_string(),
            ));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    /// The webhook signing secret from the Stripe dashboard (whsec_...).
    secret: SecretString,
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Overrides the maximum accepted signature age.
    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verifies the signature against the current time and parses the event.
    pub fn verify(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, VerificationError> {
        self.verify_at(payload, signature_header, Timestamp::now())
    }

    /// Verifies the webhook signature and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the signature header
    /// 2. Validate timestamp is within the tolerance window
    /// 3. Compute expected signature over the raw bytes
    /// 4. Compare against every v1 signature in constant time
    /// 5. Parse the JSON payload into a StripeEvent
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: Timestamp,
    ) -> Result<StripeEvent, VerificationError> {
        let header = SignatureHeader::parse(signature_header)?;

        check_timestamp(header.timestamp, now, self.tolerance_secs)?;

        let expected = self.compute_signature(header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_eq(&expected, candidate));
        if !matched {
            return Err(VerificationError::SignatureMismatch);
        }

        serde_json::from_slice(payload).map_err(|e| VerificationError::InvalidPayload(e.to_string()))
    }

    /// Builds a valid `Stripe-Signature` header for `payload`.
    ///
    /// Used by fixtures and local replay tooling.
    pub fn signature_header(&self, payload: &[u8], timestamp: i64) -> Result<String, VerificationError> {
        let signature = self.compute_signature(timestamp, payload)?;
        Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, VerificationError> {
        let timestamp = timestamp.to_string();
        hmac_sha256(
            self.secret.expose_secret().as_bytes(),
            &[timestamp.as_bytes(), b".", payload],
        )
    }
}
