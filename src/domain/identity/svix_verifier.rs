//! Svix signature verification for identity webhooks.
//!
//! Svix signs `"<msg id>.<timestamp>." ++ <raw body>` with HMAC-SHA256 using
//! the base64 key carried in the `whsec_` secret. The `svix-signature` header
//! holds space-separated `v1,<base64>` entries.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use secrecy::{ExposeSecret, SecretString, SecretVec};

use crate::domain::foundation::Timestamp;
use crate::domain::webhook::{
    check_timestamp, constant_time_eq, hmac_sha256, VerificationError, DEFAULT_TOLERANCE_SECS,
};

pub const SVIX_ID_HEADER: &str = "svix-id";
pub const SVIX_TIMESTAMP_HEADER: &str = "svix-timestamp";
pub const SVIX_SIGNATURE_HEADER: &str = "svix-signature";

const SECRET_PREFIX: &str = "whsec_";

/// The three headers Svix attaches to every delivery.
#[derive(Debug, Clone, Copy)]
pub struct SvixHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

/// Verifier for identity webhook signatures.
pub struct SvixWebhookVerifier {
    key: SecretVec<u8>,
    tolerance_secs: i64,
}

impl SvixWebhookVerifier {
    /// Decodes the signing key from a `whsec_<base64>` secret.
    ///
    /// The prefix is optional.
    pub fn new(secret: &SecretString) -> Result<Self, VerificationError> {
        let raw = secret.expose_secret();
        let encoded = raw.strip_prefix(SECRET_PREFIX).unwrap_or(raw);
        let key = BASE64
            .decode(encoded)
            .map_err(|_| VerificationError::InvalidSecret)?;
        if key.is_empty() {
            return Err(VerificationError::InvalidSecret);
        }

        Ok(Self {
            key: SecretVec::new(key),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        })
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    pub fn verify(&self, payload: &[u8], headers: SvixHeaders<'_>) -> Result<(), VerificationError> {
        self.verify_at(payload, headers, Timestamp::now())
    }

    /// Checks the timestamp window, then accepts the delivery if any `v1`
    /// signature matches.
    pub fn verify_at(
        &self,
        payload: &[u8],
        headers: SvixHeaders<'_>,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        if headers.id.trim().is_empty() {
            return Err(VerificationError::MissingHeader(SVIX_ID_HEADER));
        }
        let signed_at: i64 = headers.timestamp.trim().parse().map_err(|_| {
            VerificationError::MalformedHeader(format!("invalid {}", SVIX_TIMESTAMP_HEADER))
        })?;

        check_timestamp(signed_at, now, self.tolerance_secs)?;

        let expected = self.compute_signature(headers.id, signed_at, payload)?;

        let mut saw_v1 = false;
        for entry in headers.signature.split_whitespace() {
            let Some((version, encoded)) = entry.split_once(',') else {
                continue;
            };
            if version != "v1" {
                continue;
            }
            saw_v1 = true;
            if let Ok(candidate) = BASE64.decode(encoded) {
                if constant_time_eq(&expected, &candidate) {
                    return Ok(());
                }
            }
        }

        if !saw_v1 {
            return Err(VerificationError::MalformedHeader(
                "no signatures found with expected scheme v1".to_string(),
            ));
        }
        Err(VerificationError::SignatureMismatch)
    }

    /// Produces a `v1,<base64>` signature entry for `payload`.
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> Result<String, VerificationError> {
        let signature = self.compute_signature(msg_id, timestamp, payload)?;
        Ok(format!("v1,{}", BASE64.encode(signature)))
    }

    fn compute_signature(
        &self,
        msg_id: &str,
        timestamp: i64,
        payload: &[u8],
    ) -> Result<Vec<u8>, VerificationError> {
        let timestamp = timestamp.to_string();
        hmac_sha256(
            self.key.expose_secret(),
            &[msg_id.as_bytes(), b".", timestamp.as_bytes(), b".", payload],
        )
    }
}
