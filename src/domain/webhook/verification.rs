//! Pieces shared by every webhook signature scheme.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::foundation::Timestamp;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Default maximum age for a signed delivery (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Maximum allowed clock skew for timestamps from the future (1 minute).
pub const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Reasons an inbound webhook is not trusted.
///
/// Every variant is answered with 400 and is never retried by this service;
/// the sender's own retry schedule applies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("Missing signature header: {0}")]
    MissingHeader(&'static str),

    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),

    #[error("Timestamp outside the tolerance zone")]
    TimestampOutOfRange,

    #[error("Timestamp is too far in the future")]
    TimestampInFuture,

    #[error("No signatures found matching the expected signature for payload")]
    SignatureMismatch,

    #[error("Invalid signing secret")]
    InvalidSecret,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Rejects deliveries older than `tolerance_secs` or signed too far ahead of `now`.
pub(crate) fn check_timestamp(
    signed_at: i64,
    now: Timestamp,
    tolerance_secs: i64,
) -> Result<(), VerificationError> {
    let age = now
        .as_unix_secs()
        .checked_sub(signed_at)
        .ok_or(VerificationError::TimestampOutOfRange)?;

    if age > tolerance_secs {
        return Err(VerificationError::TimestampOutOfRange);
    }
    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(VerificationError::TimestampInFuture);
    }
    Ok(())
}

/// HMAC-SHA256 over the concatenation of `parts`.
pub(crate) fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, VerificationError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| VerificationError::InvalidSecret)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison of two byte slices.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    #[test]
    fn timestamp_within_window_is_accepted() {
        assert!(check_timestamp(1_000, at(1_120), DEFAULT_TOLERANCE_SECS).is_ok());
    }

    #[test]
    fn timestamp_at_boundary_is_accepted() {
        assert!(check_timestamp(1_000, at(1_300), DEFAULT_TOLERANCE_SECS).is_ok());
    }

    #[test]
    fn timestamp_past_boundary_is_rejected() {
        assert_eq!(
            check_timestamp(1_000, at(1_301), DEFAULT_TOLERANCE_SECS),
            Err(VerificationError::TimestampOutOfRange)
        );
    }

    #[test]
    fn small_future_skew_is_tolerated() {
        assert!(check_timestamp(1_030, at(1_000), DEFAULT_TOLERANCE_SECS).is_ok());
    }

    #[test]
    fn large_future_skew_is_rejected() {
        assert_eq!(
            check_timestamp(1_120, at(1_000), DEFAULT_TOLERANCE_SECS),
            Err(VerificationError::TimestampInFuture)
        );
    }

    #[test]
    fn extreme_timestamps_are_rejected_without_overflow() {
        assert_eq!(
            check_timestamp(i64::MIN, at(1_000), DEFAULT_TOLERANCE_SECS),
            Err(VerificationError::TimestampOutOfRange)
        );
        assert_eq!(
            check_timestamp(i64::MAX, at(1_000), DEFAULT_TOLERANCE_SECS),
            Err(VerificationError::TimestampInFuture)
        );
    }

    #[test]
    fn constant_time_eq_handles_lengths() {
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_eq(&[1, 2], &[1, 2, 3]));
        assert!(constant_time_eq(&[], &[]));
    }

    #[test]
    fn hmac_of_split_parts_matches_whole() {
        let whole = hmac_sha256(b"key", &[b"123.payload"]).unwrap();
        let split = hmac_sha256(b"key", &[b"123", b".", b"payload"]).unwrap();
        assert_eq!(whole, split);
        assert_eq!(whole.len(), 32);
    }
}
