//! Webhook trust primitives shared by the payment and identity senders.

mod verification;

pub use verification::{VerificationError, DEFAULT_TOLERANCE_SECS, MAX_CLOCK_SKEW_SECS};

pub(crate) use verification::{check_timestamp, constant_time_eq, hmac_sha256};
