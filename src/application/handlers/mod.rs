//! Application handlers.
//!
//! Command handlers that orchestrate domain operations for each webhook.

pub mod identity;
pub mod payment;
