//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - axum routes for the webhook and health endpoints
//! - `memory` - In-memory stores for tests and local runs
//! - `postgres` - PostgreSQL persistence
//! - `stripe` - Checkout session lookup against the Stripe API
//! - `sequential_enrollment` - Enrollment commit over plain repositories

pub mod http;
pub mod memory;
pub mod postgres;
pub mod sequential_enrollment;
pub mod stripe;

pub use sequential_enrollment::SequentialEnrollmentStore;
