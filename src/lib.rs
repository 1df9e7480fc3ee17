//! Course Market - webhook reconciliation backend for an online course marketplace
//!
//! Mirrors identity provider users into local records and turns Stripe
//! payment events into completed or failed purchases with joint enrollment.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
