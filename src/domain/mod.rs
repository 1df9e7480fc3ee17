//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `user` / `course` / `purchase` - Marketplace records and the purchase state machine
//! - `webhook` - Signature primitives shared by both webhook senders
//! - `payment` - Stripe events, signature verification, reconciliation errors
//! - `identity` - Auth provider user events and Svix verification

pub mod course;
pub mod foundation;
pub mod identity;
pub mod payment;
pub mod purchase;
pub mod user;
pub mod webhook;
