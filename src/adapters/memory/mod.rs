//! In-memory adapters for tests and database-less local runs.

mod store;
mod webhook_events;

pub use store::InMemoryStore;
pub use webhook_events::InMemoryWebhookEventRepository;
