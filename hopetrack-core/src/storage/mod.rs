//! Storage module
//!
//! Local persistence for state that never reaches the case API.

pub mod notification_store;

pub use notification_store::{JsonFileStore, MemoryStore, NotificationState, NotificationStore};
