//! Domain models
//!
//! Raw case records and the notifications derived from them.
//! All models use serde for (de)serialization to the API and local store.

mod case;
mod notification;

pub use case::CaseRecord;
pub(crate) use case::lookup;
pub use notification::{Notification, NotificationType};
