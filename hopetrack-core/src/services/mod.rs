//! Services module
//!
//! Business logic that coordinates between the case API, the renderers and
//! local storage.

pub mod api;
pub mod cases;
pub mod export;
pub mod notifications;
pub mod settings;

pub use api::CaseApi;
pub use cases::CaseService;
pub use export::ExportService;
pub use notifications::NotificationCenter;
pub use settings::{ApiSettings, AppSettings, ExportSettings, SettingsService};
