//! Notification models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification type shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    New,
    Admission,
    Archived,
    Reminder,
}

/// A derived (or ad hoc) notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// `<kind>-<caseId>` for derived notifications, a UUID for ad hoc ones
    pub id: String,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub case_id: Option<i64>,
    #[serde(default)]
    pub program_type: Option<String>,
}
