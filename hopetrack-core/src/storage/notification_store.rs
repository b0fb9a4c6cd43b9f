//! Persisted notification state
//!
//! The notification list, the dismissal set and the set of case ids that
//! already produced a "new case" notification survive restarts. Stores are
//! loaded once when the notification center starts and saved after every
//! mutation.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::NOTIFICATIONS_FILE;
use crate::error::{AppError, Result};
use crate::models::Notification;

/// Everything the notification center persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationState {
    /// Newest first.
    pub notifications: Vec<Notification>,
    /// Ids that must never be emitted again.
    pub dismissed: BTreeSet<String>,
    /// Case ids that already produced a "new case" notification.
    pub processed_case_ids: BTreeSet<i64>,
}

/// Load/save hooks for notification state.
pub trait NotificationStore: Send + Sync {
    fn load(&self) -> Result<NotificationState>;
    fn save(&self, state: &NotificationState) -> Result<()>;
}

/// JSON file in the app data directory, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `notifications.json` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(NOTIFICATIONS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NotificationStore for JsonFileStore {
    fn load(&self) -> Result<NotificationState> {
        if !self.path.exists() {
            tracing::debug!("No notification state at {:?}, starting empty", self.path);
            return Ok(NotificationState::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let state: NotificationState = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded {} notifications, {} dismissed ids",
            state.notifications.len(),
            state.dismissed.len()
        );
        Ok(state)
    }

    fn save(&self, state: &NotificationState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(state)?;

        // Write to temp file first (atomic write)
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        tracing::debug!("Saved notification state to {:?}", self.path);
        Ok(())
    }
}

/// In-memory store; keeps the last saved state.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<NotificationState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: NotificationState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Copy of the last saved state.
    pub fn snapshot(&self) -> NotificationState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

impl NotificationStore for MemoryStore {
    fn load(&self) -> Result<NotificationState> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|_| AppError::Generic("Notification store lock poisoned".to_string()))
    }

    fn save(&self, state: &NotificationState) -> Result<()> {
        let mut stored = self
            .state
            .lock()
            .map_err(|_| AppError::Generic("Notification store lock poisoned".to_string()))?;
        *stored = state.clone();
        Ok(())
    }
}
