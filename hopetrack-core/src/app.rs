//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::services::{
    AppSettings, CaseApi, CaseService, ExportService, NotificationCenter, SettingsService,
};
use crate::storage::JsonFileStore;

/// Values from the command line that take precedence over `settings.json`.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl SettingsOverrides {
    fn apply(&self, settings: &mut AppSettings) {
        if let Some(url) = &self.api_url {
            settings.api.base_url = url.clone();
        }
        if let Some(token) = &self.token {
            settings.api.token = Some(token.clone());
        }
        if let Some(dir) = &self.output_dir {
            settings.export.output_dir = dir.to_string_lossy().to_string();
        }
    }
}

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub settings: SettingsService,
    pub api: CaseApi,
    pub cases: Arc<Mutex<CaseService>>,
    pub notifications: Arc<Mutex<NotificationCenter>>,
    pub export: ExportService,
}

/// Application setup - called once on startup
pub async fn setup(app_data_dir: PathBuf, overrides: &SettingsOverrides) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    // Create necessary directories
    tokio::fs::create_dir_all(&app_data_dir).await?;

    let settings = SettingsService::new(app_data_dir.clone());
    let mut current = settings.load().await?;
    overrides.apply(&mut current);

    let api = CaseApi::new(&current.api)?;
    tracing::info!("Case API at {}", api.base_url());

    let store = Arc::new(JsonFileStore::in_dir(&app_data_dir));
    let notifications = NotificationCenter::open(store)?;

    let export = ExportService::from_settings(api.clone(), &app_data_dir, &current.export).await;
    tokio::fs::create_dir_all(export.output_dir()).await?;

    let state = AppState {
        app_data_dir,
        settings,
        api: api.clone(),
        cases: Arc::new(Mutex::new(CaseService::new(api))),
        notifications: Arc::new(Mutex::new(notifications)),
        export,
    };

    tracing::info!("Application initialized successfully");

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_setup_creates_directories_and_settings() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");

        let state = setup(data_dir.clone(), &SettingsOverrides::default())
            .await
            .unwrap();

        assert!(data_dir.join("settings.json").exists());
        assert!(data_dir.join("exports").is_dir());
        assert_eq!(state.export.output_dir(), data_dir.join("exports"));
        assert!(state.notifications.lock().await.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_overrides_take_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out");
        let overrides = SettingsOverrides {
            api_url: Some("http://127.0.0.1:7000/api/".to_string()),
            token: Some("abc".to_string()),
            output_dir: Some(out.clone()),
        };

        let state = setup(temp_dir.path().to_path_buf(), &overrides).await.unwrap();
        assert_eq!(state.api.base_url(), "http://127.0.0.1:7000/api");
        assert_eq!(state.export.output_dir(), out.as_path());

        // Overrides are not written back
        let saved = state.settings.load().await.unwrap();
        assert_eq!(saved.api.base_url, crate::config::DEFAULT_API_BASE_URL);
    }
}
