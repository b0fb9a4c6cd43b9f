//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::config::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_EXPORT_DIR, DEFAULT_REPORT_SUBTITLE,
    DEFAULT_REPORT_TITLE,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Case API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Export output and report branding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Output directory; relative paths resolve against the app data directory
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_report_title")]
    pub report_title: String,
    #[serde(default = "default_report_subtitle")]
    pub report_subtitle: String,
    /// PNG or JPEG shown in the report header
    #[serde(default)]
    pub logo_path: Option<String>,
    /// Header band color as `#rrggbb`
    #[serde(default = "default_header_color")]
    pub header_color: String,
}

fn default_output_dir() -> String {
    DEFAULT_EXPORT_DIR.to_string()
}

fn default_report_title() -> String {
    DEFAULT_REPORT_TITLE.to_string()
}

fn default_report_subtitle() -> String {
    DEFAULT_REPORT_SUBTITLE.to_string()
}

fn default_header_color() -> String {
    "#1F4E79".to_string()
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            report_title: default_report_title(),
            report_subtitle: default_report_subtitle(),
            logo_path: None,
            header_color: default_header_color(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub export: ExportSettings,
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join("settings.json"),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Generic(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    /// Get API settings
    pub async fn get_api(&self) -> Result<ApiSettings> {
        let settings = self.load().await?;
        Ok(settings.api)
    }

    /// Update API settings
    pub async fn update_api(&self, api: ApiSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.api = api;
        self.save(&settings).await?;
        Ok(())
    }

    /// Get export settings
    pub async fn get_export(&self) -> Result<ExportSettings> {
        let settings = self.load().await?;
        Ok(settings.export)
    }

    /// Update export settings
    pub async fn update_export(&self, export: ExportSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.export = export;
        self.save(&settings).await?;
        Ok(())
    }
}
