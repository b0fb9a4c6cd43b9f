//! Application configuration constants
//!
//! Central location for retention limits, export naming and the page
//! geometry used by the PDF renderer.

// ===== Notifications =====

/// Maximum number of notifications kept in the list (newest first)
pub const MAX_NOTIFICATIONS: usize = 50;

/// Days since the last update after which a follow-up reminder is raised
pub const FOLLOWUP_AFTER_DAYS: i64 = 30;

/// File name of the persisted notification state inside the app data dir
pub const NOTIFICATIONS_FILE: &str = "notifications.json";

// ===== API =====

/// Default base URL of the case API
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Default request timeout in seconds
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

// ===== Export naming =====

/// Prefix for every exported file name
pub const EXPORT_FILE_PREFIX: &str = "HOPETRACK";

/// Default directory (relative to the app data dir) for exported files
pub const DEFAULT_EXPORT_DIR: &str = "exports";

/// Default report title printed in the PDF header band
pub const DEFAULT_REPORT_TITLE: &str = "HOPETRACK";

/// Default report subtitle printed under the title
pub const DEFAULT_REPORT_SUBTITLE: &str = "Social Case Study Report";

// ===== PDF page geometry (points) =====

/// A4 page width
pub const PAGE_WIDTH: f32 = 595.28;
/// A4 page height
pub const PAGE_HEIGHT: f32 = 841.89;
/// Left and right margin
pub const PAGE_MARGIN_X: f32 = 40.0;
/// Top margin
pub const PAGE_MARGIN_TOP: f32 = 40.0;
/// Bottom margin; the footer is drawn inside it
pub const PAGE_MARGIN_BOTTOM: f32 = 50.0;

/// Height of the colored header band on the first page
pub const HEADER_BAND_HEIGHT: f32 = 80.0;

/// A section header starts a new page when less than this much space
/// (above the bottom margin) remains
pub const SECTION_BREAK_THRESHOLD: f32 = 90.0;

/// A table row starts a new page when less than this much space remains
pub const TABLE_BREAK_THRESHOLD: f32 = 30.0;

/// Fixed height of narrative text boxes
pub const TEXT_AREA_HEIGHT: f32 = 90.0;

/// Fixed height of the smaller assessment/recommendation boxes
pub const TEXT_AREA_SMALL_HEIGHT: f32 = 70.0;

/// Fraction of the usable width taken by the bulk summary table
pub const SUMMARY_TABLE_WIDTH_RATIO: f32 = 0.8;
