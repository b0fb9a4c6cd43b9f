//! Status classification
//!
//! Case status is free text. Everything outside the archived and after-care
//! vocabularies, including missing values, counts as active.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const ARCHIVED_STATUSES: &[&str] = &["archives", "reintegrate", "discharge", "archived"];
const AFTER_CARE_STATUSES: &[&str] = &["after care", "aftercare"];
/// Extra values the notification deriver treats as a discharge.
const CLOSED_STATUSES: &[&str] = &["closed", "completed", "inactive"];

/// Status value written when a case moves to after-care.
pub const AFTER_CARE_STATUS: &str = "After Care";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusBucket {
    Active,
    Archived,
    AfterCare,
}

impl StatusBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusBucket::Active => "active",
            StatusBucket::Archived => "archived",
            StatusBucket::AfterCare => "after-care",
        }
    }
}

impl std::fmt::Display for StatusBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn folded(status: &str) -> String {
    status.trim().to_lowercase()
}

/// Bucket for a status string.
pub fn classify(status: &str) -> StatusBucket {
    let status = folded(status);
    if ARCHIVED_STATUSES.contains(&status.as_str()) {
        StatusBucket::Archived
    } else if AFTER_CARE_STATUSES.contains(&status.as_str()) {
        StatusBucket::AfterCare
    } else {
        StatusBucket::Active
    }
}

/// Bucket for a raw JSON status. Anything that is not a string is active.
pub fn classify_value(status: Option<&Value>) -> StatusBucket {
    match status {
        Some(Value::String(s)) => classify(s),
        _ => StatusBucket::Active,
    }
}

/// Label shown for a status.
///
/// The after-care vocabulary maps to "After Care" and the archived vocabulary
/// to "Discharged"; any other value is shown as stored.
pub fn display_label(status: &str) -> &str {
    match classify(status) {
        StatusBucket::AfterCare => "After Care",
        StatusBucket::Archived => "Discharged",
        StatusBucket::Active => status,
    }
}

/// Whether a raw status means the case left the program.
pub fn is_discharged_equivalent(status: Option<&Value>) -> bool {
    match status {
        Some(Value::String(s)) => {
            let s = folded(s);
            ARCHIVED_STATUSES.contains(&s.as_str()) || CLOSED_STATUSES.contains(&s.as_str())
        }
        Some(Value::Bool(active)) => !active,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_buckets() {
        assert_eq!(classify("Archived"), StatusBucket::Archived);
        assert_eq!(classify("  REINTEGRATE "), StatusBucket::Archived);
        assert_eq!(classify("discharge"), StatusBucket::Archived);
        assert_eq!(classify("After Care"), StatusBucket::AfterCare);
        assert_eq!(classify("aftercare"), StatusBucket::AfterCare);
        assert_eq!(classify("Active"), StatusBucket::Active);
        assert_eq!(classify(""), StatusBucket::Active);
        assert_eq!(classify("closed"), StatusBucket::Active);
    }

    #[test]
    fn test_classify_non_string_values() {
        assert_eq!(classify_value(None), StatusBucket::Active);
        assert_eq!(classify_value(Some(&json!(null))), StatusBucket::Active);
        assert_eq!(classify_value(Some(&json!(true))), StatusBucket::Active);
        assert_eq!(classify_value(Some(&json!("archives"))), StatusBucket::Archived);
    }

    #[test]
    fn test_display_label_is_asymmetric() {
        assert_eq!(display_label("aftercare"), "After Care");
        assert_eq!(display_label("Archived"), "Discharged");
        assert_eq!(display_label("reintegrate"), "Discharged");
        assert_eq!(display_label("On Hold"), "On Hold");
        assert_eq!(display_label("active"), "active");
    }

    #[test]
    fn test_discharged_equivalent() {
        assert!(is_discharged_equivalent(Some(&json!("Closed"))));
        assert!(is_discharged_equivalent(Some(&json!("archived"))));
        assert!(is_discharged_equivalent(Some(&json!(false))));
        assert!(!is_discharged_equivalent(Some(&json!(true))));
        assert!(!is_discharged_equivalent(Some(&json!("after care"))));
        assert!(!is_discharged_equivalent(None));
    }
}
