//! Raw case records as delivered by the case API or by form state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalize::parse_timestamp;

/// Candidate keys for the last-modified stamp, client spelling first.
const LAST_UPDATED_KEYS: &[&str] = &[
    "lastUpdated",
    "timestamp",
    "updatedAt",
    "last_updated",
    "updated_at",
];

/// A case record with unknown shape.
///
/// Keys may use the client (camelCase) or server (snake_case) spelling and
/// any field may be missing. Nothing here validates the shape; the
/// normalizer turns it into the canonical field set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseRecord(Map<String, Value>);

impl CaseRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap an arbitrary JSON value. Anything but an object becomes an empty record.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// First candidate key holding a present value (not null, not "").
    pub fn lookup(&self, candidates: &[&str]) -> Option<&Value> {
        lookup(&self.0, candidates)
    }

    /// Numeric case id; numeric strings are accepted.
    pub fn id(&self) -> Option<i64> {
        match self.lookup(&["id", "caseId", "case_id"])? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Raw status value, untouched.
    pub fn status(&self) -> Option<&Value> {
        self.0.get("status")
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.lookup(LAST_UPDATED_KEYS).and_then(parse_timestamp)
    }

    /// Stamp the record as modified at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.set("lastUpdated", Value::String(now.to_rfc3339()));
    }
}

impl From<Value> for CaseRecord {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

/// First candidate whose value is present. `null` and the empty string are
/// treated as absent so the next spelling gets a chance.
pub(crate) fn lookup<'a>(map: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|key| match map.get(*key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_prefers_first_present_candidate() {
        let record = CaseRecord::from(json!({
            "firstName": "",
            "first_name": "Maria"
        }));
        assert_eq!(
            record.lookup(&["firstName", "first_name"]),
            Some(&json!("Maria"))
        );
    }

    #[test]
    fn test_id_accepts_numeric_strings() {
        assert_eq!(CaseRecord::from(json!({"id": 12})).id(), Some(12));
        assert_eq!(CaseRecord::from(json!({"id": " 7 "})).id(), Some(7));
        assert_eq!(CaseRecord::from(json!({"id": "abc"})).id(), None);
        assert_eq!(CaseRecord::from(json!([1, 2])).id(), None);
    }

    #[test]
    fn test_touch_sets_last_updated() {
        let mut record = CaseRecord::default();
        let now = Utc::now();
        record.touch(now);
        let stamped = record.last_updated().unwrap();
        assert_eq!(stamped.timestamp(), now.timestamp());
    }

    #[test]
    fn test_last_updated_falls_back_to_server_spelling() {
        let record = CaseRecord::from(json!({"updated_at": "2024-03-01T08:00:00Z"}));
        assert_eq!(
            record.last_updated().unwrap().to_rfc3339(),
            "2024-03-01T08:00:00+00:00"
        );
    }

    #[test]
    fn test_last_updated_prefers_client_spelling() {
        let record = CaseRecord::from(json!({
            "last_updated": "2020-01-01T00:00:00Z",
            "updatedAt": "2024-06-01T00:00:00Z"
        }));
        assert_eq!(
            record.last_updated().unwrap().to_rfc3339(),
            "2024-06-01T00:00:00+00:00"
        );
    }
}
