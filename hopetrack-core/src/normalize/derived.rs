//! Derived values: ages, date normalization and display labels.
//!
//! Every function here is total. Bad input yields an empty result or the
//! input itself, never a panic or an error.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Today's date in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Reduce a date-like string to `YYYY-MM-DD`.
///
/// Recognized shapes: ISO timestamps (`2024-01-05T10:00:00Z`), US slash
/// dates (`2/1/2017`, `02/01/2017`) and plain ISO dates. Anything else is
/// returned unchanged so free text that merely contains digits survives.
pub fn date_only(input: &str) -> String {
    let trimmed = input.trim();
    match iso_prefix(trimmed).or_else(|| us_slash_date(trimmed)) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => input.to_string(),
    }
}

/// Parse any shape `date_only` recognizes.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    iso_prefix(trimmed).or_else(|| us_slash_date(trimmed))
}

/// Whole years between `birthdate` and `today`.
///
/// Returns `None` for a missing, unparseable or future birthdate.
pub fn age_on(birthdate: &str, today: NaiveDate) -> Option<u32> {
    let born = parse_date(birthdate)?;
    if born > today {
        return None;
    }

    let mut years = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Age relative to the local current date.
pub fn age(birthdate: &str) -> Option<u32> {
    age_on(birthdate, today())
}

/// Age as display text; empty when unknown.
pub fn age_text(birthdate: &str, today: NaiveDate) -> String {
    age_on(birthdate, today)
        .map(|years| years.to_string())
        .unwrap_or_default()
}

/// "January 5, 2024" style date for document headers. Empty when the
/// input is not a recognizable date.
pub fn long_date(input: &str) -> String {
    parse_date(input)
        .map(|date| date.format("%B %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Join name parts with single spaces, skipping blanks.
pub fn full_name(first: &str, middle: &str, last: &str) -> String {
    [first, middle, last]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a timestamp value: RFC 3339, naive date-times (taken as UTC),
/// plain dates (midnight UTC) or epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(s) {
        return Some(stamp.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    parse_date(s)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DD`, optionally followed by a `T...` time part.
fn iso_prefix(s: &str) -> Option<NaiveDate> {
    let head = s.get(..10)?;
    let rest = &s[10..];
    if !(rest.is_empty() || rest.starts_with('T')) {
        return None;
    }

    let bytes = head.as_bytes();
    let shaped = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// `M/D/YYYY` with one- or two-digit month and day and a four-digit year.
fn us_slash_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('/');
    let (month, day, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let digits = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !(digits(month, 1, 2) && digits(day, 1, 2) && digits(year, 4, 4)) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_only_shapes() {
        assert_eq!(date_only("2024-01-05T10:00:00Z"), "2024-01-05");
        assert_eq!(date_only("2/1/2017"), "2017-02-01");
        assert_eq!(date_only("02/01/2017"), "2017-02-01");
        assert_eq!(date_only("2017-02-01"), "2017-02-01");
    }

    #[test]
    fn test_date_only_passes_other_text_through() {
        assert_eq!(date_only("not a date"), "not a date");
        assert_eq!(date_only("Room 12/3"), "Room 12/3");
        assert_eq!(date_only("2/1/17"), "2/1/17");
        assert_eq!(date_only("13/45/2020"), "13/45/2020");
        assert_eq!(date_only(""), "");
    }

    #[test]
    fn test_age_on_birthday_boundary() {
        assert_eq!(age_on("2015-01-01", date(2025, 1, 1)), Some(10));
        assert_eq!(age_on("2015-01-01", date(2024, 12, 31)), Some(9));
    }

    #[test]
    fn test_age_invalid_inputs() {
        assert_eq!(age_on("", date(2025, 1, 1)), None);
        assert_eq!(age_on("someday", date(2025, 1, 1)), None);
        assert_eq!(age_on("2030-01-01", date(2025, 1, 1)), None);
        assert_eq!(age_text("", date(2025, 1, 1)), "");
    }

    #[test]
    fn test_long_date() {
        assert_eq!(long_date("2024-01-05T00:00:00.000Z"), "January 5, 2024");
        assert_eq!(long_date("12/25/2023"), "December 25, 2023");
        assert_eq!(long_date("soon"), "");
        assert_eq!(long_date(""), "");
    }

    #[test]
    fn test_full_name_skips_blanks() {
        assert_eq!(full_name("Ana", "", "Reyes"), "Ana Reyes");
        assert_eq!(full_name(" Ana ", "Cruz", "Reyes"), "Ana Cruz Reyes");
        assert_eq!(full_name("", "", ""), "");
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = "2024-03-01T00:00:00+00:00";
        assert_eq!(
            parse_timestamp(&json!("2024-03-01")).unwrap().to_rfc3339(),
            expected
        );
        assert_eq!(
            parse_timestamp(&json!("2024-03-01 00:00:00")).unwrap().to_rfc3339(),
            expected
        );
        assert_eq!(
            parse_timestamp(&json!(1709251200000i64)).unwrap().to_rfc3339(),
            expected
        );
        assert!(parse_timestamp(&json!("whenever")).is_none());
        assert!(parse_timestamp(&json!(true)).is_none());
    }
}
