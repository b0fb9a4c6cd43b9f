//! Case normalization
//!
//! Turns a raw case record of unknown shape into the canonical field set,
//! the yes/no flags and the typed nested collections every renderer reads.

mod collections;
mod derived;
mod fields;

pub use collections::{
    AgencyRecord, CaseCollections, EducationRecord, FamilyMember, LifeSkillRecord,
    SacramentRecord, TableRow, VitalSignRecord,
};
pub use derived::{
    age, age_on, age_text, date_only, full_name, long_date, parse_date, parse_timestamp, today,
};
pub use fields::{CaseFields, CaseFlags, Field, FlagField, FlagValue};

use chrono::NaiveDate;

use crate::models::CaseRecord;

/// A case record after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedCase {
    pub fields: CaseFields,
    pub flags: CaseFlags,
    pub collections: CaseCollections,
}

impl NormalizedCase {
    pub fn from_record(record: &CaseRecord) -> Self {
        Self {
            fields: CaseFields::resolve(record.as_map()),
            flags: CaseFlags::resolve(record.as_map()),
            collections: CaseCollections::from_record(record),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        self.fields.get(field)
    }

    pub fn display(&self, field: Field) -> String {
        self.fields.display(field)
    }

    pub fn full_name(&self) -> String {
        full_name(
            self.get(Field::FirstName),
            self.get(Field::MiddleName),
            self.get(Field::LastName),
        )
    }

    /// Age text as of `today`; empty when the birthdate is unusable.
    pub fn age_on(&self, today: NaiveDate) -> String {
        age_text(self.get(Field::Birthdate), today)
    }

    pub fn program(&self) -> &str {
        self.get(Field::Program)
    }
}

/// Normalize a raw record.
pub fn normalize(record: &CaseRecord) -> NormalizedCase {
    NormalizedCase::from_record(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_mixed_spellings() {
        let record = CaseRecord::from(json!({
            "first_name": "Maria",
            "middleName": "Santos",
            "last_name": "Cruz",
            "birthdate": "2/1/2017",
            "case_type": "Youth",
            "family_members": [{"name": "Jose"}]
        }));
        let case = normalize(&record);

        assert_eq!(case.full_name(), "Maria Santos Cruz");
        assert_eq!(case.program(), "Youth");
        assert_eq!(
            case.age_on(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()),
            "7"
        );
        assert_eq!(case.age_on(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()), "8");
        assert_eq!(case.collections.family_members.len(), 1);
    }

    #[test]
    fn test_normalize_empty_record() {
        let case = normalize(&CaseRecord::default());
        assert_eq!(case, NormalizedCase::default());
        assert_eq!(case.full_name(), "");
    }
}
