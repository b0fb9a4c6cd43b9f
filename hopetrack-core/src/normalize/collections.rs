//! Nested collections, normalized once at the boundary.
//!
//! The API and form state disagree on shape: arrays of objects, objects
//! keyed by level or sacrament name, or the same thing serialized as JSON
//! text. Everything here ends up as an ordered `Vec` of typed rows.

use serde::Serialize;
use serde_json::{Map, Value};

use super::derived::date_only;
use super::fields::resolve_text;
use crate::models::CaseRecord;

/// A row of a tabular section.
pub trait TableRow {
    /// Column labels, in cell order.
    fn columns() -> &'static [&'static str];

    /// Cell values, aligned with `columns()`.
    fn cells(&self) -> Vec<&str>;

    /// The value that decides whether the row carries any information.
    fn primary(&self) -> &str;

    fn has_content(&self) -> bool {
        !self.primary().trim().is_empty()
    }
}

macro_rules! collection_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $field:ident : $label:literal => [$($key:literal),+ $(,)?] ),+ $(,)?
        }
        primary = [$($primary:ident),+];
        dates = [$($date:ident),*];
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
        pub struct $name {
            $(pub $field: String),+
        }

        impl $name {
            fn from_object(obj: &Map<String, Value>) -> Self {
                #[allow(unused_mut)]
                let mut row = Self {
                    $($field: resolve_text(obj, &[$($key),+])),+
                };
                $(row.$date = date_only(&row.$date);)*
                row
            }
        }

        impl TableRow for $name {
            fn columns() -> &'static [&'static str] {
                &[$($label),+]
            }

            fn cells(&self) -> Vec<&str> {
                vec![$(self.$field.as_str()),+]
            }

            fn primary(&self) -> &str {
                [$(self.$primary.as_str()),+]
                    .into_iter()
                    .find(|value| !value.trim().is_empty())
                    .unwrap_or("")
            }
        }
    };
}

collection_record! {
    /// Household or extended-family member.
    pub struct FamilyMember {
        name: "Name" => ["name", "fullName", "full_name"],
        relation: "Relation" => ["relation", "relationship", "relationToClient", "relation_to_client"],
        age: "Age" => ["age"],
        sex: "Sex" => ["sex", "gender"],
        civil_status: "Civil Status" => ["civilStatus", "civil_status"],
        education: "Education" => ["education", "educationalAttainment", "educational_attainment"],
        occupation: "Occupation" => ["occupation"],
        income: "Income" => ["income", "monthlyIncome", "monthly_income"],
    }
    primary = [name];
    dates = [];
}

collection_record! {
    /// One level of schooling.
    pub struct EducationRecord {
        level: "Level" => ["level", "educationLevel", "education_level"],
        school_name: "School" => ["schoolName", "school_name", "school"],
        school_address: "School Address" => ["schoolAddress", "school_address"],
        year: "Year" => ["year", "yearCompleted", "schoolYear", "year_completed", "school_year"],
    }
    primary = [school_name];
    dates = [];
}

collection_record! {
    /// A sacrament received.
    pub struct SacramentRecord {
        sacrament: "Sacrament" => ["sacrament", "name", "type"],
        date_received: "Date Received" => ["dateReceived", "date_received", "date"],
        place: "Place" => ["placeReceived", "place_received", "place", "parish"],
    }
    primary = [date_received, place];
    dates = [date_received];
}

collection_record! {
    /// Agency involved with the case.
    pub struct AgencyRecord {
        name: "Agency" => ["name", "agencyName", "agency_name"],
        address: "Address" => ["address"],
        contact: "Contact Person" => ["contactPerson", "contact_person", "contact"],
        services: "Services" => ["services", "servicesProvided", "services_provided"],
    }
    primary = [name];
    dates = [];
}

collection_record! {
    /// Life-skills activity.
    pub struct LifeSkillRecord {
        activity: "Activity" => ["activity", "skill", "name"],
        date: "Date" => ["date", "dateCompleted", "date_completed"],
        performance: "Performance" => ["performance", "rating", "level"],
        remarks: "Remarks" => ["remarks", "notes"],
    }
    primary = [activity];
    dates = [date];
}

collection_record! {
    /// Vital-signs reading.
    pub struct VitalSignRecord {
        date: "Date" => ["date", "dateRecorded", "date_recorded"],
        blood_pressure: "Blood Pressure" => ["bloodPressure", "blood_pressure"],
        heart_rate: "Heart Rate" => ["heartRate", "pulseRate", "heart_rate", "pulse_rate"],
        respiratory_rate: "Respiratory Rate" => ["respiratoryRate", "respiratory_rate"],
        temperature: "Temperature" => ["temperature"],
        weight: "Weight" => ["weight"],
        height: "Height" => ["height"],
    }
    primary = [date, blood_pressure, temperature, weight, height];
    dates = [date];
}

/// Canonical ordering for level-keyed education maps.
const EDUCATION_ORDER: &[&str] = &[
    "elementary",
    "juniorhigh",
    "highschool",
    "seniorhigh",
    "vocational",
    "college",
    "postgraduate",
];

/// Canonical ordering for sacrament-keyed maps.
const SACRAMENT_ORDER: &[&str] = &[
    "baptism",
    "firstcommunion",
    "communion",
    "confirmation",
    "marriage",
];

/// All nested collections of a case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaseCollections {
    pub family_members: Vec<FamilyMember>,
    pub extended_family: Vec<FamilyMember>,
    pub education: Vec<EducationRecord>,
    pub sacraments: Vec<SacramentRecord>,
    pub agencies: Vec<AgencyRecord>,
    pub life_skills: Vec<LifeSkillRecord>,
    pub vital_signs: Vec<VitalSignRecord>,
}

impl CaseCollections {
    pub fn from_record(record: &CaseRecord) -> Self {
        let items = |keys: &[&str]| record.lookup(keys).map(list_items).unwrap_or_default();

        Self {
            family_members: items(&["familyMembers", "family_members"])
                .iter()
                .map(FamilyMember::from_object)
                .collect(),
            extended_family: items(&["extendedFamily", "extended_family"])
                .iter()
                .map(FamilyMember::from_object)
                .collect(),
            education: keyed_rows(
                record.lookup(&["educationalAttainment", "educational_attainment"]),
                EDUCATION_ORDER,
                |obj, key| {
                    let mut row = EducationRecord::from_object(obj);
                    if row.level.is_empty() {
                        row.level = humanize_key(key);
                    }
                    row
                },
                EducationRecord::from_object,
            ),
            sacraments: keyed_rows(
                record.lookup(&["sacramentalRecord", "sacramental_record"]),
                SACRAMENT_ORDER,
                |obj, key| {
                    let mut row = SacramentRecord::from_object(obj);
                    if row.sacrament.is_empty() {
                        row.sacrament = humanize_key(key);
                    }
                    row
                },
                SacramentRecord::from_object,
            ),
            agencies: items(&["agencies"])
                .iter()
                .map(AgencyRecord::from_object)
                .collect(),
            life_skills: items(&["lifeSkills", "life_skills"])
                .iter()
                .map(LifeSkillRecord::from_object)
                .collect(),
            vital_signs: items(&["vitalSigns", "vital_signs"])
                .iter()
                .map(VitalSignRecord::from_object)
                .collect(),
        }
    }
}

/// Objects of an array-shaped collection. JSON text is decoded first;
/// non-object elements are dropped.
fn list_items(value: &Value) -> Vec<Map<String, Value>> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        Value::String(text) => serde_json::from_str::<Value>(text)
            .map(|decoded| match decoded {
                Value::String(_) => Vec::new(),
                other => list_items(&other),
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Rows of a collection that may be an array or a map keyed by category.
fn keyed_rows<T>(
    value: Option<&Value>,
    order: &[&str],
    from_keyed: impl Fn(&Map<String, Value>, &str) -> T,
    from_plain: impl Fn(&Map<String, Value>) -> T,
) -> Vec<T> {
    let decoded;
    let value = match value {
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(parsed) => {
                decoded = parsed;
                &decoded
            }
            Err(_) => return Vec::new(),
        },
        Some(value) => value,
        None => return Vec::new(),
    };

    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Map<String, Value>)> = map
                .iter()
                .filter_map(|(key, entry)| entry.as_object().map(|obj| (key, obj)))
                .collect();
            entries.sort_by_key(|(key, _)| (rank(order, key), key.to_lowercase()));
            entries
                .into_iter()
                .map(|(key, obj)| from_keyed(obj, key))
                .collect()
        }
        Value::Array(_) => list_items(value).iter().map(from_plain).collect(),
        _ => Vec::new(),
    }
}

/// Position of a key in the canonical order; unknown keys sort last.
fn rank(order: &[&str], key: &str) -> usize {
    let folded: String = key
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    order
        .iter()
        .position(|known| *known == folded)
        .unwrap_or(order.len())
}

/// `highSchool` / `high_school` -> `High School`.
fn humanize_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in key.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_collections() {
        let record = CaseRecord::from(json!({
            "familyMembers": [
                {"name": "Ana", "relation": "Sister", "age": 12},
                {"full_name": "Ben", "relationship": "Brother"},
                "garbage"
            ],
            "vital_signs": [{"date_recorded": "2024-02-01T00:00:00Z", "blood_pressure": "110/70"}]
        }));
        let collections = CaseCollections::from_record(&record);

        assert_eq!(collections.family_members.len(), 2);
        assert_eq!(collections.family_members[0].age, "12");
        assert_eq!(collections.family_members[1].name, "Ben");
        assert_eq!(collections.family_members[1].relation, "Brother");
        assert_eq!(collections.vital_signs[0].date, "2024-02-01");
        assert!(collections.agencies.is_empty());
    }

    #[test]
    fn test_keyed_education_map_is_ordered() {
        let record = CaseRecord::from(json!({
            "educational_attainment": {
                "college": {"schoolName": "State U"},
                "elementary": {"school_name": "Central ES", "year": "2012"},
                "highSchool": {"schoolName": "National HS"}
            }
        }));
        let education = CaseCollections::from_record(&record).education;

        let levels: Vec<&str> = education.iter().map(|row| row.level.as_str()).collect();
        assert_eq!(levels, vec!["Elementary", "High School", "College"]);
        assert_eq!(education[0].year, "2012");
    }

    #[test]
    fn test_json_text_collections_are_decoded() {
        let record = CaseRecord::from(json!({
            "agencies": "[{\"name\":\"DSWD\",\"address\":\"Manila\"}]",
            "sacramentalRecord": "{\"baptism\":{\"date\":\"3/4/2011\",\"place\":\"St. Jude\"}}"
        }));
        let collections = CaseCollections::from_record(&record);

        assert_eq!(collections.agencies[0].name, "DSWD");
        assert_eq!(collections.sacraments[0].sacrament, "Baptism");
        assert_eq!(collections.sacraments[0].date_received, "2011-03-04");
    }

    #[test]
    fn test_only_date_columns_are_reformatted() {
        let record = CaseRecord::from(json!({
            "lifeSkills": [{
                "activity": "Cooking",
                "date": "12/25/2023",
                "remarks": "12/25/2023",
                "performance": "2024-01-05T00:00:00Z"
            }],
            "agencies": [{"name": "DSWD", "contact": "1/2/2020"}]
        }));
        let collections = CaseCollections::from_record(&record);

        let skill = &collections.life_skills[0];
        assert_eq!(skill.date, "2023-12-25");
        assert_eq!(skill.remarks, "12/25/2023");
        assert_eq!(skill.performance, "2024-01-05T00:00:00Z");
        assert_eq!(collections.agencies[0].contact, "1/2/2020");
    }

    #[test]
    fn test_client_spelling_wins_in_collections() {
        let record = CaseRecord::from(json!({
            "vitalSigns": [{"date": "2024-02-01", "heart_rate": "90", "pulseRate": "72"}]
        }));
        let collections = CaseCollections::from_record(&record);
        assert_eq!(collections.vital_signs[0].heart_rate, "72");
    }

    #[test]
    fn test_malformed_collections_are_empty() {
        let record = CaseRecord::from(json!({
            "familyMembers": "not json",
            "lifeSkills": 42,
            "educationalAttainment": true
        }));
        let collections = CaseCollections::from_record(&record);
        assert_eq!(collections, CaseCollections::default());
    }

    #[test]
    fn test_primary_field_decides_content() {
        let blank = FamilyMember {
            relation: "Cousin".into(),
            ..FamilyMember::default()
        };
        assert!(!blank.has_content());

        let sacrament = SacramentRecord {
            place: "Cathedral".into(),
            ..SacramentRecord::default()
        };
        assert!(sacrament.has_content());
    }

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("highSchool"), "High School");
        assert_eq!(humanize_key("senior_high"), "Senior High");
        assert_eq!(humanize_key("firstCommunion"), "First Communion");
    }
}
