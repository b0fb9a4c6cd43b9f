//! Canonical field set and its resolution table.
//!
//! Every canonical field lists its candidate keys in precedence order:
//! client (camelCase) spelling first, server (snake_case) spelling after.
//! Resolution walks that list and takes the first present value.

use serde_json::{Map, Value};

use super::derived::date_only;
use crate::models::lookup;

macro_rules! resolution_table {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $label:literal, [$($key:literal),+ $(,)?] ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every field, in table order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Human-readable column/field label.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Candidate keys in precedence order.
            pub fn candidates(self) -> &'static [&'static str] {
                match self {
                    $($name::$variant => &[$($key),+]),+
                }
            }

            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

resolution_table! {
    /// Text fields of the canonical case record.
    pub enum Field {
        Id => "Case ID", ["id", "caseId", "case_id"],
        FirstName => "First Name", ["firstName", "first_name"],
        MiddleName => "Middle Name", ["middleName", "middle_name"],
        LastName => "Last Name", ["lastName", "last_name"],
        Nickname => "Nickname", ["nickname", "nick_name"],
        Sex => "Sex", ["sex", "gender"],
        Birthdate => "Birthdate", ["birthdate", "birthDate", "birth_date"],
        Birthplace => "Birthplace", ["birthplace", "birthPlace", "birth_place"],
        Nationality => "Nationality", ["nationality"],
        Religion => "Religion", ["religion"],
        Status => "Status", ["status"],

        Address => "Address", ["address"],
        PresentAddress => "Present Address", ["presentAddress", "present_address"],
        ProvincialAddress => "Provincial Address", ["provincialAddress", "provincial_address"],
        Barangay => "Barangay", ["barangay"],
        Municipality => "Municipality", ["municipality"],
        Province => "Province", ["province"],

        SourceOfReferral => "Source of Referral", ["sourceOfReferral", "source_of_referral"],
        OtherSourceOfReferral => "Other Source of Referral",
            ["otherSourceOfReferral", "other_source_of_referral"],
        DateOfReferral => "Date of Referral", ["dateOfReferral", "date_of_referral"],
        AddressAndTel => "Address and Tel. No.", ["addressAndTel", "address_and_tel"],
        RelationToClient => "Relation to Client", ["relationToClient", "relation_to_client"],

        Program => "Program", ["caseType", "programType", "case_type", "program_type"],
        AssignedHouseParent => "Assigned House Parent",
            ["assignedHouseParent", "assigned_house_parent"],
        AdmissionMonth => "Admission Month", ["admissionMonth", "admission_month"],
        AdmissionYear => "Admission Year", ["admissionYear", "admission_year"],

        FatherName => "Father's Name", ["fatherName", "father_name"],
        FatherAge => "Father's Age", ["fatherAge", "father_age"],
        FatherEducation => "Father's Education", ["fatherEducation", "father_education"],
        FatherOccupation => "Father's Occupation", ["fatherOccupation", "father_occupation"],
        FatherOtherSkills => "Father's Other Skills", ["fatherOtherSkills", "father_other_skills"],
        FatherAddress => "Father's Address", ["fatherAddress", "father_address"],
        FatherIncome => "Father's Income", ["fatherIncome", "father_income"],

        MotherName => "Mother's Name", ["motherName", "mother_name"],
        MotherAge => "Mother's Age", ["motherAge", "mother_age"],
        MotherEducation => "Mother's Education", ["motherEducation", "mother_education"],
        MotherOccupation => "Mother's Occupation", ["motherOccupation", "mother_occupation"],
        MotherOtherSkills => "Mother's Other Skills", ["motherOtherSkills", "mother_other_skills"],
        MotherAddress => "Mother's Address", ["motherAddress", "mother_address"],
        MotherIncome => "Mother's Income", ["motherIncome", "mother_income"],

        GuardianName => "Guardian's Name", ["guardianName", "guardian_name"],
        GuardianAge => "Guardian's Age", ["guardianAge", "guardian_age"],
        GuardianEducation => "Guardian's Education", ["guardianEducation", "guardian_education"],
        GuardianOccupation => "Guardian's Occupation", ["guardianOccupation", "guardian_occupation"],
        GuardianOtherSkills => "Guardian's Other Skills",
            ["guardianOtherSkills", "guardian_other_skills"],
        GuardianAddress => "Guardian's Address", ["guardianAddress", "guardian_address"],
        GuardianIncome => "Guardian's Income", ["guardianIncome", "guardian_income"],

        MarriageDatePlace => "Date and Place of Marriage",
            ["marriageDatePlace", "marriage_date_place"],

        BriefDescription => "Brief Description", ["briefDescription", "brief_description"],
        ProblemPresented => "Problem Presented", ["problemPresented", "problem_presented"],
        BriefHistory => "Brief History", ["briefHistory", "brief_history"],
        EconomicSituation => "Economic Situation", ["economicSituation", "economic_situation"],
        MedicalHistory => "Medical History", ["medicalHistory", "medical_history"],
        FamilyBackground => "Family Background", ["familyBackground", "family_background"],
        ClientDescription => "Client Description", ["clientDescription", "client_description"],
        ParentsDescription => "Parents Description", ["parentsDescription", "parents_description"],
        Assessment => "Assessment", ["assessment"],
        Recommendation => "Recommendation", ["recommendation"],
        InterventionPlan => "Intervention Plan", ["interventionPlan", "intervention_plan"],
        Notes => "Notes", ["notes", "progress"],

        LastUpdated => "Last Updated",
            ["lastUpdated", "timestamp", "updatedAt", "last_updated", "updated_at"],
        CreatedAt => "Created", ["createdAt", "created_at"],
    }
}

resolution_table! {
    /// Yes/no fields of the canonical case record.
    pub enum FlagField {
        FatherLiving => "Father Living", ["fatherLiving", "father_living"],
        MotherLiving => "Mother Living", ["motherLiving", "mother_living"],
        GuardianLiving => "Guardian Living", ["guardianLiving", "guardian_living"],
        MarriedInChurch => "Married in Church", ["marriedInChurch", "married_in_church"],
        LiveInCommonLaw => "Live-in / Common Law", ["liveInCommonLaw", "live_in_common_law"],
        CivilMarriage => "Civil Marriage", ["civilMarriage", "civil_marriage"],
        Separated => "Separated", ["separated"],
    }
}

impl Field {
    /// Fields holding dates; displayed through `date_only`.
    pub fn is_date(self) -> bool {
        matches!(
            self,
            Field::Birthdate | Field::DateOfReferral | Field::LastUpdated | Field::CreatedAt
        )
    }
}

/// Value of a yes/no field.
///
/// `Unknown` carries whatever non-boolean text was found; it is never
/// coerced to `No`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Yes,
    No,
    Unknown(String),
}

impl Default for FlagValue {
    fn default() -> Self {
        FlagValue::Unknown(String::new())
    }
}

impl FlagValue {
    pub fn label(&self) -> &str {
        match self {
            FlagValue::Yes => "Yes",
            FlagValue::No => "No",
            FlagValue::Unknown(raw) => raw,
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, FlagValue::Yes)
    }
}

/// The canonical text fields. Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFields {
    values: Vec<String>,
}

impl Default for CaseFields {
    fn default() -> Self {
        Self {
            values: vec![String::new(); Field::ALL.len()],
        }
    }
}

impl CaseFields {
    pub fn resolve(map: &Map<String, Value>) -> Self {
        Self {
            values: Field::ALL
                .iter()
                .map(|field| resolve_text(map, field.candidates()))
                .collect(),
        }
    }

    /// Raw resolved value.
    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    /// Value prepared for documents: dates reduced to `YYYY-MM-DD`.
    pub fn display(&self, field: Field) -> String {
        let value = self.get(field);
        if field.is_date() {
            date_only(value)
        } else {
            value.to_string()
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL.iter().map(move |field| (*field, self.get(*field)))
    }
}

/// The canonical yes/no fields. Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFlags {
    values: Vec<FlagValue>,
}

impl Default for CaseFlags {
    fn default() -> Self {
        Self {
            values: vec![FlagValue::default(); FlagField::ALL.len()],
        }
    }
}

impl CaseFlags {
    pub fn resolve(map: &Map<String, Value>) -> Self {
        Self {
            values: FlagField::ALL
                .iter()
                .map(|field| resolve_flag(map, field.candidates()))
                .collect(),
        }
    }

    pub fn get(&self, field: FlagField) -> &FlagValue {
        &self.values[field.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlagField, &FlagValue)> {
        FlagField::ALL.iter().map(move |field| (*field, self.get(*field)))
    }
}

/// Resolve a text value; absent everywhere means "".
pub(crate) fn resolve_text(map: &Map<String, Value>, candidates: &[&str]) -> String {
    lookup(map, candidates).and_then(value_text).unwrap_or_default()
}

/// Three-way flag resolution: client boolean, then server boolean, then
/// the first present value passed through as unknown text.
fn resolve_flag(map: &Map<String, Value>, candidates: &[&str]) -> FlagValue {
    let Some((client, server)) = candidates.split_first() else {
        return FlagValue::default();
    };

    let as_bool = |key: &str| map.get(key).and_then(Value::as_bool);
    let found = as_bool(*client).or_else(|| server.iter().find_map(|key| as_bool(*key)));

    match found {
        Some(true) => FlagValue::Yes,
        Some(false) => FlagValue::No,
        None => FlagValue::Unknown(resolve_text(map, candidates)),
    }
}

/// Scalar JSON values as text. Nested arrays/objects do not belong in a
/// flat field and resolve as absent.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_resolution_table_is_complete() {
        for field in Field::ALL {
            assert!(!field.candidates().is_empty(), "{:?}", field);
            assert!(!field.label().is_empty());
        }
    }

    #[test]
    fn test_empty_input_resolves_all_blank() {
        let fields = CaseFields::resolve(&Map::new());
        assert!(fields.iter().all(|(_, value)| value.is_empty()));
        let flags = CaseFlags::resolve(&Map::new());
        assert!(flags.iter().all(|(_, value)| *value == FlagValue::default()));
    }

    #[test]
    fn test_camel_case_wins_over_snake_case() {
        let map = object(json!({
            "firstName": "Client",
            "first_name": "Server",
            "last_name": "Only Server"
        }));
        let fields = CaseFields::resolve(&map);
        assert_eq!(fields.get(Field::FirstName), "Client");
        assert_eq!(fields.get(Field::LastName), "Only Server");
    }

    #[test]
    fn test_every_client_spelling_precedes_server_spelling() {
        let map = object(json!({
            "case_type": "Youth",
            "programType": "Children",
            "last_updated": "2020-01-01",
            "updatedAt": "2024-06-01"
        }));
        let fields = CaseFields::resolve(&map);
        assert_eq!(fields.get(Field::Program), "Children");
        assert_eq!(fields.get(Field::LastUpdated), "2024-06-01");

        for field in Field::ALL {
            let candidates = field.candidates();
            if let Some(first_snake) = candidates.iter().position(|key| key.contains('_')) {
                assert!(
                    candidates[first_snake..]
                        .iter()
                        .all(|key| key.contains('_') || !key.chars().any(|c| c.is_uppercase())),
                    "{:?} lists a camelCase key after a snake_case one",
                    field
                );
            }
        }
    }

    #[test]
    fn test_numbers_and_nested_values() {
        let map = object(json!({
            "fatherAge": 0,
            "admission_year": 2021,
            "address": {"street": "x"}
        }));
        let fields = CaseFields::resolve(&map);
        assert_eq!(fields.get(Field::FatherAge), "0");
        assert_eq!(fields.get(Field::AdmissionYear), "2021");
        assert_eq!(fields.get(Field::Address), "");
    }

    #[test]
    fn test_flag_three_way_logic() {
        let map = object(json!({
            "fatherLiving": true,
            "motherLiving": "unknown",
            "mother_living": false,
            "guardianLiving": "deceased?",
            "separated": null
        }));
        let flags = CaseFlags::resolve(&map);
        assert_eq!(flags.get(FlagField::FatherLiving), &FlagValue::Yes);
        assert_eq!(flags.get(FlagField::MotherLiving), &FlagValue::No);
        assert_eq!(
            flags.get(FlagField::GuardianLiving),
            &FlagValue::Unknown("deceased?".into())
        );
        assert_eq!(flags.get(FlagField::Separated), &FlagValue::default());
    }

    #[test]
    fn test_display_normalizes_dates_only() {
        let map = object(json!({
            "birthdate": "2010-06-15T00:00:00.000Z",
            "notes": "seen 2/1/2017"
        }));
        let fields = CaseFields::resolve(&map);
        assert_eq!(fields.display(Field::Birthdate), "2010-06-15");
        assert_eq!(fields.display(Field::Notes), "seen 2/1/2017");
    }
}
