//! Section model shared by the HTML-based renderers.

use chrono::NaiveDate;

use crate::normalize::{CaseCollections, Field, FlagField, NormalizedCase, TableRow};
use crate::status::display_label;

/// A titled group of label/value pairs and an optional table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub title: &'static str,
    pub fields: Vec<(&'static str, String)>,
    pub table: Option<ReportTable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn from_rows<T: TableRow>(rows: &[T]) -> Self {
        Self {
            columns: T::columns(),
            rows: rows
                .iter()
                .map(|row| row.cells().into_iter().map(str::to_string).collect())
                .collect(),
        }
    }
}

impl ReportSection {
    fn fields(title: &'static str, case: &NormalizedCase, fields: &[Field]) -> Self {
        Self {
            title,
            fields: fields
                .iter()
                .map(|field| (field.label(), case.display(*field)))
                .collect(),
            table: None,
        }
    }

    fn table<T: TableRow>(title: &'static str, rows: &[T]) -> Self {
        Self {
            title,
            fields: Vec::new(),
            table: Some(ReportTable::from_rows(rows)),
        }
    }

    fn with_field(mut self, at: usize, label: &'static str, value: String) -> Self {
        let at = at.min(self.fields.len());
        self.fields.insert(at, (label, value));
        self
    }
}

const PERSONAL: &[Field] = &[
    Field::Id,
    Field::FirstName,
    Field::MiddleName,
    Field::LastName,
    Field::Nickname,
    Field::Sex,
    Field::Birthdate,
    Field::Birthplace,
    Field::Nationality,
    Field::Religion,
];

const ADDRESSES: &[Field] = &[
    Field::Address,
    Field::PresentAddress,
    Field::ProvincialAddress,
    Field::Barangay,
    Field::Municipality,
    Field::Province,
];

const REFERRAL: &[Field] = &[
    Field::SourceOfReferral,
    Field::OtherSourceOfReferral,
    Field::DateOfReferral,
    Field::AddressAndTel,
    Field::RelationToClient,
];

const CASE_DETAILS: &[Field] = &[
    Field::Program,
    Field::AssignedHouseParent,
    Field::AdmissionMonth,
    Field::AdmissionYear,
    Field::CreatedAt,
    Field::LastUpdated,
];

const PARENTS: &[Field] = &[
    Field::FatherName,
    Field::FatherAge,
    Field::FatherEducation,
    Field::FatherOccupation,
    Field::FatherOtherSkills,
    Field::FatherAddress,
    Field::FatherIncome,
    Field::MotherName,
    Field::MotherAge,
    Field::MotherEducation,
    Field::MotherOccupation,
    Field::MotherOtherSkills,
    Field::MotherAddress,
    Field::MotherIncome,
    Field::GuardianName,
    Field::GuardianAge,
    Field::GuardianEducation,
    Field::GuardianOccupation,
    Field::GuardianOtherSkills,
    Field::GuardianAddress,
    Field::GuardianIncome,
    Field::MarriageDatePlace,
];

const NARRATIVE: &[Field] = &[
    Field::BriefDescription,
    Field::ProblemPresented,
    Field::BriefHistory,
    Field::EconomicSituation,
    Field::MedicalHistory,
    Field::FamilyBackground,
    Field::ClientDescription,
    Field::ParentsDescription,
    Field::Assessment,
    Field::Recommendation,
    Field::Notes,
];

/// The spreadsheet/document sections of a case, in display order.
pub fn case_sections(case: &NormalizedCase, today: NaiveDate) -> Vec<ReportSection> {
    let CaseCollections {
        family_members,
        extended_family,
        education,
        sacraments,
        agencies,
        life_skills,
        vital_signs,
    } = &case.collections;

    let age_at = PERSONAL
        .iter()
        .position(|field| *field == Field::Birthdate)
        .map_or(PERSONAL.len(), |index| index + 1);

    let mut family = ReportSection::fields("Family Composition", case, PARENTS);
    family.fields.extend(
        case.flags
            .iter()
            .map(|(flag, value)| (flag.label(), value.label().to_string())),
    );
    family.table = Some(ReportTable::from_rows(family_members));

    vec![
        ReportSection::fields("Personal Information", case, PERSONAL).with_field(
            age_at,
            "Age",
            case.age_on(today),
        ),
        ReportSection::fields("Addresses", case, ADDRESSES),
        ReportSection::fields("Referral", case, REFERRAL),
        ReportSection::fields("Case Details", case, CASE_DETAILS).with_field(
            1,
            "Status",
            display_label(case.get(Field::Status)).to_string(),
        ),
        family,
        ReportSection::table("Extended Family", extended_family),
        ReportSection::table("Educational Attainment", education),
        ReportSection::table("Sacramental Record", sacraments),
        ReportSection::table("Agencies", agencies),
        ReportSection::table("Life Skills", life_skills),
        ReportSection::table("Vital Signs", vital_signs),
        ReportSection::fields("Narrative", case, NARRATIVE),
        ReportSection::fields("Intervention Plan", case, &[Field::InterventionPlan]),
    ]
}

/// Whether a flag counts toward the parents' civil status.
pub(crate) fn is_marital_flag(flag: FlagField) -> bool {
    matches!(
        flag,
        FlagField::MarriedInChurch
            | FlagField::LiveInCommonLaw
            | FlagField::CivilMarriage
            | FlagField::Separated
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CaseRecord;
    use crate::normalize::normalize;
    use serde_json::json;

    #[test]
    fn test_section_order_and_titles() {
        let case = normalize(&CaseRecord::default());
        let titles: Vec<&str> = case_sections(&case, NaiveDate::MIN)
            .iter()
            .map(|section| section.title)
            .collect();
        assert_eq!(
            titles,
            vec![
                "Personal Information",
                "Addresses",
                "Referral",
                "Case Details",
                "Family Composition",
                "Extended Family",
                "Educational Attainment",
                "Sacramental Record",
                "Agencies",
                "Life Skills",
                "Vital Signs",
                "Narrative",
                "Intervention Plan",
            ]
        );
    }

    #[test]
    fn test_derived_values_in_sections() {
        let case = normalize(&CaseRecord::from(json!({
            "birthdate": "2015-01-01",
            "status": "aftercare",
            "fatherLiving": false,
            "familyMembers": [{"name": "Ana"}, {"name": "Ben"}]
        })));
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let sections = case_sections(&case, today);

        let personal = &sections[0];
        let birth = personal
            .fields
            .iter()
            .position(|(label, _)| *label == "Birthdate")
            .unwrap();
        assert_eq!(personal.fields[birth + 1], ("Age", "10".to_string()));

        assert!(sections[3]
            .fields
            .contains(&("Status", "After Care".to_string())));

        let family = &sections[4];
        assert!(family
            .fields
            .contains(&("Father Living", "No".to_string())));
        assert_eq!(family.table.as_ref().unwrap().rows.len(), 2);
    }
}
