//! Social case study report for a single case.

use chrono::NaiveDate;

use super::canvas::{self, Canvas, Font};
use super::{decode_image, stamp_page_numbers, PdfOptions, Rgb, TableLayout};
use crate::config::{
    HEADER_BAND_HEIGHT, PAGE_MARGIN_X, PAGE_WIDTH, SECTION_BREAK_THRESHOLD, TABLE_BREAK_THRESHOLD,
    TEXT_AREA_HEIGHT, TEXT_AREA_SMALL_HEIGHT,
};
use crate::error::Result;
use crate::export::sections::is_marital_flag;
use crate::normalize::{long_date, Field, FlagField, FlagValue, NormalizedCase, TableRow};
use crate::status::display_label;

const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * PAGE_MARGIN_X;
const BODY_SIZE: f32 = 9.0;
const LINE_HEIGHT: f32 = 11.0;
const FORM_ROW_HEIGHT: f32 = 20.0;
const LOGO_BOX: f32 = 60.0;

/// Render the full case report.
///
/// Only serialization can fail; unreadable images and odd collection shapes
/// leave their region blank.
pub fn render_case_pdf(
    case: &NormalizedCase,
    options: &PdfOptions,
    today: NaiveDate,
) -> Result<Vec<u8>> {
    let mut report = CaseReport {
        canvas: Canvas::new(),
        case,
        options,
    };

    report.header_band(today);
    report.identifying_information(today);
    report.family_composition();
    report.civil_status();

    report.section("IV", "Brief Description of the Client");
    report.text_area(None, Field::BriefDescription, TEXT_AREA_HEIGHT);
    report.text_area(Some("Client"), Field::ClientDescription, TEXT_AREA_SMALL_HEIGHT);
    report.text_area(Some("Parents"), Field::ParentsDescription, TEXT_AREA_SMALL_HEIGHT);

    for (numeral, title, field) in [
        ("V", "Problem Presented", Field::ProblemPresented),
        ("VI", "Brief History of the Problem", Field::BriefHistory),
        ("VII", "Economic Situation", Field::EconomicSituation),
        ("VIII", "Medical History", Field::MedicalHistory),
        ("IX", "Family Background", Field::FamilyBackground),
    ] {
        report.section(numeral, title);
        report.text_area(None, field, TEXT_AREA_HEIGHT);
    }

    let collections = &case.collections;
    report.section("X", "Educational Attainment");
    report.table(&collections.education);
    report.section("XI", "Sacramental Record");
    report.table(&collections.sacraments);
    report.section("XII", "Family Members");
    report.table(&collections.family_members);
    report.section("XIII", "Extended Family");
    report.table(&collections.extended_family);
    report.section("XIV", "Agencies Involved");
    report.table(&collections.agencies);

    report.section("XV", "Assessment and Recommendation");
    report.text_area(Some("Assessment"), Field::Assessment, TEXT_AREA_HEIGHT);
    report.text_area(Some("Recommendation"), Field::Recommendation, TEXT_AREA_HEIGHT);

    report.section("XVI", "Life Skills");
    report.table(&collections.life_skills);
    report.section("XVII", "Vital Signs");
    report.table(&collections.vital_signs);

    report.section("XVIII", "Intervention Plan");
    report.text_area(None, Field::InterventionPlan, TEXT_AREA_HEIGHT);
    report.text_area(Some("Progress Notes"), Field::Notes, TEXT_AREA_SMALL_HEIGHT);

    let mut canvas = report.canvas;
    tracing::debug!("Case report laid out on {} pages", canvas.page_count());
    stamp_page_numbers(&mut canvas, &format!("{} - Confidential", options.title));
    canvas.finish()
}

struct CaseReport<'a> {
    canvas: Canvas,
    case: &'a NormalizedCase,
    options: &'a PdfOptions,
}

impl CaseReport<'_> {
    fn header_band(&mut self, today: NaiveDate) {
        let color = self.options.header_color;
        self.canvas
            .fill_rect(0.0, 0.0, PAGE_WIDTH, HEADER_BAND_HEIGHT, color);

        let top = (HEADER_BAND_HEIGHT - LOGO_BOX) / 2.0;
        if let Some(logo) = self.options.logo.as_deref().and_then(|b| decode_image(b, "logo")) {
            self.canvas.image(logo, PAGE_MARGIN_X, top, LOGO_BOX, LOGO_BOX);
        }
        if let Some(photo) = self
            .options
            .photo
            .as_deref()
            .and_then(|b| decode_image(b, "photo"))
        {
            let x = PAGE_WIDTH - PAGE_MARGIN_X - LOGO_BOX;
            self.canvas.image(photo, x, top, LOGO_BOX, LOGO_BOX);
        }

        let title = self.options.title.clone();
        let subtitle = self.options.subtitle.clone();
        self.canvas
            .text_centered(0.0, PAGE_WIDTH, 32.0, 18.0, Font::Bold, Rgb::WHITE, &title);
        self.canvas
            .text_centered(0.0, PAGE_WIDTH, 50.0, 11.0, Font::Regular, Rgb::WHITE, &subtitle);
        let generated = format!("Date Generated: {}", long_date(&today.to_string()));
        self.canvas
            .text_centered(0.0, PAGE_WIDTH, 66.0, 8.0, Font::Regular, Rgb::WHITE, &generated);

        self.canvas.set_y(HEADER_BAND_HEIGHT + 14.0);
    }

    fn section(&mut self, numeral: &str, title: &str) {
        self.canvas.ensure(SECTION_BREAK_THRESHOLD);
        self.canvas.advance(6.0);
        let top = self.canvas.y();
        self.canvas
            .fill_rect(PAGE_MARGIN_X, top, CONTENT_WIDTH, 18.0, Rgb::SECTION);
        let heading = format!("{}. {}", numeral, title.to_uppercase());
        self.canvas.text(
            PAGE_MARGIN_X + 6.0,
            top + 13.0,
            10.0,
            Font::Bold,
            Rgb::BLACK,
            &heading,
        );
        self.canvas.advance(24.0);
    }

    /// Bold label, underline rule, value; `N/A` when blank.
    fn form_row(&mut self, fields: &[(&str, String)]) {
        if fields.is_empty() {
            return;
        }
        self.canvas.ensure(FORM_ROW_HEIGHT);
        let baseline = self.canvas.y() + BODY_SIZE + 3.0;
        let column_width = CONTENT_WIDTH / fields.len() as f32;

        for (index, (label, value)) in fields.iter().enumerate() {
            let x = PAGE_MARGIN_X + index as f32 * column_width;
            let label = format!("{}:", label);
            let label_width = canvas::text_width(&label, BODY_SIZE, Font::Bold);
            self.canvas
                .text(x, baseline, BODY_SIZE, Font::Bold, Rgb::BLACK, &label);

            let rule_start = x + label_width + 4.0;
            let rule_end = x + column_width - 10.0;
            self.canvas
                .line(rule_start, baseline + 2.0, rule_end, baseline + 2.0, Rgb::GRID);

            let value = if value.trim().is_empty() { "N/A" } else { value.as_str() };
            let value = canvas::truncate(
                value,
                (rule_end - rule_start - 4.0).max(0.0),
                BODY_SIZE,
                Font::Regular,
            );
            self.canvas.text(
                rule_start + 2.0,
                baseline,
                BODY_SIZE,
                Font::Regular,
                Rgb::BLACK,
                &value,
            );
        }
        self.canvas.advance(FORM_ROW_HEIGHT);
    }

    fn field(&self, field: Field) -> (&'static str, String) {
        (field.label(), self.case.display(field))
    }

    fn flag_text(&self, flag: FlagField) -> String {
        self.case.flags.get(flag).label().to_string()
    }

    /// Bordered fixed-height box. Lines that do not fit are dropped; the box
    /// never grows.
    fn text_area(&mut self, label: Option<&str>, field: Field, height: f32) {
        let label_height = if label.is_some() { 14.0 } else { 0.0 };
        self.canvas.ensure(label_height + height + 6.0);

        if let Some(label) = label {
            let baseline = self.canvas.y() + BODY_SIZE;
            self.canvas
                .text(PAGE_MARGIN_X, baseline, BODY_SIZE, Font::Bold, Rgb::BLACK, label);
            self.canvas.advance(label_height);
        }

        let top = self.canvas.y();
        self.canvas
            .stroke_rect(PAGE_MARGIN_X, top, CONTENT_WIDTH, height, Rgb::GRID);

        let value = self.case.get(field);
        let value = if value.trim().is_empty() { "N/A" } else { value };
        let lines = canvas::wrap(value, CONTENT_WIDTH - 12.0, BODY_SIZE, Font::Regular);
        let capacity = ((height - 8.0) / LINE_HEIGHT).floor().max(0.0) as usize;
        if lines.len() > capacity {
            tracing::debug!(
                "{} truncated to {} of {} lines",
                field.label(),
                capacity,
                lines.len()
            );
        }
        for (index, line) in lines.iter().take(capacity).enumerate() {
            self.canvas.text(
                PAGE_MARGIN_X + 6.0,
                top + 4.0 + BODY_SIZE + index as f32 * LINE_HEIGHT,
                BODY_SIZE,
                Font::Regular,
                Rgb::BLACK,
                line,
            );
        }
        self.canvas.advance(height + 6.0);
    }

    /// Rows without a primary value are left out. When no row has one, the
    /// table is skipped and a single `N/A` line takes its place.
    fn table<T: TableRow>(&mut self, rows: &[T]) {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .filter(|row| row.has_content())
            .map(|row| row.cells().into_iter().map(str::to_string).collect())
            .collect();

        if rows.is_empty() {
            let baseline = self.canvas.y() + BODY_SIZE;
            self.canvas.text(
                PAGE_MARGIN_X + 6.0,
                baseline,
                BODY_SIZE,
                Font::Regular,
                Rgb::MUTED,
                "N/A",
            );
            self.canvas.advance(LINE_HEIGHT + 4.0);
            return;
        }

        let layout = TableLayout {
            x: PAGE_MARGIN_X,
            width: CONTENT_WIDTH,
            columns: T::columns(),
            font_size: 8.0,
            max_lines: 3,
            header_color: self.options.header_color,
        };
        layout.draw(&mut self.canvas, &rows, TABLE_BREAK_THRESHOLD);
        self.canvas.advance(6.0);
    }

    fn identifying_information(&mut self, today: NaiveDate) {
        let case = self.case;
        self.section("I", "Identifying Information");

        self.form_row(&[
            ("Name", case.full_name()),
            self.field(Field::Nickname),
        ]);
        self.form_row(&[self.field(Field::Sex), self.field(Field::Birthdate)]);
        self.form_row(&[("Age", case.age_on(today)), self.field(Field::Birthplace)]);
        self.form_row(&[self.field(Field::Nationality), self.field(Field::Religion)]);
        self.form_row(&[self.field(Field::PresentAddress)]);
        self.form_row(&[self.field(Field::ProvincialAddress)]);
        self.form_row(&[self.field(Field::Address)]);
        self.form_row(&[
            self.field(Field::Barangay),
            self.field(Field::Municipality),
            self.field(Field::Province),
        ]);
        self.form_row(&[
            self.field(Field::SourceOfReferral),
            self.field(Field::DateOfReferral),
        ]);
        self.form_row(&[self.field(Field::OtherSourceOfReferral)]);
        self.form_row(&[
            self.field(Field::AddressAndTel),
            self.field(Field::RelationToClient),
        ]);
        self.form_row(&[
            self.field(Field::Program),
            ("Status", display_label(case.get(Field::Status)).to_string()),
        ]);
        self.form_row(&[
            self.field(Field::AssignedHouseParent),
            self.field(Field::AdmissionMonth),
            self.field(Field::AdmissionYear),
        ]);
    }

    fn family_composition(&mut self) {
        self.section("II", "Family/Household Composition");

        let parents = [
            (
                "Father",
                [
                    Field::FatherName,
                    Field::FatherAge,
                    Field::FatherEducation,
                    Field::FatherOccupation,
                    Field::FatherOtherSkills,
                    Field::FatherIncome,
                    Field::FatherAddress,
                ],
                FlagField::FatherLiving,
            ),
            (
                "Mother",
                [
                    Field::MotherName,
                    Field::MotherAge,
                    Field::MotherEducation,
                    Field::MotherOccupation,
                    Field::MotherOtherSkills,
                    Field::MotherIncome,
                    Field::MotherAddress,
                ],
                FlagField::MotherLiving,
            ),
            (
                "Guardian",
                [
                    Field::GuardianName,
                    Field::GuardianAge,
                    Field::GuardianEducation,
                    Field::GuardianOccupation,
                    Field::GuardianOtherSkills,
                    Field::GuardianIncome,
                    Field::GuardianAddress,
                ],
                FlagField::GuardianLiving,
            ),
        ];

        for (_, [name, age, education, occupation, skills, income, address], living) in parents {
            self.form_row(&[
                self.field(name),
                self.field(age),
                ("Living", self.flag_text(living)),
            ]);
            self.form_row(&[self.field(education), self.field(occupation)]);
            self.form_row(&[self.field(skills), self.field(income)]);
            self.form_row(&[self.field(address)]);
            self.canvas.advance(4.0);
        }
    }

    fn civil_status(&mut self) {
        self.section("III", "Civil Status of Parents");

        let flags: Vec<(FlagField, FlagValue)> = self
            .case
            .flags
            .iter()
            .filter(|(flag, _)| is_marital_flag(*flag))
            .map(|(flag, value)| (flag, value.clone()))
            .collect();

        self.canvas.ensure(FORM_ROW_HEIGHT);
        let top = self.canvas.y();
        let column_width = CONTENT_WIDTH / flags.len().max(1) as f32;
        for (index, (flag, value)) in flags.iter().enumerate() {
            let x = PAGE_MARGIN_X + index as f32 * column_width;
            self.canvas.stroke_rect(x, top + 1.0, 9.0, 9.0, Rgb::BLACK);
            if value.is_yes() {
                self.canvas
                    .text(x + 1.8, top + 8.8, 9.0, Font::Bold, Rgb::BLACK, "X");
            }
            let label = match value {
                FlagValue::Unknown(raw) if !raw.trim().is_empty() => {
                    format!("{} ({})", flag.label(), raw.trim())
                }
                _ => flag.label().to_string(),
            };
            let label = canvas::truncate(&label, column_width - 16.0, BODY_SIZE, Font::Regular);
            self.canvas
                .text(x + 13.0, top + 9.0, BODY_SIZE, Font::Regular, Rgb::BLACK, &label);
        }
        self.canvas.advance(FORM_ROW_HEIGHT);

        self.form_row(&[self.field(Field::MarriageDatePlace)]);
    }
}
