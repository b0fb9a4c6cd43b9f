//! Flat CSV export
//!
//! A single case becomes one header row and one data row; nested
//! collections are flattened into a single cell each. The bulk export is a
//! reduced four-column summary.

use chrono::NaiveDate;

use super::CaseSummary;
use crate::error::{AppError, Result};
use crate::normalize::{Field, NormalizedCase, TableRow};

/// Header and value pairs of one case, in column order.
fn case_columns(case: &NormalizedCase, today: NaiveDate) -> Vec<(String, String)> {
    let mut columns = Vec::new();

    for field in Field::ALL {
        columns.push((field.label().to_string(), case.display(*field)));
        if *field == Field::Birthdate {
            columns.push(("Age".to_string(), case.age_on(today)));
        }
    }

    for (flag, value) in case.flags.iter() {
        columns.push((flag.label().to_string(), value.label().to_string()));
    }

    let collections = &case.collections;
    let flattened = [
        ("Family Members", flatten(&collections.family_members)),
        ("Extended Family", flatten(&collections.extended_family)),
        ("Educational Attainment", flatten(&collections.education)),
        ("Sacramental Record", flatten(&collections.sacraments)),
        ("Agencies", flatten(&collections.agencies)),
        ("Life Skills", flatten(&collections.life_skills)),
        ("Vital Signs", flatten(&collections.vital_signs)),
    ];
    columns.extend(
        flattened
            .into_iter()
            .map(|(label, value)| (label.to_string(), value)),
    );

    columns
}

/// `[1] Name: Ana | Age: 12 || [2] Name: Ben`
///
/// Blank values are left out; elements with nothing to show are skipped.
pub fn flatten<T: TableRow>(rows: &[T]) -> String {
    rows.iter()
        .filter_map(|row| {
            let pairs: Vec<String> = T::columns()
                .iter()
                .zip(row.cells())
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(label, value)| format!("{}: {}", label, value))
                .collect();
            (!pairs.is_empty()).then(|| pairs.join(" | "))
        })
        .enumerate()
        .map(|(index, element)| format!("[{}] {}", index + 1, element))
        .collect::<Vec<_>>()
        .join(" || ")
}

/// Collapse every run of CR/LF characters to one space.
fn single_line(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_break = false;
    for c in value.chars() {
        if c == '\r' || c == '\n' {
            if !in_break {
                out.push(' ');
            }
            in_break = true;
        } else {
            in_break = false;
            out.push(c);
        }
    }
    out
}

fn write_rows<I, R>(rows: I) -> Result<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<str>,
{
    let mut writer = ::csv::WriterBuilder::new()
        .quote_style(::csv::QuoteStyle::Always)
        .terminator(::csv::Terminator::CRLF)
        .from_writer(Vec::new());

    for row in rows {
        let cells: Vec<String> = row
            .into_iter()
            .map(|cell| single_line(cell.as_ref()))
            .collect();
        writer.write_record(&cells)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Export(format!("Failed to finish CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Export(format!("CSV is not UTF-8: {}", e)))
}

/// Full single-case export: every field, derived age, flags and flattened
/// collections.
pub fn render_case_csv(case: &NormalizedCase, today: NaiveDate) -> Result<String> {
    let (headers, values): (Vec<String>, Vec<String>) =
        case_columns(case, today).into_iter().unzip();
    tracing::debug!("Rendering case CSV with {} columns", headers.len());
    write_rows([headers, values])
}

/// Bulk export: Name, Age, Program, Last Updated.
pub fn render_all_cases_csv(cases: &[CaseSummary]) -> Result<String> {
    let header: Vec<String> = CaseSummary::COLUMNS
        .iter()
        .map(|column| column.to_string())
        .collect();
    let rows = cases.iter().map(|case| -> Vec<String> {
        case.cells().iter().map(|cell| cell.to_string()).collect()
    });
    write_rows(std::iter::once(header).chain(rows))
}
