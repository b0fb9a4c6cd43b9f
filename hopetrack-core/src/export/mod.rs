//! Document export
//!
//! Renderers for a single case (flat CSV, rich spreadsheet, Word document,
//! PDF report) and for the bulk case summary, plus the shared file naming
//! convention.

pub mod csv;
pub mod html;
pub mod pdf;
mod sections;

pub use sections::{case_sections, ReportSection, ReportTable};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::EXPORT_FILE_PREFIX;
use crate::normalize::{date_only, Field, NormalizedCase};

/// What an exported file contains; the second part of the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    CaseReport,
    CaseData,
    CaseSpreadsheet,
    CaseDocument,
    CasesSummary,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::CaseReport => "CaseReport",
            ArtifactKind::CaseData => "CaseData",
            ArtifactKind::CaseSpreadsheet => "CaseSpreadsheet",
            ArtifactKind::CaseDocument => "CaseDocument",
            ArtifactKind::CasesSummary => "CasesSummary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    /// Excel-openable: the flat single-case CSV and the rich spreadsheet.
    Xls,
    Csv,
    Doc,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Xls => "xls",
            FileFormat::Csv => "csv",
            FileFormat::Doc => "doc",
        }
    }
}

/// Identifier used for bulk exports.
pub const ALL_CASES_IDENTIFIER: &str = "AllCases";

/// `HOPETRACK_<ArtifactKind>_<Identifier>_<YYYY-MM-DD>.<ext>`
pub fn export_file_name(
    kind: ArtifactKind,
    identifier: &str,
    date: NaiveDate,
    format: FileFormat,
) -> String {
    format!(
        "{}_{}_{}_{}.{}",
        EXPORT_FILE_PREFIX,
        kind.as_str(),
        sanitize_identifier(identifier),
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Identifier for a single case: the client's name, else the case id.
pub fn case_identifier(case: &NormalizedCase) -> String {
    let name = case.full_name();
    if !name.is_empty() {
        return name;
    }
    match case.get(Field::Id) {
        "" => "Case".to_string(),
        id => format!("Case{}", id),
    }
}

/// Keep ASCII letters, digits and dashes; whitespace runs become one `_`.
fn sanitize_identifier(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len());
    let mut pending_gap = false;
    for c in identifier.trim().chars() {
        if c.is_whitespace() || c == '_' {
            pending_gap = true;
        } else if c.is_ascii_alphanumeric() || c == '-' {
            if pending_gap && !out.is_empty() {
                out.push('_');
            }
            pending_gap = false;
            out.push(c);
        }
    }
    if out.is_empty() {
        "Unknown".to_string()
    } else {
        out
    }
}

/// One row of the bulk summary exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaseSummary {
    pub name: String,
    pub age: String,
    pub program: String,
    pub last_updated: String,
}

impl CaseSummary {
    pub const COLUMNS: [&'static str; 4] = ["Name", "Age", "Program", "Last Updated"];

    pub fn from_case(case: &NormalizedCase, today: NaiveDate) -> Self {
        Self {
            name: case.full_name(),
            age: case.age_on(today),
            program: case.program().to_string(),
            last_updated: date_only(case.get(Field::LastUpdated)),
        }
    }

    pub fn cells(&self) -> [&str; 4] {
        [
            self.name.as_str(),
            self.age.as_str(),
            self.program.as_str(),
            self.last_updated.as_str(),
        ]
    }
}
