//! Export service
//!
//! Fetches full case details, renders the requested document and writes it
//! to the export directory. Detail fetches that fail fall back to the
//! summary record already held in memory.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::api::CaseApi;
use super::settings::ExportSettings;
use crate::error::Result;
use crate::export::pdf::{render_all_cases_pdf, render_case_pdf, PdfOptions, Rgb};
use crate::export::{
    case_identifier, csv, export_file_name, html, ArtifactKind, CaseSummary, FileFormat,
    ALL_CASES_IDENTIFIER,
};
use crate::models::CaseRecord;
use crate::normalize::{normalize, today};

#[derive(Clone)]
pub struct ExportService {
    api: CaseApi,
    output_dir: PathBuf,
    pdf_options: PdfOptions,
}

impl ExportService {
    pub fn new(api: CaseApi, output_dir: PathBuf, pdf_options: PdfOptions) -> Self {
        Self {
            api,
            output_dir,
            pdf_options,
        }
    }

    /// Build from settings. A relative output directory is resolved against
    /// `app_data_dir`; an unreadable logo is logged and left out.
    pub async fn from_settings(api: CaseApi, app_data_dir: &Path, settings: &ExportSettings) -> Self {
        let output_dir = {
            let configured = PathBuf::from(&settings.output_dir);
            if configured.is_absolute() {
                configured
            } else {
                app_data_dir.join(configured)
            }
        };

        let logo = match &settings.logo_path {
            Some(path) => match fs::read(path).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!("Failed to read report logo {}: {}", path, e);
                    None
                }
            },
            None => None,
        };

        let header_color = Rgb::from_hex(&settings.header_color).unwrap_or_else(|| {
            tracing::warn!("Invalid header color {:?}, using default", settings.header_color);
            PdfOptions::default().header_color
        });

        let pdf_options = PdfOptions {
            title: settings.report_title.clone(),
            subtitle: settings.report_subtitle.clone(),
            logo,
            photo: None,
            header_color,
        };

        Self::new(api, output_dir, pdf_options)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Full record for a summary; the summary itself when the fetch fails.
    pub async fn fetch_full_details(&self, summary: &CaseRecord) -> CaseRecord {
        let Some(id) = summary.id() else {
            return summary.clone();
        };

        match self.api.get_case(id).await {
            Ok(full) if !full.as_map().is_empty() => full,
            Ok(_) => {
                tracing::warn!("Case {} came back empty, using summary", id);
                summary.clone()
            }
            Err(e) => {
                tracing::warn!("Failed to fetch details for case {}, using summary: {}", id, e);
                summary.clone()
            }
        }
    }

    /// All detail fetches are issued at once with no concurrency limit.
    pub async fn fetch_all_full_details(&self, summaries: &[CaseRecord]) -> Vec<CaseRecord> {
        tracing::debug!("Fetching details for {} cases", summaries.len());
        join_all(
            summaries
                .iter()
                .map(|summary| self.fetch_full_details(summary)),
        )
        .await
    }

    /// Case report PDF, optionally with the client's photo in the header.
    pub async fn export_case_pdf(&self, summary: &CaseRecord, photo: Option<Vec<u8>>) -> Result<PathBuf> {
        let case = normalize(&self.fetch_full_details(summary).await);
        let options = PdfOptions {
            photo,
            ..self.pdf_options.clone()
        };
        let bytes = render_case_pdf(&case, &options, today())?;

        let name = export_file_name(
            ArtifactKind::CaseReport,
            &case_identifier(&case),
            today(),
            FileFormat::Pdf,
        );
        self.write(&name, &bytes).await
    }

    /// Flat single-case CSV, saved with the `.xls` extension.
    pub async fn export_case_csv(&self, summary: &CaseRecord) -> Result<PathBuf> {
        let case = normalize(&self.fetch_full_details(summary).await);
        let text = csv::render_case_csv(&case, today())?;

        let name = export_file_name(
            ArtifactKind::CaseData,
            &case_identifier(&case),
            today(),
            FileFormat::Xls,
        );
        self.write(&name, text.as_bytes()).await
    }

    pub async fn export_case_spreadsheet(&self, summary: &CaseRecord) -> Result<PathBuf> {
        let case = normalize(&self.fetch_full_details(summary).await);
        let text = html::render_case_spreadsheet(&case, today())?;

        let name = export_file_name(
            ArtifactKind::CaseSpreadsheet,
            &case_identifier(&case),
            today(),
            FileFormat::Xls,
        );
        self.write(&name, text.as_bytes()).await
    }

    pub async fn export_case_word(&self, summary: &CaseRecord) -> Result<PathBuf> {
        let case = normalize(&self.fetch_full_details(summary).await);
        let text = html::render_case_word(&case, today())?;

        let name = export_file_name(
            ArtifactKind::CaseDocument,
            &case_identifier(&case),
            today(),
            FileFormat::Doc,
        );
        self.write(&name, text.as_bytes()).await
    }

    /// Four-column summary of the cases already in memory.
    pub async fn export_all_csv(&self, cases: &[CaseRecord]) -> Result<PathBuf> {
        let text = csv::render_all_cases_csv(&summaries(cases))?;
        let name = export_file_name(
            ArtifactKind::CasesSummary,
            ALL_CASES_IDENTIFIER,
            today(),
            FileFormat::Csv,
        );
        self.write(&name, text.as_bytes()).await
    }

    pub async fn export_all_spreadsheet(&self, cases: &[CaseRecord]) -> Result<PathBuf> {
        let text = html::render_all_cases_spreadsheet(&summaries(cases), today())?;
        let name = export_file_name(
            ArtifactKind::CasesSummary,
            ALL_CASES_IDENTIFIER,
            today(),
            FileFormat::Xls,
        );
        self.write(&name, text.as_bytes()).await
    }

    /// Server-rendered bulk PDF, falling back to the local renderer.
    ///
    /// Returns `Ok(None)` when both the server and the fallback fail; that
    /// failure is only logged.
    pub async fn export_all_pdf(&self, cases: &[CaseRecord]) -> Result<Option<PathBuf>> {
        let full = self.fetch_all_full_details(cases).await;

        let bytes = match self.api.export_pdf_html(&full).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Server PDF export failed, rendering locally: {}", e);
                match render_all_cases_pdf(&summaries(&full), today()) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!("Local PDF export failed: {}", e);
                        return Ok(None);
                    }
                }
            }
        };

        let name = export_file_name(
            ArtifactKind::CasesSummary,
            ALL_CASES_IDENTIFIER,
            today(),
            FileFormat::Pdf,
        );
        self.write(&name, &bytes).await.map(Some)
    }

    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(file_name);

        // Write to temp file first (atomic write)
        let temp_path = path.with_extension("part");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, &path).await?;

        tracing::info!("Exported {:?} ({} bytes)", path, bytes.len());
        Ok(path)
    }
}

fn summaries(cases: &[CaseRecord]) -> Vec<CaseSummary> {
    let today = today();
    cases
        .iter()
        .map(|record| CaseSummary::from_case(&normalize(record), today))
        .collect()
}
