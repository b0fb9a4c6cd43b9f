// HOPETRACK - case export and notification tool
// Entry point and command dispatch

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hopetrack::app::{self, AppState, SettingsOverrides};
use hopetrack::models::CaseRecord;
use hopetrack::normalize::normalize;
use hopetrack::status::{display_label, StatusBucket, AFTER_CARE_STATUS};

#[derive(Parser)]
#[command(
    name = "hopetrack",
    version,
    about = "HOPETRACK case exports and notifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding settings.json, notifications.json and exports.
    #[arg(long = "data-dir", value_name = "DIR", default_value = ".hopetrack", global = true)]
    data_dir: PathBuf,

    /// Case API base URL (overrides settings.json).
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Bearer token for the case API (overrides settings.json).
    #[arg(long = "token", value_name = "TOKEN", global = true)]
    token: Option<String>,

    /// Directory for exported files (overrides settings.json).
    #[arg(long = "output-dir", value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// List cases, optionally limited to one status bucket.
    Cases {
        #[arg(long, value_enum)]
        bucket: Option<BucketArg>,
    },

    /// Export one case.
    ExportCase {
        /// Case id.
        id: i64,

        #[arg(long, value_enum, default_value = "pdf")]
        format: CaseFormatArg,

        /// Client photo (PNG or JPEG) for the PDF header.
        #[arg(long, value_name = "PATH")]
        photo: Option<PathBuf>,
    },

    /// Export a summary of all cases.
    ExportAll {
        #[arg(long, value_enum, default_value = "pdf")]
        format: SummaryFormatArg,
    },

    /// Move a case to after-care.
    AfterCare {
        /// Case id.
        id: i64,
    },

    /// Derive and manage notifications.
    #[command(subcommand)]
    Notifications(NotificationCommand),
}

#[derive(Subcommand)]
enum NotificationCommand {
    /// Show the stored notifications.
    List,
    /// Fetch cases and record new notifications.
    Derive,
    /// Mark one notification as read.
    Read { id: String },
    /// Mark every notification as read.
    ReadAll,
    /// Dismiss one notification permanently.
    Dismiss { id: String },
    /// Dismiss every notification.
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum BucketArg {
    Active,
    Archived,
    AfterCare,
}

impl From<BucketArg> for StatusBucket {
    fn from(arg: BucketArg) -> Self {
        match arg {
            BucketArg::Active => StatusBucket::Active,
            BucketArg::Archived => StatusBucket::Archived,
            BucketArg::AfterCare => StatusBucket::AfterCare,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CaseFormatArg {
    /// Case report PDF
    Pdf,
    /// Flat CSV saved as .xls
    Csv,
    /// HTML spreadsheet (.xls)
    Xls,
    /// Word document (.doc)
    Doc,
}

#[derive(Clone, Copy, ValueEnum)]
enum SummaryFormatArg {
    Pdf,
    Csv,
    Xls,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hopetrack=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting HOPETRACK");

    let overrides = SettingsOverrides {
        api_url: cli.api_url.clone(),
        token: cli.token.clone(),
        output_dir: cli.output_dir.clone(),
    };
    let state = app::setup(cli.data_dir.clone(), &overrides)
        .await
        .context("Failed to initialize application")?;

    match cli.command {
        Command::Cases { bucket } => list_cases(&state, bucket.map(StatusBucket::from)).await,
        Command::ExportCase { id, format, photo } => export_case(&state, id, format, photo).await,
        Command::ExportAll { format } => export_all(&state, format).await,
        Command::AfterCare { id } => after_care(&state, id).await,
        Command::Notifications(command) => notifications(&state, command).await,
    }
}

async fn list_cases(state: &AppState, bucket: Option<StatusBucket>) -> Result<()> {
    let mut cases = state.cases.lock().await;
    cases.refresh().await.context("Failed to load cases")?;

    let selected: Vec<&CaseRecord> = match bucket {
        Some(bucket) => cases.by_bucket(bucket),
        None => cases.cases().iter().collect(),
    };

    for record in selected {
        let case = normalize(record);
        let status = record
            .status()
            .and_then(|value| value.as_str())
            .map(display_label)
            .unwrap_or("");
        println!(
            "{:>6}  {:<32}  {:<12}  {}",
            record.id().map(|id| id.to_string()).unwrap_or_default(),
            case.full_name(),
            case.program(),
            status
        );
    }
    Ok(())
}

/// The summary held in the case list, or a bare id when it is unavailable.
async fn case_summary(state: &AppState, id: i64) -> CaseRecord {
    let mut cases = state.cases.lock().await;
    if let Err(e) = cases.refresh().await {
        tracing::warn!("Could not load case list: {}", e);
    }
    cases
        .find(id)
        .cloned()
        .unwrap_or_else(|| CaseRecord::from(json!({ "id": id })))
}

async fn export_case(
    state: &AppState,
    id: i64,
    format: CaseFormatArg,
    photo: Option<PathBuf>,
) -> Result<()> {
    let summary = case_summary(state, id).await;

    let path = match format {
        CaseFormatArg::Pdf => {
            let photo = match photo {
                Some(path) => Some(
                    tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("Failed to read photo {:?}", path))?,
                ),
                None => None,
            };
            state.export.export_case_pdf(&summary, photo).await?
        }
        CaseFormatArg::Csv => state.export.export_case_csv(&summary).await?,
        CaseFormatArg::Xls => state.export.export_case_spreadsheet(&summary).await?,
        CaseFormatArg::Doc => state.export.export_case_word(&summary).await?,
    };

    println!("{}", path.display());
    Ok(())
}

async fn export_all(state: &AppState, format: SummaryFormatArg) -> Result<()> {
    let cases = {
        let mut service = state.cases.lock().await;
        service.refresh().await.context("Failed to load cases")?;
        service.cases().to_vec()
    };

    let path = match format {
        SummaryFormatArg::Pdf => match state.export.export_all_pdf(&cases).await? {
            Some(path) => path,
            None => {
                eprintln!("PDF export failed; see log for details");
                return Ok(());
            }
        },
        SummaryFormatArg::Csv => state.export.export_all_csv(&cases).await?,
        SummaryFormatArg::Xls => state.export.export_all_spreadsheet(&cases).await?,
    };

    println!("{}", path.display());
    Ok(())
}

async fn after_care(state: &AppState, id: i64) -> Result<()> {
    let mut cases = state.cases.lock().await;
    cases.refresh().await.context("Failed to load cases")?;

    let record = cases
        .move_to_after_care(id)
        .await
        .with_context(|| format!("Failed to move case {} to after-care", id))?;
    println!("{} -> {}", normalize(record).full_name(), AFTER_CARE_STATUS);
    Ok(())
}

async fn notifications(state: &AppState, command: NotificationCommand) -> Result<()> {
    let mut center = state.notifications.lock().await;

    match command {
        NotificationCommand::List => {}
        NotificationCommand::Derive => {
            let cases = {
                let mut service = state.cases.lock().await;
                service.refresh().await.context("Failed to load cases")?;
                service.cases().to_vec()
            };
            let added = center.derive(&cases, Utc::now())?;
            println!("{} new notification(s)", added.len());
        }
        NotificationCommand::Read { id } => {
            if !center.mark_read(&id)? {
                eprintln!("No notification with id {}", id);
            }
        }
        NotificationCommand::ReadAll => center.mark_all_read()?,
        NotificationCommand::Dismiss { id } => {
            if !center.dismiss(&id)? {
                eprintln!("No notification with id {}", id);
            }
        }
        NotificationCommand::Clear => center.clear_all()?,
    }

    for notification in center.notifications() {
        println!(
            "{} {:<20} {}  {}: {}",
            if notification.read { " " } else { "*" },
            notification.id,
            notification.timestamp.format("%Y-%m-%d %H:%M"),
            notification.title,
            notification.message
        );
    }
    println!("{} unread", center.unread_count());
    Ok(())
}
