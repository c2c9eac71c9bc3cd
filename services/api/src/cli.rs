use crate::commands::{run_digest, run_export, run_report, DigestArgs, ExportArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use task_reports::error::AppError;
use task_reports::request::ReportParams;

#[derive(Parser, Debug)]
#[command(
    name = "Task Reports",
    about = "Serve, print and export task reporting rollups",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print a report to the terminal
    Report(ReportArgs),
    /// Write a report as an xlsx or csv file
    Export(ExportArgs),
    /// Send deadline reminders to assignees
    Digest(DigestArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON task snapshot to serve (overrides APP_DATA_PATH)
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
}

/// Report scope shared by every offline command.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct FilterArgs {
    /// Comma-separated project ids
    #[arg(long)]
    pub(crate) project_ids: Option<String>,
    /// Comma-separated department ids
    #[arg(long)]
    pub(crate) department_ids: Option<String>,
    /// Inclusive start date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) start_date: Option<String>,
    /// Inclusive end date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) end_date: Option<String>,
    /// Evaluate overdue state as of this instant instead of now
    #[arg(long)]
    pub(crate) as_of: Option<String>,
    /// JSON task snapshot to read (overrides APP_DATA_PATH)
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
}

impl FilterArgs {
    pub(crate) fn params(&self) -> ReportParams {
        ReportParams {
            project_ids: self.project_ids.clone(),
            department_ids: self.department_ids.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            as_of: self.as_of.clone(),
            ..ReportParams::default()
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
        Command::Export(args) => run_export(args),
        Command::Digest(args) => run_digest(args),
    }
}
