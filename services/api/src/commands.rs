use crate::cli::FilterArgs;
use crate::infra::{load_store, InMemoryReminderNotifier};
use chrono::{Duration, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use task_reports::config::AppConfig;
use task_reports::error::AppError;
use task_reports::export::{document_for, ExportFormat};
use task_reports::reporting::{
    DeadlineDigest, LoggedTimeReport, ReportOutput, ReportService, TaskCompletionReport,
    TeamSummaryReport, Timeline,
};
use task_reports::request::{ReportAction, RequestError};
use task_reports::telemetry;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// metrics, report, team, departments, projects or timeline
    #[arg(long, default_value = "metrics")]
    pub(crate) kind: ReportAction,
    /// Print the raw JSON payload instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) filters: FilterArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// metrics, report, team or timeline
    #[arg(long, default_value = "metrics")]
    pub(crate) kind: ReportAction,
    /// xlsx (default), csv or pdf
    #[arg(long)]
    pub(crate) format: Option<ExportFormat>,
    /// Directory for the exported file (overrides APP_EXPORT_DIR)
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) filters: FilterArgs,
}

#[derive(Args, Debug)]
pub(crate) struct DigestArgs {
    /// Remind about deadlines falling within this many hours (overrides APP_DIGEST_WINDOW_HOURS)
    #[arg(long)]
    pub(crate) within_hours: Option<u32>,
    #[command(flatten)]
    pub(crate) filters: FilterArgs,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        kind,
        json,
        filters,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let params = filters.params();
    let filter = params.filter()?;
    let now = params.now(Utc::now())?;
    let store = load_store(&config.store, filters.data)?;
    let output = ReportService::new(Arc::new(store)).run(kind, &filter, now)?;

    if json {
        let payload = serde_json::to_string_pretty(&output)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{payload}");
        return Ok(());
    }

    render_output(&output);
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        kind,
        format,
        output_dir,
        filters,
    } = args;
    if !kind.is_exportable() {
        return Err(RequestError::NotExportable { action: kind }.into());
    }

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let params = filters.params();
    let filter = params.filter()?;
    let now = params.now(Utc::now())?;
    let format = format.unwrap_or(ExportFormat::Xlsx);
    let store = load_store(&config.store, filters.data)?;
    let output = ReportService::new(Arc::new(store)).run(kind, &filter, now)?;

    let document = document_for(&output, now.date_naive())?;
    let bytes = format.render(&document)?;
    let dir = output_dir.unwrap_or(config.export.dir);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(document.file_name(format));
    std::fs::write(&path, &bytes)?;

    println!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

pub(crate) fn run_digest(args: DigestArgs) -> Result<(), AppError> {
    let DigestArgs {
        within_hours,
        filters,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let params = filters.params();
    let filter = params.filter()?;
    let now = params.now(Utc::now())?;
    let window = Duration::hours(i64::from(
        within_hours.unwrap_or(config.digest.window_hours),
    ));
    let store = load_store(&config.store, filters.data)?;
    let notifier = Arc::new(InMemoryReminderNotifier::default());
    let digest = DeadlineDigest::new(Arc::new(store), Arc::clone(&notifier));

    let summary = digest.run(&filter, now, window)?;

    println!("Deadline digest ({} h window)", window.num_hours());
    for batch in notifier.batches() {
        println!("- {} ({} tasks)", batch.recipient_name, batch.reminders.len());
        for reminder in &batch.reminders {
            let marker = if reminder.overdue { "overdue" } else { "due" };
            println!(
                "    {} #{} {} {}",
                marker,
                reminder.task_id,
                reminder.title,
                reminder.deadline.format("%Y-%m-%d %H:%M")
            );
        }
    }
    println!(
        "{} recipients, {} reminders, {} delivered, {} failed",
        summary.recipients, summary.reminders, summary.delivered, summary.failed
    );
    Ok(())
}

fn render_output(output: &ReportOutput) {
    match output {
        ReportOutput::Metrics(report) => render_logged_time(report),
        ReportOutput::Completion(report) => render_completion(report),
        ReportOutput::Team(report) => render_team(report),
        ReportOutput::Timeline(timeline) => render_timeline(timeline),
        ReportOutput::Departments(departments) => {
            println!("Departments");
            for department in departments {
                println!("- {} (#{})", department.name, department.id.0);
            }
        }
        ReportOutput::Projects(projects) => {
            println!("Projects");
            for project in projects {
                println!("- {} (#{})", project.name, project.id);
            }
        }
    }
}

fn render_logged_time(report: &LoggedTimeReport) {
    println!("Logged time report");
    println!(
        "{} tasks | {:.2} h logged | {:.2} h average per completed task",
        report.total_tasks, report.total_time, report.avg_time
    );
    println!(
        "Completed {} | Overdue {} ({:.1} h past due) | Blocked {}",
        report.completed_tasks, report.overdue_tasks, report.overdue_time, report.blocked_tasks
    );
    println!(
        "On-time completion {:.0}% | {:.1} h total delay",
        report.on_time_completion_rate * 100.0,
        report.total_delay_hours
    );

    if report.task_times.is_empty() {
        return;
    }
    println!("\nTime per task (including direct subtasks)");
    for (id, entry) in &report.task_times {
        let parent = match entry.parent_task_id {
            Some(parent) => format!(" (subtask of #{parent})"),
            None => String::new(),
        };
        println!(
            "- #{} {}: {:.2} h{}",
            id,
            entry.title,
            entry.total_hours(),
            parent
        );
    }
}

fn render_completion(report: &TaskCompletionReport) {
    println!("Task completion report");
    println!(
        "{} tasks | {:.0}% completed",
        report.total_tasks,
        report.completion_rate * 100.0
    );

    println!("\nBy creator");
    for stats in &report.user_stats {
        println!(
            "- {}: {} tasks, {:.0}% completed, {} on time / {} late, {:.1} h logged",
            stats.user_name,
            stats.total_tasks,
            stats.completion_rate * 100.0,
            stats.on_time_count,
            stats.late_count,
            stats.total_logged_hours
        );
    }

    println!("\nCompleted per project");
    for (project, completed) in &report.project_stats {
        println!("- #{project}: {completed}");
    }
}

fn render_team(report: &TeamSummaryReport) {
    println!("Team summary");
    println!(
        "{} task assignments across {} users",
        report.total_tasks, report.total_users
    );

    println!("\nBy user");
    for totals in report.user_totals.values() {
        println!(
            "- {}: {} total, {} completed, {} blocked",
            totals.user_name, totals.total, totals.counts.completed, totals.counts.blocked
        );
    }

    println!("\nBy week");
    for (week, totals) in &report.week_totals {
        println!(
            "- {} (from {}): {} total, {} completed",
            week, totals.week_start, totals.total, totals.counts.completed
        );
    }
}

fn render_timeline(timeline: &Timeline) {
    match timeline.range {
        Some(range) => println!(
            "Timeline {} -> {} ({} days)",
            range.start, range.end, range.days
        ),
        None => {
            println!("Timeline: no tasks");
            return;
        }
    }
    for bar in &timeline.bars {
        let indent = if bar.parent_task_id.is_some() { "    " } else { "" };
        println!(
            "{}- #{} {} [{}] {} -> {} ({} d)",
            indent,
            bar.task_id,
            bar.title,
            bar.status.label(),
            bar.start,
            bar.end,
            bar.duration_days
        );
    }
}
