use chrono::NaiveDate;

use super::{hours, percent, ExportDocument, ExportTable, FieldConfig, FieldValue};
use crate::reporting::domain::{ProjectId, TaskId, TaskStatus, UserId};
use crate::reporting::service::ReportOutput;
use crate::reporting::store::WeeklyTaskStat;
use crate::reporting::timeline::{Timeline, TimelineBar};
use crate::reporting::views::{
    CreatorStats, LoggedTimeReport, StatusCounts, TaskCompletionReport, TaskTimeEntry,
    TeamSummaryReport, UserTotals, WeekTotals,
};
use crate::request::{ReportAction, RequestError};

fn push_status_counts(document: &mut ExportDocument, counts: &StatusCounts) {
    for status in TaskStatus::ordered() {
        let count = match status {
            TaskStatus::Todo => counts.todo,
            TaskStatus::InProgress => counts.in_progress,
            TaskStatus::Completed => counts.completed,
            TaskStatus::Blocked => counts.blocked,
        };
        document.push_summary(status.label(), count);
    }
}

fn logged_time_summary() -> Vec<FieldConfig<LoggedTimeReport>> {
    vec![
        FieldConfig::new("Total Tasks", |r: &LoggedTimeReport| r.total_tasks.into()),
        FieldConfig::new("Total Time", |r: &LoggedTimeReport| r.total_time.into())
            .formatted(hours),
        FieldConfig::new("Average Time", |r: &LoggedTimeReport| r.avg_time.into())
            .formatted(hours),
        FieldConfig::new("Completed Tasks", |r: &LoggedTimeReport| {
            r.completed_tasks.into()
        }),
        FieldConfig::new("Overdue Tasks", |r: &LoggedTimeReport| r.overdue_tasks.into()),
        FieldConfig::new("Blocked Tasks", |r: &LoggedTimeReport| r.blocked_tasks.into()),
        FieldConfig::new("On-Time Completion Rate", |r: &LoggedTimeReport| {
            r.on_time_completion_rate.into()
        })
        .formatted(percent),
        FieldConfig::new("Total Delay", |r: &LoggedTimeReport| {
            r.total_delay_hours.into()
        })
        .formatted(hours),
        FieldConfig::new("Overdue Time", |r: &LoggedTimeReport| r.overdue_time.into())
            .formatted(hours),
    ]
}

type TaskTimeRow<'a> = (&'a TaskId, &'a TaskTimeEntry);

fn task_time_fields<'a>() -> Vec<FieldConfig<TaskTimeRow<'a>>> {
    vec![
        FieldConfig::new("Task ID", |(id, _): &TaskTimeRow<'a>| id.0.into()),
        FieldConfig::new("Title", |(_, entry): &TaskTimeRow<'a>| {
            entry.title.as_str().into()
        }),
        FieldConfig::new("Parent Task", |(_, entry): &TaskTimeRow<'a>| {
            entry
                .parent_task_id
                .map(|id| FieldValue::Integer(id.0))
                .unwrap_or_else(|| FieldValue::Text(String::new()))
        }),
        FieldConfig::new("Own Hours", |(_, entry): &TaskTimeRow<'a>| {
            (entry.own_seconds as f64 / 3600.0).into()
        }),
        FieldConfig::new("Total Hours", |(_, entry): &TaskTimeRow<'a>| {
            entry.total_hours().into()
        }),
    ]
}

pub fn logged_time_document(
    report: &LoggedTimeReport,
    generated_on: NaiveDate,
) -> ExportDocument {
    let mut document = ExportDocument::new("Logged Time Report", generated_on)
        .with_summary(&logged_time_summary(), report);
    push_status_counts(&mut document, &report.status_counts);
    document.with_table(ExportTable::from_records(
        "Task Time",
        &task_time_fields(),
        report.task_times.iter().collect::<Vec<_>>().iter(),
    ))
}

fn weekly_fields() -> Vec<FieldConfig<WeeklyTaskStat>> {
    vec![
        FieldConfig::new("Week", |row: &WeeklyTaskStat| row.week.as_str().into()),
        FieldConfig::new("Week Start", |row: &WeeklyTaskStat| {
            row.week_start.to_string().into()
        }),
        FieldConfig::new("User", |row: &WeeklyTaskStat| row.user_name.as_str().into()),
        FieldConfig::new("To Do", |row: &WeeklyTaskStat| row.todo.into()),
        FieldConfig::new("In Progress", |row: &WeeklyTaskStat| row.in_progress.into()),
        FieldConfig::new("Completed", |row: &WeeklyTaskStat| row.completed.into()),
        FieldConfig::new("Blocked", |row: &WeeklyTaskStat| row.blocked.into()),
        FieldConfig::new("Total", |row: &WeeklyTaskStat| row.total.into()),
    ]
}

type UserTotalsRow<'a> = (&'a UserId, &'a UserTotals);

fn user_total_fields<'a>() -> Vec<FieldConfig<UserTotalsRow<'a>>> {
    vec![
        FieldConfig::new("User", |(_, totals): &UserTotalsRow<'a>| {
            totals.user_name.as_str().into()
        }),
        FieldConfig::new("To Do", |(_, totals): &UserTotalsRow<'a>| {
            totals.counts.todo.into()
        }),
        FieldConfig::new("In Progress", |(_, totals): &UserTotalsRow<'a>| {
            totals.counts.in_progress.into()
        }),
        FieldConfig::new("Completed", |(_, totals): &UserTotalsRow<'a>| {
            totals.counts.completed.into()
        }),
        FieldConfig::new("Blocked", |(_, totals): &UserTotalsRow<'a>| {
            totals.counts.blocked.into()
        }),
        FieldConfig::new("Total", |(_, totals): &UserTotalsRow<'a>| totals.total.into()),
    ]
}

type WeekTotalsRow<'a> = (&'a String, &'a WeekTotals);

fn week_total_fields<'a>() -> Vec<FieldConfig<WeekTotalsRow<'a>>> {
    vec![
        FieldConfig::new("Week", |(week, _): &WeekTotalsRow<'a>| week.as_str().into()),
        FieldConfig::new("Week Start", |(_, totals): &WeekTotalsRow<'a>| {
            totals.week_start.to_string().into()
        }),
        FieldConfig::new("Completed", |(_, totals): &WeekTotalsRow<'a>| {
            totals.counts.completed.into()
        }),
        FieldConfig::new("Total", |(_, totals): &WeekTotalsRow<'a>| totals.total.into()),
    ]
}

pub fn team_document(report: &TeamSummaryReport, generated_on: NaiveDate) -> ExportDocument {
    let mut document = ExportDocument::new("Team Summary Report", generated_on);
    document.push_summary("Total Tasks", report.total_tasks);
    document.push_summary("Total Users", report.total_users);

    document
        .with_table(ExportTable::from_records(
            "Weekly Stats",
            &weekly_fields(),
            report.weekly_stats.iter(),
        ))
        .with_table(ExportTable::from_records(
            "User Totals",
            &user_total_fields(),
            report.user_totals.iter().collect::<Vec<_>>().iter(),
        ))
        .with_table(ExportTable::from_records(
            "Week Totals",
            &week_total_fields(),
            report.week_totals.iter().collect::<Vec<_>>().iter(),
        ))
}

fn creator_fields() -> Vec<FieldConfig<CreatorStats>> {
    vec![
        FieldConfig::new("Creator", |s: &CreatorStats| s.user_name.as_str().into()),
        FieldConfig::new("Total Tasks", |s: &CreatorStats| s.total_tasks.into()),
        FieldConfig::new("Completed", |s: &CreatorStats| s.counts.completed.into()),
        FieldConfig::new("Completion Rate", |s: &CreatorStats| s.completion_rate.into())
            .formatted(percent),
        FieldConfig::new("Avg Completion", |s: &CreatorStats| {
            s.avg_completion_hours.into()
        })
        .formatted(hours),
        FieldConfig::new("On Time", |s: &CreatorStats| s.on_time_count.into()),
        FieldConfig::new("Late", |s: &CreatorStats| s.late_count.into()),
        FieldConfig::new("On-Time Rate", |s: &CreatorStats| s.on_time_rate.into())
            .formatted(percent),
        FieldConfig::new("Logged Hours", |s: &CreatorStats| {
            s.total_logged_hours.into()
        }),
    ]
}

type ProjectRow<'a> = (&'a ProjectId, &'a usize);

fn project_fields<'a>() -> Vec<FieldConfig<ProjectRow<'a>>> {
    vec![
        FieldConfig::new("Project ID", |(id, _): &ProjectRow<'a>| id.0.into()),
        FieldConfig::new("Completed Tasks", |(_, count): &ProjectRow<'a>| {
            (**count).into()
        }),
    ]
}

pub fn completion_document(
    report: &TaskCompletionReport,
    generated_on: NaiveDate,
) -> ExportDocument {
    let mut document = ExportDocument::new("Task Completion Report", generated_on);
    document.push_summary("Total Tasks", report.total_tasks);
    document.push_summary(
        "Completion Rate",
        percent(&FieldValue::Number(report.completion_rate)),
    );
    push_status_counts(&mut document, &report.status_counts);

    document
        .with_table(ExportTable::from_records(
            "Creators",
            &creator_fields(),
            report.user_stats.iter(),
        ))
        .with_table(ExportTable::from_records(
            "Projects",
            &project_fields(),
            report.project_stats.iter().collect::<Vec<_>>().iter(),
        ))
}

fn timeline_fields() -> Vec<FieldConfig<TimelineBar>> {
    vec![
        FieldConfig::new("Task ID", |bar: &TimelineBar| bar.task_id.0.into()),
        FieldConfig::new("Title", |bar: &TimelineBar| bar.title.as_str().into()),
        FieldConfig::new("Status", |bar: &TimelineBar| bar.status.label().into()),
        FieldConfig::new("Start", |bar: &TimelineBar| bar.start.to_string().into()),
        FieldConfig::new("End", |bar: &TimelineBar| bar.end.to_string().into()),
        FieldConfig::new("Days", |bar: &TimelineBar| bar.duration_days.into()),
    ]
}

pub fn timeline_document(timeline: &Timeline, generated_on: NaiveDate) -> ExportDocument {
    let mut document = ExportDocument::new("Task Timeline", generated_on);
    document.push_summary("Tasks", timeline.bars.len());
    if let Some(range) = timeline.range {
        document.push_summary("Start", range.start.to_string());
        document.push_summary("End", range.end.to_string());
        document.push_summary("Days", range.days);
    }
    document.with_table(ExportTable::from_records(
        "Timeline",
        &timeline_fields(),
        timeline.bars.iter(),
    ))
}

/// Export document for a report action; lookup lists are rejected.
pub fn document_for(
    output: &ReportOutput,
    generated_on: NaiveDate,
) -> Result<ExportDocument, RequestError> {
    match output {
        ReportOutput::Metrics(report) => Ok(logged_time_document(report, generated_on)),
        ReportOutput::Completion(report) => Ok(completion_document(report, generated_on)),
        ReportOutput::Team(report) => Ok(team_document(report, generated_on)),
        ReportOutput::Timeline(timeline) => Ok(timeline_document(timeline, generated_on)),
        ReportOutput::Departments(_) => Err(RequestError::NotExportable {
            action: ReportAction::Departments,
        }),
        ReportOutput::Projects(_) => Err(RequestError::NotExportable {
            action: ReportAction::Projects,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportFormat;
    use std::collections::BTreeMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 2).expect("valid date")
    }

    #[test]
    fn logged_time_document_lists_summary_and_rollups() {
        let mut task_times = BTreeMap::new();
        task_times.insert(
            TaskId(1),
            TaskTimeEntry {
                title: "Parent".to_string(),
                parent_task_id: None,
                own_seconds: 1800,
                total_seconds: 5400,
            },
        );
        let report = LoggedTimeReport {
            total_tasks: 1,
            total_time: 0.5,
            on_time_completion_rate: 0.75,
            task_times,
            ..LoggedTimeReport::default()
        };

        let document = logged_time_document(&report, today());

        assert_eq!(document.title, "Logged Time Report");
        assert!(document
            .summary
            .contains(&("Total Time".to_string(), FieldValue::Text("0.50 h".to_string()))));
        assert!(document.summary.contains(&(
            "On-Time Completion Rate".to_string(),
            FieldValue::Text("75.0%".to_string())
        )));
        assert!(document
            .summary
            .contains(&("To Do".to_string(), FieldValue::Integer(0))));

        let table = &document.tables[0];
        assert_eq!(table.name, "Task Time");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], FieldValue::Integer(1));
        assert_eq!(table.rows[0][2], FieldValue::Text(String::new()));
        assert_eq!(table.rows[0][4], FieldValue::Number(1.5));
    }

    #[test]
    fn completion_document_has_creator_and_project_tables() {
        let report = TaskCompletionReport {
            total_tasks: 2,
            completion_rate: 0.5,
            project_stats: BTreeMap::from([(ProjectId(4), 1)]),
            ..TaskCompletionReport::default()
        };

        let document = completion_document(&report, today());
        let names: Vec<&str> = document.tables.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(names, vec!["Creators", "Projects"]);
        assert_eq!(
            document.tables[1].rows,
            vec![vec![FieldValue::Integer(4), FieldValue::Integer(1)]]
        );
        assert_eq!(
            document.file_name(ExportFormat::Csv),
            "Task_Completion_Report_2025-04-02.csv"
        );
    }

    #[test]
    fn lookup_lists_are_not_exportable() {
        let err = document_for(&ReportOutput::Departments(Vec::new()), today())
            .expect_err("departments are not exportable");
        assert_eq!(
            err,
            RequestError::NotExportable {
                action: ReportAction::Departments
            }
        );
    }
}
