use super::store::WeeklyTaskStat;
use super::views::{StatusCounts, TeamSummaryReport, UserTotals, WeekTotals};

fn row_counts(row: &WeeklyTaskStat) -> StatusCounts {
    StatusCounts {
        todo: row.todo,
        in_progress: row.in_progress,
        completed: row.completed,
        blocked: row.blocked,
    }
}

/// Folds weekly per-assignee rows into per-user and per-week totals.
///
/// Counting is per assignment: a task with two assignees contributes to both
/// users and twice to its week.
pub fn team_summary_report(rows: Vec<WeeklyTaskStat>) -> TeamSummaryReport {
    let mut report = TeamSummaryReport::default();

    for row in &rows {
        let counts = row_counts(row);
        report.total_tasks += row.total;

        let user = report
            .user_totals
            .entry(row.user_id.clone())
            .or_insert_with(|| UserTotals {
                user_name: row.user_name.clone(),
                counts: StatusCounts::default(),
                total: 0,
            });
        user.counts.add_counts(&counts);
        user.total += row.total;

        let week = report
            .week_totals
            .entry(row.week.clone())
            .or_insert_with(|| WeekTotals {
                week_start: row.week_start,
                counts: StatusCounts::default(),
                total: 0,
            });
        week.counts.add_counts(&counts);
        week.total += row.total;
    }

    report.total_users = report.user_totals.len();
    report.weekly_stats = rows;
    report
}
