use super::domain::Task;
use super::views::{ratio, seconds_to_hours, LoggedTimeReport, StatusCounts, TaskTimeEntry};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

fn hours_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    (later - earlier).num_seconds() as f64 / 3600.0
}

/// Logged-time rollup over an already scoped task set.
pub fn logged_time_report(tasks: &[Task], now: DateTime<Utc>) -> LoggedTimeReport {
    let mut task_times: BTreeMap<_, TaskTimeEntry> = tasks
        .iter()
        .map(|task| {
            (
                task.id,
                TaskTimeEntry {
                    title: task.title.clone(),
                    parent_task_id: task.parent_task_id,
                    own_seconds: task.logged_seconds,
                    total_seconds: task.logged_seconds,
                },
            )
        })
        .collect();

    // One level only: a child's own time reaches its parent, never the grandparent.
    for task in tasks {
        let Some(parent_id) = task.parent_task_id else {
            continue;
        };
        if parent_id == task.id {
            continue;
        }
        if let Some(parent) = task_times.get_mut(&parent_id) {
            parent.total_seconds += task.logged_seconds;
        }
    }

    let mut status_counts = StatusCounts::default();
    let mut total_seconds = 0u64;
    let mut completed_seconds = 0u64;
    let mut on_time = 0usize;
    let mut total_delay_hours = 0.0;
    let mut overdue_tasks = 0usize;
    let mut overdue_time = 0.0;

    for task in tasks {
        status_counts.record(task.status);
        total_seconds += task.logged_seconds;

        if task.is_completed() {
            completed_seconds += task.logged_seconds;
            if task.completed_on_time() {
                on_time += 1;
            }
            if let (Some(updated), Some(deadline)) = (task.updated_at, task.deadline) {
                total_delay_hours += hours_between(updated, deadline).max(0.0);
            }
        } else if let Some(deadline) = task.deadline.filter(|_| task.is_overdue(now)) {
            overdue_tasks += 1;
            overdue_time += hours_between(now, deadline).max(0.0);
        }
    }

    let completed_tasks = status_counts.completed;
    let avg_time = if completed_tasks == 0 {
        0.0
    } else {
        seconds_to_hours(completed_seconds) / completed_tasks as f64
    };

    LoggedTimeReport {
        total_tasks: tasks.len(),
        status_counts,
        total_time: seconds_to_hours(total_seconds),
        avg_time,
        completed_tasks,
        overdue_tasks,
        blocked_tasks: status_counts.blocked,
        task_times,
        // Completed tasks without both stamps still count in the denominator.
        on_time_completion_rate: ratio(on_time, completed_tasks),
        total_delay_hours,
        overdue_time,
    }
}
