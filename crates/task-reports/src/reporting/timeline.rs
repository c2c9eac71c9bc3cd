use super::domain::{Task, TaskId, TaskStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBar {
    pub task_id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<TaskId>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Inclusive day count; a task starting and ending on the same day spans one day.
    pub duration_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<TimelineRange>,
    pub bars: Vec<TimelineBar>,
}

fn bar(task: &Task, now: DateTime<Utc>) -> TimelineBar {
    let start = task.created_at.date_naive();
    let end = task
        .deadline
        .or(task.updated_at)
        .unwrap_or(now)
        .date_naive()
        .max(start);

    TimelineBar {
        task_id: task.id,
        title: task.title.clone(),
        status: task.status,
        parent_task_id: task.parent_task_id,
        start,
        end,
        duration_days: (end - start).num_days() + 1,
    }
}

fn push_with_children(
    bar: TimelineBar,
    children: &mut BTreeMap<TaskId, Vec<TimelineBar>>,
    ordered: &mut Vec<TimelineBar>,
) {
    let id = bar.task_id;
    ordered.push(bar);
    if let Some(subtasks) = children.remove(&id) {
        for subtask in subtasks {
            push_with_children(subtask, children, ordered);
        }
    }
}

/// Gantt bars ordered by start date, each parent immediately followed by its subtasks.
pub fn timeline(tasks: &[Task], now: DateTime<Utc>) -> Timeline {
    let present: HashSet<TaskId> = tasks.iter().map(|task| task.id).collect();
    let mut bars: Vec<TimelineBar> = tasks.iter().map(|task| bar(task, now)).collect();
    bars.sort_by(|a, b| a.start.cmp(&b.start).then(a.task_id.cmp(&b.task_id)));

    let mut children: BTreeMap<TaskId, Vec<TimelineBar>> = BTreeMap::new();
    let mut roots = Vec::new();
    for bar in bars {
        match bar.parent_task_id {
            Some(parent) if parent != bar.task_id && present.contains(&parent) => {
                children.entry(parent).or_default().push(bar)
            }
            _ => roots.push(bar),
        }
    }

    let mut ordered = Vec::with_capacity(tasks.len());
    for root in roots {
        push_with_children(root, &mut children, &mut ordered);
    }
    // Only parent cycles are left over; keep them visible at the end.
    for (_, rest) in children {
        ordered.extend(rest);
    }

    let range = match (
        ordered.iter().map(|bar| bar.start).min(),
        ordered.iter().map(|bar| bar.end).max(),
    ) {
        (Some(start), Some(end)) => Some(TimelineRange {
            start,
            end,
            days: (end - start).num_days() + 1,
        }),
        _ => None,
    };

    Timeline {
        range,
        bars: ordered,
    }
}
