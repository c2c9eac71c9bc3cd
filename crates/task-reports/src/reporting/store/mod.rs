mod rows;
mod snapshot;

pub use rows::parse_timestamp;
pub use snapshot::{SnapshotData, SnapshotStore};

use super::domain::{
    Department, Project, ReportFilter, Task, TaskAssignment, TaskId, TaskStatus, UserId,
    UserInfo, UNKNOWN_USER,
};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Read access to task data, already scoped to what the caller may see.
pub trait TaskStore: Send + Sync {
    /// Non-archived tasks matching the filter.
    fn tasks(&self, filter: &ReportFilter) -> Result<Vec<Task>, StoreError>;
    fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserInfo>, StoreError>;
    fn weekly_task_stats_by_user(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<WeeklyTaskStat>, StoreError>;
    fn assignments(&self, task_ids: &[TaskId]) -> Result<Vec<TaskAssignment>, StoreError>;
    fn projects(&self, filter: &ReportFilter) -> Result<Vec<Project>, StoreError>;
    fn departments(&self) -> Result<Vec<Department>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid {table} row {index}: {reason}")]
    InvalidRow {
        table: &'static str,
        index: usize,
        reason: String,
    },
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One assignee's task counts for one ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTaskStat {
    pub week: String,
    pub week_start: NaiveDate,
    pub user_id: UserId,
    pub user_name: String,
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub blocked: usize,
    pub total: usize,
}

/// ISO week label (`2025-W03`) and the Monday it starts on.
pub fn iso_week_bucket(date: NaiveDate) -> (String, NaiveDate) {
    let week = date.iso_week();
    let start = NaiveDate::from_isoywd_opt(week.year(), week.week(), Weekday::Mon).unwrap_or(date);
    (format!("{}-W{:02}", week.year(), week.week()), start)
}

/// Buckets tasks by the ISO week of their creation date and by assignee.
///
/// A task with several assignees lands in one bucket per assignee; unassigned
/// tasks land nowhere.
pub fn bucket_weekly_stats(
    tasks: &[Task],
    assignments: &[TaskAssignment],
    users: &[UserInfo],
) -> Vec<WeeklyTaskStat> {
    let names: HashMap<&UserId, String> = users
        .iter()
        .map(|user| (&user.id, user.display_name()))
        .collect();
    let mut assignees: HashMap<TaskId, Vec<&UserId>> = HashMap::new();
    for assignment in assignments {
        assignees
            .entry(assignment.task_id)
            .or_default()
            .push(&assignment.user_id);
    }

    let mut buckets: BTreeMap<(String, UserId), WeeklyTaskStat> = BTreeMap::new();
    for task in tasks {
        let Some(task_assignees) = assignees.get(&task.id) else {
            continue;
        };
        let (week, week_start) = iso_week_bucket(task.created_at.date_naive());
        for user_id in task_assignees {
            let entry = buckets
                .entry((week.clone(), (*user_id).clone()))
                .or_insert_with(|| WeeklyTaskStat {
                    week: week.clone(),
                    week_start,
                    user_id: (*user_id).clone(),
                    user_name: names
                        .get(user_id)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_USER.to_string()),
                    todo: 0,
                    in_progress: 0,
                    completed: 0,
                    blocked: 0,
                    total: 0,
                });
            match task.status {
                TaskStatus::Todo => entry.todo += 1,
                TaskStatus::InProgress => entry.in_progress += 1,
                TaskStatus::Completed => entry.completed += 1,
                TaskStatus::Blocked => entry.blocked += 1,
            }
            entry.total += 1;
        }
    }

    buckets.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::domain::ProjectId;
    use chrono::{TimeZone, Utc};

    fn task(id: i64, status: TaskStatus, day: u32) -> Task {
        Task {
            id: TaskId(id),
            title: format!("Task {id}"),
            status,
            project_id: ProjectId(1),
            parent_task_id: None,
            logged_seconds: 0,
            deadline: None,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap(),
            updated_at: None,
            archived: false,
        }
    }

    fn assign(task: i64, user: &str) -> TaskAssignment {
        TaskAssignment {
            task_id: TaskId(task),
            user_id: UserId(user.to_string()),
        }
    }

    #[test]
    fn iso_week_bucket_uses_monday_start() {
        let (week, start) = iso_week_bucket(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(week, "2025-W01");
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());

        let (week, _) = iso_week_bucket(NaiveDate::from_ymd_opt(2024, 12, 29).unwrap());
        assert_eq!(week, "2024-W52");
    }

    #[test]
    fn buckets_count_each_assignee_separately() {
        let tasks = vec![
            task(1, TaskStatus::Completed, 6),
            task(2, TaskStatus::Blocked, 7),
            task(3, TaskStatus::Todo, 14),
            task(4, TaskStatus::Todo, 14),
        ];
        let assignments = vec![
            assign(1, "ana"),
            assign(1, "ben"),
            assign(2, "ana"),
            assign(3, "ben"),
        ];
        let users = vec![UserInfo {
            id: UserId("ana".to_string()),
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            department_id: None,
        }];

        let rows = bucket_weekly_stats(&tasks, &assignments, &users);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].week, "2025-W02");
        assert_eq!(rows[0].user_name, "Ana Silva");
        assert_eq!((rows[0].completed, rows[0].blocked, rows[0].total), (1, 1, 2));
        assert_eq!(rows[1].user_name, UNKNOWN_USER);
        assert_eq!(rows[1].total, 1);
        assert_eq!(rows[2].week, "2025-W03");
        assert_eq!(rows[2].todo, 1);
        assert!(rows
            .iter()
            .all(|row| row.todo + row.in_progress + row.completed + row.blocked == row.total));
    }
}
