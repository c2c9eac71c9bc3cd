use super::domain::{ProjectId, TaskId, TaskStatus, UserId};
use super::store::WeeklyTaskStat;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub blocked: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Todo => self.todo += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Blocked => self.blocked += 1,
        }
    }

    pub fn add_counts(&mut self, other: &StatusCounts) {
        self.todo += other.todo;
        self.in_progress += other.in_progress;
        self.completed += other.completed;
        self.blocked += other.blocked;
    }

    pub fn total(&self) -> usize {
        self.todo + self.in_progress + self.completed + self.blocked
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTimeEntry {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<TaskId>,
    pub own_seconds: u64,
    /// Own time plus the own time of direct children present in the report.
    pub total_seconds: u64,
}

impl TaskTimeEntry {
    pub fn total_hours(&self) -> f64 {
        self.total_seconds as f64 / 3600.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedTimeReport {
    pub total_tasks: usize,
    pub status_counts: StatusCounts,
    pub total_time: f64,
    pub avg_time: f64,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub blocked_tasks: usize,
    pub task_times: BTreeMap<TaskId, TaskTimeEntry>,
    pub on_time_completion_rate: f64,
    pub total_delay_hours: f64,
    pub overdue_time: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTotals {
    pub user_name: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekTotals {
    pub week_start: NaiveDate,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummaryReport {
    pub total_tasks: usize,
    pub total_users: usize,
    pub weekly_stats: Vec<WeeklyTaskStat>,
    pub user_totals: BTreeMap<UserId, UserTotals>,
    pub week_totals: BTreeMap<String, WeekTotals>,
}

/// Bucket key for tasks that record no creator. Stored creator ids are never empty.
pub const UNASSIGNED_CREATOR: &str = "";
pub const UNASSIGNED_CREATOR_NAME: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorStats {
    pub user_id: String,
    pub user_name: String,
    pub total_tasks: usize,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub completion_rate: f64,
    pub avg_completion_hours: f64,
    pub on_time_count: usize,
    pub late_count: usize,
    pub on_time_rate: f64,
    pub total_logged_hours: f64,
    pub avg_logged_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletionReport {
    pub total_tasks: usize,
    pub status_counts: StatusCounts,
    pub completion_rate: f64,
    pub user_stats: Vec<CreatorStats>,
    pub project_stats: BTreeMap<ProjectId, usize>,
}

pub(crate) fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub(crate) fn seconds_to_hours(seconds: u64) -> f64 {
    seconds as f64 / 3600.0
}
