use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Placeholder used whenever a user's display name cannot be resolved.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Serialized as the stored label, e.g. `"In Progress"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub const fn ordered() -> [Self; 4] {
        [Self::Todo, Self::InProgress, Self::Completed, Self::Blocked]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Blocked => "Blocked",
        }
    }

    /// Matches the stored status literal exactly; `"completed"` is not `"Completed"`.
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub project_id: ProjectId,
    pub parent_task_id: Option<TaskId>,
    pub logged_seconds: u64,
    pub deadline: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub archived: bool,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Completed at or before the deadline. Tasks lacking either stamp are never on time.
    pub fn completed_on_time(&self) -> bool {
        match (self.updated_at, self.deadline) {
            (Some(updated), Some(deadline)) => self.is_completed() && updated <= deadline,
            _ => false,
        }
    }

    pub fn completed_late(&self) -> bool {
        match (self.updated_at, self.deadline) {
            (Some(updated), Some(deadline)) => self.is_completed() && updated > deadline,
            _ => false,
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed() && self.deadline.is_some_and(|deadline| now > deadline)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignment {
    pub task_id: TaskId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub department_id: Option<DepartmentId>,
}

impl UserInfo {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            UNKNOWN_USER.to_string()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub department_id: Option<DepartmentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

/// Scope of a report. Empty id lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub project_ids: BTreeSet<ProjectId>,
    pub department_ids: BTreeSet<DepartmentId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn matches_project(&self, project: ProjectId, department: Option<DepartmentId>) -> bool {
        if !self.project_ids.is_empty() && !self.project_ids.contains(&project) {
            return false;
        }
        if self.department_ids.is_empty() {
            return true;
        }
        department.is_some_and(|id| self.department_ids.contains(&id))
    }

    fn date_in_range(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }

    /// Inclusive range against the creation date or the deadline date.
    pub fn matches_dates(&self, task: &Task) -> bool {
        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }
        self.date_in_range(task.created_at.date_naive())
            || task
                .deadline
                .is_some_and(|deadline| self.date_in_range(deadline.date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(status: TaskStatus) -> Task {
        Task {
            id: TaskId(1),
            title: "Draft brief".to_string(),
            status,
            project_id: ProjectId(7),
            parent_task_id: None,
            logged_seconds: 0,
            deadline: None,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap(),
            updated_at: None,
            archived: false,
        }
    }

    #[test]
    fn statuses_serialize_as_their_labels() {
        for status in TaskStatus::ordered() {
            assert_eq!(
                serde_json::to_value(status).expect("serializes"),
                serde_json::Value::from(status.label())
            );
        }
    }

    #[test]
    fn status_labels_are_case_sensitive() {
        assert_eq!(TaskStatus::from_label("Completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::from_label("To Do"), Some(TaskStatus::Todo));
        assert_eq!(TaskStatus::from_label("completed"), None);
        assert_eq!(TaskStatus::from_label("Done"), None);
    }

    #[test]
    fn on_time_requires_both_stamps() {
        let mut completed = task(TaskStatus::Completed);
        completed.deadline = Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
        assert!(!completed.completed_on_time());
        assert!(!completed.completed_late());

        completed.updated_at = completed.deadline;
        assert!(completed.completed_on_time());

        completed.updated_at = Some(Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap());
        assert!(completed.completed_late());
    }

    #[test]
    fn overdue_ignores_completed_tasks() {
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        let mut open = task(TaskStatus::InProgress);
        open.deadline = Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
        assert!(open.is_overdue(now));

        open.status = TaskStatus::Completed;
        assert!(!open.is_overdue(now));
    }

    #[test]
    fn display_name_falls_back_to_placeholder() {
        let mut user = UserInfo {
            id: UserId("u-1".to_string()),
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            department_id: None,
        };
        assert_eq!(user.display_name(), "Ada Lovelace");

        user.first_name.clear();
        user.last_name = "  ".to_string();
        assert_eq!(user.display_name(), UNKNOWN_USER);
    }

    #[test]
    fn filter_matches_creation_or_deadline_dates() {
        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 5),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31),
            ..ReportFilter::default()
        };

        let mut candidate = task(TaskStatus::Todo);
        assert!(!filter.matches_dates(&candidate));

        candidate.deadline = Some(Utc.with_ymd_and_hms(2025, 3, 31, 23, 0, 0).unwrap());
        assert!(filter.matches_dates(&candidate));
    }

    #[test]
    fn department_filter_requires_known_department() {
        let filter = ReportFilter {
            department_ids: [DepartmentId(2)].into_iter().collect(),
            ..ReportFilter::default()
        };

        assert!(filter.matches_project(ProjectId(1), Some(DepartmentId(2))));
        assert!(!filter.matches_project(ProjectId(1), Some(DepartmentId(3))));
        assert!(!filter.matches_project(ProjectId(1), None));
    }
}
