use super::rows::{
    coerce_rows, reject_duplicate_ids, AssignmentRow, DepartmentRow, ProjectRow, TaskRow, UserRow,
};
use super::{bucket_weekly_stats, StoreError, TaskStore, WeeklyTaskStat};
use crate::reporting::domain::{
    Department, DepartmentId, Project, ProjectId, ReportFilter, Task, TaskAssignment, TaskId,
    UserId, UserInfo,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Verified tables backing a [`SnapshotStore`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotData {
    pub tasks: Vec<Task>,
    pub assignments: Vec<TaskAssignment>,
    pub users: Vec<UserInfo>,
    pub projects: Vec<Project>,
    pub departments: Vec<Department>,
}

/// Raw table export: each table is a list of loosely typed rows.
#[derive(Debug, Default, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    tasks: Vec<Value>,
    #[serde(default)]
    task_assignments: Vec<Value>,
    #[serde(default)]
    user_info: Vec<Value>,
    #[serde(default)]
    projects: Vec<Value>,
    #[serde(default)]
    departments: Vec<Value>,
}

/// In-memory store loaded from a JSON table export.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    data: SnapshotData,
    project_departments: HashMap<ProjectId, Option<DepartmentId>>,
}

impl SnapshotStore {
    pub fn new(data: SnapshotData) -> Self {
        let project_departments = data
            .projects
            .iter()
            .map(|project| (project.id, project.department_id))
            .collect();
        Self {
            data,
            project_departments,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        let document: SnapshotDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        let document: SnapshotDocument = serde_json::from_value(value)?;
        Self::from_document(document)
    }

    fn from_document(document: SnapshotDocument) -> Result<Self, StoreError> {
        let data = SnapshotData {
            tasks: coerce_rows("tasks", document.tasks, TaskRow::validate)?,
            assignments: coerce_rows(
                "task_assignments",
                document.task_assignments,
                AssignmentRow::validate,
            )?,
            users: coerce_rows("user_info", document.user_info, UserRow::validate)?,
            projects: coerce_rows("projects", document.projects, ProjectRow::validate)?,
            departments: coerce_rows("departments", document.departments, DepartmentRow::validate)?,
        };
        reject_duplicate_ids("tasks", &data.tasks, |task| task.id)?;
        reject_duplicate_ids("user_info", &data.users, |user| user.id.clone())?;
        reject_duplicate_ids("projects", &data.projects, |project| project.id)?;
        reject_duplicate_ids("departments", &data.departments, |department| {
            department.id.0
        })?;

        debug!(
            tasks = data.tasks.len(),
            assignments = data.assignments.len(),
            users = data.users.len(),
            "loaded task snapshot"
        );

        Ok(Self::new(data))
    }

    pub fn data(&self) -> &SnapshotData {
        &self.data
    }

    fn task_in_scope(&self, task: &Task, filter: &ReportFilter) -> bool {
        let department = self
            .project_departments
            .get(&task.project_id)
            .copied()
            .flatten();
        !task.archived
            && filter.matches_project(task.project_id, department)
            && filter.matches_dates(task)
    }
}

impl TaskStore for SnapshotStore {
    fn tasks(&self, filter: &ReportFilter) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .data
            .tasks
            .iter()
            .filter(|task| self.task_in_scope(task, filter))
            .cloned()
            .collect())
    }

    fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserInfo>, StoreError> {
        let wanted: HashSet<&UserId> = ids.iter().collect();
        Ok(self
            .data
            .users
            .iter()
            .filter(|user| wanted.contains(&user.id))
            .cloned()
            .collect())
    }

    fn weekly_task_stats_by_user(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<WeeklyTaskStat>, StoreError> {
        let tasks = self.tasks(filter)?;
        let task_ids: Vec<TaskId> = tasks.iter().map(|task| task.id).collect();
        let assignments = self.assignments(&task_ids)?;
        Ok(bucket_weekly_stats(&tasks, &assignments, &self.data.users))
    }

    fn assignments(&self, task_ids: &[TaskId]) -> Result<Vec<TaskAssignment>, StoreError> {
        let wanted: HashSet<&TaskId> = task_ids.iter().collect();
        Ok(self
            .data
            .assignments
            .iter()
            .filter(|assignment| wanted.contains(&assignment.task_id))
            .cloned()
            .collect())
    }

    fn projects(&self, filter: &ReportFilter) -> Result<Vec<Project>, StoreError> {
        let mut projects: Vec<Project> = self
            .data
            .projects
            .iter()
            .filter(|project| filter.matches_project(project.id, project.department_id))
            .cloned()
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    fn departments(&self) -> Result<Vec<Department>, StoreError> {
        let mut departments = self.data.departments.clone();
        departments.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(departments)
    }
}
