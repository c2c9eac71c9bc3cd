use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::completion::{creator_ids, task_completion_report};
use super::domain::{Department, Project, ReportFilter, UserId};
use super::logged_time::logged_time_report;
use super::store::{StoreError, TaskStore};
use super::team::team_summary_report;
use super::timeline::{timeline, Timeline};
use super::views::{LoggedTimeReport, TaskCompletionReport, TeamSummaryReport};
use crate::request::ReportAction;

/// Payload of one report action, serialized as the bare report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportOutput {
    Metrics(LoggedTimeReport),
    Completion(TaskCompletionReport),
    Team(TeamSummaryReport),
    Departments(Vec<Department>),
    Projects(Vec<Project>),
    Timeline(Timeline),
}

/// Composes the task store with the aggregators; one call per report.
pub struct ReportService<S> {
    store: Arc<S>,
}

impl<S> Clone for ReportService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ReportService<S>
where
    S: TaskStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn logged_time_report(
        &self,
        filter: &ReportFilter,
        now: DateTime<Utc>,
    ) -> Result<LoggedTimeReport, StoreError> {
        let tasks = self.store.tasks(filter)?;
        let report = logged_time_report(&tasks, now);
        info!(
            tasks = report.total_tasks,
            overdue = report.overdue_tasks,
            "logged-time report built"
        );
        Ok(report)
    }

    pub fn team_summary_report(
        &self,
        filter: &ReportFilter,
    ) -> Result<TeamSummaryReport, StoreError> {
        let rows = self.store.weekly_task_stats_by_user(filter)?;
        debug!(rows = rows.len(), "weekly task stats fetched");
        let report = team_summary_report(rows);
        info!(
            tasks = report.total_tasks,
            users = report.total_users,
            "team summary built"
        );
        Ok(report)
    }

    /// Name lookups never fail the report; unresolved creators show as `Unknown User`.
    pub fn task_completion_report(
        &self,
        filter: &ReportFilter,
    ) -> Result<TaskCompletionReport, StoreError> {
        let tasks = self.store.tasks(filter)?;
        let creators = creator_ids(&tasks);

        let names: HashMap<UserId, String> = if creators.is_empty() {
            HashMap::new()
        } else {
            match self.store.users_by_ids(&creators) {
                Ok(users) => users
                    .into_iter()
                    .map(|user| {
                        let name = user.display_name();
                        (user.id, name)
                    })
                    .collect(),
                Err(err) => {
                    warn!(error = %err, creators = creators.len(), "creator name lookup failed");
                    HashMap::new()
                }
            }
        };

        let report = task_completion_report(&tasks, &names);
        info!(
            tasks = report.total_tasks,
            creators = report.user_stats.len(),
            "completion report built"
        );
        Ok(report)
    }

    pub fn timeline(
        &self,
        filter: &ReportFilter,
        now: DateTime<Utc>,
    ) -> Result<Timeline, StoreError> {
        let tasks = self.store.tasks(filter)?;
        Ok(timeline(&tasks, now))
    }

    pub fn projects(&self, filter: &ReportFilter) -> Result<Vec<Project>, StoreError> {
        self.store.projects(filter)
    }

    pub fn departments(&self) -> Result<Vec<Department>, StoreError> {
        self.store.departments()
    }

    pub fn run(
        &self,
        action: ReportAction,
        filter: &ReportFilter,
        now: DateTime<Utc>,
    ) -> Result<ReportOutput, StoreError> {
        debug!(%action, ?filter, "running report action");
        Ok(match action {
            ReportAction::Metrics => ReportOutput::Metrics(self.logged_time_report(filter, now)?),
            ReportAction::Report => ReportOutput::Completion(self.task_completion_report(filter)?),
            ReportAction::Team => ReportOutput::Team(self.team_summary_report(filter)?),
            ReportAction::Departments => ReportOutput::Departments(self.departments()?),
            ReportAction::Projects => ReportOutput::Projects(self.projects(filter)?),
            ReportAction::Timeline => ReportOutput::Timeline(self.timeline(filter, now)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::domain::{
        ProjectId, Task, TaskAssignment, TaskId, TaskStatus, UserInfo, UNKNOWN_USER,
    };
    use crate::reporting::store::WeeklyTaskStat;
    use chrono::TimeZone;

    /// Serves tasks but fails every user lookup.
    struct NamelessStore {
        tasks: Vec<Task>,
    }

    impl TaskStore for NamelessStore {
        fn tasks(&self, _filter: &ReportFilter) -> Result<Vec<Task>, StoreError> {
            Ok(self.tasks.clone())
        }

        fn users_by_ids(&self, _ids: &[UserId]) -> Result<Vec<UserInfo>, StoreError> {
            Err(StoreError::Unavailable("user_info offline".to_string()))
        }

        fn weekly_task_stats_by_user(
            &self,
            _filter: &ReportFilter,
        ) -> Result<Vec<WeeklyTaskStat>, StoreError> {
            Err(StoreError::Unavailable("weekly view offline".to_string()))
        }

        fn assignments(&self, _task_ids: &[TaskId]) -> Result<Vec<TaskAssignment>, StoreError> {
            Ok(Vec::new())
        }

        fn projects(&self, _filter: &ReportFilter) -> Result<Vec<Project>, StoreError> {
            Ok(Vec::new())
        }

        fn departments(&self) -> Result<Vec<Department>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn task(id: i64, creator: &str) -> Task {
        Task {
            id: TaskId(id),
            title: format!("Task {id}"),
            status: TaskStatus::Completed,
            project_id: ProjectId(3),
            parent_task_id: None,
            logged_seconds: 3600,
            deadline: None,
            created_by: Some(UserId(creator.to_string())),
            created_at: Utc.with_ymd_and_hms(2025, 2, 3, 9, 0, 0).unwrap(),
            updated_at: None,
            archived: false,
        }
    }

    #[test]
    fn failed_name_lookup_falls_back_to_placeholder() {
        let service = ReportService::new(Arc::new(NamelessStore {
            tasks: vec![task(1, "u-1"), task(2, "u-1")],
        }));

        let report = service
            .task_completion_report(&ReportFilter::default())
            .expect("report survives lookup failure");

        assert_eq!(report.user_stats.len(), 1);
        assert_eq!(report.user_stats[0].user_name, UNKNOWN_USER);
        assert_eq!(report.user_stats[0].total_tasks, 2);
    }

    #[test]
    fn store_errors_propagate_unchanged() {
        let service = ReportService::new(Arc::new(NamelessStore { tasks: Vec::new() }));

        let err = service
            .team_summary_report(&ReportFilter::default())
            .expect_err("store failure surfaces");

        assert!(
            matches!(err, StoreError::Unavailable(ref reason) if reason == "weekly view offline")
        );
    }

    #[test]
    fn run_dispatches_by_action() {
        let service = ReportService::new(Arc::new(NamelessStore {
            tasks: vec![task(1, "u-1")],
        }));
        let now = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();

        let output = service
            .run(ReportAction::Metrics, &ReportFilter::default(), now)
            .expect("metrics");
        assert!(matches!(output, ReportOutput::Metrics(ref report) if report.total_tasks == 1));

        let output = service
            .run(ReportAction::Departments, &ReportFilter::default(), now)
            .expect("departments");
        assert_eq!(output, ReportOutput::Departments(Vec::new()));
    }
}
