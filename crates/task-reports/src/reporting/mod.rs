pub mod completion;
pub mod digest;
pub mod domain;
pub mod logged_time;
pub mod service;
pub mod store;
pub mod team;
pub mod timeline;
pub mod views;

pub use digest::{
    DeadlineDigest, DigestSummary, NotifyError, Reminder, ReminderBatch, ReminderNotifier,
};
pub use domain::{
    Department, DepartmentId, Project, ProjectId, ReportFilter, Task, TaskAssignment, TaskId,
    TaskStatus, UserId, UserInfo, UNKNOWN_USER,
};
pub use service::{ReportOutput, ReportService};
pub use store::{SnapshotData, SnapshotStore, StoreError, TaskStore, WeeklyTaskStat};
pub use timeline::{Timeline, TimelineBar, TimelineRange};
pub use views::{
    CreatorStats, LoggedTimeReport, StatusCounts, TaskCompletionReport, TaskTimeEntry,
    TeamSummaryReport, UserTotals, WeekTotals,
};
