//! End-to-end checks of the report service over a JSON table snapshot.

mod common {
    use std::path::PathBuf;
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};
    use task_reports::reporting::{ReportService, SnapshotStore};

    pub(super) fn store() -> Arc<SnapshotStore> {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/snapshot.json");
        Arc::new(SnapshotStore::from_path(path).expect("fixture snapshot loads"))
    }

    pub(super) fn service() -> ReportService<SnapshotStore> {
        ReportService::new(store())
    }

    pub(super) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }
}

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate};
use common::{now, service, store};
use task_reports::reporting::{
    DeadlineDigest, DepartmentId, NotifyError, ProjectId, ReminderBatch, ReminderNotifier,
    ReportFilter, ReportOutput, TaskId, UserId,
};
use task_reports::request::{ReportAction, ReportParams};

fn website_only() -> ReportFilter {
    ReportFilter {
        project_ids: BTreeSet::from([ProjectId(10)]),
        ..ReportFilter::default()
    }
}

#[test]
fn logged_time_report_matches_the_three_task_scenario() {
    let report = service()
        .logged_time_report(&website_only(), now())
        .expect("report builds");

    assert_eq!(report.total_tasks, 3);
    assert!((report.total_time - 1.5).abs() < 1e-9);
    assert!((report.avg_time - 1.0).abs() < 1e-9);
    assert_eq!(report.completed_tasks, 1);
    assert_eq!(report.blocked_tasks, 1);
    assert_eq!(report.overdue_tasks, 1);
    assert!((report.on_time_completion_rate - 1.0).abs() < 1e-9);
    assert_eq!(report.status_counts.total(), report.total_tasks);
}

#[test]
fn rollup_only_reaches_parents_inside_the_scope() {
    let scoped = service()
        .logged_time_report(&website_only(), now())
        .expect("scoped report");
    assert_eq!(scoped.task_times[&TaskId(1)].total_seconds, 3600);

    let everything = service()
        .logged_time_report(&ReportFilter::default(), now())
        .expect("unscoped report");
    assert_eq!(everything.total_tasks, 5, "archived task is excluded");
    assert_eq!(everything.task_times[&TaskId(1)].total_seconds, 3600 + 900);

    let orphan = &everything.task_times[&TaskId(5)];
    assert_eq!(orphan.own_seconds, 600);
    assert_eq!(orphan.total_seconds, 600);
    assert!(!everything.task_times.contains_key(&TaskId(99)));
}

#[test]
fn department_and_date_filters_narrow_the_task_set() {
    let operations = ReportFilter {
        department_ids: BTreeSet::from([DepartmentId(2)]),
        ..ReportFilter::default()
    };
    let report = service()
        .logged_time_report(&operations, now())
        .expect("department report");
    assert_eq!(report.total_tasks, 2);
    assert_eq!(report.status_counts.todo, 2);

    let params = ReportParams {
        start_date: Some("2024-12-01".to_string()),
        end_date: Some("2024-12-31".to_string()),
        ..ReportParams::default()
    };
    let december = params.filter().expect("valid dates");
    let report = service()
        .logged_time_report(&december, now())
        .expect("date scoped report");
    // Task 2 was created in 2023 and fell due on 2024-01-01.
    assert_eq!(report.total_tasks, 2);
}

#[test]
fn team_summary_counts_every_assignment() {
    let report = service()
        .team_summary_report(&ReportFilter::default())
        .expect("team summary");

    assert_eq!(report.total_tasks, 5);
    assert_eq!(report.total_users, 3);
    assert_eq!(report.week_totals.len(), 3);

    let week = &report.week_totals["2025-W22"];
    assert_eq!(week.total, 2);
    assert_eq!(
        week.week_start,
        NaiveDate::from_ymd_opt(2025, 5, 26).expect("valid date")
    );

    let ana = &report.user_totals[&UserId("u-1".to_string())];
    assert_eq!(ana.user_name, "Ana Silva");
    assert_eq!(ana.total, 2);
    assert_eq!(report.user_totals[&UserId("u-3".to_string())].user_name, "Chloe");

    let summed: usize = report
        .user_totals
        .values()
        .map(|totals| totals.counts.total())
        .sum();
    assert_eq!(summed, report.total_tasks);
}

#[test]
fn completion_report_groups_by_creator() {
    let report = service()
        .task_completion_report(&ReportFilter::default())
        .expect("completion report");

    assert_eq!(report.total_tasks, 5);
    assert!((report.completion_rate - 0.2).abs() < 1e-9);
    assert_eq!(report.status_counts.total(), report.total_tasks);
    assert_eq!(report.user_stats[0].user_name, "Chloe");
    assert_eq!(report.user_stats[0].total_tasks, 2);
    assert!(report
        .user_stats
        .iter()
        .any(|stats| stats.user_id.is_empty() && stats.user_name == "Unassigned"));
    assert_eq!(report.project_stats[&ProjectId(10)], 1);
    assert_eq!(report.project_stats[&ProjectId(20)], 0);
}

#[test]
fn repeated_runs_are_identical() {
    let service = service();
    for action in ReportAction::ALL {
        let first = service
            .run(action, &ReportFilter::default(), now())
            .expect("first run");
        let second = service
            .run(action, &ReportFilter::default(), now())
            .expect("second run");
        assert_eq!(first, second, "{action} is not deterministic");
        assert_eq!(
            serde_json::to_string(&first).expect("serializes"),
            serde_json::to_string(&second).expect("serializes")
        );
    }
}

#[test]
fn lookup_actions_are_sorted_by_name() {
    let output = service()
        .run(ReportAction::Departments, &ReportFilter::default(), now())
        .expect("departments");
    let ReportOutput::Departments(departments) = output else {
        panic!("expected departments");
    };
    let names: Vec<&str> = departments.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Engineering", "Operations"]);

    let output = service()
        .run(ReportAction::Projects, &website_only(), now())
        .expect("projects");
    let ReportOutput::Projects(projects) = output else {
        panic!("expected projects");
    };
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Website");
}

#[test]
fn timeline_places_subtasks_after_their_parent() {
    let timeline = service()
        .timeline(&ReportFilter::default(), now())
        .expect("timeline");

    let order: Vec<i64> = timeline.bars.iter().map(|bar| bar.task_id.0).collect();
    let parent = order.iter().position(|id| *id == 1).expect("parent bar");
    assert_eq!(order[parent + 1], 4);
    assert_eq!(order.len(), 5);
    assert!(timeline.range.is_some());
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<ReminderBatch>>,
}

impl ReminderNotifier for Outbox {
    fn notify(&self, batch: &ReminderBatch) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError::Transport("outbox poisoned".to_string()))?
            .push(batch.clone());
        Ok(())
    }
}

#[test]
fn digest_reminds_every_assignee_of_open_deadlines() {
    let outbox = Arc::new(Outbox::default());
    let digest = DeadlineDigest::new(store(), Arc::clone(&outbox));

    let summary = digest
        .run(&ReportFilter::default(), now(), Duration::hours(72))
        .expect("digest runs");

    assert_eq!(summary.recipients, 3);
    assert_eq!(summary.reminders, 3);
    assert_eq!(summary.delivered, 3);
    assert_eq!(summary.failed, 0);

    let sent = outbox.sent.lock().expect("outbox lock");
    let chloe = sent
        .iter()
        .find(|batch| batch.recipient == UserId("u-3".to_string()))
        .expect("chloe is reminded");
    assert_eq!(chloe.reminders[0].task_id, TaskId(4));
    assert!(!chloe.reminders[0].overdue);

    let ben = sent
        .iter()
        .find(|batch| batch.recipient_name == "Ben Okafor")
        .expect("ben is reminded");
    assert!(ben.reminders[0].overdue);
}
