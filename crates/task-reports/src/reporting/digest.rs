use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::domain::{ReportFilter, TaskId, UserId, UNKNOWN_USER};
use super::store::{StoreError, TaskStore};

/// One open task whose deadline is close or already past.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub task_id: TaskId,
    pub title: String,
    pub deadline: DateTime<Utc>,
    pub overdue: bool,
}

/// Everything one assignee is reminded of in a single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderBatch {
    pub recipient: UserId,
    pub recipient_name: String,
    pub reminders: Vec<Reminder>,
}

/// Outbound delivery hook (mail, chat, in-app notification table).
pub trait ReminderNotifier: Send + Sync {
    fn notify(&self, batch: &ReminderBatch) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("reminder transport unavailable: {0}")]
    Transport(String),
    #[error("recipient {0} rejected the reminder")]
    Rejected(UserId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestSummary {
    pub recipients: usize,
    pub reminders: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct DeadlineDigest<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> DeadlineDigest<S, N>
where
    S: TaskStore + 'static,
    N: ReminderNotifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Reminder batches for open tasks due before `now + window`, one per assignee.
    pub fn batches(
        &self,
        filter: &ReportFilter,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<ReminderBatch>, StoreError> {
        let horizon = now.checked_add_signed(window).unwrap_or(if window < Duration::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
        let due: Vec<_> = self
            .store
            .tasks(filter)?
            .into_iter()
            .filter(|task| !task.is_completed())
            .filter_map(|task| {
                let deadline = task.deadline?;
                (deadline <= horizon).then(|| Reminder {
                    task_id: task.id,
                    title: task.title,
                    deadline,
                    overdue: deadline < now,
                })
            })
            .collect();
        if due.is_empty() {
            return Ok(Vec::new());
        }

        let task_ids: Vec<TaskId> = due.iter().map(|reminder| reminder.task_id).collect();
        let assignments = self.store.assignments(&task_ids)?;

        let mut by_recipient: BTreeMap<UserId, Vec<Reminder>> = BTreeMap::new();
        for reminder in &due {
            for assignment in assignments
                .iter()
                .filter(|assignment| assignment.task_id == reminder.task_id)
            {
                by_recipient
                    .entry(assignment.user_id.clone())
                    .or_default()
                    .push(reminder.clone());
            }
        }

        let recipients: Vec<UserId> = by_recipient.keys().cloned().collect();
        let names: BTreeMap<UserId, String> = match self.store.users_by_ids(&recipients) {
            Ok(users) => users
                .into_iter()
                .map(|user| {
                    let name = user.display_name();
                    (user.id, name)
                })
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "recipient lookup failed; using placeholder names");
                BTreeMap::new()
            }
        };

        Ok(by_recipient
            .into_iter()
            .map(|(recipient, mut reminders)| {
                reminders.sort_by(|a, b| {
                    a.deadline
                        .cmp(&b.deadline)
                        .then(a.task_id.cmp(&b.task_id))
                });
                let recipient_name = names
                    .get(&recipient)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USER.to_string());
                ReminderBatch {
                    recipient,
                    recipient_name,
                    reminders,
                }
            })
            .collect())
    }

    /// Sends every batch; a failed recipient is logged and the run carries on.
    pub fn run(
        &self,
        filter: &ReportFilter,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<DigestSummary, StoreError> {
        let batches = self.batches(filter, now, window)?;
        let mut summary = DigestSummary {
            recipients: batches.len(),
            reminders: batches.iter().map(|batch| batch.reminders.len()).sum(),
            ..DigestSummary::default()
        };

        for batch in &batches {
            match self.notifier.notify(batch) {
                Ok(()) => summary.delivered += 1,
                Err(err) => {
                    summary.failed += 1;
                    tracing::warn!(recipient = %batch.recipient, error = %err, "reminder delivery failed");
                }
            }
        }

        tracing::info!(
            recipients = summary.recipients,
            delivered = summary.delivered,
            failed = summary.failed,
            "deadline digest dispatched"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::domain::{ProjectId, Task, TaskAssignment, TaskStatus, UserInfo};
    use crate::reporting::store::{SnapshotData, SnapshotStore};
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<ReminderBatch>>,
        reject: Option<UserId>,
    }

    impl ReminderNotifier for RecordingNotifier {
        fn notify(&self, batch: &ReminderBatch) -> Result<(), NotifyError> {
            if self.reject.as_ref() == Some(&batch.recipient) {
                return Err(NotifyError::Rejected(batch.recipient.clone()));
            }
            self.sent.lock().expect("notifier lock").push(batch.clone());
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap()
    }

    fn task(id: i64, status: TaskStatus, deadline: Option<DateTime<Utc>>) -> Task {
        Task {
            id: TaskId(id),
            title: format!("Task {id}"),
            status,
            project_id: ProjectId(1),
            parent_task_id: None,
            logged_seconds: 0,
            deadline,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap(),
            updated_at: None,
            archived: false,
        }
    }

    fn user(id: &str, first: &str) -> UserInfo {
        UserInfo {
            id: UserId(id.to_string()),
            first_name: first.to_string(),
            last_name: "Tester".to_string(),
            department_id: None,
        }
    }

    fn assign(task: i64, user: &str) -> TaskAssignment {
        TaskAssignment {
            task_id: TaskId(task),
            user_id: UserId(user.to_string()),
        }
    }

    fn store() -> Arc<SnapshotStore> {
        let hours = |h: i64| Some(now() + Duration::hours(h));
        Arc::new(SnapshotStore::new(SnapshotData {
            tasks: vec![
                task(1, TaskStatus::Todo, hours(5)),
                task(2, TaskStatus::InProgress, hours(-30)),
                task(3, TaskStatus::Completed, hours(2)),
                task(4, TaskStatus::Todo, hours(72)),
                task(5, TaskStatus::Blocked, None),
                task(6, TaskStatus::Todo, hours(1)),
            ],
            assignments: vec![
                assign(1, "ana"),
                assign(2, "ana"),
                assign(2, "ben"),
                assign(3, "ben"),
                assign(4, "ben"),
            ],
            users: vec![user("ana", "Ana"), user("ben", "Ben")],
            projects: Vec::new(),
            departments: Vec::new(),
        }))
    }

    #[test]
    fn batches_cover_due_and_overdue_open_tasks() {
        let digest = DeadlineDigest::new(store(), Arc::new(RecordingNotifier::default()));

        let batches = digest
            .batches(&ReportFilter::default(), now(), Duration::hours(24))
            .expect("batches");

        assert_eq!(batches.len(), 2);
        let ana = &batches[0];
        assert_eq!(ana.recipient_name, "Ana Tester");
        let ids: Vec<i64> = ana.reminders.iter().map(|r| r.task_id.0).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(ana.reminders[0].overdue);
        assert!(!ana.reminders[1].overdue);

        let ben = &batches[1];
        assert_eq!(ben.reminders.len(), 1);
        assert_eq!(ben.reminders[0].task_id, TaskId(2));
    }

    #[test]
    fn failed_delivery_does_not_stop_the_run() {
        let notifier = Arc::new(RecordingNotifier {
            reject: Some(UserId("ana".to_string())),
            ..RecordingNotifier::default()
        });
        let digest = DeadlineDigest::new(store(), Arc::clone(&notifier));

        let summary = digest
            .run(&ReportFilter::default(), now(), Duration::hours(24))
            .expect("digest runs");

        assert_eq!(
            summary,
            DigestSummary {
                recipients: 2,
                reminders: 3,
                delivered: 1,
                failed: 1,
            }
        );
        let sent = notifier.sent.lock().expect("notifier lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, UserId("ben".to_string()));
    }

    #[test]
    fn huge_windows_saturate_instead_of_overflowing() {
        let digest = DeadlineDigest::new(store(), Arc::new(RecordingNotifier::default()));

        let summary = digest
            .run(
                &ReportFilter::default(),
                now(),
                Duration::hours(i64::from(u32::MAX)),
            )
            .expect("digest runs");

        assert_eq!(summary.recipients, 2);
        assert_eq!(summary.reminders, 4);
        assert_eq!(summary.delivered, 2);
    }

    #[test]
    fn nothing_due_sends_nothing() {
        let notifier = Arc::new(RecordingNotifier::default());
        let digest = DeadlineDigest::new(store(), Arc::clone(&notifier));

        let summary = digest
            .run(&ReportFilter::default(), now(), Duration::hours(-48))
            .expect("digest runs");

        assert_eq!(summary, DigestSummary::default());
        assert!(notifier.sent.lock().expect("notifier lock").is_empty());
    }
}
