use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use task_reports::config::StoreConfig;
use task_reports::error::AppError;
use task_reports::reporting::{NotifyError, ReminderBatch, ReminderNotifier, SnapshotStore};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the JSON snapshot named on the command line or in `APP_DATA_PATH`.
///
/// With neither, the store starts empty and every report is zero-valued.
pub(crate) fn load_store(
    config: &StoreConfig,
    override_path: Option<PathBuf>,
) -> Result<SnapshotStore, AppError> {
    match override_path.or_else(|| config.data_path.clone()) {
        Some(path) => {
            let store = SnapshotStore::from_path(&path)?;
            info!(
                path = %path.display(),
                tasks = store.data().tasks.len(),
                "task snapshot loaded"
            );
            Ok(store)
        }
        None => {
            warn!("no task snapshot configured; serving an empty store");
            Ok(SnapshotStore::default())
        }
    }
}

/// Records reminder batches in memory and logs each delivery.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReminderNotifier {
    batches: Arc<Mutex<Vec<ReminderBatch>>>,
}

impl ReminderNotifier for InMemoryReminderNotifier {
    fn notify(&self, batch: &ReminderBatch) -> Result<(), NotifyError> {
        let mut guard = self
            .batches
            .lock()
            .map_err(|_| NotifyError::Transport("reminder outbox poisoned".to_string()))?;
        info!(
            recipient = %batch.recipient,
            reminders = batch.reminders.len(),
            "reminder queued"
        );
        guard.push(batch.clone());
        Ok(())
    }
}

impl InMemoryReminderNotifier {
    pub(crate) fn batches(&self) -> Vec<ReminderBatch> {
        self.batches
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}
