use super::domain::{Task, UserId, UNKNOWN_USER};
use super::views::{
    ratio, seconds_to_hours, CreatorStats, StatusCounts, TaskCompletionReport,
    UNASSIGNED_CREATOR, UNASSIGNED_CREATOR_NAME,
};
use std::collections::{BTreeMap, HashMap};

/// Creator ids referenced by the tasks, deduplicated and sorted.
pub fn creator_ids(tasks: &[Task]) -> Vec<UserId> {
    let mut ids: Vec<UserId> = tasks
        .iter()
        .filter_map(|task| task.created_by.clone())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

fn creator_stats(user_id: String, user_name: String, tasks: &[&Task]) -> CreatorStats {
    let mut counts = StatusCounts::default();
    let mut completion_hours = 0.0;
    let mut timed_completions = 0usize;
    let mut on_time_count = 0usize;
    let mut late_count = 0usize;
    let mut logged_seconds = 0u64;

    for task in tasks {
        counts.record(task.status);
        logged_seconds += task.logged_seconds;

        if !task.is_completed() {
            continue;
        }
        if let Some(updated) = task.updated_at {
            let hours = (updated - task.created_at).num_seconds() as f64 / 3600.0;
            completion_hours += hours.max(0.0);
            timed_completions += 1;
        }
        if task.completed_on_time() {
            on_time_count += 1;
        } else if task.completed_late() {
            late_count += 1;
        }
    }

    let total_tasks = tasks.len();
    let total_logged_hours = seconds_to_hours(logged_seconds);

    CreatorStats {
        user_id,
        user_name,
        total_tasks,
        counts,
        completion_rate: ratio(counts.completed, total_tasks),
        avg_completion_hours: if timed_completions == 0 {
            0.0
        } else {
            completion_hours / timed_completions as f64
        },
        on_time_count,
        late_count,
        on_time_rate: ratio(on_time_count, counts.completed),
        total_logged_hours,
        avg_logged_hours: if total_tasks == 0 {
            0.0
        } else {
            total_logged_hours / total_tasks as f64
        },
    }
}

/// Completion statistics overall, per creator and per project.
///
/// `names` maps creator ids to display names; unresolved ids show as
/// `Unknown User`.
pub fn task_completion_report(
    tasks: &[Task],
    names: &HashMap<UserId, String>,
) -> TaskCompletionReport {
    let mut status_counts = StatusCounts::default();
    let mut by_creator: BTreeMap<Option<&UserId>, Vec<&Task>> = BTreeMap::new();
    let mut project_stats = BTreeMap::new();

    for task in tasks {
        status_counts.record(task.status);
        by_creator
            .entry(task.created_by.as_ref())
            .or_default()
            .push(task);
        let completed = project_stats.entry(task.project_id).or_insert(0usize);
        if task.is_completed() {
            *completed += 1;
        }
    }

    let mut user_stats: Vec<CreatorStats> = by_creator
        .into_iter()
        .map(|(creator, tasks)| match creator {
            Some(id) => {
                let name = names
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USER.to_string());
                creator_stats(id.0.clone(), name, &tasks)
            }
            None => creator_stats(
                UNASSIGNED_CREATOR.to_string(),
                UNASSIGNED_CREATOR_NAME.to_string(),
                &tasks,
            ),
        })
        .collect();
    // Stable: equal counts keep the creator-key order from the map.
    user_stats.sort_by(|a, b| b.total_tasks.cmp(&a.total_tasks));

    TaskCompletionReport {
        total_tasks: tasks.len(),
        status_counts,
        completion_rate: ratio(status_counts.completed, tasks.len()),
        user_stats,
        project_stats,
    }
}
