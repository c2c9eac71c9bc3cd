use crate::reporting::domain::{
    Department, DepartmentId, Project, ProjectId, Task, TaskAssignment, TaskId, TaskStatus,
    UserId, UserInfo,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use super::StoreError;

/// Coerces one untyped row into a verified record, tagging failures with the row position.
pub(crate) fn coerce_rows<R, T>(
    table: &'static str,
    rows: Vec<Value>,
    validate: impl Fn(R) -> Result<T, String>,
) -> Result<Vec<T>, StoreError>
where
    R: for<'de> Deserialize<'de>,
{
    rows.into_iter()
        .enumerate()
        .map(|(index, value)| {
            let invalid = |reason: String| StoreError::InvalidRow {
                table,
                index,
                reason,
            };
            let row = serde_json::from_value::<R>(value).map_err(|err| invalid(err.to_string()))?;
            validate(row).map_err(invalid)
        })
        .collect()
}

/// Fails on the first row whose id repeats an earlier row's id.
pub(crate) fn reject_duplicate_ids<T, K>(
    table: &'static str,
    rows: &[T],
    id: impl Fn(&T) -> K,
) -> Result<(), StoreError>
where
    K: Eq + Hash + fmt::Display,
{
    let mut seen = HashSet::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let key = id(row);
        if seen.contains(&key) {
            return Err(StoreError::InvalidRow {
                table,
                index,
                reason: format!("duplicate id {key}"),
            });
        }
        seen.insert(key);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskRow {
    #[serde(default, deserialize_with = "loose_integer")]
    id: Option<i64>,
    title: Option<String>,
    status: Option<String>,
    #[serde(default, deserialize_with = "loose_integer")]
    project_id: Option<i64>,
    #[serde(default, deserialize_with = "loose_integer")]
    parent_task_id: Option<i64>,
    #[serde(default, deserialize_with = "loose_integer")]
    logged_time: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    deadline: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_by: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    updated_at: Option<String>,
    #[serde(default)]
    archived: Option<bool>,
}

impl TaskRow {
    pub(crate) fn validate(self) -> Result<Task, String> {
        let id = self.id.ok_or("missing id")?;
        let status_label = self.status.ok_or("missing status")?;
        let status = TaskStatus::from_label(&status_label)
            .ok_or_else(|| format!("unknown status '{status_label}'"))?;
        let project_id = self.project_id.ok_or("missing project_id")?;
        let logged_seconds = match self.logged_time.unwrap_or(0) {
            seconds if seconds < 0 => return Err(format!("negative logged_time {seconds}")),
            seconds => seconds as u64,
        };
        let created_at = required_timestamp("created_at", self.created_at)?;

        Ok(Task {
            id: TaskId(id),
            title: self.title.unwrap_or_default(),
            status,
            project_id: ProjectId(project_id),
            parent_task_id: self.parent_task_id.map(TaskId),
            logged_seconds,
            deadline: optional_timestamp("deadline", self.deadline)?,
            created_by: self.created_by.map(UserId),
            created_at,
            updated_at: optional_timestamp("updated_at", self.updated_at)?,
            archived: self.archived.unwrap_or(false),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentRow {
    #[serde(default, deserialize_with = "loose_integer")]
    task_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    assignee_id: Option<String>,
}

impl AssignmentRow {
    pub(crate) fn validate(self) -> Result<TaskAssignment, String> {
        Ok(TaskAssignment {
            task_id: TaskId(self.task_id.ok_or("missing task_id")?),
            user_id: UserId(self.assignee_id.ok_or("missing assignee_id")?),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default, deserialize_with = "loose_integer")]
    department_id: Option<i64>,
}

impl UserRow {
    pub(crate) fn validate(self) -> Result<UserInfo, String> {
        Ok(UserInfo {
            id: UserId(self.id.ok_or("missing id")?),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            department_id: self.department_id.map(DepartmentId),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectRow {
    #[serde(default, deserialize_with = "loose_integer")]
    id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "loose_integer")]
    department_id: Option<i64>,
}

impl ProjectRow {
    pub(crate) fn validate(self) -> Result<Project, String> {
        let id = self.id.ok_or("missing id")?;
        Ok(Project {
            id: ProjectId(id),
            name: self.name.unwrap_or_else(|| format!("Project {id}")),
            department_id: self.department_id.map(DepartmentId),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepartmentRow {
    #[serde(default, deserialize_with = "loose_integer")]
    id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
}

impl DepartmentRow {
    pub(crate) fn validate(self) -> Result<Department, String> {
        let id = self.id.ok_or("missing id")?;
        Ok(Department {
            id: DepartmentId(id),
            name: self.name.unwrap_or_else(|| format!("Department {id}")),
        })
    }
}

/// Accepts `12`, `"12"`, `null` or a missing field.
fn loose_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|n| n.fract() == 0.0).map(|n| n as i64))
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("{number} is not an integer"))),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("'{raw}' is not an integer"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected an integer, found {other}"
        ))),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn required_timestamp(field: &str, value: Option<String>) -> Result<DateTime<Utc>, String> {
    optional_timestamp(field, value)?.ok_or_else(|| format!("missing {field}"))
}

fn optional_timestamp(field: &str, value: Option<String>) -> Result<Option<DateTime<Utc>>, String> {
    value
        .map(|raw| parse_timestamp(&raw).ok_or_else(|| format!("invalid {field} '{raw}'")))
        .transpose()
}

/// RFC 3339, Postgres-style `YYYY-MM-DD HH:MM:SS[.f]` (UTC) or a bare date at midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    None
}
