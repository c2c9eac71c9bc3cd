use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::export::ExportFormat;
use crate::reporting::domain::{DepartmentId, ProjectId, ReportFilter};
use crate::reporting::store::parse_timestamp;

/// Report selected by the `action` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportAction {
    Metrics,
    Report,
    Team,
    Departments,
    Projects,
    Timeline,
}

impl ReportAction {
    pub const ALL: [Self; 6] = [
        Self::Metrics,
        Self::Report,
        Self::Team,
        Self::Departments,
        Self::Projects,
        Self::Timeline,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Report => "report",
            Self::Team => "team",
            Self::Departments => "departments",
            Self::Projects => "projects",
            Self::Timeline => "timeline",
        }
    }

    /// Lookup lists carry no aggregate worth a document.
    pub const fn is_exportable(self) -> bool {
        !matches!(self, Self::Departments | Self::Projects)
    }
}

impl fmt::Display for ReportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportAction {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RequestError::UnknownAction(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("missing required parameter `{0}`")]
    Missing(&'static str),
    #[error("unknown report action `{0}`")]
    UnknownAction(String),
    #[error("unknown export format `{0}`; expected xlsx, csv or pdf")]
    UnknownFormat(String),
    #[error("`{action}` cannot be exported")]
    NotExportable { action: ReportAction },
    #[error("{field} contains a non-integer id `{value}`")]
    InvalidId { field: &'static str, value: String },
    #[error("{field} `{value}` is not a YYYY-MM-DD or RFC 3339 date")]
    InvalidDate { field: &'static str, value: String },
    #[error("startDate {start} is after endDate {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Raw report parameters as they arrive on the query string or the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    pub action: Option<String>,
    pub project_ids: Option<String>,
    pub department_ids: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub as_of: Option<String>,
    pub format: Option<String>,
}

impl ReportParams {
    pub fn action(&self) -> Result<ReportAction, RequestError> {
        non_blank(self.action.as_deref())
            .ok_or(RequestError::Missing("action"))?
            .parse()
    }

    /// Export format, xlsx when absent.
    pub fn format(&self) -> Result<ExportFormat, RequestError> {
        match non_blank(self.format.as_deref()) {
            Some(value) => value.parse(),
            None => Ok(ExportFormat::Xlsx),
        }
    }

    pub fn filter(&self) -> Result<ReportFilter, RequestError> {
        let start_date = parse_optional_date("startDate", self.start_date.as_deref())?;
        let end_date = parse_optional_date("endDate", self.end_date.as_deref())?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(RequestError::InvertedRange { start, end });
            }
        }

        Ok(ReportFilter {
            project_ids: parse_ids("projectIds", self.project_ids.as_deref())?
                .into_iter()
                .map(ProjectId)
                .collect(),
            department_ids: parse_ids("departmentIds", self.department_ids.as_deref())?
                .into_iter()
                .map(DepartmentId)
                .collect(),
            start_date,
            end_date,
        })
    }

    /// Reference instant for overdue checks; `fallback` unless `asOf` is given.
    pub fn now(&self, fallback: DateTime<Utc>) -> Result<DateTime<Utc>, RequestError> {
        match non_blank(self.as_of.as_deref()) {
            Some(value) => parse_timestamp(value).ok_or_else(|| RequestError::InvalidDate {
                field: "asOf",
                value: value.to_string(),
            }),
            None => Ok(fallback),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Comma-separated integers; blank entries are skipped.
pub fn parse_ids(field: &'static str, raw: Option<&str>) -> Result<BTreeSet<i64>, RequestError> {
    let Some(raw) = non_blank(raw) else {
        return Ok(BTreeSet::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| RequestError::InvalidId {
                field,
                value: part.to_string(),
            })
        })
        .collect()
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its UTC date is used).
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, RequestError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
        .map_err(|_| RequestError::InvalidDate {
            field,
            value: trimmed.to_string(),
        })
}

fn parse_optional_date(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<NaiveDate>, RequestError> {
    non_blank(raw).map(|value| parse_date(field, value)).transpose()
}
