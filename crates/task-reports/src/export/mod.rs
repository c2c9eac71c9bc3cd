mod csv;
mod documents;
mod pdf;
mod xlsx;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::request::RequestError;

pub use self::csv::CsvRenderer;
pub use self::pdf::PdfRenderer;
pub use self::xlsx::XlsxRenderer;
pub use documents::{
    completion_document, document_for, logged_time_document, team_document, timeline_document,
};

/// A single cell of an export document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::Integer(value) => Some(*value as f64),
            FieldValue::Number(value) => Some(*value),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Number(value) => write!(f, "{value:.2}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        FieldValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// Declarative column: a label, how to read the value, and optionally how to print it.
pub struct FieldConfig<R> {
    pub label: &'static str,
    pub accessor: fn(&R) -> FieldValue,
    pub formatter: Option<fn(&FieldValue) -> String>,
}

impl<R> FieldConfig<R> {
    pub fn new(label: &'static str, accessor: fn(&R) -> FieldValue) -> Self {
        Self {
            label,
            accessor,
            formatter: None,
        }
    }

    pub fn formatted(mut self, formatter: fn(&FieldValue) -> String) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Formatted fields become text cells; raw ones keep their numeric type.
    pub fn cell(&self, record: &R) -> FieldValue {
        let value = (self.accessor)(record);
        match self.formatter {
            Some(format) => FieldValue::Text(format(&value)),
            None => value,
        }
    }
}

pub fn percent(value: &FieldValue) -> String {
    format!("{:.1}%", value.as_f64().unwrap_or_default() * 100.0)
}

pub fn hours(value: &FieldValue) -> String {
    format!("{:.2} h", value.as_f64().unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<FieldValue>>,
}

impl ExportTable {
    pub fn from_records<'r, R: 'r>(
        name: &str,
        fields: &[FieldConfig<R>],
        records: impl IntoIterator<Item = &'r R>,
    ) -> Self {
        Self {
            name: name.to_string(),
            headers: fields.iter().map(|field| field.label.to_string()).collect(),
            rows: records
                .into_iter()
                .map(|record| fields.iter().map(|field| field.cell(record)).collect())
                .collect(),
        }
    }
}

/// Flat, renderer-independent view of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub title: String,
    pub generated_on: NaiveDate,
    pub summary: Vec<(String, FieldValue)>,
    pub tables: Vec<ExportTable>,
}

impl ExportDocument {
    pub fn new(title: &str, generated_on: NaiveDate) -> Self {
        Self {
            title: title.to_string(),
            generated_on,
            summary: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn with_summary<R>(mut self, fields: &[FieldConfig<R>], record: &R) -> Self {
        self.summary.extend(
            fields
                .iter()
                .map(|field| (field.label.to_string(), field.cell(record))),
        );
        self
    }

    pub fn push_summary(&mut self, label: impl Into<String>, value: impl Into<FieldValue>) {
        self.summary.push((label.into(), value.into()));
    }

    pub fn with_table(mut self, table: ExportTable) -> Self {
        self.tables.push(table);
        self
    }

    pub fn file_name(&self, format: ExportFormat) -> String {
        file_name(&self.title, self.generated_on, format)
    }
}

/// `{Report_Title}_{yyyy-mm-dd}.{ext}`
pub fn file_name(title: &str, date: NaiveDate, format: ExportFormat) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{stem}_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Pdf,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn render(self, document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Xlsx => XlsxRenderer.render(document),
            ExportFormat::Csv => CsvRenderer.render(document),
            ExportFormat::Pdf => PdfRenderer.render(document),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(RequestError::UnknownFormat(other.to_string())),
        }
    }
}

pub trait ExportRenderer {
    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>, ExportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("spreadsheet rendering failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("pdf rendering failed: {0}")]
    Pdf(#[from] printpdf::Error),
    #[error("csv rendering failed: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("export io failed: {0}")]
    Io(#[from] std::io::Error),
}
