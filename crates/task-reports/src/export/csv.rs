use ::csv::{Writer, WriterBuilder};

use super::{ExportDocument, ExportError, ExportRenderer};

/// Summary section first, then one section per table, separated by blank rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRenderer;

/// Writes one section; sections are joined by a bare newline since the writer
/// quotes an empty record as `""`.
fn section(
    out: &mut Vec<u8>,
    write: impl FnOnce(&mut Writer<&mut Vec<u8>>) -> Result<(), ::csv::Error>,
) -> Result<(), ExportError> {
    if !out.is_empty() {
        out.push(b'\n');
    }
    let mut writer = WriterBuilder::new().flexible(true).from_writer(out);
    write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

impl ExportRenderer for CsvRenderer {
    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
        let mut out = Vec::new();

        section(&mut out, |writer| {
            writer.write_record([document.title.as_str()])?;
            writer.write_record([
                "Generated".to_string(),
                document.generated_on.format("%Y-%m-%d").to_string(),
            ])
        })?;

        section(&mut out, |writer| {
            writer.write_record(["Summary"])?;
            writer.write_record(["Metric", "Value"])?;
            for (label, value) in &document.summary {
                writer.write_record([label.clone(), value.to_string()])?;
            }
            Ok(())
        })?;

        for table in &document.tables {
            section(&mut out, |writer| {
                writer.write_record([table.name.as_str()])?;
                writer.write_record(&table.headers)?;
                for cells in &table.rows {
                    writer.write_record(cells.iter().map(ToString::to_string))?;
                }
                Ok(())
            })?;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportTable, FieldValue};
    use chrono::NaiveDate;

    #[test]
    fn sections_follow_the_summary() {
        let mut document = ExportDocument::new(
            "Task Completion Report",
            NaiveDate::from_ymd_opt(2025, 5, 1).expect("valid date"),
        );
        document.push_summary("Total Tasks", 3usize);
        document.push_summary("Completion Rate", "66.7%");
        let document = document.with_table(ExportTable {
            name: "Creators".to_string(),
            headers: vec!["Creator".to_string(), "Total Tasks".to_string()],
            rows: vec![vec![
                FieldValue::Text("Silva, Ana".to_string()),
                FieldValue::Integer(3),
            ]],
        });

        let bytes = CsvRenderer.render(&document).expect("csv renders");
        let text = String::from_utf8(bytes).expect("utf-8 output");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Task Completion Report");
        assert_eq!(lines[1], "Generated,2025-05-01");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Summary");
        assert!(lines.contains(&"Total Tasks,3"));
        assert!(lines.contains(&"Completion Rate,66.7%"));
        let creators = lines
            .iter()
            .position(|line| *line == "Creators")
            .expect("table section present");
        assert_eq!(lines[creators + 1], "Creator,Total Tasks");
        assert_eq!(lines[creators - 1], "");
        assert_eq!(lines[creators + 2], "\"Silva, Ana\",3");
        assert!(!text.contains("\"\"\n"));
    }
}
