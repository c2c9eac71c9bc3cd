use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};

use super::{ExportDocument, ExportError, ExportRenderer, ExportTable, FieldValue};

/// Sheet names are capped at 31 characters and may not contain `[]:*?/\`.
fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &FieldValue,
) -> Result<(), XlsxError> {
    match value {
        FieldValue::Text(text) => worksheet.write_string(row, col, text)?,
        other => worksheet.write_number(row, col, other.as_f64().unwrap_or_default())?,
    };
    Ok(())
}

fn write_summary(
    worksheet: &mut Worksheet,
    document: &ExportDocument,
    title: &Format,
    header: &Format,
) -> Result<(), XlsxError> {
    worksheet.set_name("Summary")?;
    worksheet.write_string_with_format(0, 0, &document.title, title)?;
    worksheet.write_string(1, 0, "Generated")?;
    worksheet.write_string(1, 1, document.generated_on.format("%Y-%m-%d").to_string())?;

    worksheet.write_string_with_format(3, 0, "Metric", header)?;
    worksheet.write_string_with_format(3, 1, "Value", header)?;
    for (offset, (label, value)) in document.summary.iter().enumerate() {
        let row = 4 + offset as u32;
        worksheet.write_string(row, 0, label)?;
        write_cell(worksheet, row, 1, value)?;
    }

    worksheet.autofit();
    Ok(())
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &ExportTable,
    header: &Format,
) -> Result<(), XlsxError> {
    worksheet.set_name(sheet_name(&table.name))?;
    for (col, label) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, label, header)?;
    }
    for (offset, cells) in table.rows.iter().enumerate() {
        let row = 1 + offset as u32;
        for (col, value) in cells.iter().enumerate() {
            write_cell(worksheet, row, col as u16, value)?;
        }
    }

    worksheet.autofit();
    Ok(())
}

/// Workbook with a `Summary` sheet followed by one sheet per table.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxRenderer;

impl ExportRenderer for XlsxRenderer {
    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let title = Format::new().set_bold().set_font_size(14);
        let header = Format::new().set_bold().set_background_color(Color::Gray);

        write_summary(workbook.add_worksheet(), document, &title, &header)?;
        for table in &document.tables {
            write_table(workbook.add_worksheet(), table, &header)?;
        }

        Ok(workbook.save_to_buffer()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn renders_a_zip_container() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date");
        let document = ExportDocument::new("Team Summary Report", date).with_table(ExportTable {
            name: "Weekly Stats".to_string(),
            headers: vec!["Week".to_string(), "Total".to_string()],
            rows: vec![vec![
                FieldValue::Text("2025-W02".to_string()),
                FieldValue::Integer(4),
            ]],
        });

        let bytes = XlsxRenderer.render(&document).expect("workbook renders");

        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn sheet_names_are_sanitized() {
        assert_eq!(sheet_name("Q1/Q2 [draft]"), "Q1Q2 draft");
        assert_eq!(sheet_name("???"), "Sheet");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
    }
}
