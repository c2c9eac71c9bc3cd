use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use super::{ExportDocument, ExportError, ExportRenderer};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 5.0;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 14.0;

/// Plain A4 text pages: title, summary pairs, then each table one row per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    y: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            font,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn line(&mut self, text: &str, size: f32) {
        if self.y < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
        if !text.is_empty() {
            self.layer.use_text(text, size, Mm(MARGIN), Mm(self.y), &self.font);
        }
        self.y -= LINE_HEIGHT;
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        Ok(self.doc.save_to_bytes()?)
    }
}

impl ExportRenderer for PdfRenderer {
    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
        let mut writer = PageWriter::new(&document.title)?;

        writer.line(&document.title, TITLE_SIZE);
        writer.line(
            &format!("Generated {}", document.generated_on.format("%Y-%m-%d")),
            FONT_SIZE,
        );
        writer.line("", FONT_SIZE);

        writer.line("Summary", FONT_SIZE);
        for (label, value) in &document.summary {
            writer.line(&format!("{label}: {value}"), FONT_SIZE);
        }

        for table in &document.tables {
            writer.line("", FONT_SIZE);
            writer.line(&table.name, FONT_SIZE);
            writer.line(&table.headers.join(" | "), FONT_SIZE);
            for cells in &table.rows {
                let row: Vec<String> = cells.iter().map(ToString::to_string).collect();
                writer.line(&row.join(" | "), FONT_SIZE);
            }
        }

        writer.finish()
    }
}
