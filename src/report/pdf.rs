use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use super::metrics::Font;
use super::{Align, LayoutCursor, ReportRenderer, RowKind, TableRow, TextBlock};
use crate::color::pdf_rgb;
use crate::config::{PageSettings, ReportStyle};
use crate::error::PipelineError;

const POINTS_PER_MM: f32 = 72.0 / 25.4;
const REGULAR: &str = "F1";
const BOLD: &str = "F2";
const BORDER_WIDTH: f32 = 0.2;

// ---------------------------------------------------------------------------
// PDF renderer: one content stream per page, built-in Helvetica fonts
// ---------------------------------------------------------------------------

pub struct PdfRenderer {
    style: ReportStyle,
    pages: Vec<Vec<Operation>>,
}

impl PdfRenderer {
    pub fn new(style: ReportStyle) -> Self {
        PdfRenderer {
            style,
            pages: Vec::new(),
        }
    }

    fn ops(&mut self, page: usize) -> &mut Vec<Operation> {
        if self.pages.len() <= page {
            self.pages.resize_with(page + 1, Vec::new);
        }
        &mut self.pages[page]
    }

    fn text(
        &mut self,
        settings: &PageSettings,
        cursor: LayoutCursor,
        font: Font,
        color: [u8; 3],
        text: &str,
    ) {
        let [r, g, b] = pdf_rgb(color);
        let x = cursor.x * POINTS_PER_MM;
        let y = (settings.height - cursor.y) * POINTS_PER_MM;
        let name = if font.bold { BOLD } else { REGULAR };
        let ops = self.ops(cursor.page);
        ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![name.into(), font.size.into()]));
        ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]));
        ops.push(Operation::new("ET", vec![]));
    }

    /// Cell rectangle, optionally filled, always bordered.
    fn rect(
        &mut self,
        settings: &PageSettings,
        cursor: LayoutCursor,
        width: f32,
        height: f32,
        fill: Option<[u8; 3]>,
    ) {
        let [br, bg, bb] = pdf_rgb(self.style.border_color);
        let x = cursor.x * POINTS_PER_MM;
        let y = (settings.height - cursor.y - height) * POINTS_PER_MM;
        let (w, h) = (width * POINTS_PER_MM, height * POINTS_PER_MM);
        let ops = self.ops(cursor.page);
        ops.push(Operation::new("w", vec![BORDER_WIDTH.into()]));
        ops.push(Operation::new("RG", vec![br.into(), bg.into(), bb.into()]));
        if let Some(color) = fill {
            let [r, g, b] = pdf_rgb(color);
            ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        }
        ops.push(Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]));
        ops.push(Operation::new(if fill.is_some() { "B" } else { "S" }, vec![]));
    }

    fn build(self, settings: &PageSettings) -> Result<Vec<u8>, PipelineError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR => regular_id,
                BOLD => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations }
                .encode()
                .map_err(|e| PipelineError::Report(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            (settings.width * POINTS_PER_MM).into(),
            (settings.height * POINTS_PER_MM).into(),
        ];
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => media_box,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| PipelineError::Report(e.to_string()))?;
        Ok(out)
    }
}

/// Latin-1 bytes for the WinAnsi-encoded base fonts; anything else prints
/// as `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Baseline for line `index` of a block starting at `top`.
fn baseline(top: f32, index: usize, line_height: f32, font: &Font) -> f32 {
    top + index as f32 * line_height + 0.5 * line_height + 0.3 * font.size_mm()
}

impl ReportRenderer for PdfRenderer {
    fn render_header(
        &mut self,
        settings: &PageSettings,
        cursor: LayoutCursor,
        title: &str,
    ) -> LayoutCursor {
        self.ops(cursor.page);
        let font = Font::bold(settings.banner_font_size);
        let text = font.clip(title, settings.content_width());
        let x = settings.margin_left + (settings.content_width() - font.text_width(&text)) / 2.0;
        let y = baseline(cursor.y, 0, settings.banner_height, &font);
        let color = self.style.banner_color;
        self.text(settings, LayoutCursor { x, y, ..cursor }, font, color, &text);
        cursor.below(settings.banner_height)
    }

    fn render_title(
        &mut self,
        settings: &PageSettings,
        cursor: LayoutCursor,
        heading: &TextBlock,
    ) -> LayoutCursor {
        let font = Font::bold(settings.heading_font_size);
        let color = self.style.text_color;
        for (i, line) in heading.lines.iter().enumerate() {
            let y = baseline(cursor.y, i, settings.heading_line_height, &font);
            self.text(settings, LayoutCursor { y, ..cursor }, font, color, line);
        }
        cursor.below(heading.height)
    }

    fn render_row(
        &mut self,
        settings: &PageSettings,
        cursor: LayoutCursor,
        row: &TableRow,
    ) -> LayoutCursor {
        let (font, fill) = match row.kind {
            RowKind::Header => (
                Font::bold(settings.table_font_size),
                Some(self.style.header_fill),
            ),
            RowKind::Data => (Font::regular(settings.table_font_size), None),
        };
        let color = self.style.text_color;
        let mut x = cursor.x;
        for cell in &row.cells {
            let at = LayoutCursor { x, ..cursor };
            self.rect(settings, at, cell.width, row.height, fill);
            for (i, line) in cell.lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let tx = match cell.align {
                    Align::Left => x + settings.cell_padding,
                    Align::Center => x + (cell.width - font.text_width(line)) / 2.0,
                };
                let y = baseline(cursor.y, i, settings.line_height, &font);
                self.text(settings, LayoutCursor { x: tx, y, ..cursor }, font, color, line);
            }
            x += cell.width;
        }
        cursor.below(row.height)
    }

    fn finish(self: Box<Self>, settings: &PageSettings) -> Result<Vec<u8>, PipelineError> {
        self.build(settings)
    }
}
