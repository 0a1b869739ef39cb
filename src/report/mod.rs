/// Report layer: page layout, renderer strategies, and output sinks.
///
/// Architecture:
/// ```text
///   Dataset + title
///        │
///        ▼
///   ┌──────────┐
///   │  layout   │  widths, wrapping, pagination → ReportDocument
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ ReportRenderer    │  pdf / text, driven page by page with a LayoutCursor
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  sink     │  directory (atomic) or memory
///   └──────────┘
/// ```

pub mod layout;
pub mod metrics;
pub mod pdf;
pub mod sink;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::config::{PageSettings, ReportStyle};
use crate::error::PipelineError;

pub use layout::{TableLayout, build_document};

// ---------------------------------------------------------------------------
// Document model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Data,
}

/// One table cell with its text already wrapped or clipped to `width`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub width: f32,
    pub lines: Vec<String>,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub kind: RowKind,
    pub height: f32,
    pub cells: Vec<Cell>,
}

/// Wrapped heading text shown above the table on the first page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub heading: Option<TextBlock>,
    /// Table rows top to bottom, including any header row.
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    /// Banner printed at the top of every page.
    pub title: String,
    pub settings: PageSettings,
    pub pages: Vec<Page>,
}

impl ReportDocument {
    pub fn data_rows(&self) -> impl Iterator<Item = &TableRow> + '_ {
        self.pages
            .iter()
            .flat_map(|p| p.rows.iter())
            .filter(|r| r.kind == RowKind::Data)
    }
}

// ---------------------------------------------------------------------------
// Layout cursor
// ---------------------------------------------------------------------------

/// Position of the next element, in millimetres from the page's top-left
/// corner.  Passed into every renderer call and returned advanced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub page: usize,
    pub x: f32,
    pub y: f32,
}

impl LayoutCursor {
    pub fn top_of(page: usize, settings: &PageSettings) -> Self {
        LayoutCursor {
            page,
            x: settings.margin_left,
            y: settings.margin_top,
        }
    }

    pub fn below(self, height: f32) -> Self {
        LayoutCursor {
            y: self.y + height,
            ..self
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer strategy
// ---------------------------------------------------------------------------

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Text,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Text => "txt",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Text => "text/plain",
        }
    }
}

/// Draws a laid-out document.  `render_header` opens the page the cursor
/// points at; every call returns the cursor moved below what it drew.
pub trait ReportRenderer {
    fn render_header(&mut self, settings: &PageSettings, cursor: LayoutCursor, title: &str)
        -> LayoutCursor;

    fn render_title(
        &mut self,
        settings: &PageSettings,
        cursor: LayoutCursor,
        heading: &TextBlock,
    ) -> LayoutCursor;

    fn render_row(&mut self, settings: &PageSettings, cursor: LayoutCursor, row: &TableRow)
        -> LayoutCursor;

    fn finish(self: Box<Self>, settings: &PageSettings) -> Result<Vec<u8>, PipelineError>;
}

pub fn renderer_for(format: ReportFormat, style: &ReportStyle) -> Box<dyn ReportRenderer> {
    match format {
        ReportFormat::Pdf => Box::new(pdf::PdfRenderer::new(style.clone())),
        ReportFormat::Text => Box::new(text::TextRenderer::default()),
    }
}

/// Walk the document page by page through `renderer`.
pub fn render_with(
    document: &ReportDocument,
    mut renderer: Box<dyn ReportRenderer>,
) -> Result<Vec<u8>, PipelineError> {
    let settings = &document.settings;
    for page in &document.pages {
        let mut cursor = LayoutCursor::top_of(page.number, settings);
        cursor = renderer.render_header(settings, cursor, &document.title);
        if let Some(heading) = &page.heading {
            cursor = renderer.render_title(settings, cursor, heading);
        }
        for row in &page.rows {
            cursor = renderer.render_row(settings, cursor, row);
        }
    }
    renderer.finish(settings)
}

pub fn render(
    document: &ReportDocument,
    format: ReportFormat,
    style: &ReportStyle,
) -> Result<Vec<u8>, PipelineError> {
    render_with(document, renderer_for(format, style))
}

/// Deterministic download name for the report of `source_name`.
pub fn report_file_name(source_name: &str, format: ReportFormat) -> String {
    format!(
        "College_Admission_Analysis_{source_name}.{}",
        format.extension()
    )
}
