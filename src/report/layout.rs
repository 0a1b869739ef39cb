use super::metrics::Font;
use super::{Align, Cell, Page, ReportDocument, RowKind, TableRow, TextBlock};
use crate::config::{PageSettings, ReportSettings};
use crate::data::model::Dataset;

/// Width used when a layout has fewer widths than the dataset has columns.
const FALLBACK_WIDTH: f32 = 15.0;

// ---------------------------------------------------------------------------
// Table layout: fixed widths chosen by the caller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    /// Width in millimetres of each data column, in column order.
    pub widths: Vec<f32>,
    /// The only column allowed to wrap onto several lines.
    pub wrap_column: Option<usize>,
    pub annotation_label: String,
    pub annotation_width: f32,
    pub repeat_header: bool,
}

impl TableLayout {
    /// Widths looked up by column name, falling back to the default width.
    /// `wrap_name` is usually the college-name column.
    pub fn from_settings(columns: &[String], settings: &ReportSettings, wrap_name: &str) -> Self {
        TableLayout {
            widths: columns
                .iter()
                .map(|c| {
                    settings
                        .column_widths
                        .get(c)
                        .copied()
                        .unwrap_or(settings.default_column_width)
                })
                .collect(),
            wrap_column: columns.iter().position(|c| c == wrap_name),
            annotation_label: settings.annotation_label.clone(),
            annotation_width: settings.annotation_width,
            repeat_header: settings.repeat_header,
        }
    }

    fn width(&self, column: usize) -> f32 {
        self.widths.get(column).copied().unwrap_or(FALLBACK_WIDTH)
    }
}

// ---------------------------------------------------------------------------
// Row construction
// ---------------------------------------------------------------------------

fn inner_width(width: f32, settings: &PageSettings) -> f32 {
    (width - 2.0 * settings.cell_padding).max(0.0)
}

fn single_line(font: &Font, text: &str, width: f32, settings: &PageSettings) -> Cell {
    Cell {
        width,
        lines: vec![font.clip(text, inner_width(width, settings))],
        align: Align::Center,
    }
}

/// Header cells wrap instead of clipping, so a label is never cut short.
fn header_row(columns: &[String], layout: &TableLayout, settings: &PageSettings) -> TableRow {
    let font = Font::bold(settings.table_font_size);
    let labels = columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), layout.width(i)))
        .chain([(layout.annotation_label.as_str(), layout.annotation_width)]);
    let cells: Vec<Cell> = labels
        .map(|(label, width)| Cell {
            width,
            lines: font.wrap(label, inner_width(width, settings)),
            align: Align::Center,
        })
        .collect();
    TableRow {
        kind: RowKind::Header,
        height: line_count(&cells) as f32 * settings.line_height,
        cells,
    }
}

fn data_row(
    values: &[crate::data::model::CellValue],
    layout: &TableLayout,
    settings: &PageSettings,
) -> TableRow {
    let font = Font::regular(settings.table_font_size);
    let mut cells: Vec<Cell> = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let width = layout.width(i);
            let text = value.to_string();
            if layout.wrap_column == Some(i) {
                Cell {
                    width,
                    lines: font.wrap(&text, inner_width(width, settings)),
                    align: Align::Left,
                }
            } else {
                single_line(&font, &text, width, settings)
            }
        })
        .collect();
    cells.push(Cell {
        width: layout.annotation_width,
        lines: vec![String::new()],
        align: Align::Center,
    });
    TableRow {
        kind: RowKind::Data,
        height: line_count(&cells) as f32 * settings.line_height,
        cells,
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

fn line_count(cells: &[Cell]) -> usize {
    cells.iter().map(|c| c.lines.len()).max().unwrap_or(1)
}

/// Cut `row` after its first `lines` lines.  Cells with nothing left
/// continue as blank cells.
fn split_row(row: TableRow, lines: usize, line_height: f32) -> (TableRow, TableRow) {
    let mut rest_cells = Vec::with_capacity(row.cells.len());
    let mut head_cells = Vec::with_capacity(row.cells.len());
    for mut cell in row.cells {
        let tail = if cell.lines.len() > lines {
            cell.lines.split_off(lines)
        } else {
            vec![String::new()]
        };
        rest_cells.push(Cell {
            width: cell.width,
            lines: tail,
            align: cell.align,
        });
        head_cells.push(cell);
    }
    let head = TableRow {
        kind: row.kind,
        height: line_count(&head_cells) as f32 * line_height,
        cells: head_cells,
    };
    let rest = TableRow {
        kind: row.kind,
        height: line_count(&rest_cells) as f32 * line_height,
        cells: rest_cells,
    };
    (head, rest)
}

/// Lay out `dataset` as a paginated table.  Rows keep their input order; a
/// row moves to a new page when it would cross the bottom margin, unless it
/// is the first row on its page, in which case it is split by lines.
pub fn build_document(
    dataset: &Dataset,
    title: &str,
    heading: Option<&str>,
    layout: &TableLayout,
    settings: &PageSettings,
) -> ReportDocument {
    let header = header_row(dataset.columns(), layout, settings);
    let heading = heading.map(|text| {
        let font = Font::bold(settings.heading_font_size);
        let lines = font.wrap(text, settings.content_width());
        let height = lines.len() as f32 * settings.heading_line_height + settings.heading_gap;
        TextBlock { lines, height }
    });

    let mut y = settings.margin_top
        + settings.banner_height
        + heading.as_ref().map_or(0.0, |h| h.height)
        + header.height;
    let mut page = Page {
        number: 0,
        heading,
        rows: vec![header.clone()],
    };
    let mut pages = Vec::new();
    let mut page_has_data = false;

    for values in dataset.rows() {
        let mut row = data_row(values, layout, settings);
        loop {
            if page_has_data && y + row.height > settings.content_bottom() {
                let number = page.number + 1;
                pages.push(std::mem::replace(
                    &mut page,
                    Page {
                        number,
                        heading: None,
                        rows: Vec::new(),
                    },
                ));
                y = settings.margin_top + settings.banner_height;
                if layout.repeat_header {
                    page.rows.push(header.clone());
                    y += header.height;
                }
                page_has_data = false;
            }

            // A row taller than the room left on an otherwise empty page is
            // split by lines and continues on the next page.
            let room = settings.content_bottom() - y;
            let fit = ((room / settings.line_height).floor() as usize).max(1);
            if row.height <= room || fit >= line_count(&row.cells) {
                y += row.height;
                page.rows.push(row);
                page_has_data = true;
                break;
            }
            let (head, rest) = split_row(row, fit, settings.line_height);
            y += head.height;
            page.rows.push(head);
            page_has_data = true;
            row = rest;
        }
    }
    pages.push(page);

    let document = ReportDocument {
        title: title.to_string(),
        settings: settings.clone(),
        pages,
    };
    log::debug!(
        "laid out {} rows on {} page(s) for '{title}'",
        document.data_rows().count(),
        document.pages.len()
    );
    document
}
