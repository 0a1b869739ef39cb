use super::{Align, LayoutCursor, ReportRenderer, RowKind, TableRow, TextBlock};
use crate::config::PageSettings;
use crate::error::PipelineError;

/// Character columns per millimetre of layout width.
const CHARS_PER_MM: f32 = 1.0;
const MIN_CELL_CHARS: usize = 3;
const PAGE_BREAK: char = '\u{c}';

// ---------------------------------------------------------------------------
// Plain-text renderer: boxed ASCII table, form feed between pages
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct TextRenderer {
    out: String,
    page: Option<usize>,
    /// Border of the last row drawn on the current page.
    last_border: Option<String>,
}

fn cell_chars(width: f32) -> usize {
    ((width * CHARS_PER_MM).floor() as usize).max(MIN_CELL_CHARS)
}

/// Split a line into chunks of at most `width` characters, so text wider
/// than its column wraps instead of being cut.
fn chunks(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

fn border(row: &TableRow) -> String {
    let mut s = String::from("+");
    for cell in &row.cells {
        s.push_str(&"-".repeat(cell_chars(cell.width) + 2));
        s.push('+');
    }
    s
}

impl TextRenderer {
    fn close_table(&mut self) {
        if let Some(b) = self.last_border.take() {
            self.out.push_str(&b);
            self.out.push('\n');
        }
    }
}

impl ReportRenderer for TextRenderer {
    fn render_header(
        &mut self,
        settings: &PageSettings,
        cursor: LayoutCursor,
        title: &str,
    ) -> LayoutCursor {
        if self.page.is_some() {
            self.close_table();
            self.out.push(PAGE_BREAK);
        }
        self.page = Some(cursor.page);
        let width = cell_chars(settings.content_width());
        self.out.push_str(&format!("{title:^width$}\n\n"));
        cursor.below(settings.banner_height)
    }

    fn render_title(
        &mut self,
        _settings: &PageSettings,
        cursor: LayoutCursor,
        heading: &TextBlock,
    ) -> LayoutCursor {
        for line in &heading.lines {
            self.out.push_str(line);
            self.out.push('\n');
        }
        self.out.push('\n');
        cursor.below(heading.height)
    }

    fn render_row(
        &mut self,
        _settings: &PageSettings,
        cursor: LayoutCursor,
        row: &TableRow,
    ) -> LayoutCursor {
        let line = border(row);
        if self.last_border.is_none() || row.kind == RowKind::Header {
            self.out.push_str(&line);
            self.out.push('\n');
        }

        // Wrapped cells and header labels keep every character; single-line
        // data cells stay on one line.
        let columns: Vec<(usize, Align, Vec<String>)> = row
            .cells
            .iter()
            .map(|cell| {
                let width = cell_chars(cell.width);
                let lines = if cell.align == Align::Left || row.kind == RowKind::Header {
                    cell.lines.iter().flat_map(|l| chunks(l, width)).collect()
                } else {
                    cell.lines.iter().map(|l| l.chars().take(width).collect()).collect()
                };
                (width, cell.align, lines)
            })
            .collect();
        let height = columns.iter().map(|(_, _, l)| l.len()).max().unwrap_or(1);

        for i in 0..height {
            self.out.push('|');
            for (width, align, lines) in &columns {
                let text = lines.get(i).map(String::as_str).unwrap_or("");
                let padded = match align {
                    Align::Left => format!(" {text:<width$} "),
                    Align::Center => format!(" {text:^width$} "),
                };
                self.out.push_str(&padded);
                self.out.push('|');
            }
            self.out.push('\n');
        }

        if row.kind == RowKind::Header {
            self.out.push_str(&line);
            self.out.push('\n');
        }
        self.last_border = Some(line);
        cursor.below(row.height)
    }

    fn finish(mut self: Box<Self>, _settings: &PageSettings) -> Result<Vec<u8>, PipelineError> {
        self.close_table();
        Ok(self.out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportSettings;
    use crate::data::model::Dataset;
    use crate::report::{Cell, ReportFormat, TableLayout, build_document, render};

    fn rendered(ds: &Dataset) -> String {
        let settings = ReportSettings::default();
        let layout = TableLayout::from_settings(ds.columns(), &settings, "CollegeName");
        let doc = build_document(
            ds,
            "Report - a.csv",
            Some("Prediction"),
            &layout,
            &settings.page,
        );
        let bytes = render(&doc, ReportFormat::Text, &settings.style).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn table_has_header_rows_and_annotation_column() {
        let ds = Dataset::from_text(&["ST", "CollegeName"], &[&["45", "Alpha Tech"]]);
        let out = rendered(&ds);
        assert!(out.contains("Report - a.csv"));
        assert!(out.contains("Prediction"));
        let rows: Vec<&str> = out.lines().filter(|l| l.starts_with('|')).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("Preference"));
        assert!(rows[1].contains("Alpha Tech"));
        // ST | CollegeName | Preference
        assert_eq!(rows[1].matches('|').count(), 4);
        assert!(out.trim_end().ends_with('+'));
    }

    #[test]
    fn pages_are_separated_by_form_feeds() {
        let rows: Vec<Vec<String>> = (0..80).map(|i| vec![i.to_string(), "X".into()]).collect();
        let refs: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let slices: Vec<&[&str]> = refs.iter().map(|r| r.as_slice()).collect();
        let ds = Dataset::from_text(&["ST", "CollegeName"], &slices);
        let out = rendered(&ds);
        let pages = out.split(PAGE_BREAK).count();
        assert!(pages > 1);
        assert!(out.split(PAGE_BREAK).all(|p| p.contains("Preference")));
    }

    #[test]
    fn long_lines_wrap_inside_their_column() {
        assert_eq!(chunks("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(chunks("", 3), vec![String::new()]);
    }

    #[test]
    fn single_line_cells_never_spill_onto_extra_lines() {
        let row = TableRow {
            kind: RowKind::Data,
            height: 6.0,
            cells: vec![
                Cell {
                    width: 5.0,
                    lines: vec!["6101245101".into()],
                    align: Align::Center,
                },
                Cell {
                    width: 5.0,
                    lines: vec!["Alpha Tech".into()],
                    align: Align::Left,
                },
            ],
        };
        let settings = PageSettings::default();
        let mut renderer = TextRenderer::default();
        renderer.render_row(&settings, LayoutCursor::top_of(0, &settings), &row);

        let lines: Vec<&str> = renderer.out.lines().filter(|l| l.starts_with('|')).collect();
        assert_eq!(lines, ["| 61012 | Alpha |", "|       |  Tech |"]);
    }
}
