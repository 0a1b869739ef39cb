//! Helvetica glyph widths for laying out text without a font file.
//!
//! Widths are in 1/1000 em for the printable ASCII range (32..=126); every
//! other character uses the width of a digit.

const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const MM_PER_POINT: f32 = 25.4 / 72.0;

/// A font face at a size, able to measure strings in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub bold: bool,
    pub size: f32,
}

impl Font {
    pub fn regular(size: f32) -> Self {
        Font { bold: false, size }
    }

    pub fn bold(size: f32) -> Self {
        Font { bold: true, size }
    }

    fn glyph_width(&self, c: char) -> u16 {
        let table = if self.bold { &HELVETICA_BOLD } else { &HELVETICA };
        let code = c as u32;
        if (32..=126).contains(&code) {
            table[(code - 32) as usize]
        } else {
            FALLBACK_WIDTH
        }
    }

    pub fn char_width(&self, c: char) -> f32 {
        self.glyph_width(c) as f32 / 1000.0 * self.size * MM_PER_POINT
    }

    pub fn text_width(&self, text: &str) -> f32 {
        text.chars().map(|c| self.char_width(c)).sum()
    }

    /// Height of one em in millimetres.
    pub fn size_mm(&self) -> f32 {
        self.size * MM_PER_POINT
    }

    /// Longest prefix of `text` that fits in `max_width`.
    pub fn clip(&self, text: &str, max_width: f32) -> String {
        let mut used = 0.0;
        text.chars()
            .take_while(|&c| {
                used += self.char_width(c);
                used <= max_width
            })
            .collect()
    }

    /// Greedy word wrap.  Words wider than `max_width` are split between
    /// characters; no text is ever dropped.  Always returns at least one line.
    pub fn wrap(&self, text: &str, max_width: f32) -> Vec<String> {
        let space = self.char_width(' ');
        let mut lines = Vec::new();
        let mut line = String::new();
        let mut line_width = 0.0;

        for word in text.split_whitespace() {
            let word_width = self.text_width(word);
            if !line.is_empty() && line_width + space + word_width <= max_width {
                line.push(' ');
                line.push_str(word);
                line_width += space + word_width;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0.0;
            }
            if word_width <= max_width {
                line.push_str(word);
                line_width = word_width;
                continue;
            }
            // split an overlong word; at least one char per line
            for c in word.chars() {
                let w = self.char_width(c);
                if !line.is_empty() && line_width + w > max_width {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0.0;
                }
                line.push(c);
                line_width += w;
            }
        }
        if !line.is_empty() || lines.is_empty() {
            lines.push(line);
        }
        lines
    }
}
