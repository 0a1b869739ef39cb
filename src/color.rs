use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

/// Configured `[r, g, b]` as PDF colour components in `0.0..=1.0`.
pub fn pdf_rgb(color: [u8; 3]) -> [f32; 3] {
    let rgb: Srgb<f32> = Srgb::new(color[0], color[1], color[2]).into_format();
    [rgb.red, rgb.green, rgb.blue]
}

/// Configured `[r, g, b]` for egui widgets.
pub fn egui_rgb(color: [u8; 3]) -> Color32 {
    Color32::from_rgb(color[0], color[1], color[2])
}

// ---------------------------------------------------------------------------
// Color mapping: reservation category → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a categorical column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<CellValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the column's distinct values.
    pub fn new(values: &[CellValue]) -> Self {
        let palette = generate_palette(values.len());
        let mapping: BTreeMap<CellValue, Color32> = values
            .iter()
            .zip(palette)
            .map(|(v, c): (&CellValue, Color32)| (v.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &CellValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let colours = generate_palette(4);
        assert_eq!(colours.len(), 4);
        for (i, a) in colours.iter().enumerate() {
            assert!(colours[i + 1..].iter().all(|b| b != a));
        }
    }

    #[test]
    fn pdf_components_are_normalised() {
        assert_eq!(pdf_rgb([255, 0, 0]), [1.0, 0.0, 0.0]);
        let [r, g, b] = pdf_rgb([200, 220, 255]);
        assert!((r - 200.0 / 255.0).abs() < 1e-6);
        assert!((g - 220.0 / 255.0).abs() < 1e-6);
        assert_eq!(b, 1.0);
    }

    #[test]
    fn unknown_values_get_the_default_colour() {
        let map = ColorMap::new(&["OPEN".into(), "SC".into()]);
        assert_ne!(map.color_for(&"OPEN".into()), map.color_for(&"SC".into()));
        assert_eq!(map.color_for(&"ST".into()), Color32::GRAY);
    }
}
