use std::hash::Hash;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Plot};

// ---------------------------------------------------------------------------
// Marks distribution (per file)
// ---------------------------------------------------------------------------

/// Maximum number of bars in the distribution chart.
const MAX_BINS: usize = 10;

/// One histogram bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub center: f64,
    pub width: f64,
    pub count: usize,
}

/// Equal-width bins over `[min, max]`.  All-equal values collapse into a
/// single unit-wide bin.
pub fn histogram(values: &[f64], max_bins: usize) -> Vec<Bin> {
    if values.is_empty() || max_bins == 0 {
        return Vec::new();
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range.abs() < f64::EPSILON {
        return vec![Bin {
            center: min,
            width: 1.0,
            count: values.len(),
        }];
    }

    let bins = max_bins.min(values.len());
    let width = range / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let i = (((v - min) / width) as usize).min(bins - 1);
        counts[i] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            center: min + width * (i as f64 + 0.5),
            width,
            count,
        })
        .collect()
}

/// Render the distribution of qualifying cut-off marks.
pub fn marks_histogram(ui: &mut Ui, id_salt: impl Hash, marks: &[f64]) {
    let bins = histogram(marks, MAX_BINS);
    if bins.is_empty() {
        ui.label("No marks to plot.");
        return;
    }

    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| Bar::new(b.center, b.count as f64).width(b.width * 0.9))
        .collect();
    let chart = BarChart::new(bars)
        .name("Qualifying cut-offs")
        .color(Color32::LIGHT_BLUE);

    Plot::new(id_salt)
        .height(180.0)
        .legend(egui_plot::Legend::default())
        .x_axis_label("Cut-off marks")
        .y_axis_label("Colleges")
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(chart);
        });
}
