use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use super::plot::marks_histogram;
use super::table::{Highlight, dataset_table};
use crate::color::{ColorMap, egui_rgb};
use crate::config::AppConfig;
use crate::pipeline::FileAnalysis;
use crate::state::{AppState, FileView};
use crate::ui::panels::save_report_dialog;

// ---------------------------------------------------------------------------
// Central panel – one section per analysed file
// ---------------------------------------------------------------------------

pub fn results_panel(ui: &mut Ui, state: &mut AppState) {
    if state.sources.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open cut-off files to begin  (File → Open…)");
        });
        return;
    }
    if state.outcomes.is_empty() {
        ui.label("Choose the parameters and press \"Filter colleges\".");
        return;
    }

    let mut save_request = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (index, outcome) in state.outcomes.iter().enumerate() {
                match outcome {
                    Ok(analysis) => {
                        let Some(view) = state.views.get_mut(index) else {
                            continue;
                        };
                        let colors = state.color_map.as_ref();
                        if file_section(ui, index, analysis, view, colors, &state.config) {
                            save_request = Some(index);
                        }
                    }
                    Err(e) => {
                        ui.label(RichText::new(e.to_string()).color(Color32::RED));
                    }
                }
                ui.separator();
            }
        });

    if let Some(index) = save_request {
        save_report_dialog(state, index);
    }
}

/// Returns true when the user asked to save this file's report.
fn file_section(
    ui: &mut Ui,
    index: usize,
    analysis: &FileAnalysis,
    view: &mut FileView,
    colors: Option<&ColorMap>,
    config: &AppConfig,
) -> bool {
    let highlight = || {
        colors.map(|colors| Highlight {
            column: &config.reservation_column,
            colors,
        })
    };
    let title = RichText::new(format!("Analysis for {}", analysis.file_name))
        .strong()
        .color(egui_rgb(config.report.style.banner_color));

    let mut save = false;
    egui::CollapsingHeader::new(title)
        .id_salt(("analysis", index))
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                ui.checkbox(&mut view.show_raw, "Show raw data");
                ui.checkbox(&mut view.show_reservation, "Show rows after reservation filter");
            });

            if view.show_raw {
                ui.strong(format!("Raw data ({} rows)", analysis.raw.len()));
                dataset_table(ui, ("raw", index), &analysis.raw, highlight());
            }
            if view.show_reservation {
                ui.strong(format!(
                    "After location and reservation filters ({} rows)",
                    analysis.by_reservation.len()
                ));
                dataset_table(ui, ("reservation", index), &analysis.by_reservation, highlight());
            }

            ui.strong(format!("Qualifying colleges ({})", analysis.filtered.len()));
            if analysis.filtered.is_empty() {
                ui.label("No colleges match these parameters.");
            } else {
                dataset_table(ui, ("filtered", index), &analysis.filtered, highlight());
            }

            ui.add_space(6.0);
            ui.strong(format!("Top {} colleges by cut-off", config.top_n));
            dataset_table(ui, ("top", index), &analysis.top, highlight());

            ui.add_space(6.0);
            ui.columns(2, |cols| {
                cols[0].strong("Summary of qualifying cut-offs");
                egui::Grid::new(("summary", index))
                    .striped(true)
                    .show(&mut cols[0], |ui: &mut Ui| {
                        for (label, value) in analysis.summary.rows() {
                            ui.label(label);
                            ui.label(value.map_or("NaN".to_string(), |v| format!("{v:.2}")));
                            ui.end_row();
                        }
                    });
                marks_histogram(&mut cols[1], ("marks", index), &analysis.marks);
            });

            ui.add_space(6.0);
            if ui.button(format!("Save report ({})…", analysis.report.file_name)).clicked() {
                save = true;
            }
        });
    save
}
