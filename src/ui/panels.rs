use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::config::CONFIG_FILE;
use crate::data::model::CellValue;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – analysis parameters
// ---------------------------------------------------------------------------

/// Render the left parameter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Parameters");
    ui.separator();

    if state.sources.is_empty() {
        ui.label("No files loaded.");
        return;
    }
    if state.columns.is_empty() {
        ui.label("The first file could not be read.");
        return;
    }

    // Clone what we need so we can mutate state inside the loops.
    let reservations = state.reservation_choices.clone();
    let categories = state.category_columns.clone();
    let columns = state.columns.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Your marks");
            ui.add(egui::DragValue::new(&mut state.inputs.marks).speed(1));
            ui.add_space(4.0);

            ui.strong("Reservation");
            let current = state.inputs.reservation.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("reservation")
                .selected_text(&current)
                .show_ui(ui, |ui: &mut Ui| {
                    for choice in &reservations {
                        let mut text = RichText::new(choice);
                        if let Some(cm) = &state.color_map {
                            text = text.color(cm.color_for(&CellValue::from(choice.as_str())));
                        }
                        ui.selectable_value(
                            &mut state.inputs.reservation,
                            Some(choice.clone()),
                            text,
                        );
                    }
                });
            ui.add_space(4.0);

            ui.strong("Category (marks column)");
            let current = state.inputs.marks_column.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("marks_column")
                .selected_text(&current)
                .show_ui(ui, |ui: &mut Ui| {
                    for category in &categories {
                        ui.selectable_value(
                            &mut state.inputs.marks_column,
                            Some(category.clone()),
                            category,
                        );
                    }
                });
            ui.add_space(4.0);

            ui.strong("Location");
            ui.add(
                egui::TextEdit::singleline(&mut state.inputs.location)
                    .hint_text("e.g. Pune (empty for all)"),
            );
            ui.separator();

            let heading = RichText::new(format!(
                "Display columns  ({}/{})",
                state.inputs.display_columns.len(),
                columns.len()
            ))
            .strong();
            egui::CollapsingHeader::new(heading)
                .id_salt("display_columns")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for col in &columns {
                        let mut checked = state.inputs.display_columns.contains(col);
                        if ui.checkbox(&mut checked, col).changed() {
                            state.toggle_display_column(col);
                        }
                    }
                });
            ui.separator();

            let ready = state.params().is_some();
            if ui
                .add_enabled(ready, egui::Button::new("Filter colleges"))
                .clicked()
            {
                state.run();
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(!state.sources.is_empty(), egui::Button::new("Export reports…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Save settings…").clicked() {
                save_settings_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if !state.sources.is_empty() {
            let names: Vec<&str> = state.sources.iter().map(|s| s.name.as_str()).collect();
            ui.label(format!("{} file(s): {}", names.len(), names.join(", ")));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            let text = RichText::new(msg);
            if msg.starts_with("Error") || msg.contains("failed") {
                ui.label(text.color(Color32::RED));
            } else {
                ui.label(text);
            }
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open cut-off files")
        .add_filter(
            "Supported files",
            &["xlsx", "xlsm", "xls", "xlsb", "ods", "csv", "json", "parquet", "pq"],
        )
        .add_filter("Excel", &["xlsx", "xlsm", "xls", "xlsb"])
        .add_filter("OpenDocument", &["ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_files();

    if let Some(paths) = files {
        log::info!("Opening {} file(s)", paths.len());
        state.open_paths(&paths);
    }
}

fn export_dialog(state: &mut AppState) {
    let dir = rfd::FileDialog::new()
        .set_title("Export reports to folder")
        .pick_folder();
    if let Some(dir) = dir {
        state.export_to(&dir);
    }
}

fn save_settings_dialog(state: &mut AppState) {
    let path = rfd::FileDialog::new()
        .set_title("Save settings")
        .set_file_name(CONFIG_FILE)
        .add_filter("JSON", &["json"])
        .save_file();
    if let Some(path) = path {
        state.save_config(&path);
    }
}

/// Ask where to save the report of outcome `index`.
pub fn save_report_dialog(state: &mut AppState, index: usize) {
    let Some(Ok(analysis)) = state.outcomes.get(index) else {
        return;
    };
    let report = &analysis.report;
    let extension = report
        .file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_string();
    let path = rfd::FileDialog::new()
        .set_title("Save report")
        .set_file_name(&report.file_name)
        .add_filter(report.mime, &[extension.as_str()])
        .save_file();
    if let Some(path) = path {
        state.save_report(index, &path);
    }
}
