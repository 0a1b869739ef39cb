use std::hash::Hash;

use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::ColorMap;
use crate::data::model::Dataset;

/// Column whose cells are tinted by a colour map.
pub struct Highlight<'a> {
    pub column: &'a str,
    pub colors: &'a ColorMap,
}

/// Scrollable, striped table of every column of `dataset`.
pub fn dataset_table(
    ui: &mut Ui,
    id_salt: impl Hash,
    dataset: &Dataset,
    highlight: Option<Highlight<'_>>,
) {
    if dataset.columns().is_empty() {
        ui.label("No columns selected.");
        return;
    }
    let tinted = highlight.as_ref().and_then(|h| {
        dataset
            .column_index(h.column)
            .map(|idx| (idx, h.colors))
    });

    ui.push_id(id_salt, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(true)
            .max_scroll_height(260.0)
            .columns(Column::auto().at_least(48.0).clip(true), dataset.columns().len())
            .header(20.0, |mut header| {
                for name in dataset.columns() {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, dataset.len(), |mut row| {
                    let cells = &dataset.rows()[row.index()];
                    for (i, value) in cells.iter().enumerate() {
                        row.col(|ui: &mut Ui| {
                            let mut text = RichText::new(value.to_string());
                            if let Some((idx, colors)) = tinted {
                                if idx == i {
                                    text = text.color(colors.color_for(value));
                                }
                            }
                            ui.label(text);
                        });
                    }
                });
            });
    });
}
