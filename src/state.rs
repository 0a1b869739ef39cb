use std::path::{Path, PathBuf};

use crate::color::ColorMap;
use crate::config::AppConfig;
use crate::data::filter::FilterParams;
use crate::data::model::CellValue;
use crate::pipeline::{
    FileOutcome, Source, analyze_batch, category_columns, default_display_columns,
    reservation_choices,
};
use crate::report::sink::{DirectorySink, write_atomic};

// ---------------------------------------------------------------------------
// Parameter inputs
// ---------------------------------------------------------------------------

/// What the user has picked in the parameter panel.  Choices are offered
/// from the first loaded file and applied to every file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamInputs {
    /// Whole-number marks threshold.
    pub marks: u32,
    pub reservation: Option<String>,
    pub marks_column: Option<String>,
    pub location: String,
    /// In the order the user ticked them.
    pub display_columns: Vec<String>,
}

/// Per-file toggles of the results view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileView {
    pub show_raw: bool,
    pub show_reservation: bool,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    pub config: AppConfig,

    /// Opened files in the order they were picked.
    pub sources: Vec<Source>,

    /// Choices derived from the first file.
    pub columns: Vec<String>,
    pub reservation_choices: Vec<String>,
    pub category_columns: Vec<String>,

    pub inputs: ParamInputs,

    /// One outcome per source from the last run.
    pub outcomes: Vec<FileOutcome>,
    pub views: Vec<FileView>,

    /// Colours for reservation values in result tables.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        AppState {
            config,
            ..Default::default()
        }
    }

    /// Read `paths` and replace the current sources.  Files that cannot be
    /// read are skipped and reported in the status line.
    pub fn open_paths(&mut self, paths: &[PathBuf]) {
        let mut sources = Vec::with_capacity(paths.len());
        let mut failed = Vec::new();
        for path in paths {
            match Source::from_path(path) {
                Ok(source) => sources.push(source),
                Err(e) => {
                    log::error!("Failed to open {}: {e}", path.display());
                    failed.push(e.to_string());
                }
            }
        }
        self.set_sources(sources);
        if !failed.is_empty() {
            self.status_message = Some(format!("Error: {}", failed.join("; ")));
        }
    }

    /// Replace the sources and derive the parameter choices from the
    /// first one.
    pub fn set_sources(&mut self, sources: Vec<Source>) {
        self.sources = sources;
        self.outcomes.clear();
        self.views.clear();
        self.status_message = None;
        self.columns.clear();
        self.reservation_choices.clear();
        self.category_columns.clear();
        self.color_map = None;
        self.inputs = ParamInputs::default();

        let Some(first) = self.sources.first() else {
            return;
        };
        let dataset = match first.load() {
            Ok(ds) => ds,
            Err(e) => {
                log::error!("Failed to load {}: {e}", first.name);
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
        };
        log::info!(
            "Loaded {} with {} rows and columns {:?}",
            first.name,
            dataset.len(),
            dataset.columns()
        );

        self.reservation_choices = reservation_choices(&dataset, &self.config.reservation_column);
        self.category_columns = category_columns(&dataset, &self.config.excluded_columns);
        self.columns = dataset.columns().to_vec();
        self.inputs.display_columns = default_display_columns(&dataset, &self.config);
        self.inputs.reservation = self.reservation_choices.first().cloned();
        self.inputs.marks_column = self.category_columns.first().cloned();

        let values: Vec<CellValue> = self
            .reservation_choices
            .iter()
            .map(|v| CellValue::from(v.as_str()))
            .collect();
        self.color_map = Some(ColorMap::new(&values));
    }

    /// Tick or untick a display column, keeping the toggle order.
    pub fn toggle_display_column(&mut self, column: &str) {
        let shown = &mut self.inputs.display_columns;
        match shown.iter().position(|c| c == column) {
            Some(i) => {
                shown.remove(i);
            }
            None => shown.push(column.to_string()),
        }
    }

    /// Parameters for a run, or `None` while a required choice is open.
    pub fn params(&self) -> Option<FilterParams> {
        Some(FilterParams {
            location: self.inputs.location.trim().to_string(),
            reservation: self.inputs.reservation.clone()?,
            marks_column: self.inputs.marks_column.clone()?,
            marks_threshold: f64::from(self.inputs.marks),
            display_columns: self.inputs.display_columns.clone(),
        })
    }

    /// Analyse every source with the current parameters.
    pub fn run(&mut self) {
        let Some(params) = self.params() else {
            self.status_message = Some("Pick a reservation and a category first".into());
            return;
        };
        self.outcomes = analyze_batch(&self.sources, &params, &self.config, None);
        self.views = vec![FileView::default(); self.outcomes.len()];
        self.status_message = self.failure_summary();
    }

    /// Analyse every source again and write each report into `dir`.
    pub fn export_to(&mut self, dir: &Path) {
        let Some(params) = self.params() else {
            self.status_message = Some("Pick a reservation and a category first".into());
            return;
        };
        let mut sink = DirectorySink::new(dir);
        self.outcomes = analyze_batch(&self.sources, &params, &self.config, Some(&mut sink));
        self.views = vec![FileView::default(); self.outcomes.len()];
        self.status_message = self.failure_summary().or_else(|| {
            Some(format!(
                "Wrote {} report(s) to {}",
                self.outcomes.len(),
                dir.display()
            ))
        });
    }

    /// Save the report of one successful outcome to `path`.
    pub fn save_report(&mut self, index: usize, path: &Path) {
        let Some(Ok(analysis)) = self.outcomes.get(index) else {
            return;
        };
        match write_atomic(path, &analysis.report.bytes) {
            Ok(()) => {
                log::info!("Saved report {}", path.display());
                self.status_message = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to save {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    pub fn save_config(&mut self, path: &Path) {
        self.status_message = Some(match self.config.save_to_file(path) {
            Ok(()) => format!("Saved settings to {}", path.display()),
            Err(e) => {
                log::error!("Failed to save settings: {e:#}");
                format!("Error: {e:#}")
            }
        });
    }

    fn failure_summary(&self) -> Option<String> {
        let failed = self.outcomes.iter().filter(|o| o.is_err()).count();
        (failed > 0).then(|| format!("{failed} of {} file(s) failed", self.outcomes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, csv: &str) -> Source {
        Source {
            name: name.to_string(),
            bytes: csv.as_bytes().to_vec(),
        }
    }

    const CUTOFFS: &str = "\
ChoiceCodeDisplay,CollegeName,Reservation Details,ST,General
1,Alpha Pune,SC,40,70
2,Beta Mumbai,OPEN,60,80
3,Gamma Pune,SC,55,90
";

    #[test]
    fn first_file_seeds_the_choices() {
        let mut state = AppState::default();
        state.set_sources(vec![source("a.csv", CUTOFFS)]);

        assert_eq!(state.reservation_choices, ["SC", "OPEN"]);
        assert_eq!(state.category_columns, ["ST", "General"]);
        assert_eq!(state.inputs.reservation.as_deref(), Some("SC"));
        assert_eq!(state.inputs.marks_column.as_deref(), Some("ST"));
        assert_eq!(
            state.inputs.display_columns,
            ["ChoiceCodeDisplay", "ST", "General", "CollegeName"]
        );
        assert!(state.color_map.is_some());
    }

    #[test]
    fn display_columns_follow_toggle_order() {
        let mut state = AppState::default();
        state.inputs.display_columns = vec!["ST".into()];
        state.toggle_display_column("CollegeName");
        state.toggle_display_column("ST");
        state.toggle_display_column("ST");
        assert_eq!(state.inputs.display_columns, ["CollegeName", "ST"]);
    }

    #[test]
    fn run_keeps_one_outcome_per_file() {
        let mut state = AppState::default();
        state.set_sources(vec![
            source("a.csv", CUTOFFS),
            source("b.csv", "CollegeName,Reservation Details\nX,SC\n"),
        ]);
        state.inputs.marks = 50;
        state.run();

        assert_eq!(state.outcomes.len(), 2);
        assert_eq!(state.views.len(), 2);
        let first = state.outcomes[0].as_ref().unwrap();
        assert_eq!(first.filtered.len(), 1);
        assert!(state.outcomes[1].is_err());
        assert_eq!(state.status_message.as_deref(), Some("1 of 2 file(s) failed"));
    }

    #[test]
    fn run_without_choices_is_refused() {
        let mut state = AppState::default();
        state.run();
        assert!(state.outcomes.is_empty());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn export_writes_every_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::default();
        state.set_sources(vec![source("a.csv", CUTOFFS)]);
        state.inputs.marks = 60;
        state.export_to(dir.path());

        let written = dir.path().join("College_Admission_Analysis_a.csv.pdf");
        assert!(written.exists());
        assert!(state.status_message.unwrap().starts_with("Wrote 1 report(s)"));
    }
}
