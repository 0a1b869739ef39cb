use std::path::Path;

use crate::config::AppConfig;
use crate::data::filter::{FilterColumns, FilterParams};
use crate::data::loader;
use crate::data::model::{CellValue, Dataset};
use crate::data::summary::{SummaryStats, sort_descending, summarize, top_n};
use crate::error::{FileError, LoadError, PipelineError, Stage};
use crate::report::sink::ReportSink;
use crate::report::{self, TableLayout, build_document, report_file_name};

// ---------------------------------------------------------------------------
// Inputs and outputs of one file's run
// ---------------------------------------------------------------------------

/// An opened input file, kept as bytes so it can be re-run with new
/// parameters.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Source {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Source { name, bytes })
    }

    pub fn load(&self) -> Result<Dataset, LoadError> {
        loader::load_bytes(&self.name, self.bytes.clone())
    }
}

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub file_name: String,
    pub raw: Dataset,
    /// Rows left after the location and reservation stages.
    pub by_reservation: Dataset,
    /// Qualifying rows, projected onto the display columns.
    pub filtered: Dataset,
    /// Coerced marks of the qualifying rows, in row order.
    pub marks: Vec<f64>,
    pub top: Dataset,
    pub summary: SummaryStats,
    pub report: RenderedReport,
}

pub type FileOutcome = Result<FileAnalysis, FileError>;

// ---------------------------------------------------------------------------
// Parameter choices offered by the first file
// ---------------------------------------------------------------------------

/// Distinct reservation values of `dataset`, in first-seen order.
pub fn reservation_choices(dataset: &Dataset, column: &str) -> Vec<String> {
    dataset
        .column_index(column)
        .map(|idx| {
            dataset
                .distinct_values(idx)
                .iter()
                .map(CellValue::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Columns that can hold cut-off marks: everything but the identifiers.
pub fn category_columns(dataset: &Dataset, excluded: &[String]) -> Vec<String> {
    dataset
        .columns()
        .iter()
        .filter(|c| !excluded.contains(c))
        .cloned()
        .collect()
}

/// Configured default display columns that exist in `dataset`.
pub fn default_display_columns(dataset: &Dataset, config: &AppConfig) -> Vec<String> {
    config
        .default_display_columns
        .iter()
        .filter(|c| dataset.has_column(c))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Per-file pipeline
// ---------------------------------------------------------------------------

/// Every column the parameters refer to must exist in this file.
fn validate(
    dataset: &Dataset,
    params: &FilterParams,
    config: &AppConfig,
) -> Result<(), PipelineError> {
    let mut required = vec![config.reservation_column.as_str(), params.marks_column.as_str()];
    if !params.location.is_empty() {
        required.push(&config.name_column);
    }
    required.extend(params.display_columns.iter().map(String::as_str));
    match required.into_iter().find(|c| !dataset.has_column(c)) {
        Some(missing) => Err(PipelineError::missing_column(missing, Stage::Validate)),
        None => Ok(()),
    }
}

fn project(dataset: &Dataset, columns: &[String], stage: Stage) -> Result<Dataset, PipelineError> {
    dataset
        .select(columns)
        .map_err(|missing| PipelineError::missing_column(&missing, stage))
}

fn report_heading(params: &FilterParams) -> String {
    let location = if params.location.is_empty() {
        "All Locations"
    } else {
        params.location.as_str()
    };
    format!(
        "Prediction Based on Marks: '{}', Sorted by Category Type (marks): '{}' based on Location provided '{}'",
        params.marks_threshold, params.marks_column, location
    )
}

/// Run the filters, ranking, summary and report for one loaded file.
pub fn analyze_dataset(
    file_name: &str,
    raw: Dataset,
    params: &FilterParams,
    config: &AppConfig,
) -> FileOutcome {
    let fail = |stage: Stage| move |e: PipelineError| FileError::new(file_name, stage, e);

    validate(&raw, params, config).map_err(fail(Stage::Validate))?;

    let columns = FilterColumns {
        name: &config.name_column,
        reservation: &config.reservation_column,
    };
    let stages = params.apply(&raw, columns).map_err(|e| {
        let stage = match &e {
            PipelineError::MissingColumn { stage, .. } => *stage,
            _ => Stage::Marks,
        };
        FileError::new(file_name, stage, e)
    })?;
    if stages.by_reservation.is_empty() && !stages.by_location.is_empty() {
        log::warn!(
            "{file_name}: no rows match reservation '{}' after the location filter",
            params.reservation
        );
    }

    let marks_idx = stages
        .filtered
        .column_index(&params.marks_column)
        .ok_or_else(|| {
            fail(Stage::Marks)(PipelineError::missing_column(
                &params.marks_column,
                Stage::Marks,
            ))
        })?;
    let marks: Vec<f64> = stages
        .filtered
        .column_values(marks_idx)
        .filter_map(CellValue::numeric)
        .collect();

    let top = top_n(&stages.filtered, &params.marks_column, config.top_n)
        .and_then(|t| project(&t, &params.display_columns, Stage::Rank))
        .map_err(fail(Stage::Rank))?;
    let summary = summarize(&stages.filtered, &params.marks_column).map_err(fail(Stage::Summary))?;

    let report = render_report(file_name, &stages.filtered, params, config)
        .map_err(fail(Stage::Render))?;

    let filtered = project(&stages.filtered, &params.display_columns, Stage::Validate)
        .map_err(fail(Stage::Validate))?;

    log::info!(
        "{file_name}: {} of {} rows qualify (marks <= {} in '{}')",
        filtered.len(),
        raw.len(),
        params.marks_threshold,
        params.marks_column
    );

    Ok(FileAnalysis {
        file_name: file_name.to_string(),
        by_reservation: stages.by_reservation,
        filtered,
        marks,
        top,
        summary,
        report,
        raw,
    })
}

/// Sort the qualifying rows by the marks column (largest first), keep the
/// display columns, lay them out and encode them in the configured format.
fn render_report(
    file_name: &str,
    filtered: &Dataset,
    params: &FilterParams,
    config: &AppConfig,
) -> Result<RenderedReport, PipelineError> {
    let settings = &config.report;
    let sorted = sort_descending(filtered, &params.marks_column)?;
    let shown = project(&sorted, &params.display_columns, Stage::Render)?;
    let layout = TableLayout::from_settings(shown.columns(), settings, &config.name_column);
    let title = format!("College Admission Analysis - {file_name}");
    let heading = report_heading(params);
    let document = build_document(&shown, &title, Some(&heading), &layout, &settings.page);
    let bytes = report::render(&document, settings.format, &settings.style)?;
    Ok(RenderedReport {
        file_name: report_file_name(file_name, settings.format),
        mime: settings.format.mime(),
        bytes,
    })
}

/// Load one source and analyse it; every failure carries the file name.
pub fn analyze(source: &Source, params: &FilterParams, config: &AppConfig) -> FileOutcome {
    let raw = source
        .load()
        .map_err(|e| FileError::new(&source.name, Stage::Load, e))?;
    log::info!(
        "Loaded {} with {} rows and columns {:?}",
        source.name,
        raw.len(),
        raw.columns()
    );
    analyze_dataset(&source.name, raw, params, config)
}

/// Analyse every source in order with the same parameters.  A failing file
/// is reported in its slot and does not stop the others.  When a sink is
/// given, each successful report is handed to it.
pub fn analyze_batch(
    sources: &[Source],
    params: &FilterParams,
    config: &AppConfig,
    mut sink: Option<&mut dyn ReportSink>,
) -> Vec<FileOutcome> {
    sources
        .iter()
        .map(|source| -> FileOutcome {
            let analysis = analyze(source, params, config)?;
            if let Some(sink) = sink.as_deref_mut() {
                sink.accept(&analysis.report.file_name, &analysis.report.bytes)
                    .map_err(|e| FileError::new(&source.name, Stage::Write, e))?;
            }
            Ok(analysis)
        })
        .inspect(|outcome| {
            if let Err(e) = outcome {
                log::warn!("{e}");
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileErrorKind;

    #[derive(Default)]
    struct MemorySink {
        reports: Vec<(String, Vec<u8>)>,
    }

    impl ReportSink for MemorySink {
        fn accept(&mut self, name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
            self.reports.push((name.to_string(), bytes.to_vec()));
            Ok(())
        }
    }

    const CSV: &str = "ChoiceCodeDisplay,CollegeName,Reservation Details,ST\n\
                       101,Alpha College,OPEN,55\n\
                       102,Beta Institute,SC,70\n\
                       103,Alpha Tech,OPEN,45\n";

    fn params() -> FilterParams {
        FilterParams {
            location: "Alpha".into(),
            reservation: "OPEN".into(),
            marks_column: "ST".into(),
            marks_threshold: 50.0,
            display_columns: vec![
                "ChoiceCodeDisplay".into(),
                "CollegeName".into(),
                "Reservation Details".into(),
                "ST".into(),
            ],
        }
    }

    fn source(name: &str, body: &str) -> Source {
        Source {
            name: name.into(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn end_to_end_scenario_keeps_only_alpha_tech() {
        let analysis =
            analyze(&source("cutoffs.csv", CSV), &params(), &AppConfig::default()).unwrap();
        assert_eq!(analysis.raw.len(), 3);
        assert_eq!(analysis.by_reservation.len(), 2);
        assert_eq!(analysis.filtered.len(), 1);
        let row: Vec<String> = analysis.filtered.rows()[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(row, ["103", "Alpha Tech", "OPEN", "45"]);
        assert_eq!(analysis.marks, vec![45.0]);
        assert_eq!(analysis.top.len(), 1);
        assert_eq!(analysis.summary.count, 1);
        assert_eq!(analysis.report.file_name, "College_Admission_Analysis_cutoffs.csv.pdf");
        assert_eq!(analysis.report.mime, "application/pdf");
        assert!(analysis.report.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn top_n_is_projected_onto_display_columns() {
        let mut p = params();
        p.location.clear();
        p.marks_threshold = 100.0;
        p.display_columns = vec!["CollegeName".into()];
        let analysis = analyze(&source("a.csv", CSV), &p, &AppConfig::default()).unwrap();
        assert_eq!(analysis.top.columns(), ["CollegeName"]);
        let names: Vec<String> = analysis.top.rows().iter().map(|r| r[0].to_string()).collect();
        assert_eq!(names, ["Alpha College", "Alpha Tech"]);
    }

    #[test]
    fn report_format_follows_configuration() {
        let mut config = AppConfig::default();
        config.report.format = crate::report::ReportFormat::Text;
        let analysis = analyze(&source("a.csv", CSV), &params(), &config).unwrap();
        assert_eq!(analysis.report.file_name, "College_Admission_Analysis_a.csv.txt");
        let text = String::from_utf8(analysis.report.bytes).unwrap();
        assert!(text.contains("Alpha Tech"));
        assert!(text.contains("Prediction Based on Marks: '50'"));
    }

    #[test]
    fn batch_isolates_failing_files() {
        let other_schema =
            "ChoiceCodeDisplay,CollegeName,Reservation Details,SC\n1,Alpha,OPEN,10\n";
        let sources = vec![
            source("good.csv", CSV),
            source("broken.docx", ""),
            source("other.csv", other_schema),
            source("again.csv", CSV),
        ];
        let mut sink = MemorySink::default();
        let outcomes = analyze_batch(&sources, &params(), &AppConfig::default(), Some(&mut sink));

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].is_ok());
        let load = outcomes[1].as_ref().unwrap_err();
        assert_eq!(load.stage, Stage::Load);
        assert_eq!(load.file, "broken.docx");
        let schema = outcomes[2].as_ref().unwrap_err();
        assert_eq!(schema.stage, Stage::Validate);
        assert!(matches!(
            &schema.kind,
            FileErrorKind::Pipeline(PipelineError::MissingColumn { column, .. }) if column == "ST"
        ));
        assert!(outcomes[3].is_ok());

        let names: Vec<&str> = sink.reports.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            [
                "College_Admission_Analysis_good.csv.pdf",
                "College_Admission_Analysis_again.csv.pdf"
            ]
        );
    }

    #[test]
    fn choices_come_from_the_file() {
        let ds = source("a.csv", CSV).load().unwrap();
        assert_eq!(reservation_choices(&ds, "Reservation Details"), ["OPEN", "SC"]);
        assert_eq!(
            category_columns(&ds, &AppConfig::default().excluded_columns),
            ["ST"]
        );
        assert_eq!(
            default_display_columns(&ds, &AppConfig::default()),
            ["ChoiceCodeDisplay", "ST", "CollegeName"]
        );
    }
}
