use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types shared by the loader, the pipeline and the report writer
// ---------------------------------------------------------------------------

/// Failure to turn an input source into a [`crate::data::model::Dataset`].
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {file}: {source:#}")]
    Parse {
        file: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{0} has no columns")]
    NoColumns(String),

    #[error("{file}: row {row} has {found} cells but the header has {expected}")]
    RaggedRow {
        file: String,
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Which step of the per-file pipeline produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Validate,
    Location,
    Reservation,
    Marks,
    Rank,
    Summary,
    Render,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Validate => "validate",
            Stage::Location => "location filter",
            Stage::Reservation => "reservation filter",
            Stage::Marks => "marks filter",
            Stage::Rank => "ranking",
            Stage::Summary => "summary",
            Stage::Render => "report rendering",
            Stage::Write => "report output",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("column '{column}' not found ({stage})")]
    MissingColumn { column: String, stage: Stage },

    #[error("report encoding failed: {0}")]
    Report(String),

    #[error("could not write report {name}: {source}")]
    Sink {
        name: String,
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn missing_column(column: &str, stage: Stage) -> Self {
        PipelineError::MissingColumn {
            column: column.to_string(),
            stage,
        }
    }
}

/// A failure for one file of a batch, with enough context to show the user.
#[derive(Error, Debug)]
#[error("{file}: {stage} failed: {kind}")]
pub struct FileError {
    pub file: String,
    pub stage: Stage,
    pub kind: FileErrorKind,
}

#[derive(Error, Debug)]
pub enum FileErrorKind {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl FileError {
    pub fn new(file: &str, stage: Stage, kind: impl Into<FileErrorKind>) -> Self {
        FileError {
            file: file.to_string(),
            stage,
            kind: kind.into(),
        }
    }
}
