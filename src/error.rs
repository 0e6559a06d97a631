//! Error types for the preprocessing pipeline and its loader.

use std::path::PathBuf;

/// Failures that abort a pipeline run or an artifact load.
///
/// Unparseable occupancy cells are not represented here: the cleaner turns
/// them into `0.0` and only counts them.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The raw table has fewer than the five positional identifier columns.
    #[error("schema error: expected at least {expected} columns, found {found}")]
    TooFewColumns { expected: usize, found: usize },

    /// Required columns are absent from a table or artifact header.
    #[error("schema error: missing required columns {missing:?}")]
    MissingColumns { missing: Vec<String> },

    /// The occupancy column holds a value that is not a finite number.
    #[error("type error: occupancy is not numeric ({detail})")]
    NonNumericCongestion { detail: String },

    /// A time-slot label does not follow the `H:MM` shape.
    #[error("malformed time slot label \"{label}\"")]
    MalformedTimeSlot { label: String },

    /// Two raw headers normalize to the same canonical time slot.
    #[error("time columns \"{first}\" and \"{second}\" both normalize to {canonical}")]
    DuplicateTimeColumn {
        first: String,
        second: String,
        canonical: String,
    },

    /// The raw file could not be decoded with any supported encoding.
    #[error("cannot decode {path} as CP949 or UTF-8")]
    Encoding { path: PathBuf },

    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error")]
    Csv(#[from] csv::Error),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error belongs to the fatal schema class.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            PipelineError::TooFewColumns { .. } | PipelineError::MissingColumns { .. }
        )
    }
}
