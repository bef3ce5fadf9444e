use std::{io, path::PathBuf};
use thiserror::Error;

/// Failures raised while loading, aggregating, or rendering experiment
/// results.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("i/o error (path={}, error={source})", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed csv (path={}, error={source})", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("significance level must lie in (0, 1) (alpha={0})")]
    InvalidAlpha(f64),

    #[error("unsupported image format (path={})", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("error rendering chart (path={}, error={reason})", path.display())]
    Render { path: PathBuf, reason: String },
}

impl AnalysisError {
    pub fn schema(reason: impl Into<String>) -> Self {
        AnalysisError::Schema(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
