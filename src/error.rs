use std::path::PathBuf;
use thiserror::Error;

/// Startup failures while reading the launch dataset. All of them are fatal.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} has no header row", .path.display())]
    Empty { path: PathBuf },

    #[error("{} is missing required columns: {}", .path.display(), .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("bad row at line {line}: {reason}")]
    BadRow { line: usize, reason: String },
}

/// Failures while evaluating dashboard inputs after startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashError {
    #[error("unknown launch site: {0}")]
    UnknownSite(String),

    #[error("invalid payload range: [{low}, {high}]")]
    InvalidRange { low: f64, high: f64 },

    #[error("unknown input: {0}")]
    UnknownInput(String),

    #[error("bad query: {0}")]
    BadQuery(String),
}
