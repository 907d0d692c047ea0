/// Error types for a sweep.
///
/// Only [`SweepError::EmptyPattern`], [`SweepError::InvalidPattern`] and the
/// configuration/export variants are ever returned to the caller of a run.
/// Per-volume variants are contained inside that volume's worker and surface
/// through its `ScanProgress` and the [`ScanLog`](crate::report::ScanLog).
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SweepError>;

#[derive(Error, Debug)]
pub enum SweepError {
    /// The volume root could not be opened (not ready, access denied).
    #[error("volume {volume} is unavailable: {message}")]
    VolumeUnavailable { volume: String, message: String },

    /// One subtree of an otherwise reachable volume could not be listed.
    #[error("cannot list {}: {message}", .path.display())]
    Traversal { path: PathBuf, message: String },

    /// A worker reported no final output for its volume.
    #[error("no result retrieved for volume {volume}: {reason}")]
    ResultRetrieval { volume: String, reason: String },

    #[error("search pattern is empty")]
    EmptyPattern,

    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid configuration{}: {message}", config_origin(.path))]
    Config {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn config_origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

impl SweepError {
    /// Whether this error aborts the whole run rather than a single volume.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Self::EmptyPattern | Self::InvalidPattern(_) | Self::Config { .. }
        )
    }
}

impl From<csv::Error> for SweepError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(err: serde_json::Error) -> Self {
        Self::Export(err.to_string())
    }
}
