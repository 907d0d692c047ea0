/// Data model for a sweep.
///
/// Re-exports the volume description, per-volume progress, match records,
/// and size formatting helpers.
pub mod progress;
pub mod size;
pub mod volume;

pub use progress::{ProgressEntry, ProgressUpdate, ScanProgress, ScanStatus};
pub use volume::{Volume, VolumeId, VolumeKind};

use serde::Serialize;
use std::path::PathBuf;

/// One file whose base name satisfied the search pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Volume the file was found on.
    pub volume: VolumeId,
    /// Absolute path of the file.
    pub path: PathBuf,
}

/// Final outcome of one volume's scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub volume: Volume,
    /// Matches in the worker's traversal order. Empty for failed volumes.
    pub matches: Vec<MatchRecord>,
    pub progress: ScanProgress,
}

impl ScanResult {
    pub fn is_completed(&self) -> bool {
        self.progress.status == ScanStatus::Completed
    }
}
