/// Per-volume scan progress.
///
/// One `ScanProgress` exists per dispatched volume. It is written only by
/// that volume's worker (through a tracker slot) and read by the monitor.
use super::volume::VolumeId;
use chrono::{DateTime, Local};
use std::time::Duration;

/// Lifecycle of one volume's scan. Transitions only move forward:
/// `Pending → Running → Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub status: ScanStatus,
    /// 0–100, non-decreasing until terminal.
    pub percent: u8,
    pub match_count: u64,
    /// Directory entries visited so far.
    pub entries_processed: u64,
    /// Subtrees skipped because they could not be listed.
    pub traversal_errors: u64,
    /// Last path the worker reported.
    pub current_path: String,
    pub start_time: DateTime<Local>,
    pub end_time: Option<DateTime<Local>>,
    pub error_message: Option<String>,
}

impl ScanProgress {
    pub fn pending() -> Self {
        Self {
            status: ScanStatus::Pending,
            percent: 0,
            match_count: 0,
            entries_processed: 0,
            traversal_errors: 0,
            current_path: String::new(),
            start_time: Local::now(),
            end_time: None,
            error_message: None,
        }
    }

    /// Wall time between start and end (or now, while still running).
    pub fn elapsed(&self) -> Duration {
        let end = self.end_time.unwrap_or_else(Local::now);
        (end - self.start_time).to_std().unwrap_or_default()
    }
}

/// Counters a worker publishes at each progress interval.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub match_count: u64,
    pub entries_processed: u64,
    pub traversal_errors: u64,
    pub current_path: String,
}

/// One row of a tracker snapshot.
#[derive(Debug, Clone)]
pub struct ProgressEntry {
    pub volume: VolumeId,
    pub progress: ScanProgress,
}
