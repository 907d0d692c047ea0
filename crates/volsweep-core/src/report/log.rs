/// Per-volume event log.
use crate::error::SweepError;
use crate::model::{ScanProgress, Volume};
use tracing::{info, warn};

/// Receives one record per volume lifecycle event.
///
/// Called from worker threads, so implementations must be thread-safe.
pub trait ScanLog: Send + Sync {
    fn volume_started(&self, volume: &Volume);
    fn volume_completed(&self, volume: &Volume, progress: &ScanProgress);
    fn volume_failed(&self, volume: &Volume, error: &SweepError);
    /// A worker finished but its output could not be retrieved.
    fn result_unavailable(&self, volume: &Volume, error: &SweepError);
}

/// Emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl ScanLog for TracingLog {
    fn volume_started(&self, volume: &Volume) {
        info!(
            volume = %volume.id,
            kind = volume.kind.label(),
            root = %volume.root.display(),
            "scan started"
        );
    }

    fn volume_completed(&self, volume: &Volume, progress: &ScanProgress) {
        info!(
            volume = %volume.id,
            matches = progress.match_count,
            entries = progress.entries_processed,
            skipped_subtrees = progress.traversal_errors,
            elapsed_ms = progress.elapsed().as_millis() as u64,
            "scan completed"
        );
    }

    fn volume_failed(&self, volume: &Volume, error: &SweepError) {
        warn!(volume = %volume.id, error = %error, "scan failed");
    }

    fn result_unavailable(&self, volume: &Volume, error: &SweepError) {
        warn!(volume = %volume.id, error = %error, "scan result unavailable");
    }
}
