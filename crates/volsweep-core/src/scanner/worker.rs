/// Scan worker: walks one volume and matches file base names.
///
/// Each worker is serial: a sorted `jwalk` traversal with
/// `Parallelism::Serial`, so matches are produced in a stable traversal
/// order and the only concurrency in a sweep is one worker per volume.
///
/// # Synchronisation cost
///
/// Matches are buffered locally and moved into the aggregator, and counters
/// published to the tracker, only every `progress_interval` entries (plus
/// once at the end). A volume with a million entries therefore takes about a
/// thousand short locks at the default interval rather than one per file.
use crate::error::SweepError;
use crate::model::{MatchRecord, ProgressUpdate, ScanStatus, Volume};
use crate::report::ScanLog;
use crate::scanner::aggregator::ResultAggregator;
use crate::scanner::tracker::{ProgressSlot, ProgressTracker};
use crate::scanner::ScanTask;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Percent reported while walking never reaches 100; only completion does.
const MAX_RUNNING_PERCENT: u8 = 99;

pub struct ScanWorker {
    tracker: Arc<ProgressTracker>,
    results: Arc<ResultAggregator>,
    log: Arc<dyn ScanLog>,
    progress_interval: u64,
    /// Roots of every enumerated volume. A walk never descends into another
    /// volume's root, so nested mounts are reported once, by their own worker.
    volume_roots: Arc<Vec<PathBuf>>,
}

/// Counters accumulated during one walk.
#[derive(Debug, Default)]
struct WalkState {
    entries: u64,
    bytes_seen: u64,
    matches: u64,
    traversal_errors: u64,
}

impl ScanWorker {
    pub fn new(
        tracker: Arc<ProgressTracker>,
        results: Arc<ResultAggregator>,
        log: Arc<dyn ScanLog>,
        progress_interval: u64,
        volume_roots: Arc<Vec<PathBuf>>,
    ) -> Self {
        Self {
            tracker,
            results,
            log,
            progress_interval: progress_interval.max(1),
            volume_roots,
        }
    }

    /// Scan one volume to a terminal state.
    ///
    /// Never returns an error: every failure is recorded in the volume's
    /// tracker slot and the log, and reported as [`ScanStatus::Failed`].
    pub fn scan(&self, task: ScanTask) -> ScanStatus {
        let ScanTask { volume, pattern } = task;
        let Some(slot) = self.tracker.slot(&volume.id) else {
            warn!(volume = %volume.id, "no progress slot registered; skipping");
            return ScanStatus::Failed;
        };

        if !slot.begin() {
            // Another task already owns this volume's slot.
            warn!(volume = %volume.id, "volume already claimed by another task; skipping");
            return slot.status();
        }
        self.log.volume_started(&volume);

        match self.walk(&volume, &pattern, slot) {
            Ok(()) => {
                slot.complete();
                self.log.volume_completed(&volume, &slot.snapshot());
                ScanStatus::Completed
            }
            Err(err) => {
                self.results.discard(&volume.id);
                slot.fail(err.to_string());
                self.log.volume_failed(&volume, &err);
                ScanStatus::Failed
            }
        }
    }

    fn walk(
        &self,
        volume: &Volume,
        pattern: &Regex,
        slot: &ProgressSlot,
    ) -> Result<(), SweepError> {
        let root = volume.root.as_path();

        let nested: HashSet<PathBuf> = self
            .volume_roots
            .iter()
            .filter(|other| other.as_path() != root && other.starts_with(root))
            .cloned()
            .collect();

        let mut walker = jwalk::WalkDir::new(root)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .parallelism(jwalk::Parallelism::Serial);
        if !nested.is_empty() {
            debug!(volume = %volume.id, nested = nested.len(), "pruning nested volume roots");
            walker = walker.process_read_dir(move |_depth, _dir, _state, children| {
                children.retain(|child| match child {
                    Ok(entry) => !(entry.file_type().is_dir() && nested.contains(&entry.path())),
                    Err(_) => true,
                });
            });
        }

        let used_bytes = volume.used_bytes();
        let mut state = WalkState::default();
        let mut pending: Vec<MatchRecord> = Vec::new();

        for entry_result in walker {
            let mut entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    if err.path() == Some(root) {
                        // The root itself could not be opened.
                        return Err(unavailable(volume, err.to_string()));
                    }
                    state.skip(volume, err.path().map(Path::to_path_buf), err.to_string());
                    continue;
                }
            };

            if entry.depth == 0 {
                if let Some(err) = entry.read_children_error.take() {
                    return Err(unavailable(volume, err.to_string()));
                }
                if !entry.file_type().is_dir() {
                    return Err(unavailable(volume, "root is not a directory".into()));
                }
                continue;
            }
            if let Some(err) = entry.read_children_error.take() {
                // The directory is reported as an entry; its contents are skipped.
                state.skip(volume, Some(entry.path()), err.to_string());
            }
            state.entries += 1;

            let path = entry.path();
            if !entry.file_type().is_dir() {
                if used_bytes > 0 {
                    if let Ok(meta) = entry.metadata() {
                        state.bytes_seen += meta.len();
                    }
                }
                if pattern.is_match(&entry.file_name().to_string_lossy()) {
                    state.matches += 1;
                    pending.push(MatchRecord {
                        volume: volume.id.clone(),
                        path: path.clone(),
                    });
                }
            }

            if state.entries % self.progress_interval == 0 {
                self.publish(volume, slot, &state, &mut pending, &path, used_bytes);
            }
        }

        self.results.append(&volume.id, &mut pending);
        slot.advance(ProgressUpdate {
            percent: estimate_percent(state.bytes_seen, used_bytes),
            match_count: state.matches,
            entries_processed: state.entries,
            traversal_errors: state.traversal_errors,
            current_path: volume.root.to_string_lossy().into_owned(),
        });
        Ok(())
    }

    fn publish(
        &self,
        volume: &Volume,
        slot: &ProgressSlot,
        state: &WalkState,
        pending: &mut Vec<MatchRecord>,
        current: &Path,
        used_bytes: u64,
    ) {
        self.results.append(&volume.id, pending);
        slot.advance(ProgressUpdate {
            percent: estimate_percent(state.bytes_seen, used_bytes),
            match_count: state.matches,
            entries_processed: state.entries,
            traversal_errors: state.traversal_errors,
            current_path: current.to_string_lossy().into_owned(),
        });
    }
}

impl WalkState {
    /// Count a subtree that could not be listed and carry on.
    fn skip(&mut self, volume: &Volume, path: Option<PathBuf>, message: String) {
        self.traversal_errors += 1;
        let skipped = SweepError::Traversal {
            path: path.unwrap_or_default(),
            message,
        };
        debug!(volume = %volume.id, "{skipped}");
    }
}

fn unavailable(volume: &Volume, message: String) -> SweepError {
    SweepError::VolumeUnavailable {
        volume: volume.id.to_string(),
        message,
    }
}

/// Share of the volume's used bytes seen so far, capped below 100.
/// Volumes of unknown size stay at 0 until they complete.
fn estimate_percent(bytes_seen: u64, used_bytes: u64) -> u8 {
    if used_bytes == 0 {
        return 0;
    }
    let pct = (bytes_seen as u128 * 100) / used_bytes as u128;
    pct.min(MAX_RUNNING_PERCENT as u128) as u8
}
