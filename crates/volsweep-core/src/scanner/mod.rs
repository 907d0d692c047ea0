/// Scanner module: orchestrates one concurrent scan per volume.
///
/// A sweep runs in four phases:
/// 1. **Validate** the pattern. Empty or whitespace-only patterns and
///    patterns the regex engine rejects end the run before anything else.
/// 2. **Enumerate** volumes and split them into scanned and skipped
///    (optical media and excluded kinds are reported but never scanned).
/// 3. **Dispatch** one [`ScanWorker`] job per scanned volume through the
///    backend chosen by [`backend::select`], then poll the shared
///    [`ProgressTracker`] at a fixed interval to drive the display until
///    every volume is terminal.
/// 4. **Merge** the [`ResultAggregator`] lists in enumeration order.
///
/// The orchestrating thread never touches the filesystem itself; it only
/// sleeps, reads snapshots, and finally drains the aggregator.
pub mod aggregator;
pub mod backend;
pub mod tracker;
pub mod worker;

pub use aggregator::{merge, ResultAggregator};
pub use backend::{BackendKind, ExecutionBackend, Job, RunningSweep, TaskReport};
pub use tracker::{ProgressSlot, ProgressTracker};
pub use worker::ScanWorker;

use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::model::{MatchRecord, ScanProgress, ScanResult, ScanStatus, Volume, VolumeId};
use crate::platform::VolumeSource;
use crate::report::{ProgressDisplay, ScanLog};
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Parameters of one worker invocation.
#[derive(Debug, Clone)]
pub struct ScanTask {
    pub volume: Volume,
    pub pattern: Regex,
}

/// Everything a finished sweep produced.
#[derive(Debug)]
pub struct SweepReport {
    /// Backend that ran the workers; `None` when nothing was scanned.
    pub backend: Option<BackendKind>,
    pub throttle: usize,
    /// Every enumerated volume, in enumeration order.
    pub volumes: Vec<Volume>,
    /// Enumerated volumes that were not scanned.
    pub skipped: Vec<Volume>,
    /// One result per scanned volume, in enumeration order.
    pub results: Vec<ScanResult>,
    /// All matches: enumeration order, then traversal order, no duplicates.
    pub matches: Vec<MatchRecord>,
    pub elapsed: Duration,
}

impl SweepReport {
    fn empty(volumes: Vec<Volume>, skipped: Vec<Volume>, started: Instant) -> Self {
        Self {
            backend: None,
            throttle: 0,
            volumes,
            skipped,
            results: Vec::new(),
            matches: Vec::new(),
            elapsed: started.elapsed(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_completed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.progress.status == ScanStatus::Failed)
            .count()
    }
}

/// Compile the user's pattern, matched later against file base names.
///
/// The pattern is handed to the regex engine as-is; only the emptiness check
/// looks at it trimmed.
pub fn build_pattern(pattern: &str, ignore_case: bool) -> Result<Regex> {
    if pattern.trim().is_empty() {
        return Err(SweepError::EmptyPattern);
    }
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()?)
}

pub struct Orchestrator {
    config: SweepConfig,
    source: Box<dyn VolumeSource>,
    log: Arc<dyn ScanLog>,
}

impl Orchestrator {
    pub fn new(config: SweepConfig, source: Box<dyn VolumeSource>, log: Arc<dyn ScanLog>) -> Self {
        Self {
            config,
            source,
            log,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run a full sweep for `pattern`, rendering progress through `display`.
    ///
    /// Only pattern errors are returned. Volume failures are recorded in the
    /// report's per-volume progress and never abort the sweep.
    pub fn run(&self, pattern: &str, display: &mut dyn ProgressDisplay) -> Result<SweepReport> {
        let started = Instant::now();
        let pattern = build_pattern(pattern, self.config.ignore_case)?;

        let volumes = distinct_volumes(self.source.volumes());
        if volumes.is_empty() {
            warn!("no volumes found; nothing to scan");
        }
        let (eligible, skipped): (Vec<Volume>, Vec<Volume>) = volumes
            .iter()
            .cloned()
            .partition(|v| self.config.scans_kind(v.kind));
        for volume in &skipped {
            info!(volume = %volume.id, kind = volume.kind.label(), "volume skipped");
        }
        if eligible.is_empty() {
            return Ok(SweepReport::empty(volumes, skipped, started));
        }

        let tracker = Arc::new(ProgressTracker::new(&eligible));
        let results = Arc::new(ResultAggregator::new(&eligible));
        let roots: Arc<Vec<PathBuf>> = Arc::new(volumes.iter().map(|v| v.root.clone()).collect());
        let worker = Arc::new(ScanWorker::new(
            Arc::clone(&tracker),
            Arc::clone(&results),
            Arc::clone(&self.log),
            self.config.progress_interval,
            roots,
        ));
        let job: Job = Arc::new(move |task: ScanTask| worker.scan(task));

        let throttle = self.config.throttle_for(eligible.len());
        let backend = backend::select(self.config.backend, throttle);
        let backend_kind = backend.kind();
        info!(
            volumes = eligible.len(),
            throttle,
            backend = backend_kind.label(),
            "sweep started"
        );

        let tasks = eligible
            .iter()
            .map(|volume| ScanTask {
                volume: volume.clone(),
                pattern: pattern.clone(),
            })
            .collect();
        let running = backend.launch(tasks, job);

        self.monitor(&tracker, running.as_ref(), display);
        let reports = running.finish();
        reconcile(&eligible, &tracker, &results, &reports, self.log.as_ref());
        display.finish(&tracker.snapshot());

        let per_volume = results.drain();
        let merged = merge(per_volume.iter().map(|(_, list)| list.as_slice()));
        let mut lists: HashMap<VolumeId, Vec<MatchRecord>> = per_volume.into_iter().collect();
        let scan_results: Vec<ScanResult> = eligible
            .into_iter()
            .map(|volume| {
                let progress = tracker
                    .slot(&volume.id)
                    .map(ProgressSlot::snapshot)
                    .unwrap_or_else(ScanProgress::pending);
                let matches = lists.remove(&volume.id).unwrap_or_default();
                ScanResult {
                    volume,
                    matches,
                    progress,
                }
            })
            .collect();

        let report = SweepReport {
            backend: Some(backend_kind),
            throttle,
            volumes,
            skipped,
            results: scan_results,
            matches: merged,
            elapsed: started.elapsed(),
        };
        info!(
            completed = report.completed_count(),
            failed = report.failed_count(),
            matches = report.matches.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "sweep finished"
        );
        Ok(report)
    }

    /// Poll the tracker until every volume is terminal.
    ///
    /// There is no timeout: a worker that never finishes stalls the sweep.
    /// The loop does stop early if the backend has no job left, since a
    /// non-terminal slot then has no writer that could ever finish it.
    fn monitor(
        &self,
        tracker: &ProgressTracker,
        running: &dyn RunningSweep,
        display: &mut dyn ProgressDisplay,
    ) {
        let interval = self.config.poll_interval();
        loop {
            if tracker.all_terminal() {
                return;
            }
            display.render(&tracker.snapshot());
            if running.is_settled() && !tracker.all_terminal() {
                warn!("backend settled with volumes still open");
                return;
            }
            thread::sleep(interval);
        }
    }
}

/// Drop repeated volume ids, keeping the first. Each id owns exactly one
/// tracker slot and one match list, so it may be scanned only once.
fn distinct_volumes(volumes: Vec<Volume>) -> Vec<Volume> {
    let mut seen = HashSet::new();
    volumes
        .into_iter()
        .filter(|volume| {
            let first = seen.insert(volume.id.clone());
            if !first {
                warn!(volume = %volume.id, "volume listed more than once; scanning it once");
            }
            first
        })
        .collect()
}

/// Record a retrieval error for every volume whose job delivered no report.
///
/// Such a volume contributes zero matches. If its slot is still open (the
/// worker died mid-scan) it is failed here, since nothing else will.
/// A slot that already reached Completed holds a finished walk whose matches
/// were all published, so those are kept and only a warning is logged.
fn reconcile(
    volumes: &[Volume],
    tracker: &ProgressTracker,
    results: &ResultAggregator,
    reports: &[TaskReport],
    log: &dyn ScanLog,
) {
    for volume in volumes {
        if reports.iter().any(|r| r.volume == volume.id) {
            continue;
        }
        let slot = tracker.slot(&volume.id);
        if slot.is_some_and(|s| s.status() == ScanStatus::Completed) {
            warn!(
                volume = %volume.id,
                "scan job ended abnormally after completing; keeping its matches"
            );
            continue;
        }
        let err = SweepError::ResultRetrieval {
            volume: volume.id.to_string(),
            reason: "scan job ended without reporting a result".into(),
        };
        results.discard(&volume.id);
        if let Some(slot) = slot {
            slot.fail(err.to_string());
        }
        log.result_unavailable(volume, &err);
    }
}
