/// End-to-end sweep tests.
///
/// These drive the real `Orchestrator` over real temporary directory trees
/// presented as volumes through `StaticVolumes`, so worker threads, both
/// backends, the tracker/aggregator handoff and the merge are exercised with
/// no mocking beyond the volume list, the log and the display.
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use volsweep_core::config::BackendPreference;
use volsweep_core::model::{ProgressEntry, ScanProgress, ScanStatus, Volume, VolumeKind};
use volsweep_core::platform::{StaticVolumes, VolumeSource};
use volsweep_core::report::{NullDisplay, ProgressDisplay, ScanLog};
use volsweep_core::scanner::{Orchestrator, SweepReport};
use volsweep_core::{SweepConfig, SweepError};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"volsweep").unwrap();
}

fn fast_config() -> SweepConfig {
    SweepConfig {
        poll_interval_ms: 10,
        ..SweepConfig::default()
    }
}

/// Records every log call and the peak number of volumes between
/// `volume_started` and their terminal record.
#[derive(Default)]
struct RecordingLog {
    events: Mutex<Vec<String>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingLog {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn finished_one(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScanLog for RecordingLog {
    fn volume_started(&self, volume: &Volume) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.events.lock().push(format!("start {}", volume.id));
    }

    fn volume_completed(&self, volume: &Volume, progress: &ScanProgress) {
        self.finished_one();
        self.events
            .lock()
            .push(format!("done {} {}", volume.id, progress.match_count));
    }

    fn volume_failed(&self, volume: &Volume, _error: &SweepError) {
        self.finished_one();
        self.events.lock().push(format!("fail {}", volume.id));
    }

    fn result_unavailable(&self, volume: &Volume, _error: &SweepError) {
        self.events.lock().push(format!("lost {}", volume.id));
    }
}

/// Counts how often the orchestrator asked for volumes.
struct CountingSource {
    inner: StaticVolumes,
    calls: Arc<AtomicUsize>,
}

impl VolumeSource for CountingSource {
    fn volumes(&self) -> Vec<Volume> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.volumes()
    }
}

/// Keeps every snapshot it was asked to render.
#[derive(Default)]
struct RecordingDisplay {
    renders: usize,
    finishes: usize,
    history: Vec<Vec<ProgressEntry>>,
    last: Vec<ProgressEntry>,
}

impl ProgressDisplay for RecordingDisplay {
    fn render(&mut self, snapshot: &[ProgressEntry]) {
        self.renders += 1;
        self.history.push(snapshot.to_vec());
        self.last = snapshot.to_vec();
    }

    fn finish(&mut self, snapshot: &[ProgressEntry]) {
        self.finishes += 1;
        self.last = snapshot.to_vec();
    }
}

fn sweep(volumes: Vec<Volume>, config: SweepConfig, pattern: &str) -> SweepReport {
    let orchestrator = Orchestrator::new(
        config,
        Box::new(StaticVolumes(volumes)),
        Arc::new(RecordingLog::default()),
    );
    orchestrator.run(pattern, &mut NullDisplay).unwrap()
}

/// ```text
/// root/
///   c/ a/report1.pdf  b/x.txt
///   e/ report-2024.pdf  deep/nested/report_final.pdf  notes.md
/// ```
fn two_volume_tree(root: &Path) -> (PathBuf, PathBuf) {
    let c = root.join("c");
    let e = root.join("e");
    touch(&c.join("a").join("report1.pdf"));
    touch(&c.join("b").join("x.txt"));
    touch(&e.join("report-2024.pdf"));
    touch(&e.join("deep").join("nested").join("report_final.pdf"));
    touch(&e.join("notes.md"));
    (c, e)
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Reachable volume completes with its match, unreachable volume fails empty,
/// merged output holds only the reachable volume's match.
#[test]
fn reachable_and_unreachable_volumes() {
    let tmp = TempDir::new().unwrap();
    let (c_root, _) = two_volume_tree(tmp.path());
    let c = Volume::from_root(&c_root);
    let d = Volume::from_root(tmp.path().join("not-mounted")).with_kind(VolumeKind::Removable);

    let log = Arc::new(RecordingLog::default());
    let orchestrator = Orchestrator::new(
        fast_config(),
        Box::new(StaticVolumes(vec![c.clone(), d.clone()])),
        log.clone(),
    );
    let mut display = RecordingDisplay::default();
    let report = orchestrator.run(r"^report.*\.pdf$", &mut display).unwrap();

    assert_eq!(report.results.len(), 2);
    let c_result = &report.results[0];
    assert_eq!(c_result.volume.id, c.id);
    assert_eq!(c_result.progress.status, ScanStatus::Completed);
    assert_eq!(c_result.progress.percent, 100);
    let c_paths: Vec<&Path> = c_result.matches.iter().map(|m| m.path.as_path()).collect();
    assert_eq!(c_paths, vec![c_root.join("a").join("report1.pdf").as_path()]);

    let d_result = &report.results[1];
    assert_eq!(d_result.progress.status, ScanStatus::Failed);
    assert!(d_result.matches.is_empty());
    assert_eq!(d_result.progress.match_count, 0);
    assert!(d_result.progress.error_message.is_some());

    let merged: Vec<&Path> = report.matches.iter().map(|m| m.path.as_path()).collect();
    assert_eq!(merged, c_paths);
    assert_eq!(report.completed_count(), 1);
    assert_eq!(report.failed_count(), 1);

    // The failed volume still shows up in the final progress view.
    assert_eq!(display.finishes, 1);
    assert_eq!(display.last.len(), 2);
    assert!(display.last.iter().all(|e| e.progress.status.is_terminal()));

    let events = log.events();
    assert!(events.contains(&format!("done {} 1", c.id)));
    assert!(events.contains(&format!("fail {}", d.id)));
}

#[test]
fn empty_pattern_scans_nothing() {
    for pattern in ["", "   ", "\t\n"] {
        let tmp = TempDir::new().unwrap();
        two_volume_tree(tmp.path());
        let calls = Arc::new(AtomicUsize::new(0));
        let log = Arc::new(RecordingLog::default());
        let orchestrator = Orchestrator::new(
            fast_config(),
            Box::new(CountingSource {
                inner: StaticVolumes::from_roots(vec![tmp.path().to_path_buf()]),
                calls: calls.clone(),
            }),
            log.clone(),
        );
        let mut display = RecordingDisplay::default();

        let result = orchestrator.run(pattern, &mut display);
        assert!(matches!(result, Err(SweepError::EmptyPattern)));
        assert_eq!(calls.load(Ordering::SeqCst), 0, "volumes were enumerated");
        assert!(log.events().is_empty(), "volume log records were written");
        assert_eq!(display.renders + display.finishes, 0);
    }
}

#[test]
fn invalid_pattern_is_fatal_before_dispatch() {
    let tmp = TempDir::new().unwrap();
    let log = Arc::new(RecordingLog::default());
    let orchestrator = Orchestrator::new(
        fast_config(),
        Box::new(StaticVolumes::from_roots(vec![tmp.path().to_path_buf()])),
        log.clone(),
    );
    let result = orchestrator.run("report[", &mut NullDisplay);
    assert!(matches!(result, Err(SweepError::InvalidPattern(_))));
    assert!(log.events().is_empty());
}

/// Merge is enumeration order first, then each volume's traversal order.
#[test]
fn merge_follows_enumeration_then_traversal_order() {
    let tmp = TempDir::new().unwrap();
    let (c_root, e_root) = two_volume_tree(tmp.path());
    // Enumerate E before C.
    let volumes = vec![Volume::from_root(&e_root), Volume::from_root(&c_root)];
    let report = sweep(volumes, fast_config(), r"^report");

    let merged: Vec<PathBuf> = report.matches.iter().map(|m| m.path.clone()).collect();
    assert_eq!(
        merged,
        vec![
            e_root.join("deep").join("nested").join("report_final.pdf"),
            e_root.join("report-2024.pdf"),
            c_root.join("a").join("report1.pdf"),
        ]
    );

    // Union of the per-volume lists, nothing lost, nothing repeated.
    let union: Vec<PathBuf> = report
        .results
        .iter()
        .flat_map(|r| r.matches.iter().map(|m| m.path.clone()))
        .collect();
    assert_eq!(union, merged);
}

#[test]
fn completed_volumes_count_their_matches() {
    let tmp = TempDir::new().unwrap();
    let (c_root, e_root) = two_volume_tree(tmp.path());
    let report = sweep(
        vec![Volume::from_root(&c_root), Volume::from_root(&e_root)],
        fast_config(),
        r"\.(pdf|md)$",
    );
    for result in &report.results {
        assert_eq!(result.progress.status, ScanStatus::Completed);
        assert_eq!(result.progress.percent, 100);
        assert_eq!(result.progress.match_count, result.matches.len() as u64);
        assert!(result.progress.end_time.is_some());
    }
    assert_eq!(report.matches.len(), 4);
}

#[test]
fn repeated_runs_are_identical() {
    let tmp = TempDir::new().unwrap();
    let (c_root, e_root) = two_volume_tree(tmp.path());
    let volumes = vec![Volume::from_root(&c_root), Volume::from_root(&e_root)];

    let first = sweep(volumes.clone(), fast_config(), "report");
    let second = sweep(volumes, fast_config(), "report");
    assert_eq!(first.matches, second.matches);
    for (a, b) in first.results.iter().zip(&second.results) {
        assert_eq!(a.matches, b.matches);
    }
}

#[test]
fn both_backends_agree() {
    let tmp = TempDir::new().unwrap();
    let (c_root, e_root) = two_volume_tree(tmp.path());
    let volumes = vec![Volume::from_root(&c_root), Volume::from_root(&e_root)];

    let fan_out = sweep(
        volumes.clone(),
        SweepConfig {
            backend: BackendPreference::FanOut,
            ..fast_config()
        },
        r"\.pdf$",
    );
    let pool = sweep(
        volumes,
        SweepConfig {
            backend: BackendPreference::WorkerPool,
            ..fast_config()
        },
        r"\.pdf$",
    );
    assert_eq!(fan_out.backend.map(|b| b.label()), Some("fan-out"));
    assert_eq!(pool.backend.map(|b| b.label()), Some("worker pool"));
    assert_eq!(fan_out.matches, pool.matches);
}

/// Throttle holds end to end, for more volumes than the limit.
#[test]
fn throttle_bounds_active_workers() {
    for backend in [BackendPreference::FanOut, BackendPreference::WorkerPool] {
        let tmp = TempDir::new().unwrap();
        let mut volumes = Vec::new();
        for v in 0..9 {
            let root = tmp.path().join(format!("vol{v}"));
            for f in 0..200 {
                touch(&root.join(format!("d{}", f % 7)).join(format!("file{f}.bin")));
            }
            volumes.push(Volume::from_root(root));
        }

        let log = Arc::new(RecordingLog::default());
        let orchestrator = Orchestrator::new(
            SweepConfig {
                max_concurrent: 2,
                backend,
                ..fast_config()
            },
            Box::new(StaticVolumes(volumes)),
            log.clone(),
        );
        let report = orchestrator.run(r"file1\d\d\.bin", &mut NullDisplay).unwrap();

        assert_eq!(report.throttle, 2);
        assert_eq!(report.completed_count(), 9);
        let peak = log.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "{backend:?}: {peak} workers active at once");
    }
}

#[test]
fn default_throttle_is_five() {
    let tmp = TempDir::new().unwrap();
    let volumes: Vec<Volume> = (0..8)
        .map(|v| {
            let root = tmp.path().join(format!("v{v}"));
            touch(&root.join("a.txt"));
            Volume::from_root(root)
        })
        .collect();
    let report = sweep(volumes.clone(), fast_config(), "a");
    assert_eq!(report.throttle, 5);
    let report = sweep(volumes[..3].to_vec(), fast_config(), "a");
    assert_eq!(report.throttle, 3);
}

#[test]
fn optical_and_excluded_volumes_are_skipped_but_reported() {
    let tmp = TempDir::new().unwrap();
    let (c_root, e_root) = two_volume_tree(tmp.path());
    let optical = Volume::from_root(&e_root).with_kind(VolumeKind::Optical);
    let share = Volume::from_root(tmp.path().join("share")).with_kind(VolumeKind::Network);
    let local = Volume::from_root(&c_root);

    let report = sweep(
        vec![optical.clone(), local.clone(), share.clone()],
        SweepConfig {
            exclude_kinds: vec![VolumeKind::Network],
            ..fast_config()
        },
        "report",
    );

    assert_eq!(report.volumes.len(), 3);
    assert_eq!(report.skipped, vec![optical, share]);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].volume, local);
    assert_eq!(report.matches.len(), 1);
}

#[test]
fn no_eligible_volumes_is_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let optical = Volume::from_root(tmp.path()).with_kind(VolumeKind::Optical);
    let report = sweep(vec![optical], fast_config(), ".*");
    assert!(report.backend.is_none());
    assert!(report.results.is_empty());
    assert!(report.matches.is_empty());

    let report = sweep(Vec::new(), fast_config(), ".*");
    assert!(report.volumes.is_empty());
}

/// A volume mounted inside another is reported once, by its own worker.
#[test]
fn nested_volumes_do_not_duplicate_matches() {
    let tmp = TempDir::new().unwrap();
    let inner = tmp.path().join("mnt").join("usb");
    touch(&tmp.path().join("top.log"));
    touch(&inner.join("stick.log"));

    let report = sweep(
        vec![Volume::from_root(tmp.path()), Volume::from_root(&inner)],
        fast_config(),
        r"\.log$",
    );
    assert_eq!(report.results[0].matches.len(), 1);
    assert_eq!(report.results[1].matches.len(), 1);
    assert_eq!(report.matches.len(), 2);
    assert_eq!(report.matches[1].volume, report.results[1].volume.id);
}

/// The same volume listed twice is scanned once and reported once.
#[test]
fn repeated_volume_is_scanned_once() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("hit.txt"));
    let volume = Volume::from_root(tmp.path());

    let report = sweep(vec![volume.clone(), volume.clone()], fast_config(), "hit");
    assert_eq!(report.volumes, vec![volume]);
    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.progress.status, ScanStatus::Completed);
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.progress.match_count, 1);
    assert_eq!(report.matches.len(), 1);
}

/// An unlistable subtree is skipped and counted; the volume still completes.
#[cfg(unix)]
#[test]
fn unreadable_subtree_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("open").join("keep.dat"));
    let locked = tmp.path().join("locked");
    touch(&locked.join("hidden.dat"));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        // A privileged user can list it regardless; nothing is skipped.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        eprintln!("skipping: running with permission to list locked directories");
        return;
    }

    let report = sweep(vec![Volume::from_root(tmp.path())], fast_config(), r"\.dat$");

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let result = &report.results[0];
    assert_eq!(result.progress.status, ScanStatus::Completed);
    assert_eq!(result.matches.len(), 1);
    assert!(result.matches[0].path.ends_with("open/keep.dat"));
    assert_eq!(result.progress.traversal_errors, 1);
}

/// Every snapshot the monitor renders moves forward: status never goes back
/// and percent never decreases for any volume.
#[test]
fn progress_is_rendered_while_scanning() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("big");
    for f in 0..2_000 {
        touch(&root.join(format!("d{}", f % 40)).join(format!("f{f}.txt")));
    }
    let mut volume = Volume::from_root(&root);
    // 2,000 files of 8 bytes each.
    volume.total_bytes = 32_000;
    volume.free_bytes = 16_000;
    let small = tmp.path().join("small");
    touch(&small.join("f1.txt"));

    let orchestrator = Orchestrator::new(
        SweepConfig {
            poll_interval_ms: 1,
            progress_interval: 50,
            ..SweepConfig::default()
        },
        Box::new(StaticVolumes(vec![volume, Volume::from_root(&small)])),
        Arc::new(RecordingLog::default()),
    );
    let mut display = RecordingDisplay::default();
    let report = orchestrator.run(r"^f1", &mut display).unwrap();

    assert!(display.renders > 0);
    assert_eq!(display.renders, display.history.len());
    assert_eq!(display.finishes, 1);

    let rank = |status: ScanStatus| match status {
        ScanStatus::Pending => 0,
        ScanStatus::Running => 1,
        ScanStatus::Completed | ScanStatus::Failed => 2,
    };
    let mut timeline = display.history.clone();
    timeline.push(display.last.clone());
    for pair in timeline.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after) {
            assert_eq!(b.volume, a.volume);
            assert!(rank(a.progress.status) >= rank(b.progress.status));
            assert!(
                a.progress.percent >= b.progress.percent,
                "{}: percent went back",
                a.volume
            );
            if b.progress.status.is_terminal() {
                assert_eq!(a.progress.status, b.progress.status);
                assert_eq!(a.progress.percent, b.progress.percent);
                assert_eq!(a.progress.match_count, b.progress.match_count);
            }
        }
    }

    assert!(display.last.iter().all(|e| e.progress.status == ScanStatus::Completed));
    assert!(display.last.iter().all(|e| e.progress.percent == 100));
    assert_eq!(report.results[0].progress.entries_processed, 2_040);
}
