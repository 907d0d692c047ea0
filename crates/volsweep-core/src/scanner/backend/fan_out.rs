/// Fan-out backend: every task is handed to a dedicated rayon pool at once.
///
/// The pool is built with exactly `throttle` threads, so the pool itself is
/// the counting gate: extra tasks queue inside rayon until a thread frees up.
/// Reports come back over a crossbeam channel; the channel disconnects when
/// the last task closure (and its sender clone) is dropped.
use super::{run_guarded, BackendKind, ExecutionBackend, Job, RunningSweep, TaskReport};
use crate::scanner::ScanTask;
use crossbeam_channel::Receiver;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

pub struct FanOutBackend {
    pool: ThreadPool,
    throttle: usize,
}

impl FanOutBackend {
    /// Build the pool. This is the capability probe: failure means the
    /// platform refused the threads and the caller should fall back.
    pub fn new(throttle: usize) -> Result<Self, ThreadPoolBuildError> {
        let throttle = throttle.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(throttle)
            .thread_name(|i| format!("volsweep-fanout-{i}"))
            .build()?;
        Ok(Self { pool, throttle })
    }
}

impl ExecutionBackend for FanOutBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::FanOut
    }

    fn throttle(&self) -> usize {
        self.throttle
    }

    fn launch(self: Box<Self>, tasks: Vec<ScanTask>, job: Job) -> Box<dyn RunningSweep> {
        let (report_tx, report_rx) = crossbeam_channel::unbounded::<TaskReport>();
        let outstanding = Arc::new(AtomicUsize::new(tasks.len()));

        debug!(tasks = tasks.len(), throttle = self.throttle, "fanning out scan tasks");
        for task in tasks {
            let job = Arc::clone(&job);
            let tx = report_tx.clone();
            let outstanding = Arc::clone(&outstanding);
            self.pool.spawn(move || {
                if let Some(report) = run_guarded(&job, task) {
                    let _ = tx.send(report);
                }
                outstanding.fetch_sub(1, Ordering::SeqCst);
            });
        }
        drop(report_tx);

        Box::new(FanOutSweep {
            _pool: self.pool,
            report_rx,
            outstanding,
        })
    }
}

struct FanOutSweep {
    /// Kept alive until every task has run.
    _pool: ThreadPool,
    report_rx: Receiver<TaskReport>,
    outstanding: Arc<AtomicUsize>,
}

impl RunningSweep for FanOutSweep {
    fn is_settled(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst) == 0
    }

    fn finish(self: Box<Self>) -> Vec<TaskReport> {
        // Ends once every task closure has dropped its sender.
        self.report_rx.iter().collect()
    }
}
