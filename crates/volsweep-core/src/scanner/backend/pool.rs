/// Worker-pool backend: a fixed set of OS threads draining a task queue.
///
/// All tasks are queued up front on an unbounded crossbeam channel and the
/// sender is dropped, so each pool thread exits as soon as the queue is
/// empty. The pool never has more than `size` threads, which bounds how
/// many jobs run at once. Completion is detected by polling the threads'
/// join handles.
use super::{run_guarded, BackendKind, ExecutionBackend, Job, RunningSweep, TaskReport};
use crate::scanner::ScanTask;
use crossbeam_channel::Receiver;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// How often `finish` re-checks the join handles.
const HANDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct WorkerPoolBackend {
    size: usize,
}

impl WorkerPoolBackend {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }
}

impl ExecutionBackend for WorkerPoolBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::WorkerPool
    }

    fn throttle(&self) -> usize {
        self.size
    }

    fn launch(self: Box<Self>, tasks: Vec<ScanTask>, job: Job) -> Box<dyn RunningSweep> {
        let threads = self.size.min(tasks.len());
        let (task_tx, task_rx) = crossbeam_channel::unbounded::<ScanTask>();
        let (report_tx, report_rx) = crossbeam_channel::unbounded::<TaskReport>();
        for task in tasks {
            // The receiver is alive; send cannot fail.
            let _ = task_tx.send(task);
        }
        drop(task_tx);

        let mut handles = Vec::with_capacity(threads);
        for i in 0..threads {
            let task_rx = task_rx.clone();
            let report_tx = report_tx.clone();
            let job = job.clone();
            let spawned = thread::Builder::new()
                .name(format!("volsweep-pool-{i}"))
                .spawn(move || {
                    while let Ok(task) = task_rx.recv() {
                        if let Some(report) = run_guarded(&job, task) {
                            let _ = report_tx.send(report);
                        }
                    }
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => warn!("failed to spawn pool thread {i}: {err}"),
            }
        }
        debug!(threads = handles.len(), "worker pool started");

        Box::new(PoolSweep {
            handles,
            report_rx,
        })
    }
}

struct PoolSweep {
    handles: Vec<JoinHandle<()>>,
    report_rx: Receiver<TaskReport>,
}

impl RunningSweep for PoolSweep {
    fn is_settled(&self) -> bool {
        self.handles.iter().all(JoinHandle::is_finished)
    }

    fn finish(self: Box<Self>) -> Vec<TaskReport> {
        while !self.is_settled() {
            thread::sleep(HANDLE_POLL_INTERVAL);
        }
        let PoolSweep { handles, report_rx } = *self;
        for handle in handles {
            if handle.join().is_err() {
                warn!("pool thread terminated abnormally");
            }
        }
        report_rx.try_iter().collect()
    }
}
