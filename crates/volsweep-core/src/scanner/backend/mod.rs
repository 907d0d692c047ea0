/// Execution backends: how scan workers are run concurrently.
///
/// Two interchangeable strategies behind one contract: run a job for every
/// task with at most `throttle` jobs active at once, and report each job's
/// terminal status.
///
/// - **Fan-out** ([`fan_out`]): every task is spawned at once onto a
///   dedicated rayon pool whose thread count is the throttle.
/// - **Worker pool** ([`pool`]): a fixed set of named OS threads pulls tasks
///   from a channel; completion is detected by polling the join handles.
///
/// The backend is chosen once per sweep by [`select`]. Fan-out is preferred;
/// the worker pool is the fallback when the rayon pool cannot be built.
pub mod fan_out;
pub mod pool;

pub use fan_out::FanOutBackend;
pub use pool::WorkerPoolBackend;

use crate::config::BackendPreference;
use crate::model::{ScanStatus, VolumeId};
use crate::scanner::ScanTask;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

/// The unit of work a backend runs for each task.
pub type Job = Arc<dyn Fn(ScanTask) -> ScanStatus + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    FanOut,
    WorkerPool,
}

impl BackendKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::FanOut => "fan-out",
            Self::WorkerPool => "worker pool",
        }
    }
}

/// Terminal status a job returned for one volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub volume: VolumeId,
    pub status: ScanStatus,
}

pub trait ExecutionBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Maximum number of jobs this backend runs at once.
    fn throttle(&self) -> usize;

    /// Start running `job` for every task and return immediately.
    fn launch(self: Box<Self>, tasks: Vec<ScanTask>, job: Job) -> Box<dyn RunningSweep>;
}

/// A launched set of jobs.
pub trait RunningSweep {
    /// True once no job is queued or running any more.
    fn is_settled(&self) -> bool;

    /// Block until settled and collect the reports that were delivered.
    ///
    /// A job that panicked delivers no report; the caller treats its volume's
    /// result as unretrievable.
    fn finish(self: Box<Self>) -> Vec<TaskReport>;
}

/// Pick the backend for this sweep.
pub fn select(preference: BackendPreference, throttle: usize) -> Box<dyn ExecutionBackend> {
    let throttle = throttle.max(1);
    if preference == BackendPreference::WorkerPool {
        info!(throttle, "using worker pool backend (configured)");
        return Box::new(WorkerPoolBackend::new(throttle));
    }

    match FanOutBackend::new(throttle) {
        Ok(backend) => {
            info!(throttle, "using fan-out backend");
            Box::new(backend)
        }
        Err(err) => {
            warn!("fan-out pool unavailable ({err}); falling back to worker pool");
            Box::new(WorkerPoolBackend::new(throttle))
        }
    }
}

/// Run one job, converting a panic into a missing report.
fn run_guarded(job: &Job, task: ScanTask) -> Option<TaskReport> {
    let volume = task.volume.id.clone();
    match panic::catch_unwind(AssertUnwindSafe(|| job(task))) {
        Ok(status) => Some(TaskReport { volume, status }),
        Err(_) => {
            warn!(volume = %volume, "scan job panicked");
            None
        }
    }
}
