//! Pool validation errors.

use thiserror::Error;

use super::types::{JobKey, WorkerKey, MAX_INSTANCES};

/// Validation errors surfaced by [`execute`](super::execute) before any
/// task is started.
///
/// Per-request failures reported by [`Work`](super::Work) are never
/// elevated here; they travel as failing responses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No worker list supplied.
    #[error("no workers supplied")]
    NoWorkers,

    /// Two worker kinds share an identifier.
    #[error("duplicate worker: {0}")]
    DuplicateWorker(WorkerKey),

    /// Instance count outside the allowed range.
    #[error("instances must be in 1..={MAX_INSTANCES}: worker={worker}, instances={instances}")]
    BadInstances {
        /// The offending worker kind.
        worker: WorkerKey,
        /// The rejected instance count.
        instances: usize,
    },

    /// A request names a worker kind absent from the worker set.
    #[error("worker not found: worker={worker}, job={job}")]
    UnknownWorker {
        /// The unknown worker kind.
        worker: WorkerKey,
        /// The job the request belongs to.
        job: JobKey,
    },

    /// A job has no replicas (or a request carries an empty job key).
    #[error("job without replicas: {0}")]
    EmptyJob(JobKey),
}
