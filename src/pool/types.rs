//! Identifier types and capability contracts.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Maximum number of parallel instances for a single worker kind.
pub const MAX_INSTANCES: usize = 100;

/// Opaque identifier of a worker kind, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerKey(String);

impl WorkerKey {
    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkerKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<String> for WorkerKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for WorkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a job, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey(String);

impl JobKey {
    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<String> for JobKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability contract for pool inputs.
///
/// Requests carry whatever payload the [`Work`] implementation needs; the
/// pool only reads the two identifiers.
pub trait Request: Send + Sync + 'static {
    /// The job this request is a replica of.
    fn job_id(&self) -> JobKey;

    /// The worker kind that must execute this request.
    fn worker_id(&self) -> WorkerKey;
}

/// Capability contract for work results.
pub trait Response: Send + Sync + 'static {
    /// Whether this response satisfies its job. A successful response stops
    /// the remaining replicas of the same job.
    fn success(&self) -> bool;
}

/// The callback executed by worker instances.
///
/// Implementations must observe `token` and return promptly once it fires;
/// a cancellation-shaped [`Response`] is counted like any other replica
/// result.
#[async_trait]
pub trait Work<R, S>: Send + Sync
where
    R: Request,
    S: Response,
{
    /// Execute one request and produce its response.
    async fn work(&self, token: CancellationToken, req: Arc<R>) -> S;
}

/// A worker kind: identifier, parallelism bound, and work callback.
pub struct Worker<R, S>
where
    R: Request,
    S: Response,
{
    /// Unique identifier of the kind.
    pub worker_id: WorkerKey,

    /// Maximum number of parallel [`Work::work`] invocations, in
    /// `1..=MAX_INSTANCES`.
    pub instances: usize,

    /// The work callback.
    pub work: Arc<dyn Work<R, S>>,
}

impl<R, S> Worker<R, S>
where
    R: Request,
    S: Response,
{
    /// Build a worker kind.
    pub fn new(worker_id: impl Into<WorkerKey>, instances: usize, work: impl Work<R, S> + 'static) -> Self {
        Self {
            worker_id: worker_id.into(),
            instances,
            work: Arc::new(work),
        }
    }
}

impl<R, S> Clone for Worker<R, S>
where
    R: Request,
    S: Response,
{
    fn clone(&self) -> Self {
        Self {
            worker_id: self.worker_id.clone(),
            instances: self.instances,
            work: Arc::clone(&self.work),
        }
    }
}

/// How each worker's request queue is ordered before execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Schedule {
    /// Interleave replicas so that every job is attempted as early as
    /// possible, scarce jobs first. The production default.
    #[default]
    Spread,

    /// Uniform random permutation of each worker's queue.
    Random,
}
