//! Input validation and per-call wiring.
//!
//! Everything here runs synchronously, before any task is spawned: the
//! worker set is validated, requests are grouped into per-worker queues,
//! and every distinct job gets its cancellation scope and response funnel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::distribute::WorkerQueues;
use super::error::PoolError;
use super::types::{JobKey, Request, Response, Worker, WorkerKey, MAX_INSTANCES};

/// One job's cancellation scope and response funnel.
///
/// The channel capacity equals the job's replica count, so a worker
/// instance can always deliver its response without blocking.
pub(crate) struct JobSlot<S> {
    pub(crate) replicas: usize,
    pub(crate) token: CancellationToken,
    pub(crate) res_tx: mpsc::Sender<S>,
    pub(crate) res_rx: mpsc::Receiver<S>,
}

pub(crate) struct Dispatcher<R, S>
where
    R: Request,
    S: Response,
{
    pub(crate) workers: HashMap<WorkerKey, Worker<R, S>>,
    pub(crate) queues: WorkerQueues<R>,
    pub(crate) jobs: HashMap<JobKey, JobSlot<S>>,
}

impl<R, S> Dispatcher<R, S>
where
    R: Request,
    S: Response,
{
    pub(crate) fn new(
        parent: &CancellationToken,
        workers: Vec<Worker<R, S>>,
        requests: Vec<R>,
    ) -> Result<Self, PoolError> {
        if workers.is_empty() {
            return Err(PoolError::NoWorkers);
        }

        let mut worker_map = HashMap::with_capacity(workers.len());
        for worker in workers {
            if worker_map.contains_key(&worker.worker_id) {
                return Err(PoolError::DuplicateWorker(worker.worker_id));
            }
            if worker.instances == 0 || worker.instances > MAX_INSTANCES {
                return Err(PoolError::BadInstances {
                    worker: worker.worker_id,
                    instances: worker.instances,
                });
            }
            worker_map.insert(worker.worker_id.clone(), worker);
        }

        let mut queues: WorkerQueues<R> = HashMap::new();
        let mut replicas: HashMap<JobKey, usize> = HashMap::new();
        for req in requests {
            let worker = req.worker_id();
            let job = req.job_id();
            if !worker_map.contains_key(&worker) {
                return Err(PoolError::UnknownWorker { worker, job });
            }
            if job.as_str().is_empty() {
                return Err(PoolError::EmptyJob(job));
            }
            *replicas.entry(job).or_insert(0) += 1;
            queues.entry(worker).or_default().push(Arc::new(req));
        }

        let jobs = replicas
            .into_iter()
            .map(|(job, count)| {
                let (res_tx, res_rx) = mpsc::channel(count);
                let slot = JobSlot {
                    replicas: count,
                    token: parent.child_token(),
                    res_tx,
                    res_rx,
                };
                (job, slot)
            })
            .collect();

        Ok(Self {
            workers: worker_map,
            queues,
            jobs,
        })
    }
}
