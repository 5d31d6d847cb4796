//! Execution pipeline: producers, worker instances, collectors, output.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::dispatch::{Dispatcher, JobSlot};
use super::distribute;
use super::error::PoolError;
use super::types::{JobKey, Request, Response, Schedule, Worker};

/// One unit handed to a worker instance: the request plus its job's
/// cancellation scope and response funnel.
struct Task<R, S> {
    token: CancellationToken,
    res_tx: mpsc::Sender<S>,
    req: Arc<R>,
}

/// Run every request through its worker kind and yield one response per
/// job on the returned channel: the first success, or the last failure
/// when no replica succeeds.
///
/// Validation happens up front; on success the pipeline is already running
/// when this returns. The channel is closed once all jobs have produced
/// their response. Callers must drain it to completion (or cancel
/// `parent`): the output is unbuffered and collectors block on it once it
/// backs up. An empty request set yields an already-closed channel.
///
/// Cancelling `parent` stops all jobs: in-flight work observes its token,
/// the remaining responses drain, and the channel closes.
///
/// Queues are reordered with [`Schedule::Spread`]; use
/// [`execute_with_schedule`] to choose otherwise.
///
/// Must be called from within a Tokio runtime.
pub fn execute<R, S>(
    parent: &CancellationToken,
    workers: Vec<Worker<R, S>>,
    requests: Vec<R>,
) -> Result<mpsc::Receiver<S>, PoolError>
where
    R: Request,
    S: Response,
{
    execute_with_schedule(parent, workers, requests, Schedule::default())
}

/// Same as [`execute`], with an explicit queue ordering.
pub fn execute_with_schedule<R, S>(
    parent: &CancellationToken,
    workers: Vec<Worker<R, S>>,
    requests: Vec<R>,
    schedule: Schedule,
) -> Result<mpsc::Receiver<S>, PoolError>
where
    R: Request,
    S: Response,
{
    let Dispatcher {
        workers,
        mut queues,
        jobs,
    } = Dispatcher::new(parent, workers, requests)?;

    let (out_tx, out_rx) = mpsc::channel(1);
    if jobs.is_empty() {
        return Ok(out_rx);
    }

    debug!(
        workers = queues.len(),
        jobs = jobs.len(),
        requests = queues.values().map(Vec::len).sum::<usize>(),
        ?schedule,
        "starting worker pool"
    );

    distribute::reorder(&mut queues, schedule);

    // Task streams: one per worker kind holding requests, fed in queue
    // order by a single producer, consumed by `instances` parallel
    // instances. The stream is unbuffered so producers provide natural
    // backpressure.
    for (worker_id, queue) in queues {
        let Some(worker) = workers.get(&worker_id) else {
            continue;
        };

        let feed: Vec<Task<R, S>> = queue
            .into_iter()
            .filter_map(|req| {
                let slot = jobs.get(&req.job_id())?;
                Some(Task {
                    token: slot.token.clone(),
                    res_tx: slot.res_tx.clone(),
                    req,
                })
            })
            .collect();

        let (task_tx, task_rx) = mpsc::channel::<Task<R, S>>(1);
        tokio::spawn(async move {
            for task in feed {
                if task_tx.send(task).await.is_err() {
                    break;
                }
            }
        });

        let task_rx = Arc::new(Mutex::new(task_rx));
        for instance in 0..worker.instances {
            let task_rx = Arc::clone(&task_rx);
            let work = Arc::clone(&worker.work);
            let worker_id = worker_id.clone();
            tokio::spawn(async move {
                loop {
                    let task = { task_rx.lock().await.recv().await };
                    let Some(task) = task else {
                        break;
                    };
                    trace!(worker = %worker_id, instance, job = %task.req.job_id(), "task picked up");
                    let res = work.work(task.token.clone(), Arc::clone(&task.req)).await;
                    // Channel capacity equals the replica count: the send
                    // cannot block. It fails only when the collector is
                    // already gone.
                    let _ = task.res_tx.send(res).await;
                }
            });
        }
    }

    // One collector per job, plus the umbrella task that owns the JoinSet
    // and closes the output after the last collector returns.
    let mut collectors = JoinSet::new();
    for (job, slot) in jobs {
        collectors.spawn(collect(job, slot, out_tx.clone()));
    }
    drop(out_tx);
    tokio::spawn(async move {
        while collectors.join_next().await.is_some() {}
        debug!("all collectors finished, output closed");
    });

    Ok(out_rx)
}

/// Consume all of a job's replica responses and forward the winner.
///
/// The winner is the first successful response, or the last response of
/// the job when none succeeds. Responses arriving after the winner are
/// drained and discarded so that the instances that produced them can move
/// on. Exactly `replicas` responses are consumed unless a worker task
/// disappears without responding, in which case the collector exits early
/// instead of waiting forever.
async fn collect<S: Response>(job: JobKey, slot: JobSlot<S>, out_tx: mpsc::Sender<S>) {
    let JobSlot {
        replicas,
        token,
        res_tx,
        mut res_rx,
    } = slot;
    // The task-held clones must be the only remaining senders, otherwise a
    // lost worker task could never be detected.
    drop(res_tx);

    let mut remaining = replicas;
    let mut chosen = false;
    let mut cancelled = false;

    while remaining > 0 {
        tokio::select! {
            res = res_rx.recv() => {
                let Some(res) = res else {
                    debug!(job = %job, remaining, "response channel closed early");
                    break;
                };
                remaining -= 1;
                if !chosen && (res.success() || remaining == 0) {
                    chosen = true;
                    token.cancel();
                    trace!(job = %job, remaining, "job decided");
                    let _ = out_tx.send(res).await;
                }
            }
            _ = token.cancelled(), if !cancelled => {
                cancelled = true;
                token.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::super::types::{Work, WorkerKey};
    use super::*;

    struct Req {
        job: &'static str,
        worker: &'static str,
    }

    impl Request for Req {
        fn job_id(&self) -> JobKey {
            JobKey::from(self.job)
        }

        fn worker_id(&self) -> WorkerKey {
            WorkerKey::from(self.worker)
        }
    }

    struct Res(bool);

    impl Response for Res {
        fn success(&self) -> bool {
            self.0
        }
    }

    struct Instant;

    #[async_trait]
    impl Work<Req, Res> for Instant {
        async fn work(&self, _token: CancellationToken, _req: Arc<Req>) -> Res {
            Res(true)
        }
    }

    #[test]
    fn empty_request_set_yields_closed_channel() {
        tokio_test::block_on(async {
            let token = CancellationToken::new();
            let workers = vec![Worker::new("a", 1, Instant)];
            let mut out = execute(&token, workers, Vec::<Req>::new()).unwrap();
            assert!(out.recv().await.is_none());
        });
    }

    #[test]
    fn validation_runs_before_the_empty_request_short_circuit() {
        tokio_test::block_on(async {
            let token = CancellationToken::new();
            let err = execute(&token, Vec::<Worker<Req, Res>>::new(), Vec::new())
                .err()
                .unwrap();
            assert_eq!(err, PoolError::NoWorkers);
        });
    }

    #[test]
    fn single_replica_round_trip() {
        tokio_test::block_on(async {
            let token = CancellationToken::new();
            let workers = vec![Worker::new("a", 1, Instant)];
            let requests = vec![Req { job: "j1", worker: "a" }];
            let mut out = execute(&token, workers, requests).unwrap();
            assert!(out.recv().await.map(|res| res.success()).unwrap_or(false));
            assert!(out.recv().await.is_none());
        });
    }
}
