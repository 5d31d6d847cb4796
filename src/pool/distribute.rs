//! Request-queue reordering.
//!
//! Workers consume their queues head-to-tail. With the input ordering, a
//! job whose replicas all sit near the tail of busy queues is not attempted
//! until everything ahead of it has run. Reordering spreads each job's
//! replicas across the timeline so that every job has at least one replica
//! in flight as early as possible.

use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::SliceRandom;
use smallvec::SmallVec;

use super::types::{JobKey, Request, Schedule, WorkerKey};

/// Per-worker ordered request queues.
pub(crate) type WorkerQueues<R> = HashMap<WorkerKey, Vec<Arc<R>>>;

/// Reorder every queue according to the chosen schedule.
pub(crate) fn reorder<R: Request>(queues: &mut WorkerQueues<R>, schedule: Schedule) {
    match schedule {
        Schedule::Spread => spread(queues),
        Schedule::Random => shuffle(queues),
    }
}

fn shuffle<R: Request>(queues: &mut WorkerQueues<R>) {
    let mut rng = rand::thread_rng();
    for queue in queues.values_mut() {
        queue.shuffle(&mut rng);
    }
}

/// Spread each job's replicas across the timeline, scarce jobs first.
///
/// Each pass walks the jobs still waiting, ordered by ascending number of
/// candidate workers (ties by job key, so the result is deterministic), and
/// moves one replica of every job to the worker whose reordered queue is
/// currently shortest. A worker already used for a job in the current pass
/// is not reused for it.
fn spread<R: Request>(queues: &mut WorkerQueues<R>) {
    let mut dst: WorkerQueues<R> = queues.keys().map(|w| (w.clone(), Vec::new())).collect();

    loop {
        // Jobs still waiting, each with the workers holding its replicas.
        let mut job_workers: HashMap<JobKey, SmallVec<[WorkerKey; 4]>> = HashMap::new();
        for (worker, queue) in queues.iter() {
            for req in queue {
                job_workers.entry(req.job_id()).or_default().push(worker.clone());
            }
        }
        if job_workers.is_empty() {
            break;
        }
        for candidates in job_workers.values_mut() {
            candidates.sort();
        }

        let mut order: Vec<(usize, JobKey)> = job_workers
            .iter()
            .map(|(job, workers)| (workers.len(), job.clone()))
            .collect();
        order.sort();

        for (_, job) in order {
            let Some(candidates) = job_workers.get_mut(&job) else {
                continue;
            };
            if candidates.is_empty() {
                continue;
            }

            // Shortest destination queue wins; first in key order on ties.
            let mut pick = 0;
            let mut best = usize::MAX;
            for (i, worker) in candidates.iter().enumerate() {
                let len = dst.get(worker).map_or(0, Vec::len);
                if len < best {
                    best = len;
                    pick = i;
                }
            }
            let worker = candidates.swap_remove(pick);

            // Move one replica of `job` from the source queue to the tail of
            // the destination queue. Source order no longer matters, so the
            // removal swaps with the last element.
            let Some(queue) = queues.get_mut(&worker) else {
                continue;
            };
            let Some(pos) = queue.iter().position(|req| req.job_id() == job) else {
                continue;
            };
            let req = queue.swap_remove(pos);
            dst.entry(worker).or_default().push(req);
        }
    }

    *queues = dst;
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use proptest::prelude::*;

    use super::*;

    #[derive(Debug)]
    struct Req {
        job: String,
        worker: String,
    }

    impl Request for Req {
        fn job_id(&self) -> JobKey {
            JobKey::from(self.job.as_str())
        }

        fn worker_id(&self) -> WorkerKey {
            WorkerKey::from(self.worker.as_str())
        }
    }

    fn queues(spec: &[(&str, &[&str])]) -> WorkerQueues<Req> {
        spec.iter()
            .map(|(worker, jobs)| {
                let queue = jobs
                    .iter()
                    .map(|job| {
                        Arc::new(Req {
                            job: (*job).to_owned(),
                            worker: (*worker).to_owned(),
                        })
                    })
                    .collect();
                (WorkerKey::from(*worker), queue)
            })
            .collect()
    }

    fn jobs_of(queues: &WorkerQueues<Req>, worker: &str) -> Vec<String> {
        queues[&WorkerKey::from(worker)]
            .iter()
            .map(|req| req.job.clone())
            .collect()
    }

    #[test]
    fn first_positions_cover_distinct_jobs() {
        let mut queues = queues(&[
            ("w1", &["j1", "j2", "j4", "j6", "j9"]),
            ("w2", &["j1", "j2", "j4", "j6", "j8"]),
            ("w3", &["j1", "j3", "j5", "j7", "j8"]),
        ]);
        spread(&mut queues);

        let heads: HashSet<String> = queues
            .values()
            .map(|queue| queue[0].job.clone())
            .collect();
        assert_eq!(heads.len(), 3, "every worker should open with a different job");
    }

    #[test]
    fn scarce_jobs_come_before_abundant_ones() {
        // j3, j5, j7 exist only on w3; all of them must be scheduled ahead
        // of w3's replica of the three-way job j1.
        let mut queues = queues(&[
            ("w1", &["j1", "j2", "j4", "j6", "j9"]),
            ("w2", &["j1", "j2", "j4", "j6", "j8"]),
            ("w3", &["j1", "j3", "j5", "j7", "j8"]),
        ]);
        spread(&mut queues);

        let w3 = jobs_of(&queues, "w3");
        let pos = |job: &str| w3.iter().position(|j| j == job).unwrap();
        assert!(pos("j3") < pos("j1"));
        assert!(pos("j5") < pos("j1"));
        assert!(pos("j7") < pos("j1"));
    }

    #[test]
    fn preserves_per_worker_multisets() {
        let spec: &[(&str, &[&str])] = &[
            ("w1", &["j1", "j1", "j2", "j2", "j2"]),
            ("w2", &["j2", "j3"]),
            ("w3", &[]),
        ];
        let mut reordered = queues(spec);
        spread(&mut reordered);

        for (worker, jobs) in spec {
            let mut expected: Vec<String> = jobs.iter().map(|j| (*j).to_owned()).collect();
            let mut actual = jobs_of(&reordered, worker);
            expected.sort();
            actual.sort();
            assert_eq!(actual, expected, "worker {worker} queue changed content");
        }
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let spec: &[(&str, &[&str])] = &[
            ("w1", &["j1", "j2", "j3"]),
            ("w2", &["j1", "j2", "j3"]),
        ];
        let mut first = queues(spec);
        let mut second = queues(spec);
        spread(&mut first);
        spread(&mut second);
        assert_eq!(jobs_of(&first, "w1"), jobs_of(&second, "w1"));
        assert_eq!(jobs_of(&first, "w2"), jobs_of(&second, "w2"));
    }

    proptest! {
        #[test]
        fn spread_is_a_per_worker_permutation(
            assignment in proptest::collection::vec((0usize..5, 0usize..4), 0..60)
        ) {
            let mut queues: WorkerQueues<Req> = HashMap::new();
            for w in 0..4 {
                queues.insert(WorkerKey::from(format!("w{w}")), Vec::new());
            }
            for (job, worker) in assignment {
                let worker_name = format!("w{worker}");
                let req = Arc::new(Req {
                    job: format!("j{job}"),
                    worker: worker_name.clone(),
                });
                if let Some(queue) = queues.get_mut(&WorkerKey::from(worker_name)) {
                    queue.push(req);
                }
            }

            let counts = |queues: &WorkerQueues<Req>| -> HashMap<(String, String), usize> {
                let mut counts = HashMap::new();
                for (worker, queue) in queues {
                    for req in queue {
                        *counts
                            .entry((worker.to_string(), req.job.clone()))
                            .or_insert(0) += 1;
                    }
                }
                counts
            };

            let before = counts(&queues);
            spread(&mut queues);
            let after = counts(&queues);
            prop_assert_eq!(before, after);
        }
    }
}
