//! Observable effects of request distribution.
//!
//! Single-instance workers consume their queue in order, so the first
//! request each worker executes is the head of its reordered queue.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use getquotes::pool::{execute, JobKey, Request, Response, Work, Worker, WorkerKey};

#[derive(Debug, Clone)]
struct TestRequest {
    job: &'static str,
    worker: &'static str,
}

impl Request for TestRequest {
    fn job_id(&self) -> JobKey {
        JobKey::from(self.job)
    }

    fn worker_id(&self) -> WorkerKey {
        WorkerKey::from(self.worker)
    }
}

struct TestResponse;

impl Response for TestResponse {
    fn success(&self) -> bool {
        true
    }
}

/// Records every invocation as (worker, job), in pick-up order.
struct RecordingWork {
    log: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl Work<TestRequest, TestResponse> for RecordingWork {
    async fn work(&self, _token: CancellationToken, req: Arc<TestRequest>) -> TestResponse {
        if let Ok(mut log) = self.log.lock() {
            log.push((req.worker.to_owned(), req.job.to_owned()));
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        TestResponse
    }
}

#[tokio::test]
async fn every_worker_opens_with_a_distinct_job() {
    let token = CancellationToken::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let workers = ["w1", "w2", "w3"]
        .into_iter()
        .map(|id| {
            Worker::new(
                id,
                1,
                RecordingWork {
                    log: Arc::clone(&log),
                },
            )
        })
        .collect();

    let fixture: &[(&'static str, &'static [&'static str])] = &[
        ("w1", &["j1", "j2", "j4", "j6", "j9"]),
        ("w2", &["j1", "j2", "j4", "j6", "j8"]),
        ("w3", &["j1", "j3", "j5", "j7", "j8"]),
    ];
    let requests: Vec<TestRequest> = fixture
        .iter()
        .copied()
        .flat_map(|(worker, jobs)| {
            jobs.iter()
                .copied()
                .map(move |job| TestRequest { job, worker })
        })
        .collect();

    let mut out = execute(&token, workers, requests).unwrap();
    let results = timeout(Duration::from_secs(5), async {
        let mut count = 0;
        while out.recv().await.is_some() {
            count += 1;
        }
        count
    })
    .await
    .unwrap();

    assert_eq!(results, 9, "one response per distinct job");

    // First job each worker picked up = head of its reordered queue.
    let log = log.lock().unwrap();
    let mut first_job: HashMap<&str, &str> = HashMap::new();
    for (worker, job) in log.iter() {
        first_job.entry(worker.as_str()).or_insert(job.as_str());
    }
    assert_eq!(first_job.len(), 3);

    let heads: HashSet<&str> = first_job.values().copied().collect();
    assert_eq!(
        heads.len(),
        3,
        "the three queue heads should belong to three distinct jobs: {first_job:?}"
    );
}
