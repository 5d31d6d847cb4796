//! Replicated-job worker pool.
//!
//! A *job* is a logical unit of work satisfied by the first of its
//! *replicas* that succeeds. Each replica is a [`Request`] routed to a
//! [`Worker`] kind with a bounded number of parallel instances. [`execute`]
//! runs every request, cancels the losing replicas of each job as soon as a
//! winner is known, and yields exactly one [`Response`] per job on the
//! returned channel: the first success, or the last failure when every
//! replica fails.
//!
//! Before execution, each worker's request queue is reordered so that jobs
//! with few replicas are attempted as early as possible (see
//! [`Schedule`]).
//!
//! The pool is generic over the request and response types; it never looks
//! at payloads beyond the [`Request`] and [`Response`] contracts.

mod dispatch;
mod distribute;
mod error;
mod execute;
mod types;

pub use error::PoolError;
pub use execute::{execute, execute_with_schedule};
pub use types::{JobKey, Request, Response, Schedule, Work, Worker, WorkerKey, MAX_INSTANCES};
