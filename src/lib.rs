//! # getquotes
//!
//! Concurrent retrieval of stock quotes from multiple web sources.
//!
//! ## Overview
//!
//! Every stock (a *job*) is configured with one or more quote sources
//! (*replicas*), each routed to a scraper for a specific site (a *worker
//! kind*). All replicas of a job run in parallel, bounded by per-scraper
//! instance limits; the first replica that succeeds wins and the remaining
//! replicas of the same job are cancelled. When no replica succeeds, the
//! last failure is reported for the job.
//!
//! ## Modules
//!
//! - [`pool`] — the generic replicated-job worker pool: validation, request
//!   distribution, and the execution pipeline.
//! - [`scrape`] — the quote domain: site registry, HTTP fetch with
//!   cancellation, per-site extraction, and the runner wiring it all to the
//!   pool.
//! - [`config`] — TOML configuration of scrapers and stocks.
//! - [`viewer`] — post-processing of the JSON log into sessions, plus the
//!   HTTP API served by the `viewlog` binary.

#![warn(missing_docs)]

use thiserror::Error;

/// Result type for getquotes operations.
pub type Result<T> = std::result::Result<T, GetQuotesError>;

/// Main error type for getquotes operations.
#[derive(Error, Debug)]
pub enum GetQuotesError {
    /// Worker pool validation error.
    #[error("pool error: {0}")]
    Pool(#[from] pool::PoolError),

    /// Scraping error.
    #[error("scrape error: {0}")]
    Scrape(#[from] scrape::ScrapeError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Log viewer error.
    #[error("viewer error: {0}")]
    Viewer(#[from] viewer::ViewerError),
}

/// Replicated-job worker pool.
pub mod pool;

/// Quote scraping and the pool wiring for it.
pub mod scrape;

/// TOML configuration loading.
pub mod config;

/// Log sessions and their HTTP API.
pub mod viewer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_by_value() {
        let a = pool::WorkerKey::from("borsaitaliana");
        let b = pool::WorkerKey::from(String::from("borsaitaliana"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "borsaitaliana");
    }

    #[test]
    fn crate_error_wraps_module_errors() {
        let err: GetQuotesError = pool::PoolError::NoWorkers.into();
        assert!(matches!(err, GetQuotesError::Pool(_)));
    }
}
