//! Quote scraping: site registry, fetch, extraction, and the pool wiring.
//!
//! This module is the domain side of the crate. The [`pool`](crate::pool)
//! never inspects quote payloads; everything it needs to know about stocks
//! and sites is expressed here through the pool's
//! [`Request`](crate::pool::Request), [`Response`](crate::pool::Response)
//! and [`Work`](crate::pool::Work) contracts.

mod extract;
mod fetch;
mod kind;
mod quote;
mod runner;

pub use extract::{extract, Quote};
pub use fetch::{client, fetch_page};
pub use kind::ScraperKind;
pub use quote::{QuoteRequest, QuoteResponse, QuoteWorker};
pub use runner::{run, Scraper, Source, Stock, MAX_SCRAPER_WORKERS};

use thiserror::Error;

/// Errors produced while configuring or performing a scrape.
///
/// Fetch and extraction failures travel inside [`QuoteResponse`] as the
/// outcome of one replica; they are not surfaced as top-level errors.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// A scraper name absent from the registry.
    #[error("unknown scraper: {0:?}")]
    UnknownScraper(String),

    /// No registered site matches the URL.
    #[error("cannot resolve scraper from url: {0:?}")]
    UnknownSite(String),

    /// Transport-level fetch failure.
    #[error("fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The site answered with a non-success status.
    #[error("unexpected status {status} for {url}")]
    Status {
        /// The fetched URL.
        url: String,
        /// The HTTP status received.
        status: reqwest::StatusCode,
    },

    /// The page did not contain a recognizable price.
    #[error("price not found in {0} page")]
    PriceNotFound(ScraperKind),

    /// The page did not contain a recognizable date.
    #[error("date not found in {0} page")]
    DateNotFound(ScraperKind),

    /// Price text that does not parse.
    #[error("bad price: {0:?}")]
    BadPrice(String),

    /// Date text that does not parse.
    #[error("bad date: {0:?}")]
    BadDate(String),

    /// The replica was cancelled before it completed.
    #[error("cancelled")]
    Cancelled,
}
