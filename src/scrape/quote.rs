//! Pool contracts for quote scraping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::pool::{JobKey, Request, Response, Work, WorkerKey};

use super::extract::{extract, Quote};
use super::fetch::fetch_page;
use super::kind::ScraperKind;
use super::ScrapeError;

/// One replica: fetch a stock's quote from a specific site.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    /// Stock name; the job identifier.
    pub stock: String,
    /// Site the replica is routed to.
    pub kind: ScraperKind,
    /// Quote page URL.
    pub url: String,
}

impl Request for QuoteRequest {
    fn job_id(&self) -> JobKey {
        JobKey::from(self.stock.as_str())
    }

    fn worker_id(&self) -> WorkerKey {
        WorkerKey::from(self.kind.name())
    }
}

/// Outcome of one replica attempt.
#[derive(Debug)]
pub struct QuoteResponse {
    /// Stock name.
    pub stock: String,
    /// Site the replica was routed to.
    pub scraper: ScraperKind,
    /// Page that was fetched.
    pub url: String,
    /// Extracted quote, or the failure.
    pub outcome: Result<Quote, ScrapeError>,
    /// Wall time of the attempt.
    pub elapsed: Duration,
}

impl Response for QuoteResponse {
    fn success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// The pool work callback: fetch the page, extract the quote.
pub struct QuoteWorker {
    client: Client,
    kind: ScraperKind,
}

impl QuoteWorker {
    /// New worker for one site, sharing the process-wide HTTP client.
    pub fn new(client: Client, kind: ScraperKind) -> Self {
        Self { client, kind }
    }
}

#[async_trait]
impl Work<QuoteRequest, QuoteResponse> for QuoteWorker {
    async fn work(&self, token: CancellationToken, req: Arc<QuoteRequest>) -> QuoteResponse {
        let started = Instant::now();
        let outcome = match fetch_page(&self.client, &token, &req.url).await {
            Ok(body) => extract(self.kind, &body),
            Err(err) => Err(err),
        };
        let elapsed = started.elapsed();

        match &outcome {
            Ok(quote) => info!(
                scraper = %self.kind,
                stock = %req.stock,
                price = %quote.price_str,
                date = %quote.date_str,
                elapsed_ms = elapsed.as_millis() as u64,
                "quote retrieved"
            ),
            Err(err) => warn!(
                scraper = %self.kind,
                stock = %req.stock,
                error = %err,
                elapsed_ms = elapsed.as_millis() as u64,
                "quote failed"
            ),
        }

        QuoteResponse {
            stock: req.stock.clone(),
            scraper: self.kind,
            url: req.url.clone(),
            outcome,
            elapsed,
        }
    }
}
