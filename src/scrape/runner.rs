//! Mapping configured scrapers and stocks onto the pool.

use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::pool::{self, JobKey, PoolError, Schedule, Worker};

use super::fetch;
use super::kind::ScraperKind;
use super::quote::{QuoteRequest, QuoteResponse, QuoteWorker};

/// Upper bound on the parallel instances of one scraper.
pub const MAX_SCRAPER_WORKERS: usize = 10;

/// A configured scraper: site plus parallelism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scraper {
    /// The site this scraper handles.
    pub kind: ScraperKind,
    /// Requested parallel instances; clamped to
    /// `1..=MAX_SCRAPER_WORKERS` at run time.
    pub workers: usize,
}

/// A stock to quote, with its replica sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stock {
    /// Unique stock name; the job identifier.
    pub name: String,
    /// ISIN code, when configured.
    pub isin: String,
    /// Free-form description.
    pub description: String,
    /// Quote sources; each one becomes a replica.
    pub sources: Vec<Source>,
}

/// One replica source for a stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Site to fetch from.
    pub kind: ScraperKind,
    /// Quote page URL.
    pub url: String,
}

/// Fetch a quote for every stock.
///
/// Builds one pool worker per configured scraper and one request per stock
/// source, then runs the pool to completion: exactly one [`QuoteResponse`]
/// per stock, in arrival order. A stock with no sources is rejected with
/// [`PoolError::EmptyJob`] before anything runs.
pub async fn run(
    token: &CancellationToken,
    scrapers: &[Scraper],
    stocks: &[Stock],
    schedule: Schedule,
) -> crate::Result<Vec<QuoteResponse>> {
    let client = fetch::client()?;

    let workers: Vec<Worker<QuoteRequest, QuoteResponse>> = scrapers
        .iter()
        .map(|scraper| {
            let instances = scraper.workers.clamp(1, MAX_SCRAPER_WORKERS);
            Worker::new(
                scraper.kind.name(),
                instances,
                QuoteWorker::new(client.clone(), scraper.kind),
            )
        })
        .collect();

    let mut requests = Vec::new();
    for stock in stocks {
        if stock.sources.is_empty() {
            return Err(PoolError::EmptyJob(JobKey::from(stock.name.as_str())).into());
        }
        for source in &stock.sources {
            requests.push(QuoteRequest {
                stock: stock.name.clone(),
                kind: source.kind,
                url: source.url.clone(),
            });
        }
    }
    debug!(stocks = stocks.len(), requests = requests.len(), "running scrape");

    let out = pool::execute_with_schedule(token, workers, requests, schedule)?;
    let results: Vec<QuoteResponse> = ReceiverStream::new(out).collect().await;
    Ok(results)
}
