//! HTTP retrieval with cooperative cancellation.

use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::ScrapeError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client shared by all scraper workers.
pub fn client() -> Result<Client, ScrapeError> {
    let client = Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("getquotes/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Fetch a quote page, racing the request against the job's cancellation.
///
/// Returns [`ScrapeError::Cancelled`] when the token fires first; the
/// in-flight request is dropped in that case.
pub async fn fetch_page(
    client: &Client,
    token: &CancellationToken,
    url: &str,
) -> Result<String, ScrapeError> {
    let fetch = async {
        let resp = client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_owned(),
                status,
            });
        }
        let body = resp.text().await?;
        Ok(body)
    };

    tokio::select! {
        _ = token.cancelled() => Err(ScrapeError::Cancelled),
        res = fetch => res,
    }
}
