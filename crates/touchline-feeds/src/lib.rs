//! HTTP-backed odds and result sources.
//!
//! - [`odds_api::OddsApiClient`]: the paid JSON odds API (odds, scores, quota).
//! - [`oddschecker::OddscheckerScraper`]: the odds comparison site, parsed
//!   from static HTML.
//! - [`espn::EspnClient`]: the public scoreboard, parsed into result reports.

pub mod error;
pub mod espn;
mod html;
pub mod odds_api;
pub mod oddschecker;
mod rate_limit;

use std::time::Duration;

pub use error::{Error, Result};

/// Sent on every scraped page request; the sites reject obvious bots.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
   AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn http_client() -> Result<reqwest::Client> {
  Ok(
    reqwest::Client::builder()
      .user_agent(USER_AGENT)
      .timeout(REQUEST_TIMEOUT)
      .build()?,
  )
}

/// Fetch `url` and return the body, failing on any non-success status.
async fn get_text(client: &reqwest::Client, url: &str) -> Result<String> {
  let resp = client.get(url).send().await?;
  let status = resp.status();
  if !status.is_success() {
    return Err(Error::Status { url: url.to_owned(), status });
  }
  Ok(resp.text().await?)
}
