use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("odds API key not set (configure odds_api_key or ODDS_API_KEY)")]
  MissingApiKey,

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} returned {status}")]
  Status { url: String, status: StatusCode },

  #[error("malformed JSON response: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
