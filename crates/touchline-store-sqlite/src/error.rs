//! Error type for `touchline-store-sqlite`.

use thiserror::Error;
use touchline_core::model::FixtureId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] touchline_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A result or status change referred to a fixture that does not exist.
  #[error("fixture not found: {0}")]
  FixtureNotFound(FixtureId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
