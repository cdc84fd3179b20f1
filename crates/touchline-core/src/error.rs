//! Error types for `touchline-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown provenance tag: {0:?}")]
  UnknownProvenance(String),

  #[error("unknown fixture status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown outcome: {0:?}")]
  UnknownOutcome(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
