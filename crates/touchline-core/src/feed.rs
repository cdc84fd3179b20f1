//! Fetch-side collaborators: anything that yields odds or final scores.
//!
//! The paid API and the scraped site both implement [`OddsFeed`] and must
//! yield the same shape; only the API implements [`ScoresFeed`].

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  league::LeagueInfo,
  model::{BookmakerPrices, FixtureDescriptor, Provenance},
};

/// One fixture and every bookmaker row quoted for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
  pub fixture: FixtureDescriptor,
  pub prices:  Vec<BookmakerPrices>,
}

/// A completed fixture with its final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedScore {
  pub fixture:    FixtureDescriptor,
  pub home_score: u32,
  pub away_score: u32,
}

pub trait OddsFeed: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Tag written on every snapshot this feed produces.
  fn provenance(&self) -> Provenance;

  /// Current odds for every listed fixture in `league`.
  fn fetch_odds<'a>(
    &'a self,
    league: &'a LeagueInfo,
  ) -> impl Future<Output = Result<Vec<FeedEvent>, Self::Error>> + Send + 'a;
}

pub trait ScoresFeed: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Completed fixtures in `league` from the last `days_from` days.
  fn fetch_scores<'a>(
    &'a self,
    league: &'a LeagueInfo,
    days_from: u32,
  ) -> impl Future<Output = Result<Vec<FeedScore>, Self::Error>> + Send + 'a;
}
