//! Domain records: leagues, bookmakers, fixtures, odds snapshots and results.
//!
//! Every entity read back from the store is one of these typed records; the
//! pipeline never handles loosely-typed rows.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Identifiers ─────────────────────────────────────────────────────────────

macro_rules! row_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
      Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }
  };
}

row_id!(
  /// Surrogate key of a `leagues` row.
  LeagueId
);
row_id!(
  /// Surrogate key of a `bookmakers` row.
  BookmakerId
);
row_id!(
  /// Surrogate key of a `fixtures` row.
  FixtureId
);
row_id!(
  /// Surrogate key of an `odds_snapshots` row.
  SnapshotId
);

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Which source produced an odds snapshot or a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
  /// The paid JSON odds API.
  #[serde(rename = "odds_api")]
  Api,
  /// The scraped odds comparison site.
  #[serde(rename = "oddschecker")]
  Scraped,
  /// Results read off the ESPN scoreboard.
  Espn,
  /// Results typed in by an operator.
  Manual,
}

impl Provenance {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Api => "odds_api",
      Self::Scraped => "oddschecker",
      Self::Espn => "espn",
      Self::Manual => "manual",
    }
  }
}

impl FromStr for Provenance {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "odds_api" => Ok(Self::Api),
      "oddschecker" => Ok(Self::Scraped),
      "espn" => Ok(Self::Espn),
      "manual" => Ok(Self::Manual),
      other => Err(Error::UnknownProvenance(other.to_owned())),
    }
  }
}

impl fmt::Display for Provenance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Leagues & bookmakers ────────────────────────────────────────────────────

/// A competition, keyed by the odds API's sport key (e.g. `soccer_epl`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
  pub league_id: LeagueId,
  pub key:       String,
  pub name:      String,
  pub country:   Option<String>,
}

/// A betting brand as seen by one source.
///
/// Two keys can belong to the same brand (e.g. `betfair_ex_uk` and
/// `betfair_ex_eu`); de-duplication therefore groups by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmaker {
  pub bookmaker_id: BookmakerId,
  pub key:          String,
  pub name:         String,
}

/// The identity a source reports for a bookmaker, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmakerDescriptor {
  pub key:  String,
  pub name: String,
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
  #[default]
  Upcoming,
  Live,
  Completed,
}

impl FixtureStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Upcoming => "upcoming",
      Self::Live => "live",
      Self::Completed => "completed",
    }
  }
}

impl FromStr for FixtureStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "upcoming" => Ok(Self::Upcoming),
      "live" => Ok(Self::Live),
      "completed" => Ok(Self::Completed),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

impl fmt::Display for FixtureStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A scheduled match. `(home_team, away_team, kickoff)` is the natural key
/// and never changes once the row exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
  pub fixture_id:  FixtureId,
  pub league_id:   LeagueId,
  pub home_team:   String,
  pub away_team:   String,
  pub kickoff:     DateTime<Utc>,
  pub status:      FixtureStatus,
  pub external_id: Option<String>,
}

/// A fixture as reported by a source; the input to find-or-create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureDescriptor {
  pub home_team:   String,
  pub away_team:   String,
  pub kickoff:     DateTime<Utc>,
  pub external_id: Option<String>,
}

// ─── Odds ────────────────────────────────────────────────────────────────────

/// Maximum per-component difference still treated as "the same price".
pub const PRICE_TOLERANCE: f64 = 0.001;

/// Decimal prices for the three match outcomes. `draw` may be absent for
/// sources that do not quote it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTriple {
  pub home: f64,
  pub draw: Option<f64>,
  pub away: f64,
}

impl PriceTriple {
  /// `true` when any component moved by more than [`PRICE_TOLERANCE`], or
  /// when the draw price appeared or disappeared.
  pub fn differs_from(&self, other: &PriceTriple) -> bool {
    let moved = |a: f64, b: f64| (a - b).abs() > PRICE_TOLERANCE;
    if moved(self.home, other.home) || moved(self.away, other.away) {
      return true;
    }
    match (self.draw, other.draw) {
      (Some(a), Some(b)) => moved(a, b),
      (None, None) => false,
      _ => true,
    }
  }
}

/// One bookmaker's prices for one fixture at one instant. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsSnapshot {
  pub snapshot_id:  SnapshotId,
  pub fixture_id:   FixtureId,
  pub bookmaker_id: BookmakerId,
  pub prices:       PriceTriple,
  pub provenance:   Provenance,
  pub scraped_at:   DateTime<Utc>,
}

/// A priced row as delivered by a feed: the bookmaker plus one optional
/// price per outcome, already in decimal form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerPrices {
  pub bookmaker: BookmakerDescriptor,
  pub home:      Option<f64>,
  pub draw:      Option<f64>,
  pub away:      Option<f64>,
}

// ─── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
  Home,
  Draw,
  Away,
}

impl Outcome {
  /// The outcome is a pure function of the final score.
  pub fn from_scores(home: u32, away: u32) -> Self {
    match home.cmp(&away) {
      std::cmp::Ordering::Greater => Self::Home,
      std::cmp::Ordering::Less => Self::Away,
      std::cmp::Ordering::Equal => Self::Draw,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Home => "home",
      Self::Draw => "draw",
      Self::Away => "away",
    }
  }
}

impl FromStr for Outcome {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "home" => Ok(Self::Home),
      "draw" => Ok(Self::Draw),
      "away" => Ok(Self::Away),
      other => Err(Error::UnknownOutcome(other.to_owned())),
    }
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Final score of a fixture. At most one per fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
  pub fixture_id:  FixtureId,
  pub home_score:  u32,
  pub away_score:  u32,
  pub outcome:     Outcome,
  pub provenance:  Provenance,
  pub recorded_at: DateTime<Utc>,
}

/// Input to the result-writing store operations. The outcome is derived and
/// `recorded_at` is assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewResult {
  pub home_score: u32,
  pub away_score: u32,
  pub provenance: Provenance,
}

impl NewResult {
  pub fn outcome(&self) -> Outcome {
    Outcome::from_scores(self.home_score, self.away_score)
  }
}
