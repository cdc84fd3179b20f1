//! The `OddsStore` trait and supporting query/record types.
//!
//! The trait is implemented by storage backends (e.g.
//! `touchline-store-sqlite`). The collection pipeline, the reconciler and the
//! exporters depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  league::LeagueInfo,
  model::{
    Bookmaker, BookmakerDescriptor, BookmakerId, Fixture, FixtureDescriptor,
    FixtureId, FixtureStatus, League, LeagueId, MatchResult, NewResult,
    OddsSnapshot, Outcome, PriceTriple, Provenance,
  },
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`OddsStore::list_fixtures`].
#[derive(Debug, Clone, Default)]
pub struct FixtureQuery {
  pub status:       Option<FixtureStatus>,
  /// Inclusive lower bound on kick-off.
  pub kickoff_from: Option<DateTime<Utc>>,
  /// Inclusive upper bound on kick-off.
  pub kickoff_to:   Option<DateTime<Utc>>,
  /// Order by kick-off descending instead of ascending. Ties always break on
  /// the fixture id in the same direction.
  pub newest_first: bool,
  pub limit:        Option<usize>,
}

impl FixtureQuery {
  pub fn with_status(status: FixtureStatus) -> Self {
    Self { status: Some(status), ..Self::default() }
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A snapshot paired with the bookmaker that quoted it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmakerOdds {
  pub bookmaker: Bookmaker,
  pub snapshot:  OddsSnapshot,
}

/// A fixture that has a recorded result, with its league name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedFixture {
  pub fixture: Fixture,
  pub league:  String,
  pub result:  MatchResult,
}

/// One odds snapshot joined with everything known about its fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRecord {
  pub snapshot:  OddsSnapshot,
  pub bookmaker: Bookmaker,
  pub fixture:   Fixture,
  pub league:    League,
  pub result:    Option<MatchResult>,
}

/// One row of the `odds_vs_results` view: a completed fixture against the
/// last snapshot each bookmaker took before the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsVsResult {
  pub home_team:    String,
  pub away_team:    String,
  pub kickoff:      DateTime<Utc>,
  pub league:       String,
  pub home_score:   u32,
  pub away_score:   u32,
  pub outcome:      Outcome,
  pub bookmaker:    String,
  pub prices:       PriceTriple,
  /// The price on the outcome that actually happened.
  pub winning_odds: Option<f64>,
}

/// Average winning price per bookmaker across completed fixtures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmakerStat {
  pub bookmaker:        String,
  pub avg_winning_odds: f64,
  pub matches:          u64,
}

/// What [`OddsStore::ingest_odds`] did for one fetched fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
  pub fixture_id:        FixtureId,
  pub snapshots_written: usize,
  pub unchanged:         usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Touchline odds store backend.
///
/// Leagues, bookmakers and fixtures are find-or-create by natural key. Odds
/// snapshots are append-only. Results are one per fixture and replaceable.
///
/// Methods documented as *atomic* run as a single storage transaction: on
/// error none of their writes persist.
pub trait OddsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reference data ──────────────────────────────────────────────────────

  /// Look up a league by key, creating it from `info` on first reference.
  fn get_or_create_league(
    &self,
    info: LeagueInfo,
  ) -> impl Future<Output = Result<League, Self::Error>> + Send + '_;

  /// Look up a bookmaker by key, creating it on first reference.
  fn get_or_create_bookmaker(
    &self,
    bookmaker: BookmakerDescriptor,
  ) -> impl Future<Output = Result<Bookmaker, Self::Error>> + Send + '_;

  fn list_leagues(
    &self,
  ) -> impl Future<Output = Result<Vec<League>, Self::Error>> + Send + '_;

  /// All bookmakers ordered by display name.
  fn list_bookmakers(
    &self,
  ) -> impl Future<Output = Result<Vec<Bookmaker>, Self::Error>> + Send + '_;

  // ── Fixtures ────────────────────────────────────────────────────────────

  /// Find a fixture by `(home_team, away_team, kickoff)` or create it under
  /// `league_id`. An existing fixture without an external id adopts the one
  /// supplied; nothing else about it changes.
  fn get_or_create_fixture(
    &self,
    league_id: LeagueId,
    fixture: FixtureDescriptor,
  ) -> impl Future<Output = Result<Fixture, Self::Error>> + Send + '_;

  fn get_fixture(
    &self,
    fixture_id: FixtureId,
  ) -> impl Future<Output = Result<Option<Fixture>, Self::Error>> + Send + '_;

  fn list_fixtures(
    &self,
    query: FixtureQuery,
  ) -> impl Future<Output = Result<Vec<Fixture>, Self::Error>> + Send + '_;

  fn set_fixture_status(
    &self,
    fixture_id: FixtureId,
    status: FixtureStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Odds snapshots ──────────────────────────────────────────────────────

  /// `true` when there is no previous snapshot for the pair, or when
  /// `prices` differs from the latest one beyond the price tolerance.
  fn odds_changed(
    &self,
    fixture_id: FixtureId,
    bookmaker_id: BookmakerId,
    prices: PriceTriple,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Append a snapshot unconditionally.
  fn insert_snapshot(
    &self,
    fixture_id: FixtureId,
    bookmaker_id: BookmakerId,
    prices: PriceTriple,
    provenance: Provenance,
  ) -> impl Future<Output = Result<OddsSnapshot, Self::Error>> + Send + '_;

  /// *Atomic.* Find-or-create the league, fixture and every bookmaker, then
  /// append a snapshot for each row whose prices changed.
  fn ingest_odds(
    &self,
    league: LeagueInfo,
    fixture: FixtureDescriptor,
    rows: Vec<(BookmakerDescriptor, PriceTriple)>,
    provenance: Provenance,
  ) -> impl Future<Output = Result<IngestReport, Self::Error>> + Send + '_;

  /// Most recent snapshot per bookmaker for a fixture, ordered by bookmaker
  /// name.
  fn latest_odds(
    &self,
    fixture_id: FixtureId,
  ) -> impl Future<Output = Result<Vec<BookmakerOdds>, Self::Error>> + Send + '_;

  /// Every snapshot ever taken for a fixture, oldest first.
  fn fixture_snapshots(
    &self,
    fixture_id: FixtureId,
  ) -> impl Future<Output = Result<Vec<BookmakerOdds>, Self::Error>> + Send + '_;

  /// Every snapshot in the store joined with its context, ordered by capture
  /// time, fixture and bookmaker name.
  fn snapshot_history(
    &self,
  ) -> impl Future<Output = Result<Vec<SnapshotRecord>, Self::Error>> + Send + '_;

  // ── Results ─────────────────────────────────────────────────────────────

  fn get_result(
    &self,
    fixture_id: FixtureId,
  ) -> impl Future<Output = Result<Option<MatchResult>, Self::Error>> + Send + '_;

  /// *Atomic.* Insert or replace the fixture's result and mark it completed.
  fn upsert_result(
    &self,
    fixture_id: FixtureId,
    result: NewResult,
  ) -> impl Future<Output = Result<MatchResult, Self::Error>> + Send + '_;

  /// *Atomic.* Write the result and mark the fixture completed only if no
  /// result exists yet. Returns `None` when one was already recorded.
  fn record_result_if_absent(
    &self,
    fixture_id: FixtureId,
    result: NewResult,
  ) -> impl Future<Output = Result<Option<MatchResult>, Self::Error>> + Send + '_;

  /// *Atomic.* Find-or-create the league and fixture from a source's own
  /// descriptor, then upsert its result.
  fn record_final_score(
    &self,
    league: LeagueInfo,
    fixture: FixtureDescriptor,
    result: NewResult,
  ) -> impl Future<Output = Result<MatchResult, Self::Error>> + Send + '_;

  /// Completed fixtures with their results, latest kick-off first.
  fn recent_results(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<CompletedFixture>, Self::Error>> + Send + '_;

  // ── Analysis ────────────────────────────────────────────────────────────

  /// Rows of the `odds_vs_results` view, latest kick-off first.
  fn odds_vs_results(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<OddsVsResult>, Self::Error>> + Send + '_;

  /// Average winning price per bookmaker, best first.
  fn bookmaker_stats(
    &self,
  ) -> impl Future<Output = Result<Vec<BookmakerStat>, Self::Error>> + Send + '_;
}
