//! Export record builders.
//!
//! Each export has a pure builder over already-loaded records plus an async
//! gatherer that reads what it needs from an [`OddsStore`]. File formats are
//! the binary's concern; everything here is plain serialisable data.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
  model::{
    BookmakerId, Fixture, FixtureId, FixtureStatus, League, LeagueId,
    MatchResult, Outcome, Provenance,
  },
  quality::{ValidRow, dedupe_by_bookmaker, has_enough_bookmakers, validate},
  stats::{OutcomeStats, round_to},
  store::{BookmakerOdds, CompletedFixture, FixtureQuery, OddsStore, SnapshotRecord},
};

/// How many recent results the site export carries.
pub const SITE_RESULTS_LIMIT: usize = 20;

// ─── Shared ──────────────────────────────────────────────────────────────────

/// Apply the quality filter and de-duplication to a fixture's latest odds.
pub fn curate(latest: &[BookmakerOdds]) -> Vec<ValidRow<&BookmakerOdds>> {
  let rows = latest
    .iter()
    .filter_map(|o| {
      let p = o.snapshot.prices;
      validate(&o.bookmaker.name, Some(p.home), p.draw, Some(p.away), o)
    })
    .collect();
  dedupe_by_bookmaker(rows)
}

/// One value per outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerOutcome<T> {
  pub home: T,
  pub draw: T,
  pub away: T,
}

/// Per-outcome statistics over curated rows. `None` when `rows` is empty.
pub fn aggregate<T>(rows: &[ValidRow<T>]) -> Option<PerOutcome<OutcomeStats>> {
  let names: Vec<&str> = rows.iter().map(|r| r.bookmaker.as_str()).collect();
  let home: Vec<f64> = rows.iter().map(|r| r.home).collect();
  let draw: Vec<f64> = rows.iter().map(|r| r.draw).collect();
  let away: Vec<f64> = rows.iter().map(|r| r.away).collect();

  Some(PerOutcome {
    home: OutcomeStats::compute(&home, &names)?,
    draw: OutcomeStats::compute(&draw, &names)?,
    away: OutcomeStats::compute(&away, &names)?,
  })
}

/// Apply `f` to each outcome's unrounded curated prices, rounding the
/// result to 4 d.p.
fn over_prices<T>(rows: &[ValidRow<T>], f: impl Fn(&[f64]) -> f64) -> PerOutcome<f64> {
  let column = |g: fn(&ValidRow<T>) -> f64| rows.iter().map(g).collect::<Vec<f64>>();
  PerOutcome {
    home: round_to(f(&column(|r| r.home)), 4),
    draw: round_to(f(&column(|r| r.draw)), 4),
    away: round_to(f(&column(|r| r.away)), 4),
  }
}

fn best(prices: &[f64]) -> f64 { prices.iter().copied().fold(f64::MIN, f64::max) }

fn mean(prices: &[f64]) -> f64 { prices.iter().sum::<f64>() / prices.len() as f64 }

fn league_names(leagues: Vec<League>) -> HashMap<LeagueId, String> {
  leagues.into_iter().map(|l| (l.league_id, l.name)).collect()
}

// ─── Site JSON ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsLine {
  pub bookmaker:     String,
  pub bookmaker_key: String,
  pub home:          f64,
  pub draw:          f64,
  pub away:          f64,
  pub source:        Provenance,
  pub scraped_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchExport {
  pub id:              FixtureId,
  pub home_team:       String,
  pub away_team:       String,
  pub commence_time:   DateTime<Utc>,
  pub league:          String,
  pub bookmaker_count: usize,
  pub odds:            Vec<OddsLine>,
  pub best_odds:       PerOutcome<f64>,
  pub avg_odds:        PerOutcome<f64>,
  pub probabilities:   PerOutcome<OutcomeStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmakerExport {
  pub key:  String,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultExport {
  pub home_team:     String,
  pub away_team:     String,
  pub commence_time: DateTime<Utc>,
  pub league:        String,
  pub home_score:    u32,
  pub away_score:    u32,
  pub outcome:       Outcome,
}

impl From<CompletedFixture> for ResultExport {
  fn from(c: CompletedFixture) -> Self {
    Self {
      home_team:     c.fixture.home_team,
      away_team:     c.fixture.away_team,
      commence_time: c.fixture.kickoff,
      league:        c.league,
      home_score:    c.result.home_score,
      away_score:    c.result.away_score,
      outcome:       c.result.outcome,
    }
  }
}

/// The document consumed by the static site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteExport {
  pub generated_at: DateTime<Utc>,
  pub matches:      Vec<MatchExport>,
  pub bookmakers:   Vec<BookmakerExport>,
  pub results:      Vec<ResultExport>,
}

/// Build a fixture's site record, or `None` when too few bookmakers survive
/// curation.
pub fn match_export(
  fixture: &Fixture,
  league: &str,
  latest: &[BookmakerOdds],
) -> Option<MatchExport> {
  let rows = curate(latest);
  if !has_enough_bookmakers(&rows) {
    return None;
  }
  let stats = aggregate(&rows)?;

  let odds = rows
    .iter()
    .map(|r| OddsLine {
      bookmaker:     r.bookmaker.clone(),
      bookmaker_key: r.extra.bookmaker.key.clone(),
      home:          r.home,
      draw:          r.draw,
      away:          r.away,
      source:        r.extra.snapshot.provenance,
      scraped_at:    r.extra.snapshot.scraped_at,
    })
    .collect();

  Some(MatchExport {
    id: fixture.fixture_id,
    home_team: fixture.home_team.clone(),
    away_team: fixture.away_team.clone(),
    commence_time: fixture.kickoff,
    league: league.to_owned(),
    bookmaker_count: rows.len(),
    odds,
    best_odds: PerOutcome {
      home: stats.home.best_price,
      draw: stats.draw.best_price,
      away: stats.away.best_price,
    },
    avg_odds: PerOutcome {
      home: stats.home.mean_price,
      draw: stats.draw.mean_price,
      away: stats.away.mean_price,
    },
    probabilities: stats,
  })
}

/// Gather the site document: upcoming fixtures by kick-off, every
/// bookmaker, and the most recent results.
pub async fn site_export<S: OddsStore>(
  store: &S,
  generated_at: DateTime<Utc>,
) -> Result<SiteExport, S::Error> {
  let leagues = league_names(store.list_leagues().await?);
  let fixtures = store
    .list_fixtures(FixtureQuery::with_status(FixtureStatus::Upcoming))
    .await?;

  let mut matches = Vec::new();
  for fixture in &fixtures {
    let latest = store.latest_odds(fixture.fixture_id).await?;
    let league = leagues.get(&fixture.league_id).map(String::as_str).unwrap_or_default();
    if let Some(m) = match_export(fixture, league, &latest) {
      matches.push(m);
    }
  }

  let bookmakers = store
    .list_bookmakers()
    .await?
    .into_iter()
    .map(|b| BookmakerExport { key: b.key, name: b.name })
    .collect();

  let results = store
    .recent_results(SITE_RESULTS_LIMIT)
    .await?
    .into_iter()
    .map(ResultExport::from)
    .collect();

  Ok(SiteExport { generated_at, matches, bookmakers, results })
}

// ─── Odds summary ────────────────────────────────────────────────────────────

/// One row per fixture with enough bookmakers: best and average prices and
/// how far apart their implied probabilities are.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
  pub match_id:        FixtureId,
  pub home_team:       String,
  pub away_team:       String,
  pub commence_time:   DateTime<Utc>,
  pub status:          FixtureStatus,
  pub league:          String,
  pub bookmaker_count: usize,
  pub best_odds:       PerOutcome<f64>,
  pub avg_odds:        PerOutcome<f64>,
  pub best_prob:       PerOutcome<f64>,
  pub avg_prob:        PerOutcome<f64>,
  /// `avg_prob - best_prob`; positive means the best price beats consensus.
  pub value_diff:      PerOutcome<f64>,
  pub result:          Option<MatchResult>,
}

pub fn summary_row(
  fixture: &Fixture,
  league: &str,
  latest: &[BookmakerOdds],
  result: Option<MatchResult>,
) -> Option<SummaryRow> {
  let rows = curate(latest);
  if !has_enough_bookmakers(&rows) {
    return None;
  }

  Some(SummaryRow {
    match_id: fixture.fixture_id,
    home_team: fixture.home_team.clone(),
    away_team: fixture.away_team.clone(),
    commence_time: fixture.kickoff,
    status: fixture.status,
    league: league.to_owned(),
    bookmaker_count: rows.len(),
    best_odds: over_prices(&rows, best),
    avg_odds: over_prices(&rows, mean),
    best_prob: over_prices(&rows, |p| 1.0 / best(p)),
    avg_prob: over_prices(&rows, |p| 1.0 / mean(p)),
    value_diff: over_prices(&rows, |p| 1.0 / mean(p) - 1.0 / best(p)),
    result,
  })
}

/// Every fixture with enough bookmakers, latest kick-off first.
pub async fn odds_summary<S: OddsStore>(store: &S) -> Result<Vec<SummaryRow>, S::Error> {
  let leagues = league_names(store.list_leagues().await?);
  let fixtures = store
    .list_fixtures(FixtureQuery { newest_first: true, ..FixtureQuery::default() })
    .await?;

  let mut rows = Vec::new();
  for fixture in &fixtures {
    let latest = store.latest_odds(fixture.fixture_id).await?;
    let league = leagues.get(&fixture.league_id).map(String::as_str).unwrap_or_default();
    let result = store.get_result(fixture.fixture_id).await?;
    if let Some(row) = summary_row(fixture, league, &latest, result) {
      rows.push(row);
    }
  }
  Ok(rows)
}

// ─── Training data ───────────────────────────────────────────────────────────

/// One bookmaker's best-ever prices for a completed fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingRow {
  pub match_id:      FixtureId,
  pub home_team:     String,
  pub away_team:     String,
  pub commence_time: DateTime<Utc>,
  pub league:        String,
  pub home_score:    u32,
  pub away_score:    u32,
  pub outcome:       Outcome,
  pub bookmaker:     String,
  pub odds:          PerOutcome<f64>,
  pub prob:          PerOutcome<f64>,
}

/// Per bookmaker, the highest price each outcome ever reached. Snapshots
/// without a draw price are ignored.
fn best_ever(history: &[BookmakerOdds]) -> Vec<(String, f64, f64, f64)> {
  let mut order: Vec<BookmakerId> = Vec::new();
  let mut best: HashMap<BookmakerId, (String, f64, f64, f64)> = HashMap::new();

  for o in history {
    let p = o.snapshot.prices;
    let Some(draw) = p.draw else { continue };
    let id = o.bookmaker.bookmaker_id;
    match best.get_mut(&id) {
      Some(slot) => {
        slot.1 = slot.1.max(p.home);
        slot.2 = slot.2.max(draw);
        slot.3 = slot.3.max(p.away);
      }
      None => {
        order.push(id);
        best.insert(id, (o.bookmaker.name.clone(), p.home, draw, p.away));
      }
    }
  }

  let mut rows: Vec<_> = order.into_iter().filter_map(|id| best.remove(&id)).collect();
  rows.sort_by(|a, b| a.0.cmp(&b.0));
  rows
}

pub fn training_rows(completed: &CompletedFixture, history: &[BookmakerOdds]) -> Vec<TrainingRow> {
  let valid: Vec<_> = best_ever(history)
    .into_iter()
    .filter_map(|(name, h, d, a)| validate(&name, Some(h), Some(d), Some(a), ()))
    .collect();
  let rows = dedupe_by_bookmaker(valid);
  if !has_enough_bookmakers(&rows) {
    return Vec::new();
  }

  let fixture = &completed.fixture;
  rows
    .into_iter()
    .map(|r| TrainingRow {
      match_id:      fixture.fixture_id,
      home_team:     fixture.home_team.clone(),
      away_team:     fixture.away_team.clone(),
      commence_time: fixture.kickoff,
      league:        completed.league.clone(),
      home_score:    completed.result.home_score,
      away_score:    completed.result.away_score,
      outcome:       completed.result.outcome,
      odds:          PerOutcome {
        home: round_to(r.home, 2),
        draw: round_to(r.draw, 2),
        away: round_to(r.away, 2),
      },
      prob:          PerOutcome {
        home: round_to(1.0 / r.home, 4),
        draw: round_to(1.0 / r.draw, 4),
        away: round_to(1.0 / r.away, 4),
      },
      bookmaker:     r.bookmaker,
    })
    .collect()
}

/// Training rows for every completed fixture, latest kick-off first.
pub async fn training_data<S: OddsStore>(store: &S) -> Result<Vec<TrainingRow>, S::Error> {
  let mut rows = Vec::new();
  for completed in store.recent_results(usize::MAX).await? {
    let history = store.fixture_snapshots(completed.fixture.fixture_id).await?;
    rows.extend(training_rows(&completed, &history));
  }
  Ok(rows)
}

// ─── Historical snapshots ────────────────────────────────────────────────────

/// One odds snapshot flattened with its fixture and result context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalRow {
  pub odds_id:            i64,
  pub scraped_at:         DateTime<Utc>,
  pub home_win:           f64,
  pub draw:               Option<f64>,
  pub away_win:           f64,
  pub odds_source:        Provenance,
  pub bookmaker_key:      String,
  pub bookmaker_name:     String,
  pub match_id:           FixtureId,
  pub home_team:          String,
  pub away_team:          String,
  pub commence_time:      DateTime<Utc>,
  pub match_status:       FixtureStatus,
  pub league_key:         String,
  pub league_name:        String,
  pub home_score:         Option<u32>,
  pub away_score:         Option<u32>,
  pub outcome:            Option<Outcome>,
  pub result_recorded_at: Option<DateTime<Utc>>,
  pub home_prob:          f64,
  pub draw_prob:          Option<f64>,
  pub away_prob:          f64,
  /// Only defined when the draw was quoted.
  pub overround:          Option<f64>,
  pub run_date:           NaiveDate,
}

impl From<SnapshotRecord> for HistoricalRow {
  fn from(r: SnapshotRecord) -> Self {
    let p = r.snapshot.prices;
    let home_prob = 1.0 / p.home;
    let away_prob = 1.0 / p.away;
    let draw_prob = p.draw.map(|d| 1.0 / d);

    Self {
      odds_id: r.snapshot.snapshot_id.0,
      scraped_at: r.snapshot.scraped_at,
      home_win: p.home,
      draw: p.draw,
      away_win: p.away,
      odds_source: r.snapshot.provenance,
      bookmaker_key: r.bookmaker.key,
      bookmaker_name: r.bookmaker.name,
      match_id: r.fixture.fixture_id,
      home_team: r.fixture.home_team,
      away_team: r.fixture.away_team,
      commence_time: r.fixture.kickoff,
      match_status: r.fixture.status,
      league_key: r.league.key,
      league_name: r.league.name,
      home_score: r.result.as_ref().map(|x| x.home_score),
      away_score: r.result.as_ref().map(|x| x.away_score),
      outcome: r.result.as_ref().map(|x| x.outcome),
      result_recorded_at: r.result.as_ref().map(|x| x.recorded_at),
      home_prob,
      draw_prob,
      away_prob,
      overround: draw_prob.map(|d| home_prob + d + away_prob),
      run_date: r.snapshot.scraped_at.date_naive(),
    }
  }
}

pub async fn historical<S: OddsStore>(store: &S) -> Result<Vec<HistoricalRow>, S::Error> {
  Ok(
    store
      .snapshot_history()
      .await?
      .into_iter()
      .map(HistoricalRow::from)
      .collect(),
  )
}
