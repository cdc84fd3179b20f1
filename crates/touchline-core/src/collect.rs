//! The collection pipeline: feed → store.
//!
//! Each fetched fixture is one unit of work. A unit that fails is logged,
//! counted, and skipped; the run carries on with the next one.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  feed::{FeedEvent, OddsFeed, ScoresFeed},
  league::LeagueInfo,
  model::{BookmakerDescriptor, BookmakerPrices, NewResult, PriceTriple, Provenance},
  store::OddsStore,
};

/// Tally for one odds collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectSummary {
  pub matches:        usize,
  pub odds_snapshots: usize,
  /// Rows whose prices matched the latest snapshot.
  pub unchanged:      usize,
  /// Rows dropped for lacking a home or away price.
  pub rejected_rows:  usize,
  pub errors:         usize,
}

impl CollectSummary {
  pub fn absorb(&mut self, other: CollectSummary) {
    self.matches += other.matches;
    self.odds_snapshots += other.odds_snapshots;
    self.unchanged += other.unchanged;
    self.rejected_rows += other.rejected_rows;
    self.errors += other.errors;
  }
}

/// Tally for one results collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultsSummary {
  pub results: usize,
  pub errors:  usize,
}

/// Turn one event's bookmaker rows into storable price triples.
///
/// Every row quoting both a home and an away price is kept as is, draw or
/// not; non-positive prices count as missing. Quality rules and
/// de-duplication run when stored odds are aggregated, so every bookmaker
/// key keeps a current latest snapshot. Returns the rows and how many lacked
/// a home or away price.
pub fn prepare_rows(
  prices: &[BookmakerPrices],
) -> (Vec<(BookmakerDescriptor, PriceTriple)>, usize) {
  let rows: Vec<_> = prices
    .iter()
    .filter_map(|row| {
      let priced = |p: Option<f64>| p.filter(|p| p.is_finite() && *p > 0.0);
      let prices = PriceTriple {
        home: priced(row.home)?,
        draw: priced(row.draw),
        away: priced(row.away)?,
      };
      Some((row.bookmaker.clone(), prices))
    })
    .collect();
  let rejected = prices.len() - rows.len();
  (rows, rejected)
}

async fn ingest_event<S: OddsStore>(
  store: &S,
  league: &LeagueInfo,
  event: FeedEvent,
  provenance: Provenance,
  summary: &mut CollectSummary,
) {
  let label = format!("{} vs {}", event.fixture.home_team, event.fixture.away_team);
  let (rows, rejected) = prepare_rows(&event.prices);
  summary.rejected_rows += rejected;
  if rejected > 0 {
    debug!(fixture = %label, rejected, "dropped unpriced bookmaker rows");
  }

  match store
    .ingest_odds(league.clone(), event.fixture, rows, provenance)
    .await
  {
    Ok(report) => {
      summary.matches += 1;
      summary.odds_snapshots += report.snapshots_written;
      summary.unchanged += report.unchanged;
    }
    Err(e) => {
      summary.errors += 1;
      warn!(fixture = %label, error = %e, "failed to store fixture odds");
    }
  }
}

/// Fetch odds for every league from `feed` and store what changed.
///
/// A league whose fetch fails is counted as one error and skipped.
pub async fn collect_odds<S: OddsStore, F: OddsFeed>(
  store: &S,
  feed: &F,
  leagues: &[LeagueInfo],
) -> CollectSummary {
  let provenance = feed.provenance();
  let mut summary = CollectSummary::default();

  for league in leagues {
    info!(league = %league.key, source = %provenance, "fetching odds");
    let events = match feed.fetch_odds(league).await {
      Ok(events) => events,
      Err(e) => {
        summary.errors += 1;
        warn!(league = %league.key, error = %e, "failed to fetch odds");
        continue;
      }
    };
    debug!(league = %league.key, events = events.len(), "fetched events");

    for event in events {
      ingest_event(store, league, event, provenance, &mut summary).await;
    }
  }

  info!(
    matches = summary.matches,
    snapshots = summary.odds_snapshots,
    rejected = summary.rejected_rows,
    errors = summary.errors,
    "odds collection finished"
  );
  summary
}

/// Fetch completed scores for every league and upsert them.
///
/// Scores arrive with the source's own fixture descriptor, so the fixture is
/// found or created by natural key rather than fuzzy-matched.
pub async fn collect_results<S: OddsStore, F: ScoresFeed>(
  store: &S,
  feed: &F,
  leagues: &[LeagueInfo],
  days_from: u32,
  provenance: Provenance,
) -> ResultsSummary {
  let mut summary = ResultsSummary::default();

  for league in leagues {
    info!(league = %league.key, days_from, "fetching results");
    let scores = match feed.fetch_scores(league, days_from).await {
      Ok(scores) => scores,
      Err(e) => {
        summary.errors += 1;
        warn!(league = %league.key, error = %e, "failed to fetch results");
        continue;
      }
    };

    for score in scores {
      let label = format!("{} vs {}", score.fixture.home_team, score.fixture.away_team);
      let result = NewResult {
        home_score: score.home_score,
        away_score: score.away_score,
        provenance,
      };
      match store
        .record_final_score(league.clone(), score.fixture, result)
        .await
      {
        Ok(_) => summary.results += 1,
        Err(e) => {
          summary.errors += 1;
          warn!(fixture = %label, error = %e, "failed to store result");
        }
      }
    }
  }

  info!(results = summary.results, errors = summary.errors, "results collection finished");
  summary
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(key: &str, name: &str, h: f64, d: Option<f64>, a: f64) -> BookmakerPrices {
    BookmakerPrices {
      bookmaker: BookmakerDescriptor { key: key.into(), name: name.into() },
      home:      Some(h),
      draw:      d,
      away:      Some(a),
    }
  }

  fn row_without_home(key: &str) -> BookmakerPrices {
    BookmakerPrices {
      bookmaker: BookmakerDescriptor { key: key.into(), name: key.into() },
      home:      None,
      draw:      Some(3.2),
      away:      Some(3.6),
    }
  }

  #[test]
  fn prepare_keeps_every_priced_row() {
    let prices = vec![
      row("betfair_ex_uk", "Betfair", 1.9, Some(3.2), 3.6),
      row("betfair_ex_eu", "Betfair", 2.0, Some(3.4), 3.9),
      row("flat", "Flat", 2.0, Some(2.0), 2.0),
      row("nodraw", "No Draw", 1.8, None, 4.2),
      row_without_home("unpriced"),
      row("zero_away", "Zero", 2.0, Some(0.0), 0.0),
    ];
    let (rows, rejected) = prepare_rows(&prices);
    assert_eq!(rejected, 2);
    let keys: Vec<&str> = rows.iter().map(|(b, _)| b.key.as_str()).collect();
    assert_eq!(keys, ["betfair_ex_uk", "betfair_ex_eu", "flat", "nodraw"]);
    assert_eq!(rows[3].1.draw, None);
    assert_eq!(rows[1].1.home, 2.0);
  }

  #[test]
  fn summaries_add_up() {
    let mut total = CollectSummary { matches: 2, odds_snapshots: 10, ..Default::default() };
    total.absorb(CollectSummary { matches: 1, errors: 1, ..Default::default() });
    assert_eq!(total.matches, 3);
    assert_eq!(total.odds_snapshots, 10);
    assert_eq!(total.errors, 1);
  }
}
