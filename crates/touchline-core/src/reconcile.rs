//! Matching externally reported results to stored fixtures.
//!
//! Result reports (ESPN scoreboards, hand-typed lists) carry team names and a
//! date but no identifier shared with the odds sources. The reconciler
//! searches stored fixtures around that date and picks the first whose home
//! and away names both match. It never creates fixtures.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
  model::{Fixture, FixtureId, FixtureStatus, NewResult, Provenance},
  store::{FixtureQuery, OddsStore},
  teams::TeamMatcher,
};

/// How far before the report date a kick-off may fall.
pub const WINDOW_BEFORE: Duration = Duration::hours(12);
/// How far after the report date a kick-off may fall.
pub const WINDOW_AFTER: Duration = Duration::hours(36);

/// A final score reported by an external source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultReport {
  pub home_team:  String,
  pub away_team:  String,
  pub home_score: u32,
  pub away_score: u32,
  /// Day the match was reported for. `None` searches every upcoming fixture.
  #[serde(default)]
  pub date:       Option<NaiveDate>,
}

impl ResultReport {
  pub fn label(&self) -> String {
    format!("{} vs {}", self.home_team, self.away_team)
  }

  /// `[date - 12h, date + 36h]`, anchored at midnight UTC.
  pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let anchor = self.date?.and_hms_opt(0, 0, 0)?.and_utc();
    Some((anchor - WINDOW_BEFORE, anchor + WINDOW_AFTER))
  }
}

/// What happened to one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
  /// Matched an upcoming fixture; the result was written and the fixture
  /// completed.
  Updated(FixtureId),
  /// Matched a fixture that already has a result; nothing was written.
  AlreadyRecorded(FixtureId),
  NotFound,
}

/// Tally for a batch of reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
  pub matched:   usize,
  pub updated:   usize,
  /// `"home vs away"` labels for operator review.
  pub not_found: Vec<String>,
  pub errors:    usize,
}

pub struct Reconciler<'a, S> {
  store:      &'a S,
  matcher:    &'a TeamMatcher,
  provenance: Provenance,
}

impl<'a, S: OddsStore> Reconciler<'a, S> {
  pub fn new(store: &'a S, matcher: &'a TeamMatcher, provenance: Provenance) -> Self {
    Self { store, matcher, provenance }
  }

  fn candidate_query(report: &ResultReport, status: FixtureStatus) -> FixtureQuery {
    match report.window() {
      Some((from, to)) => FixtureQuery {
        status: Some(status),
        kickoff_from: Some(from),
        kickoff_to: Some(to),
        ..FixtureQuery::default()
      },
      None => FixtureQuery {
        status: Some(status),
        newest_first: true,
        ..FixtureQuery::default()
      },
    }
  }

  fn first_match<'f>(&self, report: &ResultReport, candidates: &'f [Fixture]) -> Option<&'f Fixture> {
    candidates.iter().find(|f| {
      self.matcher.matches(&report.home_team, &f.home_team)
        && self.matcher.matches(&report.away_team, &f.away_team)
    })
  }

  /// Reconcile one report.
  ///
  /// Upcoming fixtures are searched first. When none matches, completed
  /// fixtures in the same window are checked so that a re-run of an
  /// already-applied report counts as matched rather than missing.
  pub async fn reconcile(&self, report: &ResultReport) -> Result<ReconcileOutcome, S::Error> {
    let upcoming = self
      .store
      .list_fixtures(Self::candidate_query(report, FixtureStatus::Upcoming))
      .await?;

    if let Some(fixture) = self.first_match(report, &upcoming) {
      let result = NewResult {
        home_score: report.home_score,
        away_score: report.away_score,
        provenance: self.provenance,
      };
      let written = self
        .store
        .record_result_if_absent(fixture.fixture_id, result)
        .await?;
      return Ok(match written {
        Some(_) => ReconcileOutcome::Updated(fixture.fixture_id),
        None => ReconcileOutcome::AlreadyRecorded(fixture.fixture_id),
      });
    }

    let completed = self
      .store
      .list_fixtures(Self::candidate_query(report, FixtureStatus::Completed))
      .await?;
    if let Some(fixture) = self.first_match(report, &completed) {
      if self.store.get_result(fixture.fixture_id).await?.is_some() {
        return Ok(ReconcileOutcome::AlreadyRecorded(fixture.fixture_id));
      }
    }

    Ok(ReconcileOutcome::NotFound)
  }

  /// Reconcile a batch. Storage errors are counted per report and the batch
  /// carries on.
  pub async fn reconcile_all(&self, reports: &[ResultReport]) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    for report in reports {
      match self.reconcile(report).await {
        Ok(ReconcileOutcome::Updated(id)) => {
          summary.matched += 1;
          summary.updated += 1;
          info!(
            fixture = %id,
            "updated: {} {}-{} {}",
            report.home_team, report.home_score, report.away_score, report.away_team
          );
        }
        Ok(ReconcileOutcome::AlreadyRecorded(id)) => {
          summary.matched += 1;
          debug!(fixture = %id, report = %report.label(), "result already recorded");
        }
        Ok(ReconcileOutcome::NotFound) => {
          summary.not_found.push(report.label());
        }
        Err(e) => {
          summary.errors += 1;
          warn!(report = %report.label(), error = %e, "failed to reconcile result");
        }
      }
    }

    summary
  }
}
