//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexicographic order equals chronological order. Enums are
//! stored as their lowercase tags.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use touchline_core::{
  model::{
    Bookmaker, BookmakerId, Fixture, FixtureId, League, LeagueId, MatchResult,
    OddsSnapshot, PriceTriple, SnapshotId,
  },
  store::OddsVsResult,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// `usize` limit to an SQLite `LIMIT` operand.
pub fn encode_limit(limit: Option<usize>) -> i64 {
  limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX))
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `Raw*` type is read inside a `tokio_rusqlite` closure and decoded into
// its domain type outside it. `read` takes the index of the first column so
// the same reader serves joined queries.

pub const LEAGUE_COLUMNS: &str = "l.league_id, l.key, l.name, l.country";

pub struct RawLeague {
  pub league_id: i64,
  pub key:       String,
  pub name:      String,
  pub country:   Option<String>,
}

impl RawLeague {
  pub const WIDTH: usize = 4;

  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      league_id: row.get(at)?,
      key:       row.get(at + 1)?,
      name:      row.get(at + 2)?,
      country:   row.get(at + 3)?,
    })
  }

  pub fn into_league(self) -> League {
    League {
      league_id: LeagueId(self.league_id),
      key:       self.key,
      name:      self.name,
      country:   self.country,
    }
  }
}

pub const BOOKMAKER_COLUMNS: &str = "b.bookmaker_id, b.key, b.name";

pub struct RawBookmaker {
  pub bookmaker_id: i64,
  pub key:          String,
  pub name:         String,
}

impl RawBookmaker {
  pub const WIDTH: usize = 3;

  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      bookmaker_id: row.get(at)?,
      key:          row.get(at + 1)?,
      name:         row.get(at + 2)?,
    })
  }

  pub fn into_bookmaker(self) -> Bookmaker {
    Bookmaker {
      bookmaker_id: BookmakerId(self.bookmaker_id),
      key:          self.key,
      name:         self.name,
    }
  }
}

pub const FIXTURE_COLUMNS: &str =
  "f.fixture_id, f.league_id, f.home_team, f.away_team, f.kickoff, f.status, f.external_id";

pub struct RawFixture {
  pub fixture_id:  i64,
  pub league_id:   i64,
  pub home_team:   String,
  pub away_team:   String,
  pub kickoff:     String,
  pub status:      String,
  pub external_id: Option<String>,
}

impl RawFixture {
  pub const WIDTH: usize = 7;

  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      fixture_id:  row.get(at)?,
      league_id:   row.get(at + 1)?,
      home_team:   row.get(at + 2)?,
      away_team:   row.get(at + 3)?,
      kickoff:     row.get(at + 4)?,
      status:      row.get(at + 5)?,
      external_id: row.get(at + 6)?,
    })
  }

  pub fn into_fixture(self) -> Result<Fixture> {
    Ok(Fixture {
      fixture_id:  FixtureId(self.fixture_id),
      league_id:   LeagueId(self.league_id),
      home_team:   self.home_team,
      away_team:   self.away_team,
      kickoff:     decode_dt(&self.kickoff)?,
      status:      self.status.parse()?,
      external_id: self.external_id,
    })
  }
}

pub const SNAPSHOT_COLUMNS: &str = "o.snapshot_id, o.fixture_id, o.bookmaker_id, \
   o.home_price, o.draw_price, o.away_price, o.source, o.scraped_at";

pub struct RawSnapshot {
  pub snapshot_id:  i64,
  pub fixture_id:   i64,
  pub bookmaker_id: i64,
  pub home:         f64,
  pub draw:         Option<f64>,
  pub away:         f64,
  pub source:       String,
  pub scraped_at:   String,
}

impl RawSnapshot {
  pub const WIDTH: usize = 8;

  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      snapshot_id:  row.get(at)?,
      fixture_id:   row.get(at + 1)?,
      bookmaker_id: row.get(at + 2)?,
      home:         row.get(at + 3)?,
      draw:         row.get(at + 4)?,
      away:         row.get(at + 5)?,
      source:       row.get(at + 6)?,
      scraped_at:   row.get(at + 7)?,
    })
  }

  pub fn into_snapshot(self) -> Result<OddsSnapshot> {
    Ok(OddsSnapshot {
      snapshot_id:  SnapshotId(self.snapshot_id),
      fixture_id:   FixtureId(self.fixture_id),
      bookmaker_id: BookmakerId(self.bookmaker_id),
      prices:       PriceTriple { home: self.home, draw: self.draw, away: self.away },
      provenance:   self.source.parse()?,
      scraped_at:   decode_dt(&self.scraped_at)?,
    })
  }
}

pub const RESULT_COLUMNS: &str =
  "r.fixture_id, r.home_score, r.away_score, r.outcome, r.source, r.recorded_at";

pub struct RawResult {
  pub fixture_id:  i64,
  pub home_score:  u32,
  pub away_score:  u32,
  pub outcome:     String,
  pub source:      String,
  pub recorded_at: String,
}

impl RawResult {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      fixture_id:  row.get(at)?,
      home_score:  row.get(at + 1)?,
      away_score:  row.get(at + 2)?,
      outcome:     row.get(at + 3)?,
      source:      row.get(at + 4)?,
      recorded_at: row.get(at + 5)?,
    })
  }

  /// For `LEFT JOIN results`: `None` when the fixture has no result.
  pub fn read_optional(row: &Row<'_>, at: usize) -> rusqlite::Result<Option<Self>> {
    let fixture_id: Option<i64> = row.get(at)?;
    fixture_id.map(|_| Self::read(row, at)).transpose()
  }

  pub fn into_result(self) -> Result<MatchResult> {
    Ok(MatchResult {
      fixture_id:  FixtureId(self.fixture_id),
      home_score:  self.home_score,
      away_score:  self.away_score,
      outcome:     self.outcome.parse()?,
      provenance:  self.source.parse()?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// A row of the `odds_vs_results` view.
pub struct RawOddsVsResult {
  pub home_team:    String,
  pub away_team:    String,
  pub kickoff:      String,
  pub league:       String,
  pub home_score:   u32,
  pub away_score:   u32,
  pub outcome:      String,
  pub bookmaker:    String,
  pub home:         f64,
  pub draw:         Option<f64>,
  pub away:         f64,
  pub winning_odds: Option<f64>,
}

impl RawOddsVsResult {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      home_team:    row.get(0)?,
      away_team:    row.get(1)?,
      kickoff:      row.get(2)?,
      league:       row.get(3)?,
      home_score:   row.get(4)?,
      away_score:   row.get(5)?,
      outcome:      row.get(6)?,
      bookmaker:    row.get(7)?,
      home:         row.get(8)?,
      draw:         row.get(9)?,
      away:         row.get(10)?,
      winning_odds: row.get(11)?,
    })
  }

  pub fn into_row(self) -> Result<OddsVsResult> {
    Ok(OddsVsResult {
      home_team:    self.home_team,
      away_team:    self.away_team,
      kickoff:      decode_dt(&self.kickoff)?,
      league:       self.league,
      home_score:   self.home_score,
      away_score:   self.away_score,
      outcome:      self.outcome.parse()?,
      bookmaker:    self.bookmaker,
      prices:       PriceTriple { home: self.home, draw: self.draw, away: self.away },
      winning_odds: self.winning_odds,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexicographically() {
    let early = Utc.with_ymd_and_hms(2026, 1, 9, 9, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(encode_dt(early), "2026-01-09T09:00:00.000000Z");
    assert_eq!(decode_dt(&encode_dt(early)).unwrap(), early);
  }

  #[test]
  fn bad_timestamp_is_a_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn limits() {
    assert_eq!(encode_limit(None), -1);
    assert_eq!(encode_limit(Some(20)), 20);
    assert_eq!(encode_limit(Some(usize::MAX)), i64::MAX);
  }
}
