//! CSV writers for the tabular exports.

use std::{
  fs::File,
  io::{self, BufWriter, Write},
  path::Path,
};

use chrono::{DateTime, SecondsFormat, Utc};
use touchline_core::export::{HistoricalRow, SummaryRow, TrainingRow};

fn needs_quotes(field: &str) -> bool { field.contains([',', '"', '\n', '\r']) }

/// Write a single comma-separated row.
pub fn write_row<W: Write>(w: &mut W, row: &[String]) -> io::Result<()> {
  for (i, cell) in row.iter().enumerate() {
    if i > 0 {
      w.write_all(b",")?;
    }
    if needs_quotes(cell) {
      write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
    } else {
      w.write_all(cell.as_bytes())?;
    }
  }
  w.write_all(b"\n")
}

/// A value that serialises as one CSV row under a fixed header.
pub trait CsvRecord {
  const HEADER: &'static [&'static str];

  fn fields(&self) -> Vec<String>;
}

pub fn write_records<W: Write, R: CsvRecord>(mut w: W, records: &[R]) -> io::Result<()> {
  let header: Vec<String> = R::HEADER.iter().map(|h| (*h).to_owned()).collect();
  write_row(&mut w, &header)?;
  for record in records {
    write_row(&mut w, &record.fields())?;
  }
  w.flush()
}

pub fn write_file<R: CsvRecord>(path: &Path, records: &[R]) -> io::Result<()> {
  write_records(BufWriter::new(File::create(path)?), records)
}

// ─── Cell formatting ─────────────────────────────────────────────────────────

fn time(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Secs, true) }

fn opt<T: ToString>(value: Option<T>) -> String {
  value.map(|v| v.to_string()).unwrap_or_default()
}

// ─── Records ─────────────────────────────────────────────────────────────────

impl CsvRecord for SummaryRow {
  const HEADER: &'static [&'static str] = &[
    "match_id", "home_team", "away_team", "league", "commence_time", "status",
    "bookmaker_count",
    "best_home_odds", "best_draw_odds", "best_away_odds",
    "avg_home_odds", "avg_draw_odds", "avg_away_odds",
    "best_home_prob", "best_draw_prob", "best_away_prob",
    "avg_home_prob", "avg_draw_prob", "avg_away_prob",
    "home_value_diff", "draw_value_diff", "away_value_diff",
    "home_score", "away_score", "outcome",
  ];

  fn fields(&self) -> Vec<String> {
    let mut fields = vec![
      self.match_id.to_string(),
      self.home_team.clone(),
      self.away_team.clone(),
      self.league.clone(),
      time(self.commence_time),
      self.status.to_string(),
      self.bookmaker_count.to_string(),
    ];
    for triple in [
      &self.best_odds,
      &self.avg_odds,
      &self.best_prob,
      &self.avg_prob,
      &self.value_diff,
    ] {
      fields.extend([triple.home, triple.draw, triple.away].map(|v| v.to_string()));
    }
    let result = self.result.as_ref();
    fields.push(opt(result.map(|r| r.home_score)));
    fields.push(opt(result.map(|r| r.away_score)));
    fields.push(opt(result.map(|r| r.outcome)));
    fields
  }
}

impl CsvRecord for TrainingRow {
  const HEADER: &'static [&'static str] = &[
    "match_id", "home_team", "away_team", "commence_time", "league",
    "home_score", "away_score", "outcome", "bookmaker",
    "home_odds", "draw_odds", "away_odds",
    "home_prob", "draw_prob", "away_prob",
  ];

  fn fields(&self) -> Vec<String> {
    vec![
      self.match_id.to_string(),
      self.home_team.clone(),
      self.away_team.clone(),
      time(self.commence_time),
      self.league.clone(),
      self.home_score.to_string(),
      self.away_score.to_string(),
      self.outcome.to_string(),
      self.bookmaker.clone(),
      self.odds.home.to_string(),
      self.odds.draw.to_string(),
      self.odds.away.to_string(),
      self.prob.home.to_string(),
      self.prob.draw.to_string(),
      self.prob.away.to_string(),
    ]
  }
}

impl CsvRecord for HistoricalRow {
  const HEADER: &'static [&'static str] = &[
    "odds_id", "scraped_at", "home_win", "draw", "away_win", "odds_source",
    "bookmaker_key", "bookmaker_name",
    "match_id", "home_team", "away_team", "commence_time", "match_status",
    "league_key", "league_name",
    "home_score", "away_score", "outcome", "result_recorded_at",
    "home_prob", "draw_prob", "away_prob", "overround", "run_date",
  ];

  fn fields(&self) -> Vec<String> {
    vec![
      self.odds_id.to_string(),
      time(self.scraped_at),
      self.home_win.to_string(),
      opt(self.draw),
      self.away_win.to_string(),
      self.odds_source.to_string(),
      self.bookmaker_key.clone(),
      self.bookmaker_name.clone(),
      self.match_id.to_string(),
      self.home_team.clone(),
      self.away_team.clone(),
      time(self.commence_time),
      self.match_status.to_string(),
      self.league_key.clone(),
      self.league_name.clone(),
      opt(self.home_score),
      opt(self.away_score),
      opt(self.outcome),
      opt(self.result_recorded_at.map(time)),
      self.home_prob.to_string(),
      opt(self.draw_prob),
      self.away_prob.to_string(),
      opt(self.overround),
      self.run_date.to_string(),
    ]
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use touchline_core::{
    export::PerOutcome,
    model::{FixtureId, Outcome},
  };

  use super::*;

  fn to_string(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
    let mut buf = Vec::new();
    f(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
  }

  #[test]
  fn fields_are_quoted_only_when_needed() {
    let row = vec![
      "Brighton & Hove Albion".to_owned(),
      "Wolves, away".to_owned(),
      "say \"hi\"".to_owned(),
      String::new(),
    ];
    let out = to_string(|w| write_row(w, &row));
    assert_eq!(out, "Brighton & Hove Albion,\"Wolves, away\",\"say \"\"hi\"\"\",\n");
  }

  fn training_row() -> TrainingRow {
    TrainingRow {
      match_id:      FixtureId(7),
      home_team:     "Chelsea".into(),
      away_team:     "Brentford".into(),
      commence_time: Utc.with_ymd_and_hms(2026, 1, 17, 15, 0, 0).unwrap(),
      league:        "English Premier League".into(),
      home_score:    2,
      away_score:    0,
      outcome:       Outcome::Home,
      bookmaker:     "Bet365".into(),
      odds:          PerOutcome { home: 1.62, draw: 4.2, away: 5.5 },
      prob:          PerOutcome { home: 0.6173, draw: 0.2381, away: 0.1818 },
    }
  }

  #[test]
  fn training_rows_follow_the_header() {
    let out = to_string(|w| write_records(w, &[training_row()]));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("match_id,home_team,away_team,commence_time,league"));
    assert_eq!(
      lines[1],
      "7,Chelsea,Brentford,2026-01-17T15:00:00Z,English Premier League,2,0,home,Bet365,\
       1.62,4.2,5.5,0.6173,0.2381,0.1818"
    );
    assert_eq!(training_row().fields().len(), TrainingRow::HEADER.len());
  }

  #[test]
  fn empty_export_still_has_a_header() {
    let out = to_string(|w| write_records::<_, TrainingRow>(w, &[]));
    assert_eq!(out.lines().count(), 1);
  }
}
