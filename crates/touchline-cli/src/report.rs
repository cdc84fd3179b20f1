//! Plain-text console output.

use touchline_core::{
  collect::{CollectSummary, ResultsSummary},
  league::LeagueInfo,
  model::Bookmaker,
  reconcile::ReconcileSummary,
  store::{BookmakerStat, OddsVsResult},
};
use touchline_feeds::odds_api::{Quota, Sport};

fn price(p: Option<f64>) -> String {
  p.map_or_else(|| "-".to_owned(), |p| format!("{p:.2}"))
}

fn or_unknown(n: Option<u32>) -> String {
  n.map_or_else(|| "?".to_owned(), |n| n.to_string())
}

pub fn collect_summary(label: &str, s: &CollectSummary) -> String {
  format!(
    "{label}: {} matches, {} new snapshots, {} unchanged, {} rows rejected, {} errors",
    s.matches, s.odds_snapshots, s.unchanged, s.rejected_rows, s.errors
  )
}

pub fn results_summary(s: &ResultsSummary) -> String {
  format!("results: {} recorded, {} errors", s.results, s.errors)
}

pub fn reconcile_summary(s: &ReconcileSummary) -> String {
  let mut lines = vec![format!(
    "matched {}, updated {}, not found {}, errors {}",
    s.matched,
    s.updated,
    s.not_found.len(),
    s.errors
  )];
  lines.extend(s.not_found.iter().map(|label| format!("  not found: {label}")));
  lines.join("\n")
}

pub fn results_table(rows: &[OddsVsResult]) -> String {
  if rows.is_empty() {
    return "No completed matches with odds yet.".to_owned();
  }
  let mut lines = vec![format!(
    "{:<10}  {:<24}  {:>24} {:^5} {:<24}  {:<16} {:>6} {:>6} {:>6} {:>6}",
    "date", "league", "home", "score", "away", "bookmaker", "H", "D", "A", "won"
  )];
  lines.extend(rows.iter().map(|r| {
    format!(
      "{:<10}  {:<24}  {:>24} {:^5} {:<24}  {:<16} {:>6} {:>6} {:>6} {:>6}",
      r.kickoff.format("%Y-%m-%d").to_string(),
      r.league,
      r.home_team,
      format!("{}-{}", r.home_score, r.away_score),
      r.away_team,
      r.bookmaker,
      price(Some(r.prices.home)),
      price(r.prices.draw),
      price(Some(r.prices.away)),
      price(r.winning_odds),
    )
  }));
  lines.join("\n")
}

pub fn stats_table(stats: &[BookmakerStat]) -> String {
  if stats.is_empty() {
    return "No completed matches with odds yet.".to_owned();
  }
  let mut lines = vec![format!("{:<20} {:>12} {:>8}", "bookmaker", "avg winning", "matches")];
  lines.extend(stats.iter().map(|s| {
    format!("{:<20} {:>12.2} {:>8}", s.bookmaker, s.avg_winning_odds, s.matches)
  }));
  lines.join("\n")
}

pub fn leagues_table(leagues: &[LeagueInfo]) -> String {
  let mut lines = vec![format!("{:<32} {:<26} {:<12}", "key", "name", "country")];
  lines.extend(leagues.iter().map(|l| {
    format!("{:<32} {:<26} {:<12}", l.key, l.name, l.country.as_deref().unwrap_or("-"))
  }));
  lines.join("\n")
}

pub fn bookmakers_table(bookmakers: &[Bookmaker]) -> String {
  if bookmakers.is_empty() {
    return "No bookmakers stored yet.".to_owned();
  }
  let mut lines = vec![format!("{:<20} {:<24}", "key", "name")];
  lines.extend(bookmakers.iter().map(|b| format!("{:<20} {:<24}", b.key, b.name)));
  lines.join("\n")
}

pub fn quota(quota: &Quota, soccer: &[Sport]) -> String {
  let mut lines = vec![
    format!("requests remaining: {}", or_unknown(quota.remaining)),
    format!("requests used:      {}", or_unknown(quota.used)),
    format!("active soccer competitions: {}", soccer.len()),
  ];
  lines.extend(soccer.iter().map(|s| format!("  {:<36} {}", s.key, s.title)));
  lines.join("\n")
}
