//! Subcommand implementations.

use std::{
  fs,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::ValueEnum;
use serde::Deserialize;
use tracing::{info, warn};
use touchline_core::{
  collect::{CollectSummary, ResultsSummary, collect_odds, collect_results},
  export,
  league::LeagueCatalog,
  model::{FixtureStatus, Provenance},
  reconcile::{ReconcileSummary, Reconciler, ResultReport},
  store::OddsStore,
  teams::TeamMatcher,
};
use touchline_feeds::{
  espn::{EspnClient, scoreboard_days},
  odds_api::OddsApiClient,
  oddschecker::OddscheckerScraper,
};
use touchline_store_sqlite::SqliteStore;

use crate::{csv, report, settings::Settings};

/// Everything a subcommand needs: configuration plus the opened store.
pub struct App {
  pub settings: Settings,
  pub store:    SqliteStore,
  pub catalog:  LeagueCatalog,
  pub matcher:  TeamMatcher,
}

impl App {
  pub async fn open(settings: Settings) -> Result<Self> {
    let db_path = settings.db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = SqliteStore::open(&db_path)
      .await
      .with_context(|| format!("failed to open store at {}", db_path.display()))?;

    Ok(Self {
      catalog: settings.catalog(),
      matcher: settings.matcher(),
      settings,
      store,
    })
  }

  /// API client with its key checked up front.
  fn odds_api(&self) -> Result<OddsApiClient> {
    let client = OddsApiClient::new(self.settings.odds_api_config())
      .context("failed to build odds API client")?;
    client.api_key()?;
    Ok(client)
  }

  fn scraper(&self) -> Result<OddscheckerScraper> {
    OddscheckerScraper::new(self.settings.oddschecker_config())
      .context("failed to build scraper")
  }
}

// ─── Setup ───────────────────────────────────────────────────────────────────

pub async fn init(app: &App) -> Result<()> {
  for league in app.catalog.all() {
    app
      .store
      .get_or_create_league(league.clone())
      .await
      .with_context(|| format!("failed to register league {}", league.key))?;
  }
  println!(
    "Database ready at {} ({} leagues registered)",
    app.settings.db_path().display(),
    app.catalog.all().len()
  );
  Ok(())
}

// ─── Collection ──────────────────────────────────────────────────────────────

pub async fn fetch_odds(app: &App, leagues: &[String]) -> Result<CollectSummary> {
  let client = app.odds_api()?;
  Ok(collect_odds(&app.store, &client, &app.catalog.select(leagues)).await)
}

pub async fn scrape_odds(app: &App, leagues: &[String]) -> Result<CollectSummary> {
  let scraper = app.scraper()?;
  Ok(collect_odds(&app.store, &scraper, &app.catalog.select(leagues)).await)
}

pub async fn fetch_results(app: &App, leagues: &[String], days: u32) -> Result<ResultsSummary> {
  let client = app.odds_api()?;
  let leagues = app.catalog.select(leagues);
  Ok(collect_results(&app.store, &client, &leagues, days, Provenance::Api).await)
}

/// API odds, optionally scraped odds, then API results.
pub async fn update_all(app: &App, leagues: &[String], scrape: bool, days: u32) -> Result<()> {
  let client = app.odds_api()?;
  let selected = app.catalog.select(leagues);

  let api = collect_odds(&app.store, &client, &selected).await;
  println!("{}", report::collect_summary("odds API", &api));

  let mut total = api;
  if scrape {
    let scraper = app.scraper()?;
    let scraped = collect_odds(&app.store, &scraper, &selected).await;
    println!("{}", report::collect_summary("oddschecker", &scraped));
    total.absorb(scraped);
  }

  let results = collect_results(&app.store, &client, &selected, days, Provenance::Api).await;
  println!("{}", report::results_summary(&results));
  println!("{}", report::collect_summary("total", &total));
  Ok(())
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// Where result reports come from.
#[derive(Debug, Clone)]
pub enum ReportSource {
  /// A TOML file of `[[results]]` entries.
  File(PathBuf),
  /// The public scoreboard for today and this many days back.
  Espn(u32),
}

#[derive(Debug, Deserialize)]
struct ResultsFile {
  #[serde(default)]
  results: Vec<ResultReport>,
}

pub fn parse_reports(text: &str) -> Result<Vec<ResultReport>> {
  Ok(toml::from_str::<ResultsFile>(text)?.results)
}

fn read_reports(path: &Path) -> Result<Vec<ResultReport>> {
  let raw = fs::read_to_string(path)
    .with_context(|| format!("reading results file {}", path.display()))?;
  parse_reports(&raw).with_context(|| format!("parsing results file {}", path.display()))
}

async fn espn_reports(app: &App, days: u32) -> Result<Vec<ResultReport>> {
  let client = EspnClient::new(app.settings.espn_base_url.clone())
    .context("failed to build scoreboard client")?;
  let mut reports = Vec::new();
  for day in scoreboard_days(Utc::now().date_naive(), days) {
    match client.fetch_day(day).await {
      Ok(mut day_reports) => reports.append(&mut day_reports),
      Err(e) => warn!(%day, error = %e, "failed to fetch scoreboard"),
    }
  }
  Ok(reports)
}

pub async fn reconcile(app: &App, source: ReportSource) -> Result<ReconcileSummary> {
  let (reports, provenance) = match source {
    ReportSource::File(path) => (read_reports(&path)?, Provenance::Manual),
    ReportSource::Espn(days) => (espn_reports(app, days).await?, Provenance::Espn),
  };
  info!(reports = reports.len(), source = %provenance, "reconciling results");

  let reconciler = Reconciler::new(&app.store, &app.matcher, provenance);
  Ok(reconciler.reconcile_all(&reports).await)
}

// ─── Exports ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
  /// `odds.json` for the static site.
  Site,
  /// `odds_summary.csv`: one row per fixture.
  Summary,
  /// `training_data.csv`: best prices for completed fixtures.
  Training,
  /// `historical_odds.csv`: every snapshot.
  Historical,
}

impl ExportKind {
  pub const ALL: [Self; 4] = [Self::Site, Self::Summary, Self::Training, Self::Historical];

  pub fn file_name(self) -> &'static str {
    match self {
      Self::Site => "odds.json",
      Self::Summary => "odds_summary.csv",
      Self::Training => "training_data.csv",
      Self::Historical => "historical_odds.csv",
    }
  }
}

/// Write the requested exports into `out_dir`. Returns each file written
/// with its row count.
pub async fn write_exports(
  app: &App,
  out_dir: &Path,
  kinds: &[ExportKind],
) -> Result<Vec<(PathBuf, usize)>> {
  fs::create_dir_all(out_dir)
    .with_context(|| format!("failed to create {}", out_dir.display()))?;

  let mut written = Vec::new();
  for &kind in kinds {
    let path = out_dir.join(kind.file_name());
    let rows = match kind {
      ExportKind::Site => {
        let site = export::site_export(&app.store, Utc::now())
          .await
          .context("building site export")?;
        let json = serde_json::to_string_pretty(&site).context("serialising site export")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        site.matches.len()
      }
      ExportKind::Summary => {
        let rows = export::odds_summary(&app.store).await.context("building odds summary")?;
        let upcoming = rows.iter().filter(|r| r.status == FixtureStatus::Upcoming).count();
        let completed = rows.iter().filter(|r| r.status == FixtureStatus::Completed).count();
        info!(upcoming, completed, "odds summary");
        csv::write_file(&path, &rows).with_context(|| format!("writing {}", path.display()))?;
        rows.len()
      }
      ExportKind::Training => {
        let rows = export::training_data(&app.store).await.context("building training data")?;
        csv::write_file(&path, &rows).with_context(|| format!("writing {}", path.display()))?;
        rows.len()
      }
      ExportKind::Historical => {
        let rows = export::historical(&app.store).await.context("building historical odds")?;
        csv::write_file(&path, &rows).with_context(|| format!("writing {}", path.display()))?;
        rows.len()
      }
    };
    info!(file = %path.display(), rows, "exported");
    written.push((path, rows));
  }
  Ok(written)
}

// ─── Reports ─────────────────────────────────────────────────────────────────

pub async fn show_results(app: &App, limit: usize) -> Result<()> {
  let rows = app.store.odds_vs_results(limit).await.context("reading results")?;
  println!("{}", report::results_table(&rows));
  Ok(())
}

pub async fn show_stats(app: &App) -> Result<()> {
  let stats = app.store.bookmaker_stats().await.context("reading bookmaker stats")?;
  println!("{}", report::stats_table(&stats));
  Ok(())
}

pub fn list_leagues(app: &App) {
  println!("{}", report::leagues_table(app.catalog.all()));
}

pub async fn list_bookmakers(app: &App) -> Result<()> {
  let bookmakers = app.store.list_bookmakers().await.context("reading bookmakers")?;
  println!("{}", report::bookmakers_table(&bookmakers));
  Ok(())
}

pub async fn quota(app: &App) -> Result<()> {
  let client = app.odds_api()?;
  let soccer = client.soccer_leagues().await.context("listing sports")?;
  println!("{}", report::quota(&client.quota(), &soccer));
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  #[test]
  fn results_file_entries_may_omit_the_date() {
    let reports = parse_reports(
      r#"
        [[results]]
        home_team  = "Manchester United"
        away_team  = "Manchester City"
        home_score = 2
        away_score = 0
        date       = "2026-01-17"

        [[results]]
        home_team  = "Chelsea"
        away_team  = "Brentford"
        home_score = 1
        away_score = 1
      "#,
    )
    .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].date, NaiveDate::from_ymd_opt(2026, 1, 17));
    assert_eq!(reports[1].date, None);
    assert_eq!((reports[1].home_score, reports[1].away_score), (1, 1));
  }

  #[test]
  fn empty_results_file_is_valid() {
    assert!(parse_reports("").unwrap().is_empty());
  }

  #[test]
  fn negative_scores_are_rejected() {
    let err = parse_reports(
      "[[results]]\nhome_team = \"A\"\naway_team = \"B\"\nhome_score = -1\naway_score = 0\n",
    );
    assert!(err.is_err());
  }

  #[tokio::test]
  async fn export_writes_every_file_for_an_empty_store() {
    let dir = std::env::temp_dir().join(format!("touchline-export-{}", std::process::id()));
    let app = App {
      settings: Settings::default(),
      store:    SqliteStore::open_in_memory().await.unwrap(),
      catalog:  LeagueCatalog::builtin(),
      matcher:  TeamMatcher::default(),
    };

    let written = write_exports(&app, &dir, &ExportKind::ALL).await.unwrap();
    assert_eq!(written.len(), 4);
    assert!(written.iter().all(|(_, rows)| *rows == 0));

    let site = fs::read_to_string(dir.join("odds.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&site).unwrap();
    assert_eq!(value["matches"].as_array().unwrap().len(), 0);

    let training = fs::read_to_string(dir.join("training_data.csv")).unwrap();
    assert!(training.starts_with("match_id,"));

    fs::remove_dir_all(&dir).ok();
  }
}
