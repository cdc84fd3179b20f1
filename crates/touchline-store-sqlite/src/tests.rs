//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use touchline_core::{
  collect::{collect_odds, collect_results},
  export::{odds_summary, site_export, training_data},
  feed::{FeedEvent, FeedScore, OddsFeed, ScoresFeed},
  league::{LeagueCatalog, LeagueInfo},
  model::{
    BookmakerDescriptor, BookmakerPrices, FixtureDescriptor, FixtureId,
    FixtureStatus, NewResult, Outcome, PriceTriple, Provenance,
  },
  reconcile::{ReconcileOutcome, Reconciler, ResultReport},
  store::{FixtureQuery, OddsStore},
  teams::TeamMatcher,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn epl() -> LeagueInfo {
  LeagueCatalog::builtin()
    .get("soccer_epl")
    .cloned()
    .expect("epl in catalog")
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
}

fn descriptor(home: &str, away: &str, kickoff: DateTime<Utc>) -> FixtureDescriptor {
  FixtureDescriptor {
    home_team: home.into(),
    away_team: away.into(),
    kickoff,
    external_id: None,
  }
}

fn book(key: &str, name: &str) -> BookmakerDescriptor {
  BookmakerDescriptor { key: key.into(), name: name.into() }
}

fn triple(home: f64, draw: f64, away: f64) -> PriceTriple {
  PriceTriple { home, draw: Some(draw), away }
}

/// Six distinct, valid bookmaker rows.
fn six_rows() -> Vec<(BookmakerDescriptor, PriceTriple)> {
  vec![
    (book("bet365", "Bet365"), triple(2.0, 3.4, 3.8)),
    (book("betfair_ex_uk", "Betfair"), triple(2.1, 3.5, 3.9)),
    (book("coral", "Coral"), triple(1.95, 3.3, 3.75)),
    (book("ladbrokes", "Ladbrokes"), triple(2.0, 3.3, 3.7)),
    (book("unibet_eu", "Unibet"), triple(2.05, 3.4, 3.8)),
    (book("williamhill", "William Hill"), triple(1.9, 3.5, 4.0)),
  ]
}

async fn seed_fixture(s: &SqliteStore, home: &str, away: &str, kickoff: DateTime<Utc>) -> FixtureId {
  let league = s.get_or_create_league(epl()).await.unwrap();
  s.get_or_create_fixture(league.league_id, descriptor(home, away, kickoff))
    .await
    .unwrap()
    .fixture_id
}

// ─── Reference data ──────────────────────────────────────────────────────────

#[tokio::test]
async fn league_and_bookmaker_are_find_or_create() {
  let s = store().await;

  let a = s.get_or_create_league(epl()).await.unwrap();
  let b = s.get_or_create_league(epl()).await.unwrap();
  assert_eq!(a.league_id, b.league_id);
  assert_eq!(a.country.as_deref(), Some("England"));
  assert_eq!(s.list_leagues().await.unwrap().len(), 1);

  let x = s.get_or_create_bookmaker(book("williamhill", "William Hill")).await.unwrap();
  let y = s.get_or_create_bookmaker(book("williamhill", "William Hill")).await.unwrap();
  s.get_or_create_bookmaker(book("bet365", "Bet365")).await.unwrap();
  assert_eq!(x.bookmaker_id, y.bookmaker_id);

  let names: Vec<_> = s
    .list_bookmakers()
    .await
    .unwrap()
    .into_iter()
    .map(|b| b.name)
    .collect();
  assert_eq!(names, ["Bet365", "William Hill"]);
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fixture_natural_key_is_idempotent() {
  let s = store().await;
  let first = seed_fixture(&s, "Arsenal", "Chelsea", at(10, 15)).await;
  let second = seed_fixture(&s, "Arsenal", "Chelsea", at(10, 15)).await;
  assert_eq!(first, second);

  let other = seed_fixture(&s, "Arsenal", "Chelsea", at(11, 15)).await;
  assert_ne!(first, other);

  let all = s.list_fixtures(FixtureQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].kickoff, at(10, 15));
  assert_eq!(all[0].status, FixtureStatus::Upcoming);
}

#[tokio::test]
async fn external_id_is_filled_once() {
  let s = store().await;
  let league = s.get_or_create_league(epl()).await.unwrap();
  let bare = descriptor("Fulham", "Everton", at(12, 20));

  let f = s.get_or_create_fixture(league.league_id, bare.clone()).await.unwrap();
  assert!(f.external_id.is_none());

  let tagged = FixtureDescriptor { external_id: Some("abc".into()), ..bare.clone() };
  let f = s.get_or_create_fixture(league.league_id, tagged).await.unwrap();
  assert_eq!(f.external_id.as_deref(), Some("abc"));

  let retagged = FixtureDescriptor { external_id: Some("xyz".into()), ..bare };
  let f = s.get_or_create_fixture(league.league_id, retagged).await.unwrap();
  assert_eq!(f.external_id.as_deref(), Some("abc"));
}

#[tokio::test]
async fn list_fixtures_filters_and_orders() {
  let s = store().await;
  let a = seed_fixture(&s, "Arsenal", "Chelsea", at(10, 15)).await;
  let b = seed_fixture(&s, "Leeds", "Burnley", at(11, 15)).await;
  let c = seed_fixture(&s, "Wolves", "Fulham", at(14, 15)).await;
  s.set_fixture_status(b, FixtureStatus::Live).await.unwrap();

  let upcoming = s
    .list_fixtures(FixtureQuery::with_status(FixtureStatus::Upcoming))
    .await
    .unwrap();
  let ids: Vec<_> = upcoming.iter().map(|f| f.fixture_id).collect();
  assert_eq!(ids, [a, c]);

  let newest = s
    .list_fixtures(FixtureQuery { newest_first: true, limit: Some(2), ..FixtureQuery::default() })
    .await
    .unwrap();
  let ids: Vec<_> = newest.iter().map(|f| f.fixture_id).collect();
  assert_eq!(ids, [c, b]);

  let window = s
    .list_fixtures(FixtureQuery {
      kickoff_from: Some(at(10, 15)),
      kickoff_to: Some(at(11, 15)),
      ..FixtureQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(window.len(), 2);

  let live = s.get_fixture(b).await.unwrap().unwrap();
  assert_eq!(live.status, FixtureStatus::Live);
}

#[tokio::test]
async fn status_change_on_missing_fixture_fails() {
  let s = store().await;
  let err = s
    .set_fixture_status(FixtureId(99), FixtureStatus::Live)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::FixtureNotFound(FixtureId(99))));
}

// ─── Odds snapshots ──────────────────────────────────────────────────────────

#[tokio::test]
async fn snapshot_written_only_on_change() {
  let s = store().await;
  let fixture = seed_fixture(&s, "Arsenal", "Chelsea", at(10, 15)).await;
  let bm = s.get_or_create_bookmaker(book("bet365", "Bet365")).await.unwrap();
  let prices = triple(1.8, 3.5, 4.2);

  assert!(s.odds_changed(fixture, bm.bookmaker_id, prices).await.unwrap());
  s.insert_snapshot(fixture, bm.bookmaker_id, prices, Provenance::Api)
    .await
    .unwrap();

  let nudged = PriceTriple { home: 1.8005, ..prices };
  assert!(!s.odds_changed(fixture, bm.bookmaker_id, nudged).await.unwrap());

  let moved = PriceTriple { away: 4.25, ..prices };
  assert!(s.odds_changed(fixture, bm.bookmaker_id, moved).await.unwrap());
}

#[tokio::test]
async fn ingest_appends_changed_rows_only() {
  let s = store().await;
  let kickoff = at(10, 15);

  let first = s
    .ingest_odds(epl(), descriptor("Arsenal", "Chelsea", kickoff), six_rows(), Provenance::Api)
    .await
    .unwrap();
  assert_eq!(first.snapshots_written, 6);
  assert_eq!(first.unchanged, 0);

  let mut rows = six_rows();
  rows[0].1 = triple(2.2, 3.4, 3.6);
  let second = s
    .ingest_odds(epl(), descriptor("Arsenal", "Chelsea", kickoff), rows, Provenance::Api)
    .await
    .unwrap();
  assert_eq!(second.fixture_id, first.fixture_id);
  assert_eq!(second.snapshots_written, 1);
  assert_eq!(second.unchanged, 5);

  let latest = s.latest_odds(first.fixture_id).await.unwrap();
  assert_eq!(latest.len(), 6);
  assert_eq!(latest[0].bookmaker.name, "Bet365");
  assert_eq!(latest[0].snapshot.prices.home, 2.2);

  let history = s.fixture_snapshots(first.fixture_id).await.unwrap();
  assert_eq!(history.len(), 7);
  assert_eq!(history[0].snapshot.prices.home, 2.0);
}

// ─── Results ─────────────────────────────────────────────────────────────────

fn score(home: u32, away: u32, provenance: Provenance) -> NewResult {
  NewResult { home_score: home, away_score: away, provenance }
}

#[tokio::test]
async fn upsert_replaces_and_completes() {
  let s = store().await;
  let fixture = seed_fixture(&s, "Arsenal", "Chelsea", at(10, 15)).await;

  let r = s.upsert_result(fixture, score(1, 1, Provenance::Espn)).await.unwrap();
  assert_eq!(r.outcome, Outcome::Draw);

  let r = s.upsert_result(fixture, score(2, 1, Provenance::Manual)).await.unwrap();
  assert_eq!(r.outcome, Outcome::Home);

  let stored = s.get_result(fixture).await.unwrap().unwrap();
  assert_eq!((stored.home_score, stored.away_score), (2, 1));
  assert_eq!(stored.provenance, Provenance::Manual);

  let f = s.get_fixture(fixture).await.unwrap().unwrap();
  assert_eq!(f.status, FixtureStatus::Completed);
  assert_eq!(s.recent_results(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn conditional_result_write() {
  let s = store().await;
  let fixture = seed_fixture(&s, "Arsenal", "Chelsea", at(10, 15)).await;

  let first = s
    .record_result_if_absent(fixture, score(0, 2, Provenance::Espn))
    .await
    .unwrap();
  assert_eq!(first.unwrap().outcome, Outcome::Away);

  let again = s
    .record_result_if_absent(fixture, score(3, 0, Provenance::Espn))
    .await
    .unwrap();
  assert!(again.is_none());
  assert_eq!(s.get_result(fixture).await.unwrap().unwrap().away_score, 2);

  let err = s
    .record_result_if_absent(FixtureId(404), score(1, 0, Provenance::Espn))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::FixtureNotFound(_)));
}

#[tokio::test]
async fn final_score_creates_fixture_when_unseen() {
  let s = store().await;
  let r = s
    .record_final_score(epl(), descriptor("Brentford", "Wolves", at(3, 15)), score(2, 2, Provenance::Api))
    .await
    .unwrap();
  let f = s.get_fixture(r.fixture_id).await.unwrap().unwrap();
  assert_eq!(f.home_team, "Brentford");
  assert_eq!(f.status, FixtureStatus::Completed);
}

#[tokio::test]
async fn odds_versus_results_view() {
  let s = store().await;
  let report = s
    .ingest_odds(epl(), descriptor("Arsenal", "Chelsea", at(10, 15)), six_rows(), Provenance::Api)
    .await
    .unwrap();
  s.upsert_result(report.fixture_id, score(0, 1, Provenance::Api))
    .await
    .unwrap();

  let rows = s.odds_vs_results(100).await.unwrap();
  assert_eq!(rows.len(), 6);
  let wh = rows.iter().find(|r| r.bookmaker == "William Hill").unwrap();
  assert_eq!(wh.outcome, Outcome::Away);
  assert_eq!(wh.winning_odds, Some(4.0));

  let stats = s.bookmaker_stats().await.unwrap();
  assert_eq!(stats.len(), 6);
  assert_eq!(stats[0].bookmaker, "William Hill");
  assert_eq!(stats[0].matches, 1);
}

#[tokio::test]
async fn snapshot_history_joins_context() {
  let s = store().await;
  let report = s
    .ingest_odds(epl(), descriptor("Arsenal", "Chelsea", at(10, 15)), six_rows(), Provenance::Scraped)
    .await
    .unwrap();
  s.upsert_result(report.fixture_id, score(2, 0, Provenance::Api))
    .await
    .unwrap();

  let history = s.snapshot_history().await.unwrap();
  assert_eq!(history.len(), 6);
  assert!(history.iter().all(|r| r.league.key == "soccer_epl"));
  assert!(history.iter().all(|r| r.snapshot.provenance == Provenance::Scraped));
  assert_eq!(history[0].result.as_ref().unwrap().outcome, Outcome::Home);
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

fn report(home: &str, away: &str, scores: (u32, u32), date: Option<NaiveDate>) -> ResultReport {
  ResultReport {
    home_team: home.into(),
    away_team: away.into(),
    home_score: scores.0,
    away_score: scores.1,
    date,
  }
}

#[tokio::test]
async fn reconciler_matches_and_is_idempotent() {
  let s = store().await;
  let day = NaiveDate::from_ymd_opt(2026, 1, 17).unwrap();
  let fixture = seed_fixture(&s, "Manchester United", "Manchester City", at(17, 2)).await;

  let matcher = TeamMatcher::default();
  let reconciler = Reconciler::new(&s, &matcher, Provenance::Espn);
  let r = report("Manchester United", "Manchester City", (2, 0), Some(day));

  let outcome = reconciler.reconcile(&r).await.unwrap();
  assert_eq!(outcome, ReconcileOutcome::Updated(fixture));

  let result = s.get_result(fixture).await.unwrap().unwrap();
  assert_eq!(result.outcome, Outcome::Home);
  let f = s.get_fixture(fixture).await.unwrap().unwrap();
  assert_eq!(f.status, FixtureStatus::Completed);

  let summary = reconciler.reconcile_all(&[r]).await;
  assert_eq!(summary.matched, 1);
  assert_eq!(summary.updated, 0);
  assert!(summary.not_found.is_empty());
  assert_eq!(s.recent_results(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reconciler_uses_aliases_and_window() {
  let s = store().await;
  let inside = seed_fixture(&s, "Manchester United", "Tottenham Hotspur", at(17, 20)).await;
  // Outside [D-12h, D+36h] for D = 17th.
  seed_fixture(&s, "Newcastle United", "Leeds United", at(20, 15)).await;

  let matcher = TeamMatcher::default();
  let reconciler = Reconciler::new(&s, &matcher, Provenance::Espn);
  let day = NaiveDate::from_ymd_opt(2026, 1, 17);

  let summary = reconciler
    .reconcile_all(&[
      report("Man United", "Tottenham", (1, 1), day),
      report("Newcastle", "Leeds", (3, 0), day),
      report("Spurs", "Arsenal", (0, 0), day),
    ])
    .await;

  assert_eq!(summary.matched, 1);
  assert_eq!(summary.updated, 1);
  assert_eq!(summary.not_found, ["Newcastle vs Leeds", "Spurs vs Arsenal"]);
  assert_eq!(summary.errors, 0);
  assert_eq!(s.get_result(inside).await.unwrap().unwrap().outcome, Outcome::Draw);
}

#[tokio::test]
async fn undated_report_prefers_latest_kickoff() {
  let s = store().await;
  let older = seed_fixture(&s, "Chelsea", "Arsenal", at(3, 15)).await;
  let newer = seed_fixture(&s, "Chelsea", "Arsenal", at(24, 15)).await;

  let matcher = TeamMatcher::default();
  let reconciler = Reconciler::new(&s, &matcher, Provenance::Manual);
  let outcome = reconciler
    .reconcile(&report("Chelsea FC", "Arsenal", (1, 0), None))
    .await
    .unwrap();

  assert_eq!(outcome, ReconcileOutcome::Updated(newer));
  assert!(s.get_result(older).await.unwrap().is_none());
}

// ─── Collection pipeline ─────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("feed unavailable")]
struct Unavailable;

/// Serves canned events per league key; any other league fails.
struct StubFeed {
  events: HashMap<String, Vec<FeedEvent>>,
  scores: HashMap<String, Vec<FeedScore>>,
}

impl OddsFeed for StubFeed {
  type Error = Unavailable;

  fn provenance(&self) -> Provenance { Provenance::Api }

  async fn fetch_odds<'a>(&'a self, league: &'a LeagueInfo) -> Result<Vec<FeedEvent>, Unavailable> {
    self.events.get(&league.key).cloned().ok_or(Unavailable)
  }
}

impl ScoresFeed for StubFeed {
  type Error = Unavailable;

  async fn fetch_scores<'a>(
    &'a self,
    league: &'a LeagueInfo,
    _days_from: u32,
  ) -> Result<Vec<FeedScore>, Unavailable> {
    self.scores.get(&league.key).cloned().ok_or(Unavailable)
  }
}

fn feed_event(home: &str, away: &str, kickoff: DateTime<Utc>) -> FeedEvent {
  let mut prices: Vec<BookmakerPrices> = six_rows()
    .into_iter()
    .map(|(bookmaker, p)| BookmakerPrices {
      bookmaker,
      home: Some(p.home),
      draw: p.draw,
      away: Some(p.away),
    })
    .collect();
  // A second Betfair entry point with a wider book, a flat placeholder, and a
  // row with no home price.
  prices.push(BookmakerPrices {
    bookmaker: book("betfair_ex_eu", "Betfair"),
    home:      Some(2.0),
    draw:      Some(3.3),
    away:      Some(3.6),
  });
  prices.push(BookmakerPrices {
    bookmaker: book("matchbook", "Matchbook"),
    home:      Some(2.0),
    draw:      Some(2.0),
    away:      Some(2.0),
  });
  prices.push(BookmakerPrices {
    bookmaker: book("paddypower", "Paddy Power"),
    home:      None,
    draw:      Some(3.3),
    away:      Some(3.6),
  });
  FeedEvent { fixture: descriptor(home, away, kickoff), prices }
}

fn stub() -> StubFeed {
  let mut events = HashMap::new();
  events.insert(
    "soccer_epl".to_owned(),
    vec![
      feed_event("Arsenal", "Chelsea", at(10, 15)),
      feed_event("Leeds", "Burnley", at(11, 15)),
    ],
  );
  let mut scores = HashMap::new();
  scores.insert(
    "soccer_epl".to_owned(),
    vec![FeedScore {
      fixture:    descriptor("Arsenal", "Chelsea", at(10, 15)),
      home_score: 3,
      away_score: 1,
    }],
  );
  StubFeed { events, scores }
}

#[tokio::test]
async fn collect_filters_stores_and_isolates_failures() {
  let s = store().await;
  let feed = stub();
  let catalog = LeagueCatalog::builtin();
  let leagues = catalog.select(&["soccer_epl".to_owned(), "soccer_italy_serie_a".to_owned()]);

  let first = collect_odds(&s, &feed, &leagues).await;
  assert_eq!(first.matches, 2);
  assert_eq!(first.odds_snapshots, 16);
  assert_eq!(first.rejected_rows, 2);
  assert_eq!(first.errors, 1);

  let second = collect_odds(&s, &feed, &leagues).await;
  assert_eq!(second.odds_snapshots, 0);
  assert_eq!(second.unchanged, 16);

  let site = site_export(&s, Utc::now()).await.unwrap();
  assert_eq!(site.matches.len(), 2);
  assert_eq!(site.matches[0].home_team, "Arsenal");
  assert_eq!(site.matches[0].bookmaker_count, 6);
  assert_eq!(site.bookmakers.len(), 8);
  assert!(site.results.is_empty());

  let results = collect_results(&s, &feed, &leagues, 3, Provenance::Api).await;
  assert_eq!(results.results, 1);
  assert_eq!(results.errors, 1);

  let site = site_export(&s, Utc::now()).await.unwrap();
  assert_eq!(site.matches.len(), 1);
  assert_eq!(site.results.len(), 1);
  assert_eq!(site.results[0].outcome, Outcome::Home);

  let summary = odds_summary(&s).await.unwrap();
  assert_eq!(summary.len(), 2);
  assert_eq!(summary[0].home_team, "Leeds");
  assert!(summary[1].result.is_some());

  let training = training_data(&s).await.unwrap();
  assert_eq!(training.len(), 6);
  assert!(training.iter().all(|r| r.outcome == Outcome::Home));
}

fn odds_event(prices: Vec<(BookmakerDescriptor, PriceTriple)>) -> FeedEvent {
  let prices = prices
    .into_iter()
    .map(|(bookmaker, p)| BookmakerPrices {
      bookmaker,
      home: Some(p.home),
      draw: p.draw,
      away: Some(p.away),
    })
    .collect();
  FeedEvent { fixture: descriptor("Arsenal", "Chelsea", at(10, 15)), prices }
}

fn single_league_feed(event: FeedEvent) -> StubFeed {
  StubFeed {
    events: HashMap::from([("soccer_epl".to_owned(), vec![event])]),
    scores: HashMap::new(),
  }
}

/// Five single-key brands plus both Betfair keys.
fn with_betfair(uk: PriceTriple, eu: PriceTriple) -> Vec<(BookmakerDescriptor, PriceTriple)> {
  let mut rows: Vec<_> = six_rows()
    .into_iter()
    .filter(|(b, _)| b.name != "Betfair")
    .collect();
  rows.push((book("betfair_ex_uk", "Betfair"), uk));
  rows.push((book("betfair_ex_eu", "Betfair"), eu));
  rows
}

#[tokio::test]
async fn export_follows_each_key_current_price() {
  let s = store().await;
  let leagues = vec![epl()];

  let mut run1 = with_betfair(triple(2.1, 3.5, 3.9), triple(1.9, 3.2, 3.6));
  run1.push((
    book("nodraw", "No Draw"),
    PriceTriple { home: 1.8, draw: None, away: 4.2 },
  ));
  collect_odds(&s, &single_league_feed(odds_event(run1)), &leagues).await;

  // The uk key drifts wide; the eu key now has the tighter book.
  let run2 = with_betfair(triple(1.8, 3.0, 3.4), triple(2.05, 3.4, 3.8));
  let summary = collect_odds(&s, &single_league_feed(odds_event(run2)), &leagues).await;
  assert_eq!(summary.odds_snapshots, 2);
  assert_eq!(summary.rejected_rows, 0);

  let site = site_export(&s, Utc::now()).await.unwrap();
  assert_eq!(site.matches.len(), 1);
  let m = &site.matches[0];
  assert_eq!(m.bookmaker_count, 6);
  let betfair = m.odds.iter().find(|o| o.bookmaker == "Betfair").unwrap();
  assert_eq!(betfair.bookmaker_key, "betfair_ex_eu");
  assert_eq!((betfair.home, betfair.draw, betfair.away), (2.05, 3.4, 3.8));
  assert!(m.odds.iter().all(|o| o.bookmaker != "No Draw"));

  // The draw-less row is stored even though it never reaches aggregates.
  let latest = s.latest_odds(m.id).await.unwrap();
  assert_eq!(latest.len(), 8);
  let nodraw = latest.iter().find(|o| o.bookmaker.key == "nodraw").unwrap();
  assert_eq!(nodraw.snapshot.prices.draw, None);
}
