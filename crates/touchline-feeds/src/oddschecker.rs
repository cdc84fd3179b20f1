//! Scraper for the odds comparison site.
//!
//! League pages are fetched as static HTML and parsed with `scraper`. Each
//! match container yields team names, a kick-off parsed from the displayed
//! clock text, and one price row per known bookmaker column.

use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike, Utc};
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};
use touchline_core::{
  feed::{FeedEvent, OddsFeed},
  league::LeagueInfo,
  model::{BookmakerDescriptor, BookmakerPrices, FixtureDescriptor, Provenance},
  normalize::parse_price,
};

use crate::{
  Result, get_text,
  html::{select, text},
  http_client,
  rate_limit::{Limiter, pace, spaced},
};

pub const DEFAULT_BASE_URL: &str = "https://www.oddschecker.com";

/// Column code on the page, bookmaker key, display name.
pub const BOOKMAKER_CODES: &[(&str, &str, &str)] = &[
  ("B3", "bet365", "Bet365"),
  ("SK", "skybet", "Sky Bet"),
  ("PP", "paddypower", "Paddy Power"),
  ("WH", "williamhill", "William Hill"),
  ("LD", "ladbrokes", "Ladbrokes"),
  ("CE", "coral", "Coral"),
  ("BF", "betfair_ex_eu", "Betfair"),
  ("UN", "unibet_eu", "Unibet"),
  ("BY", "betway", "Betway"),
  ("FR", "betfred", "Betfred"),
  ("OE", "888sport", "888sport"),
  ("BO", "boylesports", "BoyleSports"),
  ("VB", "betvictor", "BetVictor"),
];

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

#[derive(Debug, Clone)]
pub struct OddscheckerConfig {
  pub base_url: String,
  /// Pause between consecutive page fetches.
  pub delay:    StdDuration,
}

impl Default for OddscheckerConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_owned(),
      delay:    StdDuration::from_secs(3),
    }
  }
}

pub struct OddscheckerScraper {
  client:   reqwest::Client,
  base_url: String,
  limiter:  Option<Limiter>,
}

impl OddscheckerScraper {
  pub fn new(config: OddscheckerConfig) -> Result<Self> {
    Ok(Self {
      client:   http_client()?,
      base_url: config.base_url,
      limiter:  spaced(config.delay),
    })
  }
}

impl OddsFeed for OddscheckerScraper {
  type Error = crate::Error;

  fn provenance(&self) -> Provenance { Provenance::Scraped }

  async fn fetch_odds(&self, league: &LeagueInfo) -> Result<Vec<FeedEvent>> {
    let Some(path) = league.oddschecker_path.as_deref() else {
      debug!(league = %league.key, "no page configured, skipping");
      return Ok(Vec::new());
    };

    pace(self.limiter.as_ref()).await;
    let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
    info!(%url, "scraping");
    let body = get_text(&self.client, &url).await?;

    let events = parse_page(&body, Utc::now().naive_utc());
    if events.is_empty() {
      warn!(%url, "no match rows found");
    }
    Ok(events)
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Every match on a league page. `now` anchors relative kick-off labels.
pub fn parse_page(html: &str, now: NaiveDateTime) -> Vec<FeedEvent> {
  let doc = Html::parse_document(html);
  let root = doc.root_element();

  let mut rows = select(root, "[data-event-id]");
  if rows.is_empty() {
    rows = select(root, ".betting-event");
  }
  if rows.is_empty() {
    rows = select(root, ".event-information");
  }

  rows.into_iter().filter_map(|row| parse_row(row, now)).collect()
}

fn parse_row(row: ElementRef<'_>, now: NaiveDateTime) -> Option<FeedEvent> {
  let (home_team, away_team) = team_names(row)?;

  let kickoff = select(row, ".time, .event-time, [data-time]")
    .first()
    .and_then(|el| parse_match_time(&text(*el), now))
    .unwrap_or(now + Duration::hours(24))
    .and_utc();

  let prices: Vec<BookmakerPrices> = BOOKMAKER_CODES
    .iter()
    .filter_map(|&(code, key, name)| {
      let cells = select(row, &format!("[data-bk='{code}']"));
      if cells.len() < 3 {
        return None;
      }
      let home = parse_price(&text(cells[0]));
      let draw = parse_price(&text(cells[1]));
      let away = parse_price(&text(cells[2]));
      if home.is_none() || away.is_none() {
        debug!(bookmaker = key, "{home_team} v {away_team}: incomplete prices");
        return None;
      }
      Some(BookmakerPrices {
        bookmaker: BookmakerDescriptor { key: key.to_owned(), name: name.to_owned() },
        home,
        draw,
        away,
      })
    })
    .collect();

  if prices.is_empty() {
    return None;
  }

  Some(FeedEvent {
    fixture: FixtureDescriptor { home_team, away_team, kickoff, external_id: None },
    prices,
  })
}

fn team_names(row: ElementRef<'_>) -> Option<(String, String)> {
  let mut teams = select(row, ".team-name");
  if teams.is_empty() {
    teams = select(row, "[data-team]");
  }

  let (home, away) = if teams.len() >= 2 {
    (text(teams[0]), text(teams[1]))
  } else {
    let title = select(row, ".match-name, .event-name").first().map(|el| text(*el))?;
    split_title(&title)?
  };

  (!home.is_empty() && !away.is_empty()).then_some((home, away))
}

/// `"Home v Away"` or `"Home vs Away"` (any case).
fn split_title(title: &str) -> Option<(String, String)> {
  if let Some((home, away)) = title.split_once(" v ") {
    return Some((home.trim().to_owned(), away.trim().to_owned()));
  }
  let at = title.to_ascii_lowercase().find(" vs ")?;
  Some((title[..at].trim().to_owned(), title[at + 4..].trim().to_owned()))
}

/// First `H:MM` / `HH:MM` clock in `s`.
fn find_clock(s: &str) -> Option<(u32, u32)> {
  let bytes = s.as_bytes();
  (1..bytes.len().saturating_sub(2)).find_map(|i| {
    if bytes[i] != b':'
      || !bytes[i - 1].is_ascii_digit()
      || !bytes[i + 1].is_ascii_digit()
      || !bytes[i + 2].is_ascii_digit()
    {
      return None;
    }
    let start = if i >= 2 && bytes[i - 2].is_ascii_digit() { i - 2 } else { i - 1 };
    Some((s[start..i].parse().ok()?, s[i + 1..i + 3].parse().ok()?))
  })
}

/// Parse a kick-off label such as `15:00`, `Today 15:00`, `Tomorrow 20:45`
/// or `Sat 12:30` relative to `now`.
///
/// A weekday label names the next such day; today's weekday with an hour
/// already past means a week ahead. Labels without a day mean today.
pub fn parse_match_time(label: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
  let (hour, minute) = find_clock(label)?;
  let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
  let lower = label.to_lowercase();
  let today = now.date();

  let date = if lower.contains("today") {
    today
  } else if lower.contains("tomorrow") {
    today + Duration::days(1)
  } else if let Some(day) = WEEKDAYS.iter().position(|d| lower.contains(d)) {
    let current = i64::from(now.weekday().num_days_from_monday());
    let mut ahead = (day as i64 - current).rem_euclid(7);
    if ahead == 0 && hour < now.hour() {
      ahead = 7;
    }
    today + Duration::days(ahead)
  } else {
    today
  };

  Some(date.and_time(time))
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  /// Wednesday 14 January 2026, 10:00.
  fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 14).unwrap().and_hms_opt(10, 0, 0).unwrap()
  }

  fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, day).unwrap().and_hms_opt(hour, minute, 0).unwrap()
  }

  #[test]
  fn relative_day_labels() {
    assert_eq!(parse_match_time("Today 15:00", now()), Some(at(14, 15, 0)));
    assert_eq!(parse_match_time("Tomorrow 20:45", now()), Some(at(15, 20, 45)));
    assert_eq!(parse_match_time("Sat 12:30", now()), Some(at(17, 12, 30)));
    assert_eq!(parse_match_time("Mon 19:45", now()), Some(at(19, 19, 45)));
    assert_eq!(parse_match_time("15:00", now()), Some(at(14, 15, 0)));
  }

  #[test]
  fn same_weekday_already_past_is_next_week() {
    assert_eq!(parse_match_time("Wed 9:00", now()), Some(at(21, 9, 0)));
    assert_eq!(parse_match_time("Wed 11:00", now()), Some(at(14, 11, 0)));
  }

  #[test]
  fn labels_without_a_valid_clock() {
    assert_eq!(parse_match_time("TBC", now()), None);
    assert_eq!(parse_match_time("", now()), None);
    assert_eq!(parse_match_time("Sat 25:00", now()), None);
  }

  #[test]
  fn titles_split_on_v_or_vs() {
    assert_eq!(
      split_title("Arsenal v Tottenham"),
      Some(("Arsenal".to_owned(), "Tottenham".to_owned()))
    );
    assert_eq!(
      split_title("Inter VS Milan"),
      Some(("Inter".to_owned(), "Milan".to_owned()))
    );
    assert_eq!(split_title("Arsenal"), None);
  }

  const PAGE: &str = r#"
    <html><body>
      <div data-event-id="101">
        <span class="team-name">Chelsea</span>
        <span class="team-name">Brentford</span>
        <span class="time">Sat 15:00</span>
        <span data-bk="B3">8/13</span><span data-bk="B3">5/2</span><span data-bk="B3">9/2</span>
        <span data-bk="WH">EVS</span><span data-bk="WH">SP</span><span data-bk="WH">4.50</span>
        <span data-bk="SK">SP</span><span data-bk="SK">5/2</span><span data-bk="SK">9/2</span>
        <span data-bk="ZZ">1/1</span><span data-bk="ZZ">1/1</span><span data-bk="ZZ">1/1</span>
      </div>
      <div data-event-id="102">
        <div class="event-name">Arsenal v Tottenham</div>
        <span data-bk="PP">4/5</span><span data-bk="PP">11/4</span><span data-bk="PP">10/3</span>
      </div>
      <div data-event-id="103">
        <span class="team-name">Everton</span>
        <span class="team-name">Fulham</span>
      </div>
    </body></html>
  "#;

  #[test]
  fn page_yields_one_event_per_priced_match() {
    let events = parse_page(PAGE, now());
    assert_eq!(events.len(), 2);

    let first = &events[0];
    assert_eq!(first.fixture.home_team, "Chelsea");
    assert_eq!(first.fixture.away_team, "Brentford");
    assert_eq!(first.fixture.kickoff, at(17, 15, 0).and_utc());
    assert_eq!(first.fixture.external_id, None);

    // Sky Bet has no home price and the unknown code is ignored.
    let keys: Vec<&str> = first.prices.iter().map(|p| p.bookmaker.key.as_str()).collect();
    assert_eq!(keys, ["bet365", "williamhill"]);

    let b3 = &first.prices[0];
    assert!((b3.home.unwrap() - (8.0 / 13.0 + 1.0)).abs() < 1e-9);
    assert_eq!(b3.draw, Some(3.5));
    assert_eq!(b3.away, Some(5.5));

    let wh = &first.prices[1];
    assert_eq!((wh.home, wh.draw, wh.away), (Some(2.0), None, Some(4.5)));
  }

  #[test]
  fn missing_kickoff_defaults_to_a_day_ahead() {
    let events = parse_page(PAGE, now());
    let second = &events[1];
    assert_eq!(second.fixture.home_team, "Arsenal");
    assert_eq!(second.fixture.away_team, "Tottenham");
    assert_eq!(second.fixture.kickoff, at(15, 10, 0).and_utc());
    assert_eq!(second.prices[0].bookmaker.name, "Paddy Power");
  }

  #[test]
  fn falls_back_to_betting_event_containers() {
    let page = r#"
      <div class="betting-event">
        <div class="match-name">Real Madrid vs Sevilla</div>
        <div class="event-time">Today 21:00</div>
        <span data-bk="BY">1/3</span><span data-bk="BY">5/1</span><span data-bk="BY">8/1</span>
      </div>
    "#;
    let events = parse_page(page, now());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].fixture.home_team, "Real Madrid");
    assert_eq!(events[0].fixture.away_team, "Sevilla");
    assert_eq!(events[0].fixture.kickoff, at(14, 21, 0).and_utc());
  }

  #[test]
  fn page_without_matches_is_empty() {
    assert!(parse_page("<html><body><p>Maintenance</p></body></html>", now()).is_empty());
  }

  #[test]
  fn every_code_maps_to_a_distinct_key() {
    let mut keys: Vec<&str> = BOOKMAKER_CODES.iter().map(|(_, k, _)| *k).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), 13);
  }
}
