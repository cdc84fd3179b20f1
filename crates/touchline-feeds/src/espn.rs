//! Public scoreboard scraper.
//!
//! The scoreboard lists one card per competition and one cell per game, with
//! the away side first. Parsed games become [`ResultReport`]s dated on the
//! scoreboard day, ready for the reconciler.

use chrono::{Duration, NaiveDate};
use scraper::Html;
use tracing::{debug, info};
use touchline_core::reconcile::ResultReport;

use crate::{
  Result, get_text,
  html::{select, text},
  http_client,
};

pub const DEFAULT_BASE_URL: &str = "https://www.espn.com";

pub struct EspnClient {
  client:   reqwest::Client,
  base_url: String,
}

impl EspnClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    Ok(Self { client: http_client()?, base_url: base_url.into() })
  }

  pub fn scoreboard_url(&self, date: NaiveDate) -> String {
    format!(
      "{}/soccer/scoreboard/_/date/{}",
      self.base_url.trim_end_matches('/'),
      date.format("%Y%m%d")
    )
  }

  /// Every finished game listed for `date`.
  pub async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<ResultReport>> {
    let url = self.scoreboard_url(date);
    info!(%url, "fetching scoreboard");
    let body = get_text(&self.client, &url).await?;
    Ok(parse_scoreboard(&body, date))
  }
}

/// `today` and the `days_back` days before it, newest first.
pub fn scoreboard_days(today: NaiveDate, days_back: u32) -> Vec<NaiveDate> {
  (0..=i64::from(days_back)).map(|n| today - Duration::days(n)).collect()
}

pub fn parse_scoreboard(html: &str, date: NaiveDate) -> Vec<ResultReport> {
  let doc = Html::parse_document(html);
  let mut reports = Vec::new();

  for card in select(doc.root_element(), "section.Card") {
    let Some(league) = select(card, "div.Card__Header__Title").first().map(|el| text(*el))
    else {
      continue;
    };

    for game in select(card, "article.ScoreboardScoreCell") {
      let teams = select(game, "div.ScoreCell__TeamName");
      let scores = select(game, "div.ScoreCell__Score");
      if teams.len() < 2 || scores.len() < 2 {
        continue;
      }
      // Unplayed games show no score; anything non-numeric is skipped.
      let (Ok(away_score), Ok(home_score)) =
        (text(scores[0]).parse::<u32>(), text(scores[1]).parse::<u32>())
      else {
        continue;
      };

      let report = ResultReport {
        home_team: text(teams[1]),
        away_team: text(teams[0]),
        home_score,
        away_score,
        date: Some(date),
      };
      debug!(%league, "{}", report.label());
      reports.push(report);
    }
  }

  reports
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 1, 17).unwrap() }

  const SCOREBOARD: &str = r#"
    <html><body>
      <section class="Card">
        <div class="Card__Header__Title">English Premier League</div>
        <article class="ScoreboardScoreCell">
          <div class="ScoreCell__TeamName">Man City</div>
          <div class="ScoreCell__Score">0</div>
          <div class="ScoreCell__TeamName">Man United</div>
          <div class="ScoreCell__Score">2</div>
        </article>
        <article class="ScoreboardScoreCell">
          <div class="ScoreCell__TeamName">Burnley</div>
          <div class="ScoreCell__TeamName">Wolves</div>
        </article>
        <article class="ScoreboardScoreCell">
          <div class="ScoreCell__TeamName">Fulham</div>
          <div class="ScoreCell__Score">-</div>
          <div class="ScoreCell__TeamName">Everton</div>
          <div class="ScoreCell__Score">-</div>
        </article>
      </section>
      <section class="Card">
        <article class="ScoreboardScoreCell">
          <div class="ScoreCell__TeamName">Nowhere</div>
          <div class="ScoreCell__Score">1</div>
          <div class="ScoreCell__TeamName">Somewhere</div>
          <div class="ScoreCell__Score">1</div>
        </article>
      </section>
      <section class="Card">
        <div class="Card__Header__Title">Spanish LALIGA</div>
        <article class="ScoreboardScoreCell">
          <div class="ScoreCell__TeamName">Sevilla</div>
          <div class="ScoreCell__Score">1</div>
          <div class="ScoreCell__TeamName">Atletico Madrid</div>
          <div class="ScoreCell__Score">1</div>
        </article>
      </section>
    </body></html>
  "#;

  #[test]
  fn away_side_is_listed_first() {
    let reports = parse_scoreboard(SCOREBOARD, day());
    assert_eq!(reports.len(), 2);
    assert_eq!(
      reports[0],
      ResultReport {
        home_team:  "Man United".into(),
        away_team:  "Man City".into(),
        home_score: 2,
        away_score: 0,
        date:       Some(day()),
      }
    );
    assert_eq!(reports[1].home_team, "Atletico Madrid");
    assert_eq!((reports[1].home_score, reports[1].away_score), (1, 1));
  }

  #[test]
  fn url_uses_compact_date() {
    let client = EspnClient::new("https://example.test/").unwrap();
    assert_eq!(
      client.scoreboard_url(day()),
      "https://example.test/soccer/scoreboard/_/date/20260117"
    );
  }

  #[test]
  fn days_run_back_from_today() {
    let days = scoreboard_days(day(), 2);
    assert_eq!(days.len(), 3);
    assert_eq!(days[0], day());
    assert_eq!(days[2], NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
  }
}
