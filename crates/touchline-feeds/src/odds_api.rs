//! Client for the paid JSON odds API.
//!
//! Every call is spaced by the configured rate limit and sends the API key as
//! a query parameter. The remaining/used request quota is read back from the
//! response headers after each call.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use reqwest::{StatusCode, header::HeaderMap};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};
use touchline_core::{
  feed::{FeedEvent, FeedScore, OddsFeed, ScoresFeed},
  league::LeagueInfo,
  model::{BookmakerDescriptor, BookmakerPrices, FixtureDescriptor, Provenance},
};

use crate::{
  Error, Result, http_client,
  rate_limit::{Limiter, pace, per_minute_interval, spaced},
};

pub const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com/v4";

/// The only market the collector asks for: home / draw / away.
const H2H: &str = "h2h";
/// Outcome name the API uses for the draw in the `h2h` market.
const DRAW: &str = "Draw";
/// The scores endpoint refuses anything outside this range.
const MAX_DAYS_FROM: u32 = 3;

#[derive(Debug, Clone)]
pub struct OddsApiConfig {
  pub base_url:            String,
  pub api_key:             Option<String>,
  pub regions:             Vec<String>,
  pub requests_per_minute: u32,
}

impl Default for OddsApiConfig {
  fn default() -> Self {
    Self {
      base_url:            DEFAULT_BASE_URL.to_owned(),
      api_key:             None,
      regions:             vec!["uk".to_owned()],
      requests_per_minute: 10,
    }
  }
}

/// Request quota as last reported by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Quota {
  pub remaining: Option<u32>,
  pub used:      Option<u32>,
}

impl Quota {
  fn from_headers(headers: &HeaderMap) -> Self {
    let read = |name: &str| {
      headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|v| v.max(0.0) as u32)
    };
    Self {
      remaining: read("x-requests-remaining"),
      used:      read("x-requests-used"),
    }
  }
}

/// One entry of the `sports` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sport {
  pub key:           String,
  #[serde(default)]
  pub group:         String,
  pub title:         String,
  #[serde(default)]
  pub description:   String,
  #[serde(default)]
  pub active:        bool,
  #[serde(default)]
  pub has_outrights: bool,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiEvent {
  id:            String,
  commence_time: DateTime<Utc>,
  home_team:     String,
  away_team:     String,
  #[serde(default)]
  bookmakers:    Vec<ApiBookmaker>,
}

#[derive(Debug, Deserialize)]
struct ApiBookmaker {
  key:     String,
  title:   String,
  #[serde(default)]
  markets: Vec<ApiMarket>,
}

#[derive(Debug, Deserialize)]
struct ApiMarket {
  key:      String,
  #[serde(default)]
  outcomes: Vec<ApiOutcome>,
}

#[derive(Debug, Deserialize)]
struct ApiOutcome {
  name:  String,
  price: f64,
}

#[derive(Debug, Deserialize)]
struct ApiScoreEvent {
  id:            String,
  commence_time: DateTime<Utc>,
  home_team:     String,
  away_team:     String,
  #[serde(default)]
  completed:     bool,
  #[serde(default)]
  scores:        Option<Vec<ApiScore>>,
}

#[derive(Debug, Deserialize)]
struct ApiScore {
  name:  String,
  score: String,
}

impl ApiEvent {
  fn into_feed_event(self) -> FeedEvent {
    let (home, away) = (self.home_team.as_str(), self.away_team.as_str());
    let prices = self
      .bookmakers
      .iter()
      .flat_map(|bookmaker| {
        bookmaker.markets.iter().filter(|m| m.key == H2H).map(move |market| {
          let price = |name: &str| {
            market.outcomes.iter().find(|o| o.name == name).map(|o| o.price)
          };
          BookmakerPrices {
            bookmaker: BookmakerDescriptor {
              key:  bookmaker.key.clone(),
              name: bookmaker.title.clone(),
            },
            home:      price(home),
            draw:      price(DRAW),
            away:      price(away),
          }
        })
      })
      .collect();

    FeedEvent {
      fixture: FixtureDescriptor {
        home_team:   self.home_team,
        away_team:   self.away_team,
        kickoff:     self.commence_time,
        external_id: Some(self.id),
      },
      prices,
    }
  }
}

impl ApiScoreEvent {
  /// `None` unless the event is completed and both sides carry a numeric score.
  fn into_feed_score(self) -> Option<FeedScore> {
    if !self.completed {
      return None;
    }
    let scores = self.scores?;
    let score_of = |team: &str| {
      scores
        .iter()
        .find(|s| s.name == team)
        .and_then(|s| s.score.trim().parse::<u32>().ok())
    };
    let home_score = score_of(&self.home_team)?;
    let away_score = score_of(&self.away_team)?;

    Some(FeedScore {
      fixture: FixtureDescriptor {
        home_team:   self.home_team,
        away_team:   self.away_team,
        kickoff:     self.commence_time,
        external_id: Some(self.id),
      },
      home_score,
      away_score,
    })
  }
}

fn clamp_days(days_from: u32) -> u32 { days_from.clamp(1, MAX_DAYS_FROM) }

// ─── Client ──────────────────────────────────────────────────────────────────

pub struct OddsApiClient {
  client:  reqwest::Client,
  config:  OddsApiConfig,
  limiter: Option<Limiter>,
  quota:   Mutex<Quota>,
}

impl OddsApiClient {
  pub fn new(config: OddsApiConfig) -> Result<Self> {
    let limiter = spaced(per_minute_interval(config.requests_per_minute));
    Ok(Self {
      client: http_client()?,
      config,
      limiter,
      quota: Mutex::new(Quota::default()),
    })
  }

  /// The configured API key, or [`Error::MissingApiKey`].
  pub fn api_key(&self) -> Result<&str> {
    self
      .config
      .api_key
      .as_deref()
      .filter(|k| !k.trim().is_empty())
      .ok_or(Error::MissingApiKey)
  }

  /// Quota reported by the most recent response.
  pub fn quota(&self) -> Quota {
    *self.quota.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn record_quota(&self, quota: Quota) {
    if quota == Quota::default() {
      return;
    }
    info!(
      remaining = ?quota.remaining,
      used = ?quota.used,
      "API quota"
    );
    *self.quota.lock().unwrap_or_else(PoisonError::into_inner) = quota;
  }

  /// Rate-limited GET. `Ok(None)` on 404.
  async fn get<T: DeserializeOwned>(
    &self,
    path: &str,
    params: &[(&str, String)],
  ) -> Result<Option<T>> {
    let key = self.api_key()?;
    pace(self.limiter.as_ref()).await;

    let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
    debug!(%url, "odds API request");
    let resp = self
      .client
      .get(&url)
      .query(&[("apiKey", key)])
      .query(params)
      .send()
      .await?;

    self.record_quota(Quota::from_headers(resp.headers()));

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !status.is_success() {
      return Err(Error::Status { url, status });
    }
    let body = resp.text().await?;
    Ok(Some(serde_json::from_str(&body)?))
  }

  /// Every sport the API lists. Costs no quota.
  pub async fn sports(&self) -> Result<Vec<Sport>> {
    Ok(self.get("sports", &[]).await?.unwrap_or_default())
  }

  /// Active soccer competitions.
  pub async fn soccer_leagues(&self) -> Result<Vec<Sport>> {
    let mut sports = self.sports().await?;
    sports.retain(|s| s.active && s.key.starts_with("soccer_"));
    Ok(sports)
  }
}

impl OddsFeed for OddsApiClient {
  type Error = Error;

  fn provenance(&self) -> Provenance { Provenance::Api }

  async fn fetch_odds(&self, league: &LeagueInfo) -> Result<Vec<FeedEvent>> {
    let params = [
      ("regions", self.config.regions.join(",")),
      ("markets", H2H.to_owned()),
      ("oddsFormat", "decimal".to_owned()),
    ];
    let path = format!("sports/{}/odds", league.key);
    let Some(events) = self.get::<Vec<ApiEvent>>(&path, &params).await? else {
      warn!(league = %league.key, "league not found or no events available");
      return Ok(Vec::new());
    };
    Ok(events.into_iter().map(ApiEvent::into_feed_event).collect())
  }
}

impl ScoresFeed for OddsApiClient {
  type Error = Error;

  async fn fetch_scores(&self, league: &LeagueInfo, days_from: u32) -> Result<Vec<FeedScore>> {
    let params = [("daysFrom", clamp_days(days_from).to_string())];
    let path = format!("sports/{}/scores", league.key);
    let Some(events) = self.get::<Vec<ApiScoreEvent>>(&path, &params).await? else {
      warn!(league = %league.key, "league not found or no scores available");
      return Ok(Vec::new());
    };
    Ok(events.into_iter().filter_map(ApiScoreEvent::into_feed_score).collect())
  }
}
