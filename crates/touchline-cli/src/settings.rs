//! Runtime configuration.
//!
//! Read from an optional TOML file layered under `TOUCHLINE_*` environment
//! variables. Every key has a default, so an empty configuration is valid.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;
use touchline_core::{
  league::{LeagueCatalog, LeagueInfo},
  teams::{AliasTable, TeamMatcher},
};
use touchline_feeds::{odds_api, oddschecker, espn};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub db_path:                 PathBuf,
  pub odds_api_key:            Option<String>,
  pub odds_api_base_url:       String,
  pub regions:                 Vec<String>,
  pub api_requests_per_minute: u32,
  pub scraper_delay_secs:      u64,
  pub oddschecker_base_url:    String,
  pub espn_base_url:           String,
  pub export_dir:              PathBuf,
  /// Replaces the built-in league catalog when non-empty.
  pub leagues:                 Vec<LeagueInfo>,
  /// Extra `canonical -> [variants]` entries for the team-name matcher.
  pub aliases:                 BTreeMap<String, Vec<String>>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      db_path:                 PathBuf::from("data/odds.db"),
      odds_api_key:            None,
      odds_api_base_url:       odds_api::DEFAULT_BASE_URL.to_owned(),
      regions:                 vec!["uk".to_owned()],
      api_requests_per_minute: 10,
      scraper_delay_secs:      3,
      oddschecker_base_url:    oddschecker::DEFAULT_BASE_URL.to_owned(),
      espn_base_url:           espn::DEFAULT_BASE_URL.to_owned(),
      export_dir:              PathBuf::from("."),
      leagues:                 Vec::new(),
      aliases:                 BTreeMap::new(),
    }
  }
}

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("TOUCHLINE")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("regions"),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn db_path(&self) -> PathBuf { expand_tilde(&self.db_path) }

  pub fn export_dir(&self) -> PathBuf { expand_tilde(&self.export_dir) }

  pub fn catalog(&self) -> LeagueCatalog {
    if self.leagues.is_empty() {
      LeagueCatalog::builtin()
    } else {
      LeagueCatalog::new(self.leagues.clone())
    }
  }

  pub fn matcher(&self) -> TeamMatcher {
    TeamMatcher::new(AliasTable::builtin().with_extra(&self.aliases))
  }

  pub fn odds_api_config(&self) -> odds_api::OddsApiConfig {
    odds_api::OddsApiConfig {
      base_url:            self.odds_api_base_url.clone(),
      api_key:             self.odds_api_key.clone(),
      regions:             self.regions.clone(),
      requests_per_minute: self.api_requests_per_minute,
    }
  }

  pub fn oddschecker_config(&self) -> oddschecker::OddscheckerConfig {
    oddschecker::OddscheckerConfig {
      base_url: self.oddschecker_base_url.clone(),
      delay:    Duration::from_secs(self.scraper_delay_secs),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
