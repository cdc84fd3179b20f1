//! The catalog of competitions the collector knows how to fetch.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Static description of a league: the odds API key plus the bits needed to
/// create the `leagues` row and to locate the scraped page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueInfo {
  pub key:              String,
  pub name:             String,
  #[serde(default)]
  pub country:          Option<String>,
  /// Path below the scraped site's base URL, e.g. `/football/english/premier-league`.
  #[serde(default)]
  pub oddschecker_path: Option<String>,
}

const BUILTIN: &[(&str, &str, &str, &str)] = &[
  ("soccer_epl", "English Premier League", "England", "/football/english/premier-league"),
  ("soccer_germany_bundesliga", "German Bundesliga", "Germany", "/football/germany/bundesliga"),
  ("soccer_spain_la_liga", "La Liga", "Spain", "/football/spain/la-liga"),
  ("soccer_italy_serie_a", "Serie A", "Italy", "/football/italy/serie-a"),
  ("soccer_france_ligue_one", "Ligue 1", "France", "/football/france/ligue-1"),
  ("soccer_efl_champ", "EFL Championship", "England", "/football/english/championship"),
  ("soccer_scotland_premiership", "Scottish Premiership", "Scotland", "/football/scotland/premiership"),
  ("soccer_netherlands_eredivisie", "Eredivisie", "Netherlands", "/football/netherlands/eredivisie"),
  ("soccer_portugal_primeira_liga", "Primeira Liga", "Portugal", "/football/portugal/primeira-liga"),
  ("soccer_uefa_champs_league", "UEFA Champions League", "Europe", "/football/champions-league"),
  ("soccer_uefa_europa_league", "UEFA Europa League", "Europe", "/football/europa-league"),
];

/// Ordered set of configured leagues.
#[derive(Debug, Clone)]
pub struct LeagueCatalog {
  leagues: Vec<LeagueInfo>,
}

impl LeagueCatalog {
  pub fn new(leagues: Vec<LeagueInfo>) -> Self { Self { leagues } }

  /// The eleven competitions shipped with the binary.
  pub fn builtin() -> Self {
    let leagues = BUILTIN
      .iter()
      .map(|(key, name, country, path)| LeagueInfo {
        key:              (*key).to_owned(),
        name:             (*name).to_owned(),
        country:          Some((*country).to_owned()),
        oddschecker_path: Some((*path).to_owned()),
      })
      .collect();
    Self { leagues }
  }

  pub fn all(&self) -> &[LeagueInfo] { &self.leagues }

  pub fn get(&self, key: &str) -> Option<&LeagueInfo> {
    self.leagues.iter().find(|l| l.key == key)
  }

  /// Resolve a user-supplied key list. An empty list selects everything;
  /// unknown keys are logged and skipped.
  pub fn select(&self, keys: &[String]) -> Vec<LeagueInfo> {
    if keys.is_empty() {
      return self.leagues.clone();
    }
    keys
      .iter()
      .filter_map(|k| {
        let found = self.get(k).cloned();
        if found.is_none() {
          warn!(league = %k, "league not in catalog, skipping");
        }
        found
      })
      .collect()
  }
}

impl Default for LeagueCatalog {
  fn default() -> Self { Self::builtin() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_has_every_league() {
    let catalog = LeagueCatalog::builtin();
    assert_eq!(catalog.all().len(), 11);
    let epl = catalog.get("soccer_epl").unwrap();
    assert_eq!(epl.name, "English Premier League");
    assert_eq!(epl.country.as_deref(), Some("England"));
  }

  #[test]
  fn select_skips_unknown_keys() {
    let catalog = LeagueCatalog::builtin();
    let picked = catalog.select(&[
      "soccer_italy_serie_a".to_owned(),
      "soccer_mars_league".to_owned(),
    ]);
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].key, "soccer_italy_serie_a");
  }

  #[test]
  fn empty_selection_means_all() {
    let catalog = LeagueCatalog::builtin();
    assert_eq!(catalog.select(&[]).len(), catalog.all().len());
  }
}
