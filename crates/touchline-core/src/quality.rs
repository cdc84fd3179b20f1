//! Sanity rules for bookmaker price rows, and per-brand de-duplication.

use std::collections::HashMap;

use serde::Serialize;

/// Prices below this are data-entry artifacts rather than genuine favourites.
pub const MIN_PRICE: f64 = 1.02;

/// Inclusive bounds on the sum of implied probabilities.
pub const MIN_OVERROUND: f64 = 1.00;
pub const MAX_OVERROUND: f64 = 1.50;

/// Aggregated exports need strictly more than this many bookmakers.
pub const MIN_BOOKMAKERS: usize = 5;

/// A row that passed [`validate`]. All three prices are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidRow<T> {
  /// Display name of the bookmaker; the de-duplication identity.
  pub bookmaker: String,
  pub home:      f64,
  pub draw:      f64,
  pub away:      f64,
  pub overround: f64,
  /// Whatever the caller needs to carry alongside (bookmaker key, ids).
  pub extra:     T,
}

/// Sum of the reciprocals of the three prices.
pub fn overround(home: f64, draw: f64, away: f64) -> f64 {
  1.0 / home + 1.0 / draw + 1.0 / away
}

/// Apply the validity predicate to one row.
///
/// A row is kept only when every price is present and positive, the prices
/// are not all identical, the shortest price is at least [`MIN_PRICE`], and
/// the overround falls in `[MIN_OVERROUND, MAX_OVERROUND]`.
pub fn validate<T>(
  bookmaker: &str,
  home: Option<f64>,
  draw: Option<f64>,
  away: Option<f64>,
  extra: T,
) -> Option<ValidRow<T>> {
  let (home, draw, away) = (home?, draw?, away?);
  if home <= 0.0 || draw <= 0.0 || away <= 0.0 {
    return None;
  }
  if home == draw && draw == away {
    return None;
  }
  if home.min(draw).min(away) < MIN_PRICE {
    return None;
  }
  let overround = overround(home, draw, away);
  if !(MIN_OVERROUND..=MAX_OVERROUND).contains(&overround) {
    return None;
  }
  Some(ValidRow {
    bookmaker: bookmaker.to_owned(),
    home,
    draw,
    away,
    overround,
    extra,
  })
}

/// Keep one row per bookmaker name: the one with the lowest overround.
///
/// Output order follows the first appearance of each name. On equal
/// overrounds the earlier row wins.
pub fn dedupe_by_bookmaker<T>(rows: Vec<ValidRow<T>>) -> Vec<ValidRow<T>> {
  let mut slots: HashMap<String, usize> = HashMap::new();
  let mut kept: Vec<ValidRow<T>> = Vec::with_capacity(rows.len());

  for row in rows {
    match slots.get(&row.bookmaker) {
      Some(&i) => {
        if row.overround < kept[i].overround {
          kept[i] = row;
        }
      }
      None => {
        slots.insert(row.bookmaker.clone(), kept.len());
        kept.push(row);
      }
    }
  }
  kept
}

/// `true` when enough distinct bookmakers survived to report aggregates.
pub fn has_enough_bookmakers<T>(rows: &[ValidRow<T>]) -> bool {
  rows.len() > MIN_BOOKMAKERS
}
