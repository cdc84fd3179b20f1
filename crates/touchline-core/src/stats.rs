//! Central-tendency and best-price statistics for one outcome.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Summary of the prices quoted for a single outcome across bookmakers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStats {
  pub median_price:   f64,
  pub mean_price:     f64,
  pub best_price:     f64,
  pub best_bookmaker: String,
  pub median_prob:    f64,
  pub mean_prob:      f64,
  pub best_prob:      f64,
}

impl OutcomeStats {
  /// Aggregate parallel lists of prices and bookmaker names.
  ///
  /// Non-positive prices are dropped along with their bookmaker. Returns
  /// `None` when nothing is left. Prices are rounded to 2 d.p. and implied
  /// probabilities to 4 d.p.; ties for the best price go to the earliest
  /// bookmaker in the input.
  pub fn compute<S: AsRef<str>>(prices: &[f64], bookmakers: &[S]) -> Option<Self> {
    let pairs: Vec<(f64, &str)> = prices
      .iter()
      .zip(bookmakers)
      .filter(|(p, _)| **p > 0.0)
      .map(|(p, b)| (*p, b.as_ref()))
      .collect();
    if pairs.is_empty() {
      return None;
    }

    let values: Vec<f64> = pairs.iter().map(|(p, _)| *p).collect();
    let median = median(&values);
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    let (best, best_bookmaker) = pairs
      .iter()
      .fold(pairs[0], |acc, &(p, b)| if p > acc.0 { (p, b) } else { acc });

    Some(Self {
      median_price:   round_to(median, 2),
      mean_price:     round_to(mean, 2),
      best_price:     round_to(best, 2),
      best_bookmaker: best_bookmaker.to_owned(),
      median_prob:    implied(median),
      mean_prob:      implied(mean),
      best_prob:      implied(best),
    })
  }
}

/// Implied probability of a decimal price, rounded to 4 d.p.
pub fn implied(price: f64) -> f64 { round_to(1.0 / price, 4) }

pub fn round_to(value: f64, places: i32) -> f64 {
  let factor = 10f64.powi(places);
  (value * factor).round() / factor
}

fn median(values: &[f64]) -> f64 {
  let mut sorted = values.to_vec();
  sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
  let mid = sorted.len() / 2;
  if sorted.len() % 2 == 0 {
    (sorted[mid - 1] + sorted[mid]) / 2.0
  } else {
    sorted[mid]
  }
}
