//! Price-token normalisation.
//!
//! Scraped pages show one token per (bookmaker, outcome) cell: fractional
//! (`11/10`), decimal (`2.10`), an evens marker, or a placeholder. Every
//! form is folded into a decimal price; anything else becomes `None`.

/// Tokens that stand for "no price offered".
const PLACEHOLDERS: &[&str] = &["SP", "-"];

/// Tokens that stand for even money (decimal 2.0).
const EVENS: &[&str] = &["EVS", "EVENS", "EVN"];

/// Convert one price token to decimal odds.
///
/// Returns `None` for empty, placeholder, or unparsable tokens, and for
/// anything that would come out below 1.0 or non-finite.
pub fn parse_price(token: &str) -> Option<f64> {
  let token = token.trim().to_ascii_uppercase();
  if token.is_empty() || PLACEHOLDERS.contains(&token.as_str()) {
    return None;
  }
  if EVENS.contains(&token.as_str()) {
    return Some(2.0);
  }

  let price = match token.split_once('/') {
    Some((num, den)) => {
      let num: f64 = num.trim().parse().ok()?;
      let den: f64 = den.trim().parse().ok()?;
      if den == 0.0 {
        return None;
      }
      num / den + 1.0
    }
    None => token.parse::<f64>().ok()?,
  };

  (price.is_finite() && price >= 1.0).then_some(price)
}
