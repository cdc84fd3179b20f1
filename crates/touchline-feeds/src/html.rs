//! Small helpers over `scraper` shared by the page parsers.

use scraper::{ElementRef, Selector};

/// Elements under `scope` matching `css`. An invalid selector matches nothing.
pub fn select<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
  match Selector::parse(css) {
    Ok(selector) => scope.select(&selector).collect(),
    Err(_) => Vec::new(),
  }
}

/// Text content with every text node trimmed.
pub fn text(el: ElementRef<'_>) -> String {
  el.text().map(str::trim).collect::<String>()
}

#[cfg(test)]
mod tests {
  use scraper::Html;

  use super::*;

  #[test]
  fn text_trims_each_node() {
    let doc = Html::parse_fragment("<p>\n  Man <b> City </b>\n</p>");
    let p = select(doc.root_element(), "p");
    assert_eq!(text(p[0]), "ManCity");
  }

  #[test]
  fn invalid_selector_matches_nothing() {
    let doc = Html::parse_fragment("<p>x</p>");
    assert!(select(doc.root_element(), "p[").is_empty());
  }
}
