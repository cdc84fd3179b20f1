//! Fuzzy team-name matching across sources.
//!
//! Different sources spell the same club differently ("Man United" vs
//! "Manchester United", "AFC Bournemouth" vs "Bournemouth"). Names are
//! normalised, then compared by equality, substring containment, and finally
//! through an [`AliasTable`] of known short/long forms.

use std::collections::{BTreeMap, BTreeSet};

/// Trailing tokens stripped during normalisation; only the first hit is
/// removed.
const SUFFIXES: &[&str] = &[" fc", " cf", " sc", " ac", " afc", " ssc"];

/// Lower-case, trim, and strip one trailing club suffix.
pub fn normalize_team_name(name: &str) -> String {
  let name = name.trim().to_lowercase();
  for suffix in SUFFIXES {
    if let Some(stripped) = name.strip_suffix(suffix) {
      return stripped.trim_end().to_owned();
    }
  }
  name
}

// ─── Alias table ─────────────────────────────────────────────────────────────

/// Immutable map from a canonical short key to the long-form variants it
/// stands for. Keys and variants are stored normalised.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
  entries: BTreeMap<String, BTreeSet<String>>,
}

const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
  // Premier League
  ("man united", &["manchester united"]),
  ("man city", &["manchester city"]),
  ("newcastle", &["newcastle united", "newcastle utd"]),
  ("nottm forest", &["nottingham forest"]),
  ("brighton", &["brighton and hove albion", "brighton & hove albion"]),
  ("tottenham", &["tottenham hotspur"]),
  ("west ham", &["west ham united"]),
  ("wolves", &["wolverhampton wanderers", "wolverhampton"]),
  ("leicester", &["leicester city"]),
  // La Liga
  ("atletico madrid", &["atlético madrid", "atletico de madrid", "atlético de madrid"]),
  ("athletic club", &["athletic bilbao", "athletic club bilbao"]),
  ("real betis", &["real betis balompié", "real betis balompie"]),
  // Bundesliga
  ("bayern munich", &["fc bayern munich", "bayern münchen", "fc bayern münchen"]),
  ("rb leipzig", &["rasenballsport leipzig", "rbl leipzig"]),
  ("dortmund", &["borussia dortmund"]),
  ("gladbach", &["borussia mönchengladbach", "borussia monchengladbach"]),
  ("leverkusen", &["bayer leverkusen", "bayer 04 leverkusen"]),
  ("hoffenheim", &["tsg hoffenheim", "1899 hoffenheim"]),
  ("wolfsburg", &["vfl wolfsburg"]),
  ("cologne", &["fc cologne", "1. fc köln", "fc köln", "1. fc koln"]),
  ("st. pauli", &["fc st. pauli", "st pauli"]),
  ("mainz", &["mainz 05", "1. fsv mainz 05"]),
  // Serie A
  ("inter", &["internazionale", "inter milan", "fc internazionale milano"]),
  ("ac milan", &["milan"]),
  ("roma", &["as roma"]),
  ("napoli", &["ssc napoli"]),
  ("juventus", &["juventus fc"]),
  ("lazio", &["ss lazio"]),
  ("atalanta", &["atalanta bc"]),
  // Ligue 1
  ("psg", &["paris saint-germain", "paris saint germain", "paris sg"]),
  ("monaco", &["as monaco"]),
  ("lyon", &["olympique lyonnais", "olympique lyon"]),
  ("marseille", &["olympique marseille", "olympique de marseille"]),
  ("lille", &["lille osc", "losc lille"]),
  // Eredivisie
  ("ajax", &["ajax amsterdam", "afc ajax"]),
  ("psv", &["psv eindhoven"]),
  ("feyenoord", &["feyenoord rotterdam"]),
  ("az", &["az alkmaar"]),
  // Portugal
  ("sporting", &["sporting cp", "sporting lisbon", "sporting clube de portugal"]),
  ("benfica", &["sl benfica"]),
  ("porto", &["fc porto"]),
  // Switzerland
  ("young boys", &["bsc young boys"]),
  // Belgium
  ("club brugge", &["club brugge kv"]),
  ("anderlecht", &["rsc anderlecht"]),
  ("union sg", &["union saint-gilloise", "royale union saint-gilloise"]),
];

impl AliasTable {
  /// The table shipped with the binary.
  pub fn builtin() -> Self {
    let mut table = Self::default();
    for (key, variants) in BUILTIN_ALIASES {
      table.insert(key, variants.iter().copied());
    }
    table
  }

  /// Add variants under `key`, merging with any existing entry. Only used
  /// while building the table at start-up.
  pub fn insert<'a>(
    &mut self,
    key: &str,
    variants: impl IntoIterator<Item = &'a str>,
  ) {
    let slot = self.entries.entry(normalize_team_name(key)).or_default();
    slot.extend(variants.into_iter().map(normalize_team_name));
  }

  /// Return a copy with extra entries merged in.
  pub fn with_extra(
    mut self,
    extra: &BTreeMap<String, Vec<String>>,
  ) -> Self {
    for (key, variants) in extra {
      self.insert(key, variants.iter().map(String::as_str));
    }
    self
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }
}

// ─── Matcher ─────────────────────────────────────────────────────────────────

/// Decides whether two free-text team names denote the same club.
#[derive(Debug, Clone)]
pub struct TeamMatcher {
  aliases: AliasTable,
}

impl TeamMatcher {
  pub fn new(aliases: AliasTable) -> Self { Self { aliases } }

  pub fn aliases(&self) -> &AliasTable { &self.aliases }

  /// Symmetric match: `matches(a, b) == matches(b, a)` for all inputs.
  pub fn matches(&self, a: &str, b: &str) -> bool {
    let a = normalize_team_name(a);
    let b = normalize_team_name(b);
    self.directed(&a, &b) || self.directed(&b, &a)
  }

  /// One-directional check on already-normalised names.
  fn directed(&self, a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
      return false;
    }
    if a == b || a.contains(b) || b.contains(a) {
      return true;
    }
    self.aliases.entries.iter().any(|(key, variants)| {
      let a_in_entry = a == key || variants.contains(a);
      a_in_entry
        && (b == key
          || variants
            .iter()
            .any(|v| v == b || v.contains(b) || b.contains(v.as_str())))
    })
  }
}

impl Default for TeamMatcher {
  fn default() -> Self { Self::new(AliasTable::builtin()) }
}
