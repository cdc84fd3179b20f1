//! SQL schema for the Touchline SQLite store.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS leagues (
    league_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    key         TEXT NOT NULL UNIQUE,   -- odds API sport key
    name        TEXT NOT NULL,
    country     TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bookmakers (
    bookmaker_id INTEGER PRIMARY KEY AUTOINCREMENT,
    key          TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fixtures (
    fixture_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    league_id   INTEGER NOT NULL REFERENCES leagues(league_id),
    home_team   TEXT NOT NULL,
    away_team   TEXT NOT NULL,
    kickoff     TEXT NOT NULL,          -- RFC 3339 UTC, fixed width
    status      TEXT NOT NULL DEFAULT 'upcoming',
    external_id TEXT,
    created_at  TEXT NOT NULL,
    UNIQUE (home_team, away_team, kickoff)
);

-- One result per fixture; later writes replace earlier ones.
CREATE TABLE IF NOT EXISTS results (
    result_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    fixture_id  INTEGER NOT NULL UNIQUE REFERENCES fixtures(fixture_id),
    home_score  INTEGER NOT NULL CHECK (home_score >= 0),
    away_score  INTEGER NOT NULL CHECK (away_score >= 0),
    outcome     TEXT NOT NULL,          -- 'home' | 'draw' | 'away'
    source      TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

-- Odds snapshots are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS odds_snapshots (
    snapshot_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    fixture_id   INTEGER NOT NULL REFERENCES fixtures(fixture_id),
    bookmaker_id INTEGER NOT NULL REFERENCES bookmakers(bookmaker_id),
    home_price   REAL NOT NULL CHECK (home_price > 0),
    draw_price   REAL CHECK (draw_price > 0),
    away_price   REAL NOT NULL CHECK (away_price > 0),
    source       TEXT NOT NULL,
    scraped_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS fixtures_status_idx  ON fixtures(status, kickoff);
CREATE INDEX IF NOT EXISTS fixtures_kickoff_idx ON fixtures(kickoff);
CREATE INDEX IF NOT EXISTS odds_pair_idx        ON odds_snapshots(fixture_id, bookmaker_id, snapshot_id);

-- Each completed fixture against the last snapshot every bookmaker took.
CREATE VIEW IF NOT EXISTS odds_vs_results AS
SELECT
    f.fixture_id,
    f.home_team,
    f.away_team,
    f.kickoff,
    l.name AS league,
    r.home_score,
    r.away_score,
    r.outcome,
    b.name AS bookmaker,
    o.home_price,
    o.draw_price,
    o.away_price,
    CASE r.outcome
        WHEN 'home' THEN o.home_price
        WHEN 'draw' THEN o.draw_price
        WHEN 'away' THEN o.away_price
    END AS winning_odds
FROM fixtures f
JOIN results r        ON r.fixture_id   = f.fixture_id
JOIN leagues l        ON l.league_id    = f.league_id
JOIN odds_snapshots o ON o.fixture_id   = f.fixture_id
JOIN bookmakers b     ON b.bookmaker_id = o.bookmaker_id
WHERE o.snapshot_id = (
    SELECT MAX(o2.snapshot_id) FROM odds_snapshots o2
    WHERE o2.fixture_id = o.fixture_id AND o2.bookmaker_id = o.bookmaker_id
);

PRAGMA user_version = 1;
";
