//! [`SqliteStore`], the SQLite implementation of [`OddsStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use tracing::debug;

use touchline_core::{
  league::LeagueInfo,
  model::{
    Bookmaker, BookmakerDescriptor, BookmakerId, Fixture, FixtureDescriptor,
    FixtureId, FixtureStatus, League, LeagueId, MatchResult, NewResult,
    OddsSnapshot, PriceTriple, Provenance,
  },
  store::{
    BookmakerOdds, BookmakerStat, CompletedFixture, FixtureQuery,
    IngestReport, OddsStore, OddsVsResult, SnapshotRecord,
  },
};

use crate::{
  encode::{
    encode_dt, encode_limit, RawBookmaker, RawFixture, RawLeague,
    RawOddsVsResult, RawResult, RawSnapshot, BOOKMAKER_COLUMNS,
    FIXTURE_COLUMNS, LEAGUE_COLUMNS, RESULT_COLUMNS, SNAPSHOT_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Synchronous helpers ─────────────────────────────────────────────────────
//
// These run inside `tokio_rusqlite` closures on either a plain connection or
// an open transaction (which derefs to one), so the composite operations can
// reuse them within a single transaction.

fn league_row(
  conn: &Connection,
  key: &str,
  name: &str,
  country: Option<&str>,
  now: &str,
) -> rusqlite::Result<RawLeague> {
  conn.execute(
    "INSERT INTO leagues (key, name, country, created_at) VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(key) DO NOTHING",
    rusqlite::params![key, name, country, now],
  )?;
  conn.query_row(
    &format!("SELECT {LEAGUE_COLUMNS} FROM leagues l WHERE l.key = ?1"),
    rusqlite::params![key],
    |row| RawLeague::read(row, 0),
  )
}

fn bookmaker_row(
  conn: &Connection,
  key: &str,
  name: &str,
  now: &str,
) -> rusqlite::Result<RawBookmaker> {
  conn.execute(
    "INSERT INTO bookmakers (key, name, created_at) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO NOTHING",
    rusqlite::params![key, name, now],
  )?;
  conn.query_row(
    &format!("SELECT {BOOKMAKER_COLUMNS} FROM bookmakers b WHERE b.key = ?1"),
    rusqlite::params![key],
    |row| RawBookmaker::read(row, 0),
  )
}

/// Natural-key find-or-create. An existing row only ever gains an external id.
fn fixture_row(
  conn: &Connection,
  league_id: i64,
  home: &str,
  away: &str,
  kickoff: &str,
  external_id: Option<&str>,
  now: &str,
) -> rusqlite::Result<RawFixture> {
  conn.execute(
    "INSERT INTO fixtures (league_id, home_team, away_team, kickoff, external_id, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(home_team, away_team, kickoff) DO NOTHING",
    rusqlite::params![league_id, home, away, kickoff, external_id, now],
  )?;
  if external_id.is_some() {
    conn.execute(
      "UPDATE fixtures SET external_id = ?4
       WHERE home_team = ?1 AND away_team = ?2 AND kickoff = ?3 AND external_id IS NULL",
      rusqlite::params![home, away, kickoff, external_id],
    )?;
  }
  conn.query_row(
    &format!(
      "SELECT {FIXTURE_COLUMNS} FROM fixtures f
       WHERE f.home_team = ?1 AND f.away_team = ?2 AND f.kickoff = ?3"
    ),
    rusqlite::params![home, away, kickoff],
    |row| RawFixture::read(row, 0),
  )
}

fn fixture_exists(conn: &Connection, fixture_id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM fixtures WHERE fixture_id = ?1",
        rusqlite::params![fixture_id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn latest_prices(
  conn: &Connection,
  fixture_id: i64,
  bookmaker_id: i64,
) -> rusqlite::Result<Option<PriceTriple>> {
  conn
    .query_row(
      "SELECT home_price, draw_price, away_price FROM odds_snapshots
       WHERE fixture_id = ?1 AND bookmaker_id = ?2
       ORDER BY snapshot_id DESC LIMIT 1",
      rusqlite::params![fixture_id, bookmaker_id],
      |row| {
        Ok(PriceTriple { home: row.get(0)?, draw: row.get(1)?, away: row.get(2)? })
      },
    )
    .optional()
}

fn insert_snapshot_row(
  conn: &Connection,
  fixture_id: i64,
  bookmaker_id: i64,
  prices: PriceTriple,
  source: &str,
  now: &str,
) -> rusqlite::Result<RawSnapshot> {
  conn.execute(
    "INSERT INTO odds_snapshots
       (fixture_id, bookmaker_id, home_price, draw_price, away_price, source, scraped_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      fixture_id,
      bookmaker_id,
      prices.home,
      prices.draw,
      prices.away,
      source,
      now,
    ],
  )?;
  Ok(RawSnapshot {
    snapshot_id: conn.last_insert_rowid(),
    fixture_id,
    bookmaker_id,
    home: prices.home,
    draw: prices.draw,
    away: prices.away,
    source: source.to_owned(),
    scraped_at: now.to_owned(),
  })
}

fn result_row(conn: &Connection, fixture_id: i64) -> rusqlite::Result<Option<RawResult>> {
  conn
    .query_row(
      &format!("SELECT {RESULT_COLUMNS} FROM results r WHERE r.fixture_id = ?1"),
      rusqlite::params![fixture_id],
      |row| RawResult::read(row, 0),
    )
    .optional()
}

/// Insert or replace the result and complete the fixture.
fn write_result(
  conn: &Connection,
  fixture_id: i64,
  result: NewResult,
  now: &str,
) -> rusqlite::Result<RawResult> {
  let outcome = result.outcome().as_str();
  let source = result.provenance.as_str();
  conn.execute(
    "INSERT INTO results (fixture_id, home_score, away_score, outcome, source, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(fixture_id) DO UPDATE SET
       home_score  = excluded.home_score,
       away_score  = excluded.away_score,
       outcome     = excluded.outcome,
       source      = excluded.source,
       recorded_at = excluded.recorded_at",
    rusqlite::params![fixture_id, result.home_score, result.away_score, outcome, source, now],
  )?;
  conn.execute(
    "UPDATE fixtures SET status = ?2 WHERE fixture_id = ?1",
    rusqlite::params![fixture_id, FixtureStatus::Completed.as_str()],
  )?;
  Ok(RawResult {
    fixture_id,
    home_score: result.home_score,
    away_score: result.away_score,
    outcome: outcome.to_owned(),
    source: source.to_owned(),
    recorded_at: now.to_owned(),
  })
}

/// Outcome of a conditional result write inside one transaction.
enum ResultWrite {
  MissingFixture,
  AlreadyRecorded,
  Written(RawResult),
}

fn decode_bookmaker_odds(raws: Vec<(RawBookmaker, RawSnapshot)>) -> Result<Vec<BookmakerOdds>> {
  raws
    .into_iter()
    .map(|(b, o)| {
      Ok(BookmakerOdds { bookmaker: b.into_bookmaker(), snapshot: o.into_snapshot()? })
    })
    .collect()
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Touchline odds store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn write_result_if_absent(
    &self,
    fixture_id: FixtureId,
    result: NewResult,
  ) -> Result<Option<MatchResult>> {
    let id = fixture_id.0;
    let now = encode_dt(Utc::now());

    let write = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !fixture_exists(&tx, id)? {
          return Ok(ResultWrite::MissingFixture);
        }
        if result_row(&tx, id)?.is_some() {
          return Ok(ResultWrite::AlreadyRecorded);
        }
        let raw = write_result(&tx, id, result, &now)?;
        tx.commit()?;
        Ok(ResultWrite::Written(raw))
      })
      .await?;

    match write {
      ResultWrite::MissingFixture => Err(Error::FixtureNotFound(fixture_id)),
      ResultWrite::AlreadyRecorded => Ok(None),
      ResultWrite::Written(raw) => raw.into_result().map(Some),
    }
  }
}

// ─── OddsStore impl ──────────────────────────────────────────────────────────

impl OddsStore for SqliteStore {
  type Error = Error;

  // ── Reference data ────────────────────────────────────────────────────────

  async fn get_or_create_league(&self, info: LeagueInfo) -> Result<League> {
    let now = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        Ok(league_row(conn, &info.key, &info.name, info.country.as_deref(), &now)?)
      })
      .await?;
    Ok(raw.into_league())
  }

  async fn get_or_create_bookmaker(
    &self,
    bookmaker: BookmakerDescriptor,
  ) -> Result<Bookmaker> {
    let now = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| Ok(bookmaker_row(conn, &bookmaker.key, &bookmaker.name, &now)?))
      .await?;
    Ok(raw.into_bookmaker())
  }

  async fn list_leagues(&self) -> Result<Vec<League>> {
    let raws: Vec<RawLeague> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LEAGUE_COLUMNS} FROM leagues l ORDER BY l.name"
        ))?;
        let rows = stmt
          .query_map([], |row| RawLeague::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws.into_iter().map(RawLeague::into_league).collect())
  }

  async fn list_bookmakers(&self) -> Result<Vec<Bookmaker>> {
    let raws: Vec<RawBookmaker> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BOOKMAKER_COLUMNS} FROM bookmakers b ORDER BY b.name, b.key"
        ))?;
        let rows = stmt
          .query_map([], |row| RawBookmaker::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws.into_iter().map(RawBookmaker::into_bookmaker).collect())
  }

  // ── Fixtures ──────────────────────────────────────────────────────────────

  async fn get_or_create_fixture(
    &self,
    league_id: LeagueId,
    fixture: FixtureDescriptor,
  ) -> Result<Fixture> {
    let now = encode_dt(Utc::now());
    let kickoff = encode_dt(fixture.kickoff);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(fixture_row(
          conn,
          league_id.0,
          &fixture.home_team,
          &fixture.away_team,
          &kickoff,
          fixture.external_id.as_deref(),
          &now,
        )?)
      })
      .await?;
    raw.into_fixture()
  }

  async fn get_fixture(&self, fixture_id: FixtureId) -> Result<Option<Fixture>> {
    let raw: Option<RawFixture> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {FIXTURE_COLUMNS} FROM fixtures f WHERE f.fixture_id = ?1"),
              rusqlite::params![fixture_id.0],
              |row| RawFixture::read(row, 0),
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawFixture::into_fixture).transpose()
  }

  async fn list_fixtures(&self, query: FixtureQuery) -> Result<Vec<Fixture>> {
    let status = query.status.map(|s| s.as_str());
    let from = query.kickoff_from.map(encode_dt);
    let to = query.kickoff_to.map(encode_dt);
    let limit = encode_limit(query.limit);
    let dir = if query.newest_first { "DESC" } else { "ASC" };

    let raws: Vec<RawFixture> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {FIXTURE_COLUMNS} FROM fixtures f
           WHERE (?1 IS NULL OR f.status = ?1)
             AND (?2 IS NULL OR f.kickoff >= ?2)
             AND (?3 IS NULL OR f.kickoff <= ?3)
           ORDER BY f.kickoff {dir}, f.fixture_id {dir}
           LIMIT ?4"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![status, from, to, limit], |row| {
            RawFixture::read(row, 0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFixture::into_fixture).collect()
  }

  async fn set_fixture_status(
    &self,
    fixture_id: FixtureId,
    status: FixtureStatus,
  ) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE fixtures SET status = ?2 WHERE fixture_id = ?1",
          rusqlite::params![fixture_id.0, status.as_str()],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::FixtureNotFound(fixture_id));
    }
    Ok(())
  }

  // ── Odds snapshots ────────────────────────────────────────────────────────

  async fn odds_changed(
    &self,
    fixture_id: FixtureId,
    bookmaker_id: BookmakerId,
    prices: PriceTriple,
  ) -> Result<bool> {
    let previous = self
      .conn
      .call(move |conn| Ok(latest_prices(conn, fixture_id.0, bookmaker_id.0)?))
      .await?;
    Ok(previous.is_none_or(|p| p.differs_from(&prices)))
  }

  async fn insert_snapshot(
    &self,
    fixture_id: FixtureId,
    bookmaker_id: BookmakerId,
    prices: PriceTriple,
    provenance: Provenance,
  ) -> Result<OddsSnapshot> {
    let now = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        Ok(insert_snapshot_row(
          conn,
          fixture_id.0,
          bookmaker_id.0,
          prices,
          provenance.as_str(),
          &now,
        )?)
      })
      .await?;
    raw.into_snapshot()
  }

  async fn ingest_odds(
    &self,
    league: LeagueInfo,
    fixture: FixtureDescriptor,
    rows: Vec<(BookmakerDescriptor, PriceTriple)>,
    provenance: Provenance,
  ) -> Result<IngestReport> {
    let now = encode_dt(Utc::now());
    let kickoff = encode_dt(fixture.kickoff);

    let (fixture_id, written, unchanged) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let l = league_row(&tx, &league.key, &league.name, league.country.as_deref(), &now)?;
        let f = fixture_row(
          &tx,
          l.league_id,
          &fixture.home_team,
          &fixture.away_team,
          &kickoff,
          fixture.external_id.as_deref(),
          &now,
        )?;

        let (mut written, mut unchanged) = (0usize, 0usize);
        for (bookmaker, prices) in &rows {
          let b = bookmaker_row(&tx, &bookmaker.key, &bookmaker.name, &now)?;
          let changed = latest_prices(&tx, f.fixture_id, b.bookmaker_id)?
            .is_none_or(|p| p.differs_from(prices));
          if changed {
            insert_snapshot_row(
              &tx,
              f.fixture_id,
              b.bookmaker_id,
              *prices,
              provenance.as_str(),
              &now,
            )?;
            written += 1;
          } else {
            unchanged += 1;
          }
        }

        tx.commit()?;
        Ok((f.fixture_id, written, unchanged))
      })
      .await?;

    debug!(fixture = fixture_id, written, unchanged, "ingested odds");
    Ok(IngestReport {
      fixture_id: FixtureId(fixture_id),
      snapshots_written: written,
      unchanged,
    })
  }

  async fn latest_odds(&self, fixture_id: FixtureId) -> Result<Vec<BookmakerOdds>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BOOKMAKER_COLUMNS}, {SNAPSHOT_COLUMNS}
           FROM odds_snapshots o
           JOIN bookmakers b ON b.bookmaker_id = o.bookmaker_id
           WHERE o.fixture_id = ?1
             AND o.snapshot_id = (
               SELECT MAX(o2.snapshot_id) FROM odds_snapshots o2
               WHERE o2.fixture_id = o.fixture_id AND o2.bookmaker_id = o.bookmaker_id
             )
           ORDER BY b.name, b.key"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![fixture_id.0], |row| {
            Ok((RawBookmaker::read(row, 0)?, RawSnapshot::read(row, RawBookmaker::WIDTH)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    decode_bookmaker_odds(raws)
  }

  async fn fixture_snapshots(&self, fixture_id: FixtureId) -> Result<Vec<BookmakerOdds>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BOOKMAKER_COLUMNS}, {SNAPSHOT_COLUMNS}
           FROM odds_snapshots o
           JOIN bookmakers b ON b.bookmaker_id = o.bookmaker_id
           WHERE o.fixture_id = ?1
           ORDER BY o.snapshot_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![fixture_id.0], |row| {
            Ok((RawBookmaker::read(row, 0)?, RawSnapshot::read(row, RawBookmaker::WIDTH)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    decode_bookmaker_odds(raws)
  }

  async fn snapshot_history(&self) -> Result<Vec<SnapshotRecord>> {
    const B: usize = RawSnapshot::WIDTH;
    const F: usize = B + RawBookmaker::WIDTH;
    const L: usize = F + RawFixture::WIDTH;
    const R: usize = L + RawLeague::WIDTH;

    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SNAPSHOT_COLUMNS}, {BOOKMAKER_COLUMNS}, {FIXTURE_COLUMNS},
                  {LEAGUE_COLUMNS}, {RESULT_COLUMNS}
           FROM odds_snapshots o
           JOIN bookmakers b ON b.bookmaker_id = o.bookmaker_id
           JOIN fixtures f   ON f.fixture_id   = o.fixture_id
           JOIN leagues l    ON l.league_id    = f.league_id
           LEFT JOIN results r ON r.fixture_id = f.fixture_id
           ORDER BY o.scraped_at, f.fixture_id, b.name, o.snapshot_id"
        ))?;
        let rows = stmt
          .query_map([], |row| {
            Ok((
              RawSnapshot::read(row, 0)?,
              RawBookmaker::read(row, B)?,
              RawFixture::read(row, F)?,
              RawLeague::read(row, L)?,
              RawResult::read_optional(row, R)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(o, b, f, l, r)| {
        Ok(SnapshotRecord {
          snapshot:  o.into_snapshot()?,
          bookmaker: b.into_bookmaker(),
          fixture:   f.into_fixture()?,
          league:    l.into_league(),
          result:    r.map(RawResult::into_result).transpose()?,
        })
      })
      .collect()
  }

  // ── Results ───────────────────────────────────────────────────────────────

  async fn get_result(&self, fixture_id: FixtureId) -> Result<Option<MatchResult>> {
    let raw = self
      .conn
      .call(move |conn| Ok(result_row(conn, fixture_id.0)?))
      .await?;
    raw.map(RawResult::into_result).transpose()
  }

  async fn upsert_result(
    &self,
    fixture_id: FixtureId,
    result: NewResult,
  ) -> Result<MatchResult> {
    let id = fixture_id.0;
    let now = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !fixture_exists(&tx, id)? {
          return Ok(None);
        }
        let raw = write_result(&tx, id, result, &now)?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.ok_or(Error::FixtureNotFound(fixture_id))?.into_result()
  }

  async fn record_result_if_absent(
    &self,
    fixture_id: FixtureId,
    result: NewResult,
  ) -> Result<Option<MatchResult>> {
    self.write_result_if_absent(fixture_id, result).await
  }

  async fn record_final_score(
    &self,
    league: LeagueInfo,
    fixture: FixtureDescriptor,
    result: NewResult,
  ) -> Result<MatchResult> {
    let now = encode_dt(Utc::now());
    let kickoff = encode_dt(fixture.kickoff);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let l = league_row(&tx, &league.key, &league.name, league.country.as_deref(), &now)?;
        let f = fixture_row(
          &tx,
          l.league_id,
          &fixture.home_team,
          &fixture.away_team,
          &kickoff,
          fixture.external_id.as_deref(),
          &now,
        )?;
        let raw = write_result(&tx, f.fixture_id, result, &now)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_result()
  }

  async fn recent_results(&self, limit: usize) -> Result<Vec<CompletedFixture>> {
    const L: usize = RawFixture::WIDTH;
    const R: usize = L + RawLeague::WIDTH;
    let limit = encode_limit(Some(limit));

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FIXTURE_COLUMNS}, {LEAGUE_COLUMNS}, {RESULT_COLUMNS}
           FROM results r
           JOIN fixtures f ON f.fixture_id = r.fixture_id
           JOIN leagues l  ON l.league_id  = f.league_id
           ORDER BY f.kickoff DESC, f.fixture_id DESC
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok((
              RawFixture::read(row, 0)?,
              RawLeague::read(row, L)?,
              RawResult::read(row, R)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(f, l, r)| {
        Ok(CompletedFixture {
          fixture: f.into_fixture()?,
          league:  l.name,
          result:  r.into_result()?,
        })
      })
      .collect()
  }

  // ── Analysis ──────────────────────────────────────────────────────────────

  async fn odds_vs_results(&self, limit: usize) -> Result<Vec<OddsVsResult>> {
    let limit = encode_limit(Some(limit));
    let raws: Vec<RawOddsVsResult> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT home_team, away_team, kickoff, league, home_score, away_score,
                  outcome, bookmaker, home_price, draw_price, away_price, winning_odds
           FROM odds_vs_results
           ORDER BY kickoff DESC, fixture_id DESC, bookmaker
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], RawOddsVsResult::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawOddsVsResult::into_row).collect()
  }

  async fn bookmaker_stats(&self) -> Result<Vec<BookmakerStat>> {
    let rows: Vec<(String, f64, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT bookmaker, AVG(winning_odds), COUNT(*)
           FROM odds_vs_results
           WHERE winning_odds IS NOT NULL
           GROUP BY bookmaker
           ORDER BY AVG(winning_odds) DESC, bookmaker",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(bookmaker, avg, matches)| BookmakerStat {
          bookmaker,
          avg_winning_odds: avg,
          matches: u64::try_from(matches).unwrap_or_default(),
        })
        .collect(),
    )
  }
}
