//! Per-user dictionary persistence (SQLite).
//!
//! Two tables: `dictionary_entries` keyed by `(user_id, word)` and the cached aggregate
//! `user_stats`. Every mutating call runs in one transaction while holding the connection
//! lock, so two concurrent saves for the same user never interleave.
//!
//! Each operation exists twice: `try_*` returns `StorageResult<T>`, and the plain method logs
//! the error and degrades to `false` / `None` / empty. Callers facing users use the plain form;
//! persistence failures must never suppress an answer.

mod export;
mod schema;

pub use export::{render_csv, Export, CSV_HEADER};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::domain::{DictionaryEntry, StoreTotals, UserStats};
use crate::util::normalize_word;

#[derive(Error, Debug)]
pub enum StorageError {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("failed to acquire connection lock: {0}")]
  Lock(String),

  #[error("word is empty after normalization")]
  EmptyWord,

  #[error("export failed: {0}")]
  Export(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Timestamps are stored as fixed-width RFC 3339 UTC text so that text order is time order.
pub(crate) fn ts_to_sql(ts: &DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn ts_from_sql(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw)
    .map(|d| d.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DictionaryEntry> {
  let first: String = row.get(3)?;
  let last: String = row.get(4)?;
  Ok(DictionaryEntry {
    word: row.get(0)?,
    explanation: row.get(1)?,
    lookup_count: row.get(2)?,
    first_seen: ts_from_sql(3, &first)?,
    last_seen: ts_from_sql(4, &last)?,
  })
}

/// What happened to the dictionary row on a successful save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveOutcome {
  pub word: String,
  pub lookup_count: i64,
}

#[derive(Clone)]
pub struct WordStore {
  conn: Arc<Mutex<Connection>>,
}

impl WordStore {
  /// Open (or create) the database file and ensure the schema exists.
  pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
    let conn = Connection::open(path.as_ref())?;
    conn.execute_batch(
      "PRAGMA journal_mode=WAL;
       PRAGMA synchronous=NORMAL;",
    )?;
    schema::create_schema(&conn)?;
    info!(target: "store", path = %path.as_ref().display(), "dictionary database ready");
    Ok(Self { conn: Arc::new(Mutex::new(conn)) })
  }

  /// Private in-memory database, used by tests and as a fallback when the file can't be opened.
  pub fn open_in_memory() -> StorageResult<Self> {
    let conn = Connection::open_in_memory()?;
    schema::create_schema(&conn)?;
    Ok(Self { conn: Arc::new(Mutex::new(conn)) })
  }

  fn get_conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| StorageError::Lock(e.to_string()))
  }

  // ============================================================
  // Fallible API
  // ============================================================

  /// Upsert `(user_id, word)`; the first explanation wins, repeats bump the counter.
  /// Also bumps `total_lookups` and recomputes `unique_words`, all in one transaction.
  pub fn try_save(&self, user_id: i64, word: &str, explanation: &str) -> StorageResult<SaveOutcome> {
    let key = normalize_word(word);
    if key.is_empty() {
      return Err(StorageError::EmptyWord);
    }
    let now = ts_to_sql(&Utc::now());

    let mut conn = self.get_conn()?;
    let tx = conn.transaction()?;
    tx.execute(
      "INSERT INTO dictionary_entries (user_id, word, explanation, lookup_count, first_seen, last_seen)
       VALUES (?1, ?2, ?3, 1, ?4, ?4)
       ON CONFLICT(user_id, word) DO UPDATE SET
         lookup_count = lookup_count + 1,
         last_seen = MAX(last_seen, excluded.last_seen)",
      params![user_id, key, explanation, now],
    )?;
    Self::bump_lookups(&tx, user_id, &now)?;
    Self::refresh_unique_words(&tx, user_id)?;
    let lookup_count: i64 = tx.query_row(
      "SELECT lookup_count FROM dictionary_entries WHERE user_id = ?1 AND word = ?2",
      params![user_id, key],
      |r| r.get(0),
    )?;
    tx.commit()?;

    debug!(target: "store", user_id, word = %key, lookup_count, "word saved");
    Ok(SaveOutcome { word: key, lookup_count })
  }

  /// Most recently looked-up entries first; ties broken by insertion order (newest first).
  pub fn try_list(&self, user_id: i64, limit: usize) -> StorageResult<Vec<DictionaryEntry>> {
    let conn = self.get_conn()?;
    let mut stmt = conn.prepare(
      "SELECT word, explanation, lookup_count, first_seen, last_seen
       FROM dictionary_entries
       WHERE user_id = ?1
       ORDER BY last_seen DESC, id DESC
       LIMIT ?2",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![user_id, limit], entry_from_row)?;
    let mut out = Vec::new();
    for r in rows {
      out.push(r?);
    }
    Ok(out)
  }

  /// Delete every entry of the user and recompute `unique_words`. Returns the deleted count.
  pub fn try_clear(&self, user_id: i64) -> StorageResult<usize> {
    let mut conn = self.get_conn()?;
    let tx = conn.transaction()?;
    let deleted = tx.execute("DELETE FROM dictionary_entries WHERE user_id = ?1", params![user_id])?;
    Self::refresh_unique_words(&tx, user_id)?;
    tx.commit()?;
    info!(target: "store", user_id, deleted, "dictionary cleared");
    Ok(deleted)
  }

  pub fn try_stats(&self, user_id: i64) -> StorageResult<Option<UserStats>> {
    let conn = self.get_conn()?;
    let row = conn
      .query_row(
        "SELECT user_id, total_lookups, unique_words, quiz_games, quiz_correct, created_at
         FROM user_stats WHERE user_id = ?1",
        params![user_id],
        |r| {
          let created: String = r.get(5)?;
          Ok(UserStats {
            user_id: r.get(0)?,
            total_lookups: r.get(1)?,
            unique_words: r.get(2)?,
            quiz_games: r.get(3)?,
            quiz_correct: r.get(4)?,
            created_at: ts_from_sql(5, &created)?,
          })
        },
      )
      .optional()?;
    Ok(row)
  }

  pub fn try_export(&self, user_id: i64) -> StorageResult<Export> {
    let entries = self.try_list(user_id, usize::MAX)?;
    render_csv(&entries)
  }

  /// Count a lookup that does not create a dictionary row (phrase, retell, character).
  pub fn try_record_lookup(&self, user_id: i64) -> StorageResult<()> {
    let now = ts_to_sql(&Utc::now());
    let conn = self.get_conn()?;
    Self::bump_lookups(&conn, user_id, &now)?;
    Ok(())
  }

  pub fn try_record_quiz_result(&self, user_id: i64, correct: bool) -> StorageResult<()> {
    let now = ts_to_sql(&Utc::now());
    let conn = self.get_conn()?;
    conn.execute(
      "INSERT INTO user_stats (user_id, quiz_games, quiz_correct, created_at)
       VALUES (?1, 1, ?2, ?3)
       ON CONFLICT(user_id) DO UPDATE SET
         quiz_games = quiz_games + 1,
         quiz_correct = quiz_correct + excluded.quiz_correct",
      params![user_id, i64::from(correct), now],
    )?;
    Ok(())
  }

  /// Live number of dictionary rows for the user.
  pub fn try_count(&self, user_id: i64) -> StorageResult<usize> {
    let conn = self.get_conn()?;
    let n: i64 = conn.query_row(
      "SELECT COUNT(*) FROM dictionary_entries WHERE user_id = ?1",
      params![user_id],
      |r| r.get(0),
    )?;
    Ok(usize::try_from(n).unwrap_or(0))
  }

  pub fn try_totals(&self) -> StorageResult<StoreTotals> {
    let conn = self.get_conn()?;
    let (users, lookups): (i64, i64) = conn.query_row(
      "SELECT COUNT(*), COALESCE(SUM(total_lookups), 0) FROM user_stats",
      [],
      |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    let entries: i64 = conn.query_row("SELECT COUNT(*) FROM dictionary_entries", [], |r| r.get(0))?;
    Ok(StoreTotals { users, entries, lookups })
  }

  fn bump_lookups(conn: &Connection, user_id: i64, now: &str) -> StorageResult<()> {
    conn.execute(
      "INSERT INTO user_stats (user_id, total_lookups, created_at)
       VALUES (?1, 1, ?2)
       ON CONFLICT(user_id) DO UPDATE SET total_lookups = total_lookups + 1",
      params![user_id, now],
    )?;
    Ok(())
  }

  /// `unique_words` is a cache of the live row count; it is recomputed, never incremented.
  /// Users without a stats row are left alone.
  fn refresh_unique_words(conn: &Connection, user_id: i64) -> StorageResult<()> {
    conn.execute(
      "UPDATE user_stats
       SET unique_words = (SELECT COUNT(*) FROM dictionary_entries WHERE user_id = ?1)
       WHERE user_id = ?1",
      params![user_id],
    )?;
    Ok(())
  }

  // ============================================================
  // Degrading API
  // ============================================================

  #[instrument(level = "debug", skip(self, explanation), fields(explanation_len = explanation.len()))]
  pub fn save(&self, user_id: i64, word: &str, explanation: &str) -> bool {
    match self.try_save(user_id, word, explanation) {
      Ok(_) => true,
      Err(e) => {
        error!(target: "store", user_id, %word, error = %e, "failed to save word");
        false
      }
    }
  }

  pub fn list(&self, user_id: i64, limit: usize) -> Vec<DictionaryEntry> {
    self.try_list(user_id, limit).unwrap_or_else(|e| {
      error!(target: "store", user_id, error = %e, "failed to list dictionary");
      Vec::new()
    })
  }

  pub fn clear(&self, user_id: i64) -> bool {
    match self.try_clear(user_id) {
      Ok(_) => true,
      Err(e) => {
        error!(target: "store", user_id, error = %e, "failed to clear dictionary");
        false
      }
    }
  }

  pub fn stats(&self, user_id: i64) -> Option<UserStats> {
    self.try_stats(user_id).unwrap_or_else(|e| {
      error!(target: "store", user_id, error = %e, "failed to read stats");
      None
    })
  }

  pub fn export(&self, user_id: i64) -> Export {
    self.try_export(user_id).unwrap_or_else(|e| {
      error!(target: "store", user_id, error = %e, "failed to export dictionary");
      Export::Empty
    })
  }

  pub fn record_lookup(&self, user_id: i64) -> bool {
    match self.try_record_lookup(user_id) {
      Ok(()) => true,
      Err(e) => {
        error!(target: "store", user_id, error = %e, "failed to record lookup");
        false
      }
    }
  }

  pub fn record_quiz_result(&self, user_id: i64, correct: bool) -> bool {
    match self.try_record_quiz_result(user_id, correct) {
      Ok(()) => true,
      Err(e) => {
        error!(target: "store", user_id, error = %e, "failed to record quiz result");
        false
      }
    }
  }

  pub fn count(&self, user_id: i64) -> usize {
    self.try_count(user_id).unwrap_or_else(|e| {
      error!(target: "store", user_id, error = %e, "failed to count dictionary");
      0
    })
  }

  pub fn totals(&self) -> Option<StoreTotals> {
    self.try_totals().map_err(|e| error!(target: "store", error = %e, "failed to read totals")).ok()
  }
}
