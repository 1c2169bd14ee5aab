//! Table definitions. Creation is idempotent and runs on every open.

use rusqlite::Connection;

use super::StorageResult;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS dictionary_entries (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL,
    word         TEXT    NOT NULL,
    explanation  TEXT    NOT NULL,
    lookup_count INTEGER NOT NULL DEFAULT 1,
    first_seen   TEXT    NOT NULL,
    last_seen    TEXT    NOT NULL,
    UNIQUE(user_id, word)
);

CREATE INDEX IF NOT EXISTS idx_dictionary_user_last_seen
    ON dictionary_entries(user_id, last_seen DESC, id DESC);

CREATE TABLE IF NOT EXISTS user_stats (
    user_id       INTEGER PRIMARY KEY,
    total_lookups INTEGER NOT NULL DEFAULT 0,
    unique_words  INTEGER NOT NULL DEFAULT 0,
    quiz_games    INTEGER NOT NULL DEFAULT 0,
    quiz_correct  INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT    NOT NULL
);
"#;

pub fn create_schema(conn: &Connection) -> StorageResult<()> {
  conn.execute_batch(SCHEMA)?;
  Ok(())
}
