//! SQLite schema for the song catalog.

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Current schema version, stamped into `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const SONGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS songs (
    id                 TEXT PRIMARY KEY,
    filename           TEXT NOT NULL UNIQUE,
    file_path          TEXT NOT NULL,

    arc_number         INTEGER,
    prompt_number      INTEGER,
    song_number        INTEGER,
    order_marker       TEXT,

    track_id           TEXT,
    track_title        TEXT,
    arc_name           TEXT,
    prompt_text        TEXT,
    anchor_phrase      TEXT,

    duration_seconds   REAL,
    bpm                REAL,
    key                TEXT,
    energy_level       REAL,
    tempo_category     TEXT,

    vibe_tags          TEXT NOT NULL DEFAULT '[]',
    mood_keywords      TEXT NOT NULL DEFAULT '[]',
    combined_text      TEXT,

    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    times_used         INTEGER NOT NULL DEFAULT 0,
    last_used_track_id TEXT,
    last_used_at       TEXT
);

CREATE INDEX IF NOT EXISTS idx_songs_arc_number ON songs(arc_number);
CREATE INDEX IF NOT EXISTS idx_songs_times_used ON songs(times_used);
"#;

/// Create the schema if this is a fresh database and stamp the version.
///
/// Opening a database written by a newer schema version is a fatal
/// configuration error, surfaced here rather than at first query.
pub fn init_schema(conn: &Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    if db_version > SCHEMA_VERSION {
        anyhow::bail!(
            "catalog database schema version {} is newer than supported version {}",
            db_version,
            SCHEMA_VERSION
        );
    }

    if db_version == 0 {
        info!("Creating song catalog schema at version {}", SCHEMA_VERSION);
        conn.execute_batch(SONGS_TABLE)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }

    Ok(())
}
