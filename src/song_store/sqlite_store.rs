//! SQLite-backed song store.

use super::models::{Song, TempoCategory};
use super::schema::init_schema;
use super::trait_def::SongStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// SQLite-backed catalog of songs.
pub struct SqliteSongStore {
    conn: Mutex<Connection>,
}

impl SqliteSongStore {
    /// Open (or create) the catalog database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open catalog database {:?}", db_path.as_ref()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        init_schema(&conn)?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened song catalog with {} songs", count);

        Ok(SqliteSongStore {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_song(row: &Row) -> rusqlite::Result<Song> {
        let vibe_tags: String = row.get("vibe_tags")?;
        let mood_keywords: String = row.get("mood_keywords")?;
        let tempo_category: Option<String> = row.get("tempo_category")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        let last_used_at: Option<String> = row.get("last_used_at")?;

        Ok(Song {
            id: row.get("id")?,
            filename: row.get("filename")?,
            file_path: row.get("file_path")?,
            arc_number: row.get("arc_number")?,
            prompt_number: row.get("prompt_number")?,
            song_number: row.get("song_number")?,
            order_marker: row.get("order_marker")?,
            track_id: row.get("track_id")?,
            track_title: row.get("track_title")?,
            arc_name: row.get("arc_name")?,
            prompt_text: row.get("prompt_text")?,
            anchor_phrase: row.get("anchor_phrase")?,
            duration_seconds: row.get("duration_seconds")?,
            bpm: row.get("bpm")?,
            key: row.get("key")?,
            energy_level: row.get("energy_level")?,
            tempo_category: tempo_category.as_deref().and_then(TempoCategory::from_db_str),
            vibe_tags: serde_json::from_str(&vibe_tags).unwrap_or_default(),
            mood_keywords: serde_json::from_str(&mood_keywords).unwrap_or_default(),
            combined_text: row.get("combined_text")?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
            times_used: row.get("times_used")?,
            last_used_track_id: row.get("last_used_track_id")?,
            last_used_at: last_used_at.as_deref().map(parse_timestamp),
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl SongStore for SqliteSongStore {
    fn upsert_song(&self, song: &Song) -> Result<()> {
        // Keep the tempo category consistent with the breakpoint table
        let tempo_category = song
            .tempo_category
            .or_else(|| song.bpm.map(TempoCategory::from_bpm));

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO songs (
                id, filename, file_path,
                arc_number, prompt_number, song_number, order_marker,
                track_id, track_title, arc_name, prompt_text, anchor_phrase,
                duration_seconds, bpm, key, energy_level, tempo_category,
                vibe_tags, mood_keywords, combined_text,
                created_at, updated_at, times_used,
                last_used_track_id, last_used_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25
            )
            ON CONFLICT(id) DO UPDATE SET
                filename = excluded.filename,
                file_path = excluded.file_path,
                arc_number = excluded.arc_number,
                prompt_number = excluded.prompt_number,
                song_number = excluded.song_number,
                order_marker = excluded.order_marker,
                track_id = excluded.track_id,
                track_title = excluded.track_title,
                arc_name = excluded.arc_name,
                prompt_text = excluded.prompt_text,
                anchor_phrase = excluded.anchor_phrase,
                duration_seconds = excluded.duration_seconds,
                bpm = excluded.bpm,
                key = excluded.key,
                energy_level = excluded.energy_level,
                tempo_category = excluded.tempo_category,
                vibe_tags = excluded.vibe_tags,
                mood_keywords = excluded.mood_keywords,
                combined_text = excluded.combined_text,
                updated_at = excluded.updated_at,
                times_used = excluded.times_used,
                last_used_track_id = excluded.last_used_track_id,
                last_used_at = excluded.last_used_at
            "#,
            params![
                song.id,
                song.filename,
                song.file_path,
                song.arc_number,
                song.prompt_number,
                song.song_number,
                song.order_marker,
                song.track_id,
                song.track_title,
                song.arc_name,
                song.prompt_text,
                song.anchor_phrase,
                song.duration_seconds,
                song.bpm,
                song.key,
                song.energy_level,
                tempo_category.map(|c| c.to_db_str()),
                serde_json::to_string(&song.vibe_tags)?,
                serde_json::to_string(&song.mood_keywords)?,
                song.combined_text,
                song.created_at.to_rfc3339(),
                song.updated_at.to_rfc3339(),
                song.times_used,
                song.last_used_track_id,
                song.last_used_at.map(|t| t.to_rfc3339()),
            ],
        )
        .with_context(|| format!("Failed to upsert song {}", song.filename))?;

        Ok(())
    }

    fn get_song(&self, id: &str) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM songs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], Self::row_to_song)?;
        Ok(rows.next().transpose()?)
    }

    fn get_song_by_filename(&self, filename: &str) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM songs WHERE filename = ?1")?;
        let mut rows = stmt.query_map(params![filename], Self::row_to_song)?;
        Ok(rows.next().transpose()?)
    }

    fn all_songs(&self) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM songs ORDER BY rowid")?;
        let rows = stmt.query_map([], Self::row_to_song)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn mark_used(&self, id: &str, track_id: Option<&str>) -> Result<Option<Song>> {
        let now = Utc::now().to_rfc3339();
        {
            let conn = self.conn.lock().unwrap();
            let updated = conn.execute(
                r#"
                UPDATE songs SET
                    times_used = times_used + 1,
                    last_used_track_id = ?2,
                    last_used_at = ?3,
                    updated_at = ?3
                WHERE id = ?1
                "#,
                params![id, track_id, now],
            )?;
            if updated == 0 {
                return Ok(None);
            }
        }
        self.get_song(id)
    }

    fn most_used(&self, limit: usize) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM songs WHERE times_used > 0 ORDER BY times_used DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], Self::row_to_song)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn unused(&self, limit: usize) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM songs WHERE times_used = 0 ORDER BY rowid LIMIT ?1")?;
        let rows = stmt.query_map(params![limit as i64], Self::row_to_song)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn song_count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp_store() -> (TempDir, SqliteSongStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteSongStore::open(dir.path().join("catalog.db")).unwrap();
        (dir, store)
    }

    fn make_song(filename: &str) -> Song {
        let mut song = Song::new(filename, format!("/songs/{}", filename));
        song.arc_number = Some(2);
        song.bpm = Some(95.0);
        song.key = Some("C major".to_string());
        song.duration_seconds = Some(150.0);
        song.vibe_tags = vec!["hazy".to_string(), "warm".to_string()];
        song
    }

    #[test]
    fn test_round_trip_full_song() {
        let (_dir, store) = open_temp_store();
        let mut song = make_song("2_6_19a.mp3");
        song.prompt_text = Some("warm tape hiss".to_string());
        song.mood_keywords = vec!["calm".to_string()];
        song.energy_level = Some(0.4);

        store.upsert_song(&song).unwrap();
        let loaded = store.get_song(&song.id).unwrap().unwrap();

        assert_eq!(loaded.filename, "2_6_19a.mp3");
        assert_eq!(loaded.arc_number, Some(2));
        assert_eq!(loaded.bpm, Some(95.0));
        assert_eq!(loaded.key.as_deref(), Some("C major"));
        assert_eq!(loaded.vibe_tags, vec!["hazy", "warm"]);
        assert_eq!(loaded.mood_keywords, vec!["calm"]);
        assert_eq!(loaded.times_used, 0);
    }

    #[test]
    fn test_tempo_category_derived_on_write() {
        let (_dir, store) = open_temp_store();
        let song = make_song("a.mp3");
        assert!(song.tempo_category.is_none());

        store.upsert_song(&song).unwrap();
        let loaded = store.get_song(&song.id).unwrap().unwrap();

        // bpm 95 falls in the mid-tempo bucket
        assert_eq!(loaded.tempo_category, Some(TempoCategory::MidTempo));
    }

    #[test]
    fn test_upsert_replaces_existing_row() {
        let (_dir, store) = open_temp_store();
        let mut song = make_song("a.mp3");
        store.upsert_song(&song).unwrap();

        song.bpm = Some(120.0);
        store.upsert_song(&song).unwrap();

        assert_eq!(store.song_count().unwrap(), 1);
        let loaded = store.get_song(&song.id).unwrap().unwrap();
        assert_eq!(loaded.bpm, Some(120.0));
    }

    #[test]
    fn test_mark_used_increments_and_stamps() {
        let (_dir, store) = open_temp_store();
        let song = make_song("a.mp3");
        store.upsert_song(&song).unwrap();

        let after = store.mark_used(&song.id, Some("track-7")).unwrap().unwrap();
        assert_eq!(after.times_used, 1);
        assert_eq!(after.last_used_track_id.as_deref(), Some("track-7"));
        assert!(after.last_used_at.is_some());

        let after = store.mark_used(&song.id, None).unwrap().unwrap();
        assert_eq!(after.times_used, 2);
    }

    #[test]
    fn test_mark_used_unknown_id() {
        let (_dir, store) = open_temp_store();
        assert!(store.mark_used("nope", None).unwrap().is_none());
    }

    #[test]
    fn test_most_used_and_unused() {
        let (_dir, store) = open_temp_store();
        let a = make_song("a.mp3");
        let b = make_song("b.mp3");
        let c = make_song("c.mp3");
        for song in [&a, &b, &c] {
            store.upsert_song(song).unwrap();
        }
        store.mark_used(&b.id, None).unwrap();
        store.mark_used(&b.id, None).unwrap();
        store.mark_used(&c.id, None).unwrap();

        let most = store.most_used(10).unwrap();
        assert_eq!(most.len(), 2);
        assert_eq!(most[0].id, b.id);

        let unused = store.unused(10).unwrap();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].id, a.id);
    }

    #[test]
    fn test_get_song_by_filename() {
        let (_dir, store) = open_temp_store();
        let song = make_song("findme.mp3");
        store.upsert_song(&song).unwrap();

        let loaded = store.get_song_by_filename("findme.mp3").unwrap().unwrap();
        assert_eq!(loaded.id, song.id);
        assert!(store.get_song_by_filename("other.mp3").unwrap().is_none());
    }
}
