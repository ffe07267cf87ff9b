//! SongStore trait definition.
//!
//! Abstracts catalog access so the pipeline can run against the SQLite
//! catalog or an in-memory store in tests.

use super::models::Song;
use anyhow::Result;

/// Storage backend for the song catalog.
///
/// Songs are upserted on import and updated in place; rows are never
/// deleted. `times_used` only ever grows, through `mark_used`.
pub trait SongStore: Send + Sync {
    /// Insert a song, or replace the stored row with the same id.
    fn upsert_song(&self, song: &Song) -> Result<()>;

    /// Get a song by id.
    fn get_song(&self, id: &str) -> Result<Option<Song>>;

    /// Get a song by its filename.
    fn get_song_by_filename(&self, filename: &str) -> Result<Option<Song>>;

    /// All songs, in insertion order.
    fn all_songs(&self) -> Result<Vec<Song>>;

    /// Increment a song's usage counter and stamp the usage provenance.
    /// Returns the updated song, or None if the id is unknown.
    fn mark_used(&self, id: &str, track_id: Option<&str>) -> Result<Option<Song>>;

    /// Songs with the highest usage counters, most used first.
    fn most_used(&self, limit: usize) -> Result<Vec<Song>>;

    /// Songs that have never been used.
    fn unused(&self, limit: usize) -> Result<Vec<Song>>;

    /// Number of songs in the catalog.
    fn song_count(&self) -> Result<usize>;
}
