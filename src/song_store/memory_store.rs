//! In-memory song store for tests and dry runs.

use super::models::{Song, TempoCategory};
use super::trait_def::SongStore;
use anyhow::Result;
use chrono::Utc;
use std::sync::Mutex;

/// Vec-backed store keeping insertion order, mirroring the SQLite
/// store's contract without touching disk.
#[derive(Default)]
pub struct MemorySongStore {
    songs: Mutex<Vec<Song>>,
}

impl MemorySongStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SongStore for MemorySongStore {
    fn upsert_song(&self, song: &Song) -> Result<()> {
        let mut stored = song.clone();
        if stored.tempo_category.is_none() {
            stored.tempo_category = stored.bpm.map(TempoCategory::from_bpm);
        }

        let mut songs = self.songs.lock().unwrap();
        match songs.iter_mut().find(|s| s.id == song.id) {
            Some(existing) => *existing = stored,
            None => songs.push(stored),
        }
        Ok(())
    }

    fn get_song(&self, id: &str) -> Result<Option<Song>> {
        let songs = self.songs.lock().unwrap();
        Ok(songs.iter().find(|s| s.id == id).cloned())
    }

    fn get_song_by_filename(&self, filename: &str) -> Result<Option<Song>> {
        let songs = self.songs.lock().unwrap();
        Ok(songs.iter().find(|s| s.filename == filename).cloned())
    }

    fn all_songs(&self) -> Result<Vec<Song>> {
        Ok(self.songs.lock().unwrap().clone())
    }

    fn mark_used(&self, id: &str, track_id: Option<&str>) -> Result<Option<Song>> {
        let mut songs = self.songs.lock().unwrap();
        let Some(song) = songs.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        let now = Utc::now();
        song.times_used += 1;
        song.last_used_track_id = track_id.map(str::to_string);
        song.last_used_at = Some(now);
        song.updated_at = now;
        Ok(Some(song.clone()))
    }

    fn most_used(&self, limit: usize) -> Result<Vec<Song>> {
        let songs = self.songs.lock().unwrap();
        let mut used: Vec<Song> = songs.iter().filter(|s| s.times_used > 0).cloned().collect();
        used.sort_by(|a, b| b.times_used.cmp(&a.times_used));
        used.truncate(limit);
        Ok(used)
    }

    fn unused(&self, limit: usize) -> Result<Vec<Song>> {
        let songs = self.songs.lock().unwrap();
        Ok(songs
            .iter()
            .filter(|s| s.times_used == 0)
            .take(limit)
            .cloned()
            .collect())
    }

    fn song_count(&self) -> Result<usize> {
        Ok(self.songs.lock().unwrap().len())
    }
}
