//! End-to-end tests for the matching pipeline.
//!
//! Exercises the full flow: catalog → embeddings → index artifact →
//! orchestrated search, filtering and scoring.

mod common;

use common::{arc, bank_song, default_generator, matcher_over, prompt, song_bank, TRACK_THEME};
use lofi_songbank::embeddings::EmbeddingIndex;
use lofi_songbank::song_store::{SongStore, SqliteSongStore};
use tempfile::TempDir;

// =============================================================================
// Embedding determinism
// =============================================================================

#[test]
fn test_batch_embedding_matches_single_calls() {
    let generator = default_generator();
    let songs = song_bank();

    let batch = generator.embed_songs_batch(&songs);
    assert_eq!(batch.len(), songs.len());

    for (i, song) in songs.iter().enumerate() {
        let single = generator.embed_song(song);
        assert_eq!(batch[i].0, song.id);
        assert_eq!(batch[i].1, single, "batch differs for {}", song.filename);
    }
}

#[test]
fn test_all_generated_vectors_are_unit_norm() {
    let generator = default_generator();
    for song in song_bank() {
        let norm = generator.embed_song(&song).norm();
        assert!((norm - 1.0).abs() < 1e-5, "norm {} for {}", norm, song.filename);
    }
}

// =============================================================================
// Full pipeline
// =============================================================================

#[test]
fn test_pipeline_prefers_matching_prompt_and_arc() {
    let matcher = matcher_over(song_bank());
    let matches = matcher.find_matches(
        &prompt("hazy tape loops with nostalgic static and warm dust"),
        &arc(2),
        TRACK_THEME,
        5,
        Some(0.1),
    );

    assert!(!matches.is_empty());
    assert_eq!(matches[0].song.filename, "2_1_01a.mp3");
    assert_eq!(matches[0].arc_match_bonus, 1.0);

    // Scores are sorted descending
    for pair in matches.windows(2) {
        assert!(pair[0].final_score >= pair[1].final_score);
    }
}

#[test]
fn test_pipeline_empty_bank_is_normal_outcome() {
    let matcher = matcher_over(Vec::new());
    let matches = matcher.find_matches(
        &prompt("anything at all"),
        &arc(2),
        TRACK_THEME,
        5,
        None,
    );
    assert!(matches.is_empty());
}

#[test]
fn test_pipeline_high_threshold_filters_everything() {
    let matcher = matcher_over(song_bank());
    let matches = matcher.find_matches(
        &prompt("completely unrelated death metal shredding"),
        &arc(2),
        TRACK_THEME,
        5,
        Some(0.99),
    );
    assert!(matches.is_empty());
}

#[test]
fn test_pipeline_respects_usage_ceiling() {
    let text = "dreamy synth pads over rain, hypnotic and calm";
    let mut songs = vec![bank_song("fresh.mp3", text, 2, 90.0)];
    let mut tired = bank_song("tired.mp3", text, 2, 90.0);
    tired.times_used = 25;
    songs.push(tired);

    let matcher = matcher_over(songs);
    let matches = matcher.find_matches(&prompt(text), &arc(2), TRACK_THEME, 5, Some(0.1));

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].song.filename, "fresh.mp3");
}

#[test]
fn test_pipeline_tempo_hint_drives_bpm_filter() {
    // The "upbeat" hint targets 120 BPM; the 48 BPM drone must not appear
    let matcher = matcher_over(song_bank());
    let matches = matcher.find_matches(
        &prompt("upbeat energetic drum machine groove with bright keys"),
        &arc(3),
        TRACK_THEME,
        5,
        Some(0.1),
    );

    assert!(!matches.is_empty());
    for m in &matches {
        assert_eq!(m.song.filename, "3_1_03a.mp3");
    }
}

// =============================================================================
// Index artifact round trip through the pipeline
// =============================================================================

#[test]
fn test_artifact_round_trip_preserves_search_results() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("embeddings.json");

    let generator = default_generator();
    let songs = song_bank();
    let mut index = EmbeddingIndex::new(generator.model_name().to_string());
    for (id, embedding) in generator.embed_songs_batch(&songs) {
        let song = songs.iter().find(|s| s.id == id).unwrap().clone();
        index.add(song, embedding);
    }
    index.save(&path).unwrap();

    let reloaded = EmbeddingIndex::load(&path).unwrap();
    assert_eq!(reloaded.len(), index.len());

    let query = generator.embed_text("slow hazy tape loops");
    let before: Vec<String> = index
        .search(&query, 10, 0.0)
        .into_iter()
        .map(|(s, _)| s.id)
        .collect();
    let after: Vec<String> = reloaded
        .search(&query, 10, 0.0)
        .into_iter()
        .map(|(s, _)| s.id)
        .collect();
    assert_eq!(before, after);
}

// =============================================================================
// Catalog-backed pipeline
// =============================================================================

#[test]
fn test_catalog_to_matches() {
    let dir = TempDir::new().unwrap();
    let store = SqliteSongStore::open(dir.path().join("catalog.db")).unwrap();
    for song in song_bank() {
        store.upsert_song(&song).unwrap();
    }

    let matcher = matcher_over(store.all_songs().unwrap());
    let matches = matcher.find_matches(
        &prompt("very slow ambient drones, cold and minimal"),
        &arc(1),
        TRACK_THEME,
        3,
        Some(0.1),
    );

    assert!(!matches.is_empty());
    assert_eq!(matches[0].song.filename, "1_1_04a.mp3");
    // Catalog metadata flows through to the match result
    assert_eq!(matches[0].song.bpm, Some(48.0));
    assert_eq!(matches[0].song.duration_seconds, Some(150.0));
}
