//! Shared fixtures for end-to-end tests.
#![allow(dead_code)] // Not every test file uses every fixture

use lofi_songbank::config::{AppConfig, CliConfig, EmbeddingEngine, MatchingSettings};
use lofi_songbank::embeddings::{create_embedding_model, EmbeddingGenerator, EmbeddingIndex};
use lofi_songbank::matching::{hints, ScoringWeights, SongMatcher, SongScorer};
use lofi_songbank::song_store::{Prompt, PromptArc, Song, TempoCategory};

pub const ARC_2_NAME: &str = "VHS Static Haze";
pub const TRACK_THEME: &str = "late night reruns on a dying TV";

/// Build a song the way the import pipeline would: analyzed metadata
/// plus prompt provenance.
pub fn bank_song(filename: &str, prompt_text: &str, arc: u32, bpm: f64) -> Song {
    let mut song = Song::new(filename, format!("/bank/{}", filename));
    song.prompt_text = Some(prompt_text.to_string());
    song.arc_number = Some(arc);
    song.arc_name = Some(ARC_2_NAME.to_string());
    song.track_title = Some("Midnight Reruns".to_string());
    song.bpm = Some(bpm);
    song.tempo_category = Some(TempoCategory::from_bpm(bpm));
    song.duration_seconds = Some(150.0);
    song
}

/// A small bank of stylistically distinct songs across arcs.
pub fn song_bank() -> Vec<Song> {
    vec![
        bank_song(
            "2_1_01a.mp3",
            "slow hazy tape loops, nostalgic static, warm dust over soft piano",
            2,
            72.0,
        ),
        bank_song(
            "2_2_02a.mp3",
            "dreamy synth pads over rain, hypnotic and calm",
            2,
            90.0,
        ),
        bank_song(
            "3_1_03a.mp3",
            "upbeat energetic drum machine groove with bright keys",
            3,
            120.0,
        ),
        bank_song(
            "1_1_04a.mp3",
            "very slow ambient drones, cold and minimal",
            1,
            48.0,
        ),
    ]
}

pub fn default_generator() -> EmbeddingGenerator {
    let model = create_embedding_model(&EmbeddingEngine::HashedTf, 384).unwrap();
    EmbeddingGenerator::new(model)
}

/// Index a bank of songs and wrap everything into a matcher.
pub fn matcher_over(songs: Vec<Song>) -> SongMatcher {
    let generator = default_generator();
    let mut index = EmbeddingIndex::new(generator.model_name().to_string());
    for (id, embedding) in generator.embed_songs_batch(&songs) {
        let song = songs.iter().find(|s| s.id == id).unwrap().clone();
        index.add(song, embedding);
    }
    let scorer = SongScorer::new(ScoringWeights::default()).unwrap();
    SongMatcher::new(generator, index, scorer, MatchingSettings::default())
}

pub fn prompt(text: &str) -> Prompt {
    hints::build_prompt(1, text)
}

pub fn arc(number: u32) -> PromptArc {
    PromptArc {
        arc_number: number,
        arc_name: ARC_2_NAME.to_string(),
        prompts: Vec::new(),
    }
}

pub fn default_config(dir: &std::path::Path) -> AppConfig {
    AppConfig::resolve(
        &CliConfig {
            db_path: Some(dir.join("catalog.db")),
            index_path: Some(dir.join("embeddings.json")),
        },
        None,
    )
    .unwrap()
}
