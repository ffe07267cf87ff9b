//! Lofi Songbank Library
//!
//! Exposes the catalog, embedding and matching modules for tests and reuse.

pub mod config;
pub mod embeddings;
pub mod matching;
pub mod song_store;

// Common types, re-exported for convenience
pub use config::{AppConfig, CliConfig, EmbeddingEngine, MatchingSettings};
pub use embeddings::{create_embedding_model, EmbeddingGenerator, EmbeddingIndex};
pub use matching::{ScoringWeights, SongMatcher, SongScorer};
pub use song_store::{MemorySongStore, Song, SongMatch, SongStore, SqliteSongStore};
