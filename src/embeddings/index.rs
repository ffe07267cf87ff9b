//! In-memory embedding index with linear-scan cosine search.
//!
//! Entries are kept in insertion order; search is a full scan over all
//! stored vectors. At catalog scale (hundreds of songs) this is faster
//! and simpler than any approximate index, and ranking is exact.

use super::model::Embedding;
use crate::song_store::Song;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Index statistics for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_songs: usize,
    pub embedding_dimension: usize,
}

/// Serialized form of the index.
///
/// The artifact is an opaque, versionless blob scoped to one embedding
/// model: after a model change callers must regenerate it rather than
/// migrate it.
#[derive(Serialize, Deserialize)]
struct IndexArtifact {
    model_name: String,
    entries: Vec<(String, Embedding)>,
    songs: HashMap<String, Song>,
}

/// In-memory collection of (song id, embedding) pairs plus the song
/// records needed to materialize search results.
#[derive(Default)]
pub struct EmbeddingIndex {
    model_name: String,
    entries: Vec<(String, Embedding)>,
    songs: HashMap<String, Song>,
}

impl EmbeddingIndex {
    /// Create an empty index scoped to the given model.
    pub fn new(model_name: impl Into<String>) -> Self {
        EmbeddingIndex {
            model_name: model_name.into(),
            entries: Vec::new(),
            songs: HashMap::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Add a song and its embedding, replacing any existing entry with
    /// the same song id. Never creates duplicates.
    pub fn add(&mut self, song: Song, embedding: Embedding) {
        match self.entries.iter_mut().find(|(id, _)| *id == song.id) {
            Some((_, existing)) => *existing = embedding,
            None => self.entries.push((song.id.clone(), embedding)),
        }
        self.songs.insert(song.id.clone(), song);
    }

    /// Add a batch of (song, embedding) pairs.
    pub fn add_batch(&mut self, pairs: Vec<(Song, Embedding)>) {
        let count = pairs.len();
        for (song, embedding) in pairs {
            self.add(song, embedding);
        }
        info!("Indexed {} songs ({} total)", count, self.entries.len());
    }

    /// Find the songs most similar to the query vector.
    ///
    /// Returns up to `top_k` (song, similarity) pairs with similarity at
    /// least `min_similarity`, sorted by similarity descending; ties keep
    /// insertion order. An empty index or an all-below-threshold scan
    /// yields an empty list, not an error.
    pub fn search(
        &self,
        query: &Embedding,
        top_k: usize,
        min_similarity: f32,
    ) -> Vec<(Song, f32)> {
        if self.entries.is_empty() {
            warn!("Embedding index is empty");
            return Vec::new();
        }

        let mut scored: Vec<(&str, f32)> = self
            .entries
            .iter()
            .map(|(id, embedding)| (id.as_str(), query.similarity(embedding)))
            .filter(|(_, similarity)| *similarity >= min_similarity)
            .collect();

        // Stable sort keeps first-inserted entries ahead on equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let results: Vec<(Song, f32)> = scored
            .into_iter()
            .filter_map(|(id, similarity)| {
                self.songs.get(id).map(|song| (song.clone(), similarity))
            })
            .collect();

        debug!("Found {} similar songs (top_k={})", results.len(), top_k);
        results
    }

    /// Embedding stored for a song id, if any.
    pub fn embedding_for(&self, song_id: &str) -> Option<&Embedding> {
        self.entries
            .iter()
            .find(|(id, _)| id == song_id)
            .map(|(_, embedding)| embedding)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_songs: self.entries.len(),
            embedding_dimension: self
                .entries
                .first()
                .map(|(_, e)| e.dimension())
                .unwrap_or(0),
        }
    }

    /// Serialize the full index state to a single JSON artifact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let artifact = IndexArtifact {
            model_name: self.model_name.clone(),
            entries: self.entries.clone(),
            songs: self.songs.clone(),
        };
        let json = serde_json::to_vec(&artifact)?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write index artifact {:?}", path.as_ref()))?;

        info!(
            "Saved {} embeddings to {:?}",
            self.entries.len(),
            path.as_ref()
        );
        Ok(())
    }

    /// Load a previously saved artifact, replacing the in-memory state.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .with_context(|| format!("Failed to read index artifact {:?}", path.as_ref()))?;
        let artifact: IndexArtifact = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse index artifact {:?}", path.as_ref()))?;

        info!(
            "Loaded {} embeddings from {:?}",
            artifact.entries.len(),
            path.as_ref()
        );
        Ok(EmbeddingIndex {
            model_name: artifact.model_name,
            entries: artifact.entries,
            songs: artifact.songs,
        })
    }
}
