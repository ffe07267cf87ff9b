//! Embedding vector type, model trait and the generator facade.

use crate::song_store::{Prompt, Song};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A fixed-dimension, L2-normalized vector.
///
/// All vectors produced through `Embedding::new` have unit norm (within
/// floating-point tolerance), so the dot product of two embeddings is
/// their cosine similarity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Create a normalized embedding from raw accumulator data.
    pub fn new(data: Vec<f32>) -> Self {
        Embedding(normalize(data))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Cosine similarity with another embedding of the same dimension.
    pub fn similarity(&self, other: &Embedding) -> f32 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}

fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

/// A text embedding model.
///
/// Implementations must be deterministic: the same text always maps to the
/// same vector for a given model, and batching must not change per-item
/// results.
pub trait EmbeddingModel: Send + Sync {
    /// Stable model identifier; index artifacts are scoped to one model.
    fn name(&self) -> &str;

    /// Output vector dimension.
    fn dimension(&self) -> usize;

    /// Embed a single text into a normalized vector.
    fn embed(&self, text: &str) -> Embedding;
}

/// High-level embedding generation for songs and prompts.
///
/// Wraps an `EmbeddingModel` and owns the descriptive-text assembly rules.
pub struct EmbeddingGenerator {
    model: Box<dyn EmbeddingModel>,
}

impl EmbeddingGenerator {
    pub fn new(model: Box<dyn EmbeddingModel>) -> Self {
        EmbeddingGenerator { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    /// Embed arbitrary text.
    pub fn embed_text(&self, text: &str) -> Embedding {
        self.model.embed(text)
    }

    /// Embed a song's descriptive text.
    pub fn embed_song(&self, song: &Song) -> Embedding {
        self.model.embed(&song.embedding_text())
    }

    /// Embed many songs at once.
    ///
    /// Fans out across threads; each vector is identical to what a
    /// single `embed_song` call would produce.
    pub fn embed_songs_batch(&self, songs: &[Song]) -> Vec<(String, Embedding)> {
        songs
            .par_iter()
            .map(|song| (song.id.clone(), self.embed_song(song)))
            .collect()
    }

    /// Embed a prompt query in the context of its arc and track theme.
    pub fn embed_prompt(&self, prompt: &Prompt, arc_name: &str, track_theme: &str) -> Embedding {
        let mut parts = vec![
            prompt.text.clone(),
            format!("Arc: {}", arc_name),
            format!("Theme: {}", track_theme),
        ];
        if !prompt.tempo_hints.is_empty() {
            parts.push(format!("Tempo: {}", prompt.tempo_hints.join(", ")));
        }
        if !prompt.vibe_hints.is_empty() {
            parts.push(format!("Vibes: {}", prompt.vibe_hints.join(", ")));
        }

        self.model.embed(&parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes() {
        let e = Embedding::new(vec![3.0, 4.0]);
        assert!((e.norm() - 1.0).abs() < 1e-5);
        assert!((e.as_slice()[0] - 0.6).abs() < 1e-6);
        assert!((e.as_slice()[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        let e = Embedding::new(vec![0.0, 0.0, 0.0]);
        assert_eq!(e.norm(), 0.0);
    }

    #[test]
    fn test_similarity_is_dot_product() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0]);
        assert_eq!(a.similarity(&b), 0.0);
        assert!((a.similarity(&a) - 1.0).abs() < 1e-6);
    }
}
