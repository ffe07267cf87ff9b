//! Deterministic feature-hashing embedding model.
//!
//! Tokenizes text into lowercase unicode words, hashes each word and each
//! adjacent word pair with SHA-256, and accumulates signed weights into a
//! fixed-dimension vector which is then L2-normalized. Pure local
//! computation: no model files, no network, bit-identical output for
//! identical input.

use super::model::{Embedding, EmbeddingModel};
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

/// Default output dimension.
pub const DEFAULT_DIMENSION: usize = 384;

/// Weight of word-pair features relative to single words.
const BIGRAM_WEIGHT: f32 = 0.5;

pub struct HashedTfModel {
    name: String,
    dimension: usize,
}

impl HashedTfModel {
    pub fn new(dimension: usize) -> Self {
        HashedTfModel {
            name: format!("hashed-tf-{}", dimension),
            dimension,
        }
    }

    fn accumulate(&self, acc: &mut [f32], term: &str, weight: f32) {
        let digest = Sha256::digest(term.as_bytes());

        // First 8 bytes pick the slot, the ninth picks the sign
        let raw = u64::from_be_bytes(digest[0..8].try_into().unwrap());
        let slot = (raw % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };

        acc[slot] += weight * sign;
    }
}

impl EmbeddingModel for HashedTfModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Embedding {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered.unicode_words().collect();

        let mut acc = vec![0.0f32; self.dimension];
        for word in &words {
            self.accumulate(&mut acc, word, 1.0);
        }
        for pair in words.windows(2) {
            let bigram = format!("{}_{}", pair[0], pair[1]);
            self.accumulate(&mut acc, &bigram, BIGRAM_WEIGHT);
        }

        Embedding::new(acc)
    }
}
