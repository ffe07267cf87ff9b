//! Weighted scoring of filtered candidates.
//!
//! Combines embedding similarity with arc match, BPM proximity, key
//! compatibility and a usage penalty into one final score in [0, 1],
//! keeping every component visible in the result.

use super::filters::SearchFilters;
use crate::song_store::{Song, SongMatch};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Semitone positions for key parsing. Flats are not in the table; keys
/// outside it only score through exact or parallel matches.
const NOTE_NAMES: &[&str] = &[
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Relative weights of the scoring components.
///
/// Weights must sum to 1.0. A slightly off sum is corrected by
/// proportional renormalization at scorer construction; negative or
/// non-finite weights, or a non-positive sum, are a configuration error.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub similarity: f64,
    pub arc_bonus: f64,
    pub bpm_proximity: f64,
    pub key_compatibility: f64,
    pub usage_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            similarity: 0.50,
            arc_bonus: 0.20,
            bpm_proximity: 0.15,
            key_compatibility: 0.10,
            usage_penalty: 0.05,
        }
    }
}

impl ScoringWeights {
    fn sum(&self) -> f64 {
        self.similarity
            + self.arc_bonus
            + self.bpm_proximity
            + self.key_compatibility
            + self.usage_penalty
    }

    fn all(&self) -> [f64; 5] {
        [
            self.similarity,
            self.arc_bonus,
            self.bpm_proximity,
            self.key_compatibility,
            self.usage_penalty,
        ]
    }
}

/// Computes final scores for song matches.
pub struct SongScorer {
    weights: ScoringWeights,
}

impl SongScorer {
    /// Build a scorer, validating and renormalizing the weights.
    pub fn new(weights: ScoringWeights) -> Result<Self> {
        if weights.all().iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("scoring weights must be finite and non-negative: {:?}", weights);
        }

        let total = weights.sum();
        if total <= 0.0 {
            bail!("scoring weights sum to {}, nothing to score with", total);
        }

        let weights = if (total - 1.0).abs() > 0.01 {
            warn!("Scoring weights sum to {:.3}, not 1.0. Normalizing", total);
            ScoringWeights {
                similarity: weights.similarity / total,
                arc_bonus: weights.arc_bonus / total,
                bpm_proximity: weights.bpm_proximity / total,
                key_compatibility: weights.key_compatibility / total,
                usage_penalty: weights.usage_penalty / total,
            }
        } else {
            weights
        };

        Ok(SongScorer { weights })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one candidate against the query's filters.
    ///
    /// The usage penalty enters the weighted sum in its positive
    /// direction (`1 - penalty`), so an unused song contributes its full
    /// weight. The input song is copied into the result, never mutated.
    pub fn score(&self, song: &Song, similarity_score: f64, filters: &SearchFilters) -> SongMatch {
        let arc_bonus = arc_match_bonus(song.arc_number, filters.target_arc_number);
        let bpm_proximity = bpm_proximity_score(song.bpm, filters.target_bpm, filters.bpm_tolerance);
        let key_compatibility =
            key_compatibility_score(song.key.as_deref(), filters.preferred_key.as_deref());
        let usage_penalty = usage_penalty_score(song.times_used);

        let final_score = self.weights.similarity * similarity_score
            + self.weights.arc_bonus * arc_bonus
            + self.weights.bpm_proximity * bpm_proximity
            + self.weights.key_compatibility * key_compatibility
            + self.weights.usage_penalty * (1.0 - usage_penalty);

        SongMatch {
            song: song.clone(),
            similarity_score,
            arc_match_bonus: arc_bonus,
            bpm_proximity,
            key_compatibility,
            usage_penalty,
            final_score,
        }
    }
}

// =============================================================================
// Component scores
// =============================================================================

/// 1.0 for the target arc, 0.5 for a neighboring arc, 0.0 otherwise or
/// when either side is unset.
pub fn arc_match_bonus(song_arc: Option<u32>, target_arc: Option<u32>) -> f64 {
    let (Some(song_arc), Some(target_arc)) = (song_arc, target_arc) else {
        return 0.0;
    };

    match song_arc.abs_diff(target_arc) {
        0 => 1.0,
        1 => 0.5,
        _ => 0.0,
    }
}

/// Linear falloff from 1.0 at the target BPM to 0.0 at the tolerance
/// edge, clamped at zero beyond it. 0.0 when either value is missing.
pub fn bpm_proximity_score(song_bpm: Option<f64>, target_bpm: Option<f64>, tolerance: f64) -> f64 {
    let (Some(bpm), Some(target)) = (song_bpm, target_bpm) else {
        return 0.0;
    };
    if tolerance <= 0.0 {
        return 0.0;
    }

    (1.0 - (bpm - target).abs() / tolerance).max(0.0)
}

/// 1.0 for an exact (case-insensitive) key match, 0.5 for compatible
/// keys, 0.0 otherwise or when either key is missing.
pub fn key_compatibility_score(song_key: Option<&str>, preferred_key: Option<&str>) -> f64 {
    let (Some(song_key), Some(preferred_key)) = (song_key, preferred_key) else {
        return 0.0;
    };

    if song_key.eq_ignore_ascii_case(preferred_key) {
        return 1.0;
    }
    if are_compatible_keys(song_key, preferred_key) {
        return 0.5;
    }
    0.0
}

/// Logarithmic penalty saturating near 1.0 around ten uses.
pub fn usage_penalty_score(times_used: u32) -> f64 {
    if times_used == 0 {
        return 0.0;
    }
    ((1.0 + times_used as f64).ln() / 11f64.ln()).min(1.0)
}

// =============================================================================
// Key compatibility rules
// =============================================================================

/// Parse "C minor" into root and mode; mode defaults to major.
fn parse_key(key: &str) -> (String, String) {
    let mut parts = key.split_whitespace();
    let note = parts.next().unwrap_or("C").to_uppercase();
    let mode = parts.next().unwrap_or("major").to_lowercase();
    (note, mode)
}

fn note_index(note: &str) -> Option<i32> {
    NOTE_NAMES
        .iter()
        .position(|n| *n == note)
        .map(|i| i as i32)
}

/// Compatibility heuristic: parallel keys (same root), true relative
/// major/minor pairs, or roots a perfect fifth apart in either direction.
fn are_compatible_keys(key1: &str, key2: &str) -> bool {
    let (note1, mode1) = parse_key(key1);
    let (note2, mode2) = parse_key(key2);

    if note1 == note2 {
        return true;
    }

    let (Some(idx1), Some(idx2)) = (note_index(&note1), note_index(&note2)) else {
        return false;
    };

    if are_relative_keys(idx1, &mode1, idx2, &mode2) {
        return true;
    }

    is_perfect_fifth(idx1, idx2)
}

/// Relative minor sits three semitones below its major.
fn are_relative_keys(idx1: i32, mode1: &str, idx2: i32, mode2: &str) -> bool {
    match (mode1, mode2) {
        ("major", "minor") => (idx1 - 3).rem_euclid(12) == idx2,
        ("minor", "major") => (idx2 - 3).rem_euclid(12) == idx1,
        _ => false,
    }
}

/// Seven semitones apart, counting up from either root.
fn is_perfect_fifth(idx1: i32, idx2: i32) -> bool {
    (idx1 - idx2).rem_euclid(12) == 7 || (idx2 - idx1).rem_euclid(12) == 7
}
