//! Hard-constraint filtering of search candidates.
//!
//! Filters run after the similarity search and before scoring, as a pure
//! function that preserves candidate order. Every rule treats missing
//! data as a pass: absent metadata is never a rejection reason.

use crate::song_store::{Song, TempoCategory};
use tracing::debug;

/// Hard and soft constraints for one matching query.
///
/// Built fresh per prompt by the orchestrator; all fields optional except
/// the BPM tolerance, which only takes effect alongside `target_bpm`.
#[derive(Clone, Debug, Default)]
pub struct SearchFilters {
    pub target_bpm: Option<f64>,
    pub bpm_tolerance: f64,
    pub preferred_key: Option<String>,
    pub tempo_category: Option<TempoCategory>,
    pub target_arc_number: Option<u32>,
    pub min_duration: Option<f64>,
    pub max_duration: Option<f64>,
    pub max_times_used: Option<u32>,
}

/// True when two categories are equal or adjacent in the slow-to-fast
/// ordering.
fn are_adjacent_tempos(a: TempoCategory, b: TempoCategory) -> bool {
    a.ordinal().abs_diff(b.ordinal()) <= 1
}

fn passes(song: &Song, filters: &SearchFilters) -> bool {
    if let (Some(target), Some(bpm)) = (filters.target_bpm, song.bpm) {
        if (bpm - target).abs() > filters.bpm_tolerance {
            return false;
        }
    }

    if let (Some(target), Some(category)) = (filters.tempo_category, song.tempo_category) {
        if !are_adjacent_tempos(category, target) {
            return false;
        }
    }

    if let (Some(min), Some(duration)) = (filters.min_duration, song.duration_seconds) {
        if duration < min {
            return false;
        }
    }
    if let (Some(max), Some(duration)) = (filters.max_duration, song.duration_seconds) {
        if duration > max {
            return false;
        }
    }

    if let Some(ceiling) = filters.max_times_used {
        if song.times_used > ceiling {
            return false;
        }
    }

    true
}

/// Apply every configured filter; a candidate survives only if it passes
/// all of them. Relative order is preserved.
pub fn apply_filters(
    candidates: Vec<(Song, f32)>,
    filters: &SearchFilters,
) -> Vec<(Song, f32)> {
    let before = candidates.len();
    let filtered: Vec<(Song, f32)> = candidates
        .into_iter()
        .filter(|(song, _)| passes(song, filters))
        .collect();

    debug!("Filtered {} candidates to {}", before, filtered.len());
    filtered
}
