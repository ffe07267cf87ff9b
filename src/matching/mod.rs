//! Matching pipeline: hint extraction, filtering, scoring, orchestration.

mod filters;
pub mod hints;
mod matcher;
mod scorer;

pub use filters::{apply_filters, SearchFilters};
pub use matcher::{MatcherStats, SongMatcher};
pub use scorer::{
    arc_match_bonus, bpm_proximity_score, key_compatibility_score, usage_penalty_score,
    ScoringWeights, SongScorer,
};
