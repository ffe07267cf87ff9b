//! Matching orchestrator: query embedding, wide search, filtering and
//! scoring, in that order.

use super::filters::{apply_filters, SearchFilters};
use super::hints::primary_tempo_hint;
use super::scorer::SongScorer;
use crate::config::MatchingSettings;
use crate::embeddings::{EmbeddingGenerator, EmbeddingIndex};
use crate::song_store::{Prompt, PromptArc, SongMatch, TempoCategory};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Representative BPM targets per tempo category.
fn target_bpm_for(category: TempoCategory) -> f64 {
    match category {
        TempoCategory::VerySlow => 50.0,
        TempoCategory::Slow => 70.0,
        TempoCategory::MidTempo => 95.0,
        TempoCategory::Upbeat => 120.0,
        TempoCategory::Fast => 150.0,
    }
}

/// Diagnostics about the matcher's current state.
#[derive(Debug, Clone, Serialize)]
pub struct MatcherStats {
    pub total_songs_indexed: usize,
    pub embedding_dimension: usize,
    pub min_similarity_threshold: f64,
    pub bpm_tolerance: f64,
}

/// High-level matching pipeline over one embedding index.
///
/// A matcher instance is owned by a single logical pipeline run: it holds
/// the index without internal locking and is not meant to be shared
/// across concurrent callers.
pub struct SongMatcher {
    generator: EmbeddingGenerator,
    index: EmbeddingIndex,
    scorer: SongScorer,
    settings: MatchingSettings,
}

impl SongMatcher {
    pub fn new(
        generator: EmbeddingGenerator,
        index: EmbeddingIndex,
        scorer: SongScorer,
        settings: MatchingSettings,
    ) -> Self {
        SongMatcher {
            generator,
            index,
            scorer,
            settings,
        }
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Find the best matching songs for one prompt.
    ///
    /// Returns up to `count` matches sorted by final score. An empty list
    /// is a normal outcome meaning the bank has nothing suitable and new
    /// content is needed.
    pub fn find_matches(
        &self,
        prompt: &Prompt,
        arc: &PromptArc,
        track_theme: &str,
        count: usize,
        min_similarity: Option<f64>,
    ) -> Vec<SongMatch> {
        let min_similarity = min_similarity.unwrap_or(self.settings.min_similarity);

        info!(
            "Finding matches for prompt {}.{}",
            arc.arc_number, prompt.prompt_number
        );

        let query = self.generator.embed_prompt(prompt, &arc.arc_name, track_theme);

        // Cast a wide net: more candidates and a relaxed threshold, so
        // hard filters don't starve the final ranking
        let candidate_threshold = min_similarity * self.settings.candidate_threshold_factor;
        let candidates = self.index.search(
            &query,
            self.settings.candidate_pool,
            candidate_threshold as f32,
        );

        if candidates.is_empty() {
            warn!(
                "No candidates found for prompt {}.{}",
                arc.arc_number, prompt.prompt_number
            );
            return Vec::new();
        }
        debug!("Found {} candidates", candidates.len());

        let filters = self.build_filters_from_prompt(prompt, arc);
        let filtered = apply_filters(candidates, &filters);

        if filtered.is_empty() {
            warn!(
                "No candidates passed filters for prompt {}.{}",
                arc.arc_number, prompt.prompt_number
            );
            return Vec::new();
        }
        debug!("{} candidates passed filters", filtered.len());

        let mut matches: Vec<SongMatch> = filtered
            .into_iter()
            .filter(|(_, similarity)| f64::from(*similarity) >= min_similarity)
            .map(|(song, similarity)| self.scorer.score(&song, f64::from(similarity), &filters))
            .collect();

        matches.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(count);

        if let Some(best) = matches.first() {
            info!(
                "Found {} matches for prompt {}.{} (best score: {:.3})",
                matches.len(),
                arc.arc_number,
                prompt.prompt_number,
                best.final_score
            );
        }

        matches
    }

    /// Derive hard constraints from the prompt's tempo hints, falling
    /// back to a keyword scan of the raw text.
    fn build_filters_from_prompt(&self, prompt: &Prompt, arc: &PromptArc) -> SearchFilters {
        let mut tempo_category = primary_tempo_hint(&prompt.tempo_hints);

        if tempo_category.is_none() {
            let text = prompt.text.to_lowercase();
            if text.contains("slow") {
                tempo_category = Some(TempoCategory::Slow);
            } else if text.contains("mid-tempo") || text.contains("mid tempo") {
                tempo_category = Some(TempoCategory::MidTempo);
            } else if text.contains("upbeat") || text.contains("energetic") {
                tempo_category = Some(TempoCategory::Upbeat);
            }
        }

        SearchFilters {
            target_bpm: tempo_category.map(target_bpm_for),
            bpm_tolerance: self.settings.bpm_tolerance,
            preferred_key: None,
            tempo_category,
            target_arc_number: Some(arc.arc_number),
            min_duration: Some(self.settings.min_duration),
            max_duration: Some(self.settings.max_duration),
            max_times_used: Some(self.settings.max_times_used),
        }
    }

    pub fn statistics(&self) -> MatcherStats {
        let index_stats = self.index.stats();
        MatcherStats {
            total_songs_indexed: index_stats.total_songs,
            embedding_dimension: index_stats.embedding_dimension,
            min_similarity_threshold: self.settings.min_similarity,
            bpm_tolerance: self.settings.bpm_tolerance,
        }
    }
}
