//! Catalog models for the song bank.
//!
//! These mirror the SQLite schema and carry everything the matching
//! pipeline needs: provenance from the planning document, audio features
//! from the external analyzer, and usage tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerations
// =============================================================================

/// Tempo category, derived deterministically from BPM.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoCategory {
    VerySlow,
    Slow,
    MidTempo,
    Upbeat,
    Fast,
}

impl TempoCategory {
    /// Derive the category from a BPM value using fixed breakpoints.
    pub fn from_bpm(bpm: f64) -> Self {
        if bpm < 60.0 {
            TempoCategory::VerySlow
        } else if bpm < 80.0 {
            TempoCategory::Slow
        } else if bpm < 110.0 {
            TempoCategory::MidTempo
        } else if bpm < 140.0 {
            TempoCategory::Upbeat
        } else {
            TempoCategory::Fast
        }
    }

    /// Convert from database string representation.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "very_slow" => Some(TempoCategory::VerySlow),
            "slow" => Some(TempoCategory::Slow),
            "mid_tempo" => Some(TempoCategory::MidTempo),
            "upbeat" => Some(TempoCategory::Upbeat),
            "fast" => Some(TempoCategory::Fast),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TempoCategory::VerySlow => "very_slow",
            TempoCategory::Slow => "slow",
            TempoCategory::MidTempo => "mid_tempo",
            TempoCategory::Upbeat => "upbeat",
            TempoCategory::Fast => "fast",
        }
    }

    /// Position in the slow-to-fast ordering, used for adjacency checks.
    pub fn ordinal(&self) -> usize {
        match self {
            TempoCategory::VerySlow => 0,
            TempoCategory::Slow => 1,
            TempoCategory::MidTempo => 2,
            TempoCategory::Upbeat => 3,
            TempoCategory::Fast => 4,
        }
    }
}

// =============================================================================
// Song
// =============================================================================

/// Complete song metadata, mirroring the `songs` table.
///
/// Identity fields (`id`, `filename`, `file_path`) are set once at import.
/// Audio features come from the external analyzer and may be absent; the
/// matching rules treat missing data as pass-through, never as an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub filename: String,
    pub file_path: String,

    // Parsed from the filename (e.g. "2_6_19a.mp3")
    pub arc_number: Option<u32>,
    pub prompt_number: Option<u32>,
    pub song_number: Option<u32>,
    pub order_marker: Option<String>,

    // Provenance from the planning document
    pub track_id: Option<String>,
    pub track_title: Option<String>,
    pub arc_name: Option<String>,
    pub prompt_text: Option<String>,
    pub anchor_phrase: Option<String>,

    // Audio analysis
    pub duration_seconds: Option<f64>,
    pub bpm: Option<f64>,
    pub key: Option<String>,
    pub energy_level: Option<f64>,
    pub tempo_category: Option<TempoCategory>,

    // Search text
    pub vibe_tags: Vec<String>,
    pub mood_keywords: Vec<String>,
    pub combined_text: Option<String>,

    // Bookkeeping
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub times_used: u32,
    pub last_used_track_id: Option<String>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Song {
    /// Create a new song with a fresh id and only identity fields set.
    pub fn new(filename: impl Into<String>, file_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Song {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.into(),
            file_path: file_path.into(),
            arc_number: None,
            prompt_number: None,
            song_number: None,
            order_marker: None,
            track_id: None,
            track_title: None,
            arc_name: None,
            prompt_text: None,
            anchor_phrase: None,
            duration_seconds: None,
            bpm: None,
            key: None,
            energy_level: None,
            tempo_category: None,
            vibe_tags: Vec::new(),
            mood_keywords: Vec::new(),
            combined_text: None,
            created_at: now,
            updated_at: now,
            times_used: 0,
            last_used_track_id: None,
            last_used_at: None,
        }
    }

    /// Text used for embedding generation.
    ///
    /// When `combined_text` is set it is used verbatim. Otherwise the text is
    /// assembled from prompt text (surrounding quotes stripped), arc name,
    /// track title, vibe tags and mood keywords, joined with `" | "`.
    pub fn embedding_text(&self) -> String {
        if let Some(combined) = &self.combined_text {
            return combined.clone();
        }

        let mut parts: Vec<String> = Vec::new();
        if let Some(prompt) = &self.prompt_text {
            let clean = prompt.trim().trim_matches('"').trim_matches('\'');
            parts.push(clean.to_string());
        }
        if let Some(arc_name) = &self.arc_name {
            parts.push(format!("Arc: {}", arc_name));
        }
        if let Some(title) = &self.track_title {
            parts.push(format!("Track: {}", title));
        }
        if !self.vibe_tags.is_empty() {
            parts.push(format!("Vibes: {}", self.vibe_tags.join(", ")));
        }
        if !self.mood_keywords.is_empty() {
            parts.push(format!("Mood: {}", self.mood_keywords.join(", ")));
        }

        parts.join(" | ")
    }
}

// =============================================================================
// Prompts and arcs
// =============================================================================

/// A single creative brief for one song, belonging to an arc.
///
/// The hint lists are extracted once from the text by the keyword tables in
/// `matching::hints`; a prompt is immutable after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prompt {
    pub prompt_number: u32,
    pub text: String,
    pub tempo_hints: Vec<String>,
    pub instrument_hints: Vec<String>,
    pub vibe_hints: Vec<String>,
}

/// One of up to four mood/energy phases structuring a long-form mix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptArc {
    pub arc_number: u32,
    pub arc_name: String,
    pub prompts: Vec<Prompt>,
}

// =============================================================================
// Match results
// =============================================================================

/// A scored candidate from the matching pipeline.
///
/// Ephemeral: computed per query, never persisted. Carries every component
/// score so callers can explain the ranking.
#[derive(Clone, Debug, Serialize)]
pub struct SongMatch {
    pub song: Song,
    pub similarity_score: f64,
    pub arc_match_bonus: f64,
    pub bpm_proximity: f64,
    pub key_compatibility: f64,
    pub usage_penalty: f64,
    pub final_score: f64,
}

impl SongMatch {
    /// Human-readable confidence bucket for the final score.
    pub fn confidence_level(&self) -> &'static str {
        if self.final_score >= 0.8 {
            "excellent"
        } else if self.final_score >= 0.6 {
            "good"
        } else if self.final_score >= 0.4 {
            "fair"
        } else {
            "poor"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Tempo category
    // =========================================================================

    #[test]
    fn test_tempo_category_breakpoints() {
        assert_eq!(TempoCategory::from_bpm(40.0), TempoCategory::VerySlow);
        assert_eq!(TempoCategory::from_bpm(65.0), TempoCategory::Slow);
        assert_eq!(TempoCategory::from_bpm(90.0), TempoCategory::MidTempo);
        assert_eq!(TempoCategory::from_bpm(120.0), TempoCategory::Upbeat);
        assert_eq!(TempoCategory::from_bpm(160.0), TempoCategory::Fast);
    }

    #[test]
    fn test_tempo_category_boundaries() {
        // Breakpoints are exclusive upper bounds
        assert_eq!(TempoCategory::from_bpm(59.9), TempoCategory::VerySlow);
        assert_eq!(TempoCategory::from_bpm(60.0), TempoCategory::Slow);
        assert_eq!(TempoCategory::from_bpm(80.0), TempoCategory::MidTempo);
        assert_eq!(TempoCategory::from_bpm(110.0), TempoCategory::Upbeat);
        assert_eq!(TempoCategory::from_bpm(140.0), TempoCategory::Fast);
    }

    #[test]
    fn test_tempo_category_db_round_trip() {
        for cat in [
            TempoCategory::VerySlow,
            TempoCategory::Slow,
            TempoCategory::MidTempo,
            TempoCategory::Upbeat,
            TempoCategory::Fast,
        ] {
            assert_eq!(TempoCategory::from_db_str(cat.to_db_str()), Some(cat));
        }
        assert_eq!(TempoCategory::from_db_str("allegro"), None);
    }

    // =========================================================================
    // Embedding text
    // =========================================================================

    #[test]
    fn test_embedding_text_prefers_combined_text() {
        let mut song = Song::new("a.mp3", "/songs/a.mp3");
        song.prompt_text = Some("dusty tape loops".to_string());
        song.combined_text = Some("precomputed description".to_string());

        assert_eq!(song.embedding_text(), "precomputed description");
    }

    #[test]
    fn test_embedding_text_assembly_order() {
        let mut song = Song::new("a.mp3", "/songs/a.mp3");
        song.prompt_text = Some("\"warm tape hiss, slow drums\"".to_string());
        song.arc_name = Some("VHS Static Haze".to_string());
        song.track_title = Some("Midnight Reruns".to_string());
        song.vibe_tags = vec!["hazy".to_string(), "nostalgic".to_string()];
        song.mood_keywords = vec!["calm".to_string()];

        assert_eq!(
            song.embedding_text(),
            "warm tape hiss, slow drums | Arc: VHS Static Haze | \
             Track: Midnight Reruns | Vibes: hazy, nostalgic | Mood: calm"
        );
    }

    #[test]
    fn test_embedding_text_skips_missing_fields() {
        let mut song = Song::new("a.mp3", "/songs/a.mp3");
        song.arc_name = Some("Dawn".to_string());

        assert_eq!(song.embedding_text(), "Arc: Dawn");
    }

    // =========================================================================
    // Confidence levels
    // =========================================================================

    #[test]
    fn test_confidence_levels() {
        let song = Song::new("a.mp3", "/songs/a.mp3");
        let mut m = SongMatch {
            song,
            similarity_score: 0.9,
            arc_match_bonus: 0.0,
            bpm_proximity: 0.0,
            key_compatibility: 0.0,
            usage_penalty: 0.0,
            final_score: 0.85,
        };
        assert_eq!(m.confidence_level(), "excellent");
        m.final_score = 0.65;
        assert_eq!(m.confidence_level(), "good");
        m.final_score = 0.45;
        assert_eq!(m.confidence_level(), "fair");
        m.final_score = 0.2;
        assert_eq!(m.confidence_level(), "poor");
    }
}
