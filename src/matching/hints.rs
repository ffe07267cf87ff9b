//! Keyword tables for extracting tempo, instrument and vibe hints from
//! prompt text.
//!
//! Pure substring scans over fixed tables; no tokenization, no runtime
//! configuration. Hint order follows table order so downstream priority
//! rules stay deterministic.

use crate::song_store::{Prompt, TempoCategory};

/// Tempo phrases mapped to categories. Longer phrases come first so
/// "very slow" lands in `very_slow` before the bare "slow" also matches.
const TEMPO_KEYWORDS: &[(&str, TempoCategory)] = &[
    ("very slow", TempoCategory::VerySlow),
    ("extremely slow", TempoCategory::VerySlow),
    ("slow tempo", TempoCategory::Slow),
    ("slow", TempoCategory::Slow),
    ("downtempo", TempoCategory::Slow),
    ("mid-tempo", TempoCategory::MidTempo),
    ("mid tempo", TempoCategory::MidTempo),
    ("moderate", TempoCategory::MidTempo),
    ("upbeat", TempoCategory::Upbeat),
    ("energetic", TempoCategory::Upbeat),
    ("fast", TempoCategory::Fast),
    ("rapid", TempoCategory::Fast),
];

const INSTRUMENT_KEYWORDS: &[&str] = &[
    "synth",
    "synthesizer",
    "piano",
    "guitar",
    "bass",
    "drum machine",
    "percussion",
    "drums",
    "hi-hat",
    "hihat",
    "pad",
    "arp",
    "arpeggiat",
    "organ",
    "strings",
    "tape",
    "vinyl",
    "analog",
    "analogue",
    "digital",
];

const VIBE_KEYWORDS: &[&str] = &[
    "ambient",
    "atmospheric",
    "nostalgic",
    "dreamy",
    "focused",
    "focus",
    "calm",
    "relaxing",
    "energetic",
    "melancholic",
    "uplifting",
    "dark",
    "bright",
    "hazy",
    "clear",
    "minimal",
    "rhythmic",
    "hypnotic",
    "smooth",
    "warm",
    "cold",
    "static",
];

/// Tempo categories mentioned in the text, deduplicated, in table order.
pub fn extract_tempo_hints(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut hints: Vec<String> = Vec::new();

    for (keyword, category) in TEMPO_KEYWORDS {
        if lowered.contains(keyword) {
            let name = category.to_db_str().to_string();
            if !hints.contains(&name) {
                hints.push(name);
            }
        }
    }
    hints
}

/// Instrument keywords mentioned in the text, in table order.
pub fn extract_instrument_hints(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    INSTRUMENT_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .map(|keyword| keyword.to_string())
        .collect()
}

/// Vibe keywords mentioned in the text, in table order.
pub fn extract_vibe_hints(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    VIBE_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .map(|keyword| keyword.to_string())
        .collect()
}

/// Build a prompt from raw text, running all hint extractors once.
pub fn build_prompt(prompt_number: u32, text: impl Into<String>) -> Prompt {
    let text = text.into();
    Prompt {
        prompt_number,
        tempo_hints: extract_tempo_hints(&text),
        instrument_hints: extract_instrument_hints(&text),
        vibe_hints: extract_vibe_hints(&text),
        text,
    }
}

/// First recognized tempo hint in priority order (slowest wins), used
/// when deriving search filters from a prompt.
pub fn primary_tempo_hint(hints: &[String]) -> Option<TempoCategory> {
    const PRIORITY: &[TempoCategory] = &[
        TempoCategory::VerySlow,
        TempoCategory::Slow,
        TempoCategory::MidTempo,
        TempoCategory::Upbeat,
        TempoCategory::Fast,
    ];

    PRIORITY
        .iter()
        .find(|category| hints.iter().any(|h| h == category.to_db_str()))
        .copied()
}
