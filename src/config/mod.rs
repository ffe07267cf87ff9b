mod file_config;

pub use file_config::{EmbeddingConfig, FileConfig, MatchingConfig, WeightsConfig};

use crate::embeddings::DEFAULT_DIMENSION;
use crate::matching::ScoringWeights;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be overridden by the TOML config file.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
}

/// Embedding engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingEngine {
    /// Deterministic local feature-hashing model.
    HashedTf,
}

impl EmbeddingEngine {
    /// Parse an engine name from configuration. An unknown engine is a
    /// fatal configuration error, raised here at startup.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "hashed-tf" => Ok(EmbeddingEngine::HashedTf),
            other => bail!("unknown embedding engine: {:?} (supported: hashed-tf)", other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingEngine::HashedTf => "hashed-tf",
        }
    }
}

/// Resolved embedding settings.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub engine: EmbeddingEngine,
    pub dimension: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        EmbeddingSettings {
            engine: EmbeddingEngine::HashedTf,
            dimension: DEFAULT_DIMENSION,
        }
    }
}

/// Resolved matching settings.
#[derive(Debug, Clone)]
pub struct MatchingSettings {
    /// Minimum similarity a candidate must reach to be scored.
    pub min_similarity: f64,
    /// BPM window half-width for filtering and proximity scoring.
    pub bpm_tolerance: f64,
    /// How many candidates the wide-net search pulls before filtering.
    pub candidate_pool: usize,
    /// Fraction of `min_similarity` used as the wide-net threshold.
    /// Tunable, not a contract.
    pub candidate_threshold_factor: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub max_times_used: u32,
    pub weights: ScoringWeights,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        MatchingSettings {
            min_similarity: 0.6,
            bpm_tolerance: 10.0,
            candidate_pool: 50,
            candidate_threshold_factor: 0.8,
            min_duration: 60.0,
            max_duration: 300.0,
            max_times_used: 10,
            weights: ScoringWeights::default(),
        }
    }
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub index_path: PathBuf,
    pub matching: MatchingSettings,
    pub embedding: EmbeddingSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from("./data/songbank.db"));

        let index_path = file
            .index_path
            .map(PathBuf::from)
            .or_else(|| cli.index_path.clone())
            .unwrap_or_else(|| PathBuf::from("./data/embeddings.json"));

        let defaults = MatchingSettings::default();
        let m_file = file.matching.unwrap_or_default();
        let w_file = m_file.weights.clone().unwrap_or_default();
        let w_defaults = ScoringWeights::default();

        let matching = MatchingSettings {
            min_similarity: m_file.min_similarity.unwrap_or(defaults.min_similarity),
            bpm_tolerance: m_file.bpm_tolerance.unwrap_or(defaults.bpm_tolerance),
            candidate_pool: m_file.candidate_pool.unwrap_or(defaults.candidate_pool),
            candidate_threshold_factor: m_file
                .candidate_threshold_factor
                .unwrap_or(defaults.candidate_threshold_factor),
            min_duration: m_file.min_duration.unwrap_or(defaults.min_duration),
            max_duration: m_file.max_duration.unwrap_or(defaults.max_duration),
            max_times_used: m_file.max_times_used.unwrap_or(defaults.max_times_used),
            weights: ScoringWeights {
                similarity: w_file.similarity.unwrap_or(w_defaults.similarity),
                arc_bonus: w_file.arc_bonus.unwrap_or(w_defaults.arc_bonus),
                bpm_proximity: w_file.bpm_proximity.unwrap_or(w_defaults.bpm_proximity),
                key_compatibility: w_file
                    .key_compatibility
                    .unwrap_or(w_defaults.key_compatibility),
                usage_penalty: w_file.usage_penalty.unwrap_or(w_defaults.usage_penalty),
            },
        };

        let e_file = file.embedding.unwrap_or_default();
        let e_defaults = EmbeddingSettings::default();
        let embedding = EmbeddingSettings {
            engine: match e_file.engine.as_deref() {
                Some(name) => EmbeddingEngine::parse(name)?,
                None => e_defaults.engine,
            },
            dimension: e_file.dimension.unwrap_or(e_defaults.dimension),
        };

        Ok(AppConfig {
            db_path,
            index_path,
            matching,
            embedding,
        })
    }
}
