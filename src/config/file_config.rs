use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core paths (can override CLI)
    pub db_path: Option<String>,
    pub index_path: Option<String>,

    // Feature configs
    pub matching: Option<MatchingConfig>,
    pub embedding: Option<EmbeddingConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct MatchingConfig {
    pub min_similarity: Option<f64>,
    pub bpm_tolerance: Option<f64>,
    pub candidate_pool: Option<usize>,
    pub candidate_threshold_factor: Option<f64>,
    pub min_duration: Option<f64>,
    pub max_duration: Option<f64>,
    pub max_times_used: Option<u32>,
    pub weights: Option<WeightsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct WeightsConfig {
    pub similarity: Option<f64>,
    pub arc_bonus: Option<f64>,
    pub bpm_proximity: Option<f64>,
    pub key_compatibility: Option<f64>,
    pub usage_penalty: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding engine to use: "hashed-tf"
    pub engine: Option<String>,
    pub dimension: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
