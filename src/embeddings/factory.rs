//! Factory for embedding model instances.

use super::hashed_model::HashedTfModel;
use super::model::EmbeddingModel;
use crate::config::EmbeddingEngine;
use thiserror::Error;
use tracing::info;

/// Hard cap on the configurable vector dimension.
const MAX_DIMENSION: usize = 4096;

/// Errors raised while constructing an embedding model.
///
/// These are configuration errors: they surface at startup, never at
/// first use.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("embedding dimension must be between 1 and 4096, got {0}")]
    InvalidDimension(usize),
}

/// Create an embedding model for the configured engine.
pub fn create_embedding_model(
    engine: &EmbeddingEngine,
    dimension: usize,
) -> Result<Box<dyn EmbeddingModel>, ModelError> {
    if dimension == 0 || dimension > MAX_DIMENSION {
        return Err(ModelError::InvalidDimension(dimension));
    }

    match engine {
        EmbeddingEngine::HashedTf => {
            info!("Creating hashed-tf embedding model (dimension {})", dimension);
            Ok(Box::new(HashedTfModel::new(dimension)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_hashed_tf_model() {
        let model = create_embedding_model(&EmbeddingEngine::HashedTf, 128).unwrap();
        assert_eq!(model.dimension(), 128);
        assert_eq!(model.name(), "hashed-tf-128");
    }

    #[test]
    fn test_rejects_bad_dimension() {
        assert!(create_embedding_model(&EmbeddingEngine::HashedTf, 0).is_err());
        assert!(create_embedding_model(&EmbeddingEngine::HashedTf, 100_000).is_err());
    }
}
