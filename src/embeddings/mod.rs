//! Embedding generation, storage and similarity search.

mod factory;
mod hashed_model;
mod index;
mod model;

pub use factory::{create_embedding_model, ModelError};
pub use hashed_model::{HashedTfModel, DEFAULT_DIMENSION};
pub use index::{EmbeddingIndex, IndexStats};
pub use model::{Embedding, EmbeddingGenerator, EmbeddingModel};
