//! Song catalog: models and storage backends.

mod memory_store;
mod models;
mod schema;
mod sqlite_store;
mod trait_def;

pub use memory_store::MemorySongStore;
pub use models::{Prompt, PromptArc, Song, SongMatch, TempoCategory};
pub use schema::SCHEMA_VERSION;
pub use sqlite_store::SqliteSongStore;
pub use trait_def::SongStore;
