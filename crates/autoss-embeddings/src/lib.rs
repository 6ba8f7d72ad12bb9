//! # autoss-embeddings
//!
//! Token embedding lookup for frame tags.
//!
//! A pretrained word2vec model is loaded once per run and is read-only
//! afterwards, so one instance can serve every frame concurrently. Tokens
//! outside the vocabulary resolve to `None` and are dropped by the caller.

pub mod error;
pub mod model;
pub mod word2vec;

pub use error::EmbeddingError;
pub use model::{Embedding, EmbeddingModel, ModelInfo};
pub use word2vec::{ModelFormat, Word2VecModel};
