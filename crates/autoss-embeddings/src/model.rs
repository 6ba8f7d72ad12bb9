//! Embedding model trait and types.
//!
//! Defines the lookup interface from a tag token to its pretrained vector.

/// Word vector as stored by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Widen to `f64` for aggregation.
    pub fn to_f64(&self) -> Vec<f64> {
        self.values.iter().map(|v| f64::from(*v)).collect()
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name (file stem for loaded models)
    pub name: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Number of tokens in the vocabulary
    pub vocabulary_size: usize,
}

/// Trait for token embedding models.
///
/// Implementations are read-only after load and must be thread-safe
/// (Send + Sync) so concurrent frames can share one instance.
pub trait EmbeddingModel: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Vector for `token`, or `None` if the token is not in the vocabulary.
    fn lookup(&self, token: &str) -> Option<Embedding>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize {
        self.info().dimension
    }

    /// Whether `token` is in the vocabulary.
    fn contains(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }
}
