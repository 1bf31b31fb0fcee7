//! Vector Record
//!
//! A word paired with its embedding vector.

/// Embedding vector, widened to double precision on read
pub type Vector = Vec<f64>;

/// A word and its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// The word, exactly as stored in the embedding source
    pub word: String,
    /// The embedding vector
    pub vector: Vector,
}

impl VectorRecord {
    pub fn new(word: impl Into<String>, vector: Vector) -> Self {
        Self {
            word: word.into(),
            vector,
        }
    }

    /// Get embedding dimension
    pub fn dim(&self) -> usize {
        self.vector.len()
    }
}
