//! Vector Module
//!
//! Embedding records and the similarity kernels used to compare them.

mod record;
mod similarity;

pub use record::{Vector, VectorRecord};
pub use similarity::{
    cosine_distance, cosine_similarity, dot_product, normalize_vector, SimilarityScorer,
};

pub(crate) use similarity::squared_euclidean_distance;
