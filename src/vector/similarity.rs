//! Vector Similarity Functions
//!
//! Distance kernels and the bounded relatedness score built on them.

use crate::error::{LexrelError, Result};

/// Compute dot product of two vectors
///
/// Uses unrolled loop for better CPU performance.
#[inline]
pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len().min(b.len());
    let mut sum = 0.0f64;

    // Process 4 elements at a time (manual unrolling)
    let chunks = len / 4;
    let remainder = len % 4;

    for i in 0..chunks {
        let idx = i * 4;
        sum += a[idx] * b[idx];
        sum += a[idx + 1] * b[idx + 1];
        sum += a[idx + 2] * b[idx + 2];
        sum += a[idx + 3] * b[idx + 3];
    }

    for i in (len - remainder)..len {
        sum += a[i] * b[i];
    }

    sum
}

/// Compute cosine similarity between two vectors
///
/// Returns value in range [-1, 1] where 1 means identical direction.
/// A zero-magnitude vector has similarity 0 with everything.
#[inline]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let (scale_a, scale_b) = (max_abs(a), max_abs(b));
    if !(scale_a > 0.0 && scale_b > 0.0) {
        return 0.0;
    }

    // Components are divided by the largest magnitude first so squared norms
    // stay in range for tiny or huge vectors. For a == b all three sums are
    // computed identically, giving exactly 1.
    let dot = scaled_dot(a, scale_a, b, scale_b);
    let denom = (scaled_dot(a, scale_a, a, scale_a) * scaled_dot(b, scale_b, b, scale_b)).sqrt();
    if denom > 0.0 {
        (dot / denom).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

fn scaled_dot(a: &[f64], scale_a: f64, b: &[f64], scale_b: f64) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x / scale_a) * (y / scale_b))
        .sum()
}

/// Cosine distance `1 - cos θ`, in [0, 2]
#[inline]
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

/// Squared Euclidean distance
#[inline]
pub(crate) fn squared_euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
}

/// Normalize a vector in place
pub fn normalize_vector(v: &mut [f64]) {
    let mag = dot_product(v, v).sqrt();
    if mag > 0.0 {
        for x in v.iter_mut() {
            *x /= mag;
        }
    }
}

/// Turns two embeddings into a relatedness score in [0, 1]
///
/// `score = max(0, 1 - cosine_distance)`, so vectors at an angle of 90° or
/// more score 0 and a vector scores exactly 1 against itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer;

impl SimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score two vectors, failing on empty or mismatched input
    pub fn score(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        if a.is_empty() || b.is_empty() {
            return Err(LexrelError::InvalidInput(
                "cannot score an empty vector".to_string(),
            ));
        }
        if a.len() != b.len() {
            return Err(LexrelError::InvalidInput(format!(
                "Dimension mismatch: {} vs {}",
                a.len(),
                b.len()
            )));
        }

        let distance = cosine_distance(a, b);
        Ok((1.0 - distance).clamp(0.0, 1.0))
    }

    /// Score two vectors, treating any failure as a score of 0
    pub fn score_or_zero(&self, a: &[f64], b: &[f64]) -> f64 {
        self.score(a, b).unwrap_or(0.0)
    }
}
