//! Adaptor Configuration

use crate::index::IndexConfig;
use crate::storage::StoreConfig;

/// Scores strictly below this count as a relation
pub const DEFAULT_RELATEDNESS_THRESHOLD: f64 = 0.70;

/// Neighbor count used when the caller does not give one
pub const DEFAULT_MAX_RELATED_WORDS: usize = 10;

/// Embedding adaptor configuration
#[derive(Debug, Clone)]
pub struct AdaptorConfig {
    /// Relation threshold in [0, 1]
    pub threshold: f64,

    /// Default number of related words
    pub max_related_words: usize,

    /// Build the neighbor index at open time (needed for related-word queries)
    pub build_neighbor_index: bool,

    /// Keep the vector table in memory
    pub preload_vectors: bool,

    /// Index unit-length vectors
    pub normalize_index: bool,
}

impl Default for AdaptorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_RELATEDNESS_THRESHOLD,
            max_related_words: DEFAULT_MAX_RELATED_WORDS,
            build_neighbor_index: false,
            preload_vectors: false,
            normalize_index: false,
        }
    }
}

impl AdaptorConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_related_words(mut self, max: usize) -> Self {
        self.max_related_words = max;
        self
    }

    pub fn with_neighbor_index(mut self, build: bool) -> Self {
        self.build_neighbor_index = build;
        self
    }

    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload_vectors = preload;
        self
    }

    pub fn with_normalized_index(mut self, normalize: bool) -> Self {
        self.normalize_index = normalize;
        self
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default().with_preload(self.preload_vectors)
    }

    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::default().with_normalize(self.normalize_index)
    }
}
