//! LEXREL - Lexical Relatedness over Word Embeddings
//!
//! Word similarity, nearest-neighbor and word-to-concept queries backed by
//! pretrained GloVe vectors in the binary dictionary + vector table layout.

pub mod api;
pub mod error;
pub mod index;
pub mod storage;
pub mod vector;

pub use api::{
    AdaptorConfig, Concept, ConceptRelation, Domain, EmbeddingAdaptor, LexicalBackend,
    WordRelation,
};
pub use error::{LexrelError, LoadError, Result};
pub use index::{IndexConfig, Neighbor, NeighborIndex};
pub use storage::{BinaryWriter, EmbeddingStore, RecordStream, StoreConfig, TextRecords};
pub use vector::{SimilarityScorer, Vector, VectorRecord};
