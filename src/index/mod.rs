//! Index Module
//!
//! Spatial index for k-nearest-neighbor queries over word vectors.

mod kdtree;

pub use kdtree::{IndexConfig, Neighbor, NeighborIndex};
