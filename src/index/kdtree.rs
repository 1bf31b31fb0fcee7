//! k-d Tree Neighbor Index
//!
//! Points are inserted in arrival order without rebalancing. The split axis
//! cycles through the dimensions with depth. Nodes live in a flat arena and
//! queries walk it with an explicit stack, so a degenerate (list-shaped) tree
//! built from sorted input cannot overflow the call stack.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::vector::{normalize_vector, squared_euclidean_distance, VectorRecord};

/// Index configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexConfig {
    /// Store unit-length vectors, making Euclidean order match cosine order
    pub normalize: bool,
}

impl IndexConfig {
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

#[derive(Debug)]
struct Node {
    record: VectorRecord,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// One k-nearest-neighbor hit
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub record: &'a VectorRecord,
    /// Euclidean distance to the query
    pub distance: f64,
}

impl<'a> Neighbor<'a> {
    pub fn word(&self) -> &'a str {
        &self.record.word
    }
}

/// Heap entry ordered by (squared distance, insertion id)
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist_sq: f64,
    id: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.id.cmp(&other.id))
    }
}

/// Immutable-after-build k-d tree over word vectors
///
/// Every record of the build stream is kept, duplicate words included.
#[derive(Debug, Default)]
pub struct NeighborIndex {
    nodes: Vec<Node>,
    dimension: usize,
    normalize: bool,
}

impl NeighborIndex {
    /// Build from a fallible record stream, e.g. a `RecordStream`
    pub fn build<I>(records: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = Result<VectorRecord, LoadError>>,
    {
        Self::build_with(records, IndexConfig::default())
    }

    pub fn build_with<I>(records: I, config: IndexConfig) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = Result<VectorRecord, LoadError>>,
    {
        let mut index = Self {
            nodes: Vec::new(),
            dimension: 0,
            normalize: config.normalize,
        };
        for record in records {
            index.insert(record?)?;
        }

        info!(
            points = index.len(),
            dimension = index.dimension,
            normalize = index.normalize,
            "Built neighbor index"
        );
        Ok(index)
    }

    /// Build from in-memory records
    pub fn from_records<I>(records: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = VectorRecord>,
    {
        Self::build(records.into_iter().map(Ok))
    }

    fn insert(&mut self, mut record: VectorRecord) -> Result<(), LoadError> {
        let id = self.nodes.len();

        if record.dim() == 0 {
            return Err(LoadError::EmptyVector {
                index: id,
                word: record.word,
            });
        }
        if id == 0 {
            self.dimension = record.dim();
        } else if record.dim() != self.dimension {
            let actual = record.dim();
            return Err(LoadError::DimensionMismatch {
                index: id,
                word: record.word,
                expected: self.dimension,
                actual,
            });
        }

        if self.normalize {
            normalize_vector(&mut record.vector);
        }

        if id == 0 {
            self.nodes.push(Node {
                record,
                axis: 0,
                left: None,
                right: None,
            });
            return Ok(());
        }

        let mut current = 0;
        loop {
            let node = &self.nodes[current];
            let go_left = record.vector[node.axis] < node.record.vector[node.axis];
            let child = if go_left { node.left } else { node.right };

            match child {
                Some(next) => current = next,
                None => {
                    let axis = (node.axis + 1) % self.dimension;
                    let parent = &mut self.nodes[current];
                    if go_left {
                        parent.left = Some(id);
                    } else {
                        parent.right = Some(id);
                    }
                    self.nodes.push(Node {
                        record,
                        axis,
                        left: None,
                        right: None,
                    });
                    return Ok(());
                }
            }
        }
    }

    /// Find the `k` points closest to `query`, nearest first
    ///
    /// Returns fewer than `k` hits when the index is smaller, and nothing for
    /// `k == 0`, an empty index or a query of the wrong dimension. Equal
    /// distances keep insertion order.
    pub fn k_nearest(&self, query: &[f64], k: usize) -> Vec<Neighbor<'_>> {
        if k == 0 || self.nodes.is_empty() {
            return Vec::new();
        }
        if query.len() != self.dimension {
            debug!(
                expected = self.dimension,
                actual = query.len(),
                "Query dimension mismatch"
            );
            return Vec::new();
        }

        let normalized;
        let query = if self.normalize {
            let mut q = query.to_vec();
            normalize_vector(&mut q);
            normalized = q;
            normalized.as_slice()
        } else {
            query
        };

        let k = k.min(self.nodes.len());
        let mut best: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        // (node, lower bound on squared distance of anything in its subtree)
        let mut stack: Vec<(usize, f64)> = vec![(0, 0.0)];

        while let Some((id, bound)) = stack.pop() {
            if best.len() == k && best.peek().is_some_and(|worst| bound > worst.dist_sq) {
                continue;
            }

            let node = &self.nodes[id];
            let candidate = Candidate {
                dist_sq: squared_euclidean_distance(query, &node.record.vector),
                id,
            };
            if best.len() < k {
                best.push(candidate);
            } else if best.peek().is_some_and(|worst| candidate < *worst) {
                best.pop();
                best.push(candidate);
            }

            let diff = query[node.axis] - node.record.vector[node.axis];
            let (near, far) = if diff < 0.0 {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };
            // far side first so the near side is explored first
            if let Some(far) = far {
                stack.push((far, diff * diff));
            }
            if let Some(near) = near {
                stack.push((near, bound));
            }
        }

        best.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                record: &self.nodes[c.id].record,
                distance: c.dist_sq.sqrt(),
            })
            .collect()
    }

    /// Number of indexed points, duplicates included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Vector dimensionality (0 for an empty index)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn is_normalized(&self) -> bool {
        self.normalize
    }
}
