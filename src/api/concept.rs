//! Concept
//!
//! A word reified as a single sense. Identity is the originating word.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::vector::VectorRecord;

/// A concept backed by one word vector
#[derive(Debug, Clone)]
pub struct Concept {
    record: VectorRecord,
}

impl Concept {
    pub fn new(record: VectorRecord) -> Self {
        Self { record }
    }

    /// Stable identifier, equal to the originating word
    pub fn id(&self) -> &str {
        &self.record.word
    }

    pub fn vector(&self) -> &[f64] {
        &self.record.vector
    }

    pub fn record(&self) -> &VectorRecord {
        &self.record
    }

    pub fn into_record(self) -> VectorRecord {
        self.record
    }
}

impl PartialEq for Concept {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Concept {}

impl Hash for Concept {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
