//! Lexical API
//!
//! Backend-independent relatedness interface. Capabilities a backend does not
//! offer are provided methods that fail with `NotImplemented`, so an empty
//! result always means "nothing found", never "not supported".

mod adaptor;
mod concept;
mod config;

pub use adaptor::EmbeddingAdaptor;
pub use concept::Concept;
pub use config::{AdaptorConfig, DEFAULT_MAX_RELATED_WORDS, DEFAULT_RELATEDNESS_THRESHOLD};

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use crate::error::{LexrelError, Result};

/// Word-to-word relation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordRelation {
    Relatedness,
    Similarity,
}

impl fmt::Display for WordRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordRelation::Relatedness => write!(f, "WORD_RELATEDNESS"),
            WordRelation::Similarity => write!(f, "WORD_SIMILARITY"),
        }
    }
}

/// Concept-to-concept relation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConceptRelation {
    Relatedness,
    Similarity,
}

impl fmt::Display for ConceptRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConceptRelation::Relatedness => write!(f, "CONCEPT_RELATEDNESS"),
            ConceptRelation::Similarity => write!(f, "CONCEPT_SIMILARITY"),
        }
    }
}

/// Subject domain label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(pub String);

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relation kinds whose weight is strictly below `threshold`
pub(crate) fn below_threshold<K>(weights: &HashMap<K, f64>, threshold: f64) -> HashSet<K>
where
    K: Copy + Eq + Hash,
{
    weights
        .iter()
        .filter(|(_, score)| **score < threshold)
        .map(|(kind, _)| *kind)
        .collect()
}

/// A lexical resource answering relatedness queries
pub trait LexicalBackend {
    /// Up to `max_words` words related to `word`, most related first
    fn related_words(&self, word: &str, max_words: usize) -> Result<Vec<String>>;

    /// Related words with their scores
    fn related_words_weighted(&self, word: &str) -> Result<HashMap<String, f64>>;

    fn word_relations(&self, word1: &str, word2: &str) -> Result<HashSet<WordRelation>>;

    fn word_relations_weighted(
        &self,
        word1: &str,
        word2: &str,
    ) -> Result<HashMap<WordRelation, f64>>;

    fn word_to_concepts(&self, word: &str) -> Result<HashSet<Concept>>;

    fn word_to_concepts_weighted(&self, word: &str) -> Result<HashMap<Concept, f64>>;

    fn concept_words(&self, concept: &Concept) -> Result<HashSet<String>>;

    fn concept_words_weighted(&self, concept: &Concept) -> Result<HashMap<String, f64>>;

    fn concept_relations(&self, c1: &Concept, c2: &Concept) -> Result<HashSet<ConceptRelation>>;

    fn concept_relations_weighted(
        &self,
        c1: &Concept,
        c2: &Concept,
    ) -> Result<HashMap<ConceptRelation, f64>>;

    fn word_languages(&self, _word: &str) -> Result<HashSet<String>> {
        Err(LexrelError::NotImplemented("word languages"))
    }

    fn word_domains(&self, _word: &str) -> Result<HashSet<Domain>> {
        Err(LexrelError::NotImplemented("word domains"))
    }

    fn word_domains_weighted(
        &self,
        _word: &str,
        _domains: &HashSet<Domain>,
    ) -> Result<HashMap<Domain, f64>> {
        Err(LexrelError::NotImplemented("weighted word domains"))
    }

    fn constrained_concepts(&self, _word: &str, _hypernym: &Concept) -> Result<HashSet<Concept>> {
        Err(LexrelError::NotImplemented("constrained concepts"))
    }

    fn constrained_concepts_weighted(
        &self,
        _word: &str,
        _hypernym: &Concept,
    ) -> Result<HashMap<Concept, f64>> {
        Err(LexrelError::NotImplemented("weighted constrained concepts"))
    }

    fn gloss(&self, _concept: &Concept) -> Result<String> {
        Err(LexrelError::NotImplemented("gloss"))
    }

    fn related_concepts(
        &self,
        _concept: &Concept,
        _relations: &HashSet<ConceptRelation>,
    ) -> Result<HashSet<Concept>> {
        Err(LexrelError::NotImplemented("related concepts"))
    }

    fn related_concepts_weighted(
        &self,
        _concept: &Concept,
        _relations: &HashSet<ConceptRelation>,
    ) -> Result<HashMap<Concept, f64>> {
        Err(LexrelError::NotImplemented("weighted related concepts"))
    }

    fn concept_languages(&self, _concept: &Concept) -> Result<HashSet<String>> {
        Err(LexrelError::NotImplemented("concept languages"))
    }

    fn concept_domains(&self, _concept: &Concept) -> Result<HashSet<Domain>> {
        Err(LexrelError::NotImplemented("concept domains"))
    }

    fn concept_domains_weighted(&self, _concept: &Concept) -> Result<HashMap<Domain, f64>> {
        Err(LexrelError::NotImplemented("weighted concept domains"))
    }

    fn languages(&self) -> Result<HashSet<String>> {
        Err(LexrelError::NotImplemented("languages"))
    }

    fn domains(&self) -> Result<HashSet<Domain>> {
        Err(LexrelError::NotImplemented("domains"))
    }
}
