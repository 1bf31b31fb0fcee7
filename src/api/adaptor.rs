//! Embedding Adaptor
//!
//! `LexicalBackend` over GloVe word embeddings: the store answers point
//! lookups, the optional neighbor index answers related-word queries.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use super::config::AdaptorConfig;
use super::{below_threshold, Concept, ConceptRelation, LexicalBackend, WordRelation};
use crate::error::{LexrelError, Result};
use crate::index::NeighborIndex;
use crate::storage::{EmbeddingStore, RecordStream};
use crate::vector::SimilarityScorer;

/// Relatedness backend over word embeddings
///
/// The store and index are read-only once built. The threshold is the only
/// mutable state and changing it needs `&mut self`; share the adaptor behind
/// a lock if it must be reconfigured while other threads query it.
pub struct EmbeddingAdaptor {
    store: EmbeddingStore,
    index: Option<NeighborIndex>,
    scorer: SimilarityScorer,
    threshold: f64,
    max_related_words: usize,
}

impl EmbeddingAdaptor {
    /// Open with defaults: point lookups only, no neighbor index
    pub fn open(dir: &Path) -> Result<Self> {
        Self::open_with_config(dir, AdaptorConfig::default())
    }

    /// Open the store and, if configured, build the neighbor index from a
    /// second sequential pass over the same source
    pub fn open_with_config(dir: &Path, config: AdaptorConfig) -> Result<Self> {
        validate_threshold(config.threshold)?;

        let store = EmbeddingStore::open_with_config(dir, config.store_config())?;
        let index = if config.build_neighbor_index {
            let stream = RecordStream::open(dir)?;
            Some(NeighborIndex::build_with(stream, config.index_config())?)
        } else {
            None
        };

        Self::from_parts(store, index, &config)
    }

    /// Assemble from separately built parts
    pub fn from_parts(
        store: EmbeddingStore,
        index: Option<NeighborIndex>,
        config: &AdaptorConfig,
    ) -> Result<Self> {
        validate_threshold(config.threshold)?;

        Ok(Self {
            store,
            index,
            scorer: SimilarityScorer::new(),
            threshold: config.threshold,
            max_related_words: config.max_related_words,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Set the relation threshold, which must lie in [0, 1]
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold(threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    pub fn index(&self) -> Option<&NeighborIndex> {
        self.index.as_ref()
    }

    /// Related words using the configured default count
    pub fn related_words_default(&self, word: &str) -> Result<Vec<String>> {
        self.related_words(word, self.max_related_words)
    }

    /// Related words with scores, most related first
    pub fn related_words_scored(&self, word: &str, max_words: usize) -> Result<Vec<(String, f64)>> {
        let index = self.neighbor_index()?;

        let Some(vector) = self.store.lookup(word) else {
            debug!(word, "Word not in vocabulary");
            return Ok(Vec::new());
        };

        // one extra: the word itself is normally its own nearest neighbor
        let mut scored: Vec<(String, f64)> = index
            .k_nearest(&vector, max_words.saturating_add(1))
            .into_iter()
            .map(|n| {
                let score = self.scorer.score_or_zero(&vector, &n.record.vector);
                (n.word().to_string(), score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.retain(|(w, _)| w != word);
        scored.truncate(max_words);

        debug!(word, hits = scored.len(), "Related words");
        Ok(scored)
    }

    fn neighbor_index(&self) -> Result<&NeighborIndex> {
        match &self.index {
            Some(index) if !index.is_empty() => Ok(index),
            _ => Err(LexrelError::UnsupportedState(
                "related words need a neighbor index; open the adaptor with \
                 build_neighbor_index enabled"
                    .to_string(),
            )),
        }
    }

    fn concept(&self, word: &str) -> Option<Concept> {
        self.store.record(word).map(Concept::new)
    }

    fn pair_score(&self, word1: &str, word2: &str) -> f64 {
        match (self.store.lookup(word1), self.store.lookup(word2)) {
            (Some(v1), Some(v2)) => self.scorer.score_or_zero(&v1, &v2),
            _ => 0.0,
        }
    }
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(LexrelError::InvalidInput(format!(
            "threshold {} is outside [0, 1]",
            threshold
        )))
    }
}

impl LexicalBackend for EmbeddingAdaptor {
    fn related_words(&self, word: &str, max_words: usize) -> Result<Vec<String>> {
        Ok(self
            .related_words_scored(word, max_words)?
            .into_iter()
            .map(|(w, _)| w)
            .collect())
    }

    fn related_words_weighted(&self, word: &str) -> Result<HashMap<String, f64>> {
        let mut weights = HashMap::new();
        // best score wins when the index holds a word more than once
        for (w, score) in self.related_words_scored(word, self.max_related_words)? {
            weights.entry(w).or_insert(score);
        }
        Ok(weights)
    }

    fn word_relations(&self, word1: &str, word2: &str) -> Result<HashSet<WordRelation>> {
        let weights = self.word_relations_weighted(word1, word2)?;
        Ok(below_threshold(&weights, self.threshold))
    }

    fn word_relations_weighted(
        &self,
        word1: &str,
        word2: &str,
    ) -> Result<HashMap<WordRelation, f64>> {
        let score = self.pair_score(word1, word2);
        Ok(HashMap::from([
            (WordRelation::Relatedness, score),
            (WordRelation::Similarity, score),
        ]))
    }

    fn word_to_concepts(&self, word: &str) -> Result<HashSet<Concept>> {
        Ok(self.concept(word).into_iter().collect())
    }

    fn word_to_concepts_weighted(&self, word: &str) -> Result<HashMap<Concept, f64>> {
        Ok(self.concept(word).map(|c| (c, 1.0)).into_iter().collect())
    }

    fn concept_words(&self, concept: &Concept) -> Result<HashSet<String>> {
        Ok(HashSet::from([concept.id().to_string()]))
    }

    fn concept_words_weighted(&self, concept: &Concept) -> Result<HashMap<String, f64>> {
        Ok(HashMap::from([(concept.id().to_string(), 1.0)]))
    }

    fn concept_relations(&self, c1: &Concept, c2: &Concept) -> Result<HashSet<ConceptRelation>> {
        let weights = self.concept_relations_weighted(c1, c2)?;
        Ok(below_threshold(&weights, self.threshold))
    }

    fn concept_relations_weighted(
        &self,
        c1: &Concept,
        c2: &Concept,
    ) -> Result<HashMap<ConceptRelation, f64>> {
        let score = self.scorer.score_or_zero(c1.vector(), c2.vector());
        Ok(HashMap::from([
            (ConceptRelation::Relatedness, score),
            (ConceptRelation::Similarity, score),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Domain;
    use crate::storage::{test_support::write_fixture, BinaryWriter};
    use crate::vector::VectorRecord;
    use tempfile::{tempdir, TempDir};

    fn toy_source() -> TempDir {
        let dir = tempdir().unwrap();
        write_fixture(
            dir.path(),
            &[
                ("cat", vec![1.0, 0.0]),
                ("dog", vec![0.9, 0.1]),
                ("car", vec![0.0, 1.0]),
            ],
        );
        dir
    }

    fn larger_source() -> TempDir {
        let dir = tempdir().unwrap();
        write_fixture(
            dir.path(),
            &[
                ("cat", vec![1.0, 0.0, 0.2]),
                ("kitten", vec![0.8, 0.1, 0.2]),
                ("dog", vec![0.9, 0.3, 0.1]),
                ("wolf", vec![0.6, 0.5, 0.0]),
                ("car", vec![0.0, 1.0, 0.1]),
                ("truck", vec![0.1, 0.9, 0.3]),
                ("road", vec![-0.2, 0.7, 0.9]),
                ("river", vec![0.1, -0.4, 1.0]),
            ],
        );
        dir
    }

    fn with_index(dir: &Path) -> EmbeddingAdaptor {
        EmbeddingAdaptor::open_with_config(dir, AdaptorConfig::default().with_neighbor_index(true))
            .unwrap()
    }

    #[test]
    fn test_related_words_toy_table() {
        let dir = toy_source();
        let adaptor = with_index(dir.path());

        assert_eq!(adaptor.related_words("cat", 1).unwrap(), vec!["dog"]);
    }

    #[test]
    fn test_related_words_exclude_query_and_are_ordered() {
        let dir = larger_source();
        let adaptor = with_index(dir.path());

        for word in ["cat", "kitten", "dog", "wolf", "car", "truck", "road", "river"] {
            let scored = adaptor.related_words_scored(word, 5).unwrap();
            assert!(scored.len() <= 5);
            assert!(scored.iter().all(|(w, _)| w != word), "{} in its own list", word);
            assert!(
                scored.windows(2).all(|pair| pair[0].1 >= pair[1].1),
                "scores out of order for {}: {:?}",
                word,
                scored
            );

            let words = adaptor.related_words(word, 5).unwrap();
            assert!(!words.iter().any(|w| w == word));
        }
    }

    #[test]
    fn test_related_words_all_points() {
        let dir = toy_source();
        let adaptor = with_index(dir.path());

        let words = adaptor.related_words("cat", 10).unwrap();
        assert_eq!(words, vec!["dog", "car"]);
        assert!(adaptor.related_words("cat", 0).unwrap().is_empty());
    }

    #[test]
    fn test_related_words_huge_count() {
        let dir = toy_source();
        let adaptor = with_index(dir.path());

        assert_eq!(
            adaptor.related_words("cat", usize::MAX - 1).unwrap(),
            vec!["dog", "car"]
        );
        assert_eq!(adaptor.related_words("cat", usize::MAX).unwrap().len(), 2);
    }

    #[test]
    fn test_related_words_without_index() {
        let dir = toy_source();
        let adaptor = EmbeddingAdaptor::open(dir.path()).unwrap();

        assert!(adaptor.index().is_none());
        assert!(matches!(
            adaptor.related_words("cat", 3),
            Err(LexrelError::UnsupportedState(_))
        ));
        assert!(matches!(
            adaptor.related_words_weighted("cat"),
            Err(LexrelError::UnsupportedState(_))
        ));
    }

    #[test]
    fn test_related_words_on_empty_index() {
        let dir = tempdir().unwrap();
        BinaryWriter::write_records(dir.path(), Vec::new()).unwrap();
        let adaptor = with_index(dir.path());

        assert!(adaptor.index().unwrap().is_empty());
        assert!(matches!(
            adaptor.related_words("cat", 3),
            Err(LexrelError::UnsupportedState(_))
        ));
    }

    #[test]
    fn test_unknown_word_is_empty_everywhere() {
        let dir = toy_source();
        let adaptor = with_index(dir.path());

        assert!(adaptor.store().lookup("zebra").is_none());
        assert!(adaptor.related_words("zebra", 3).unwrap().is_empty());
        assert!(adaptor.related_words_weighted("zebra").unwrap().is_empty());
        assert!(adaptor.word_to_concepts("zebra").unwrap().is_empty());
        assert!(adaptor.word_to_concepts_weighted("zebra").unwrap().is_empty());

        let weights = adaptor.word_relations_weighted("zebra", "cat").unwrap();
        assert_eq!(weights[&WordRelation::Relatedness], 0.0);
        assert_eq!(weights[&WordRelation::Similarity], 0.0);
    }

    #[test]
    fn test_related_words_weighted() {
        let dir = toy_source();
        let adaptor = with_index(dir.path());

        let weights = adaptor.related_words_weighted("cat").unwrap();
        assert_eq!(weights.len(), 2);
        assert!(!weights.contains_key("cat"));
        assert!(weights["dog"] > 0.99);
        assert!(weights["car"].abs() < 1e-6);
    }

    #[test]
    fn test_word_relations_default_threshold() {
        let dir = toy_source();
        let adaptor = EmbeddingAdaptor::open(dir.path()).unwrap();
        assert_eq!(adaptor.threshold(), 0.70);

        let far = adaptor.word_relations("cat", "car").unwrap();
        assert_eq!(
            far,
            HashSet::from([WordRelation::Relatedness, WordRelation::Similarity])
        );

        let near = adaptor.word_relations("cat", "dog").unwrap();
        assert!(near.is_empty());

        let weights = adaptor.word_relations_weighted("cat", "dog").unwrap();
        assert!(weights[&WordRelation::Similarity] > 0.99);
    }

    #[test]
    fn test_word_relations_threshold_boundary() {
        let dir = toy_source();
        let mut adaptor = EmbeddingAdaptor::open(dir.path()).unwrap();
        let score = adaptor.word_relations_weighted("cat", "dog").unwrap()
            [&WordRelation::Relatedness];

        adaptor.set_threshold(score).unwrap();
        assert!(adaptor.word_relations("cat", "dog").unwrap().is_empty());

        adaptor.set_threshold(1.0).unwrap();
        assert_eq!(adaptor.word_relations("cat", "dog").unwrap().len(), 2);
    }

    #[test]
    fn test_self_relation_never_below_threshold() {
        let dir = toy_source();
        let adaptor = EmbeddingAdaptor::open(dir.path()).unwrap();
        let weights = adaptor.word_relations_weighted("dog", "dog").unwrap();
        assert_eq!(weights[&WordRelation::Similarity], 1.0);
        assert!(adaptor.word_relations("dog", "dog").unwrap().is_empty());
    }

    #[test]
    fn test_threshold_validation() {
        let dir = toy_source();
        let mut adaptor = EmbeddingAdaptor::open(dir.path()).unwrap();

        assert!(matches!(
            adaptor.set_threshold(1.5),
            Err(LexrelError::InvalidInput(_))
        ));
        assert!(adaptor.set_threshold(f64::NAN).is_err());
        assert_eq!(adaptor.threshold(), 0.70);

        let result =
            EmbeddingAdaptor::open_with_config(dir.path(), AdaptorConfig::default().with_threshold(-0.1));
        assert!(matches!(result, Err(LexrelError::InvalidInput(_))));
    }

    #[test]
    fn test_word_to_concepts() {
        let dir = toy_source();
        let adaptor = EmbeddingAdaptor::open(dir.path()).unwrap();

        let concepts = adaptor.word_to_concepts("dog").unwrap();
        assert_eq!(concepts.len(), 1);
        let concept = concepts.into_iter().next().unwrap();
        assert_eq!(concept.id(), "dog");
        assert_eq!(concept.vector().len(), 2);

        let weighted = adaptor.word_to_concepts_weighted("dog").unwrap();
        assert_eq!(weighted[&concept], 1.0);

        assert_eq!(
            adaptor.concept_words(&concept).unwrap(),
            HashSet::from(["dog".to_string()])
        );
        assert_eq!(adaptor.concept_words_weighted(&concept).unwrap()["dog"], 1.0);
    }

    #[test]
    fn test_concept_relations() {
        let dir = toy_source();
        let adaptor = EmbeddingAdaptor::open(dir.path()).unwrap();
        let cat = Concept::new(adaptor.store().record("cat").unwrap());
        let car = Concept::new(adaptor.store().record("car").unwrap());
        let dog = Concept::new(adaptor.store().record("dog").unwrap());

        assert_eq!(
            adaptor.concept_relations(&cat, &car).unwrap(),
            HashSet::from([ConceptRelation::Relatedness, ConceptRelation::Similarity])
        );
        assert!(adaptor.concept_relations(&cat, &dog).unwrap().is_empty());

        // mismatched dimensions score zero rather than failing
        let odd = Concept::new(VectorRecord::new("odd", vec![1.0, 0.0, 0.0]));
        let weights = adaptor.concept_relations_weighted(&cat, &odd).unwrap();
        assert_eq!(weights[&ConceptRelation::Relatedness], 0.0);
    }

    #[test]
    fn test_unsupported_capabilities() {
        let dir = toy_source();
        let adaptor = EmbeddingAdaptor::open(dir.path()).unwrap();
        let cat = Concept::new(adaptor.store().record("cat").unwrap());
        let domains = HashSet::from([Domain("zoology".to_string())]);
        let relations = HashSet::from([ConceptRelation::Relatedness]);

        let not_implemented = |r: Result<()>| matches!(r, Err(LexrelError::NotImplemented(_)));

        assert!(not_implemented(adaptor.word_languages("cat").map(drop)));
        assert!(not_implemented(adaptor.word_domains("cat").map(drop)));
        assert!(not_implemented(
            adaptor.word_domains_weighted("cat", &domains).map(drop)
        ));
        assert!(not_implemented(
            adaptor.constrained_concepts("cat", &cat).map(drop)
        ));
        assert!(not_implemented(
            adaptor.constrained_concepts_weighted("cat", &cat).map(drop)
        ));
        assert!(not_implemented(adaptor.gloss(&cat).map(drop)));
        assert!(not_implemented(
            adaptor.related_concepts(&cat, &relations).map(drop)
        ));
        assert!(not_implemented(
            adaptor.related_concepts_weighted(&cat, &relations).map(drop)
        ));
        assert!(not_implemented(adaptor.concept_languages(&cat).map(drop)));
        assert!(not_implemented(adaptor.concept_domains(&cat).map(drop)));
        assert!(not_implemented(
            adaptor.concept_domains_weighted(&cat).map(drop)
        ));
        assert!(not_implemented(adaptor.languages().map(drop)));
        assert!(not_implemented(adaptor.domains().map(drop)));
    }

    #[test]
    fn test_duplicate_words_diverge_between_store_and_index() {
        // The store resolves "dog" to its last vector while the index keeps
        // both copies, so the word can be listed twice.
        let dir = tempdir().unwrap();
        write_fixture(
            dir.path(),
            &[
                ("cat", vec![1.0, 0.0]),
                ("dog", vec![0.9, 0.1]),
                ("car", vec![0.0, 1.0]),
                ("dog", vec![0.8, 0.3]),
            ],
        );
        let adaptor = with_index(dir.path());

        assert_eq!(adaptor.store().len(), 3);
        assert_eq!(adaptor.index().unwrap().len(), 4);

        let dog = adaptor.store().lookup("dog").unwrap();
        assert!((dog[1] - 0.3).abs() < 1e-6);

        let words = adaptor.related_words("cat", 3).unwrap();
        assert_eq!(words, vec!["dog", "dog", "car"]);

        let weights = adaptor.related_words_weighted("cat").unwrap();
        assert_eq!(weights.len(), 2);
    }

    #[test]
    fn test_preloaded_and_normalized() {
        let dir = larger_source();
        let plain = with_index(dir.path());
        let tuned = EmbeddingAdaptor::open_with_config(
            dir.path(),
            AdaptorConfig::default()
                .with_neighbor_index(true)
                .with_preload(true)
                .with_normalized_index(true)
                .with_max_related_words(3),
        )
        .unwrap();

        assert!(tuned.store().is_preloaded());
        assert!(tuned.index().unwrap().is_normalized());
        assert_eq!(tuned.related_words_default("cat").unwrap().len(), 3);

        // with every point retrieved both rank by cosine score
        assert_eq!(
            plain.related_words("cat", 7).unwrap(),
            tuned.related_words("cat", 7).unwrap()
        );
    }

    #[test]
    fn test_from_parts() {
        let dir = toy_source();
        let store = EmbeddingStore::open(dir.path()).unwrap();
        let index = NeighborIndex::from_records(vec![
            VectorRecord::new("cat", vec![1.0, 0.0]),
            VectorRecord::new("dog", vec![0.9, 0.1]),
        ])
        .unwrap();

        let adaptor =
            EmbeddingAdaptor::from_parts(store, Some(index), &AdaptorConfig::default()).unwrap();
        assert_eq!(adaptor.related_words("cat", 5).unwrap(), vec!["dog"]);
    }
}
