//! Vocabulary → diagram search index
//!
//! Derived from the cache context on every load, never persisted. Only the
//! obsolete-diagram check reads it.

use crate::ids::{Iri, LangMap};
use indexmap::{IndexMap, IndexSet};

/// What the cache knows about one vocabulary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedVocabulary {
    /// Labels per language
    pub labels: LangMap,
    /// IRIs of diagrams that reference the vocabulary
    pub diagrams: IndexSet<Iri>,
}

/// Index of cached vocabularies
#[derive(Debug, Clone, Default)]
pub struct VocabularyCacheIndex {
    entries: IndexMap<Iri, CachedVocabulary>,
}

impl VocabularyCacheIndex {
    /// Create an empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entry for `vocabulary`, created when absent
    pub fn entry(&mut self, vocabulary: Iri) -> &mut CachedVocabulary {
        self.entries.entry(vocabulary).or_default()
    }

    /// Record that `diagram` references `vocabulary`
    pub fn add_diagram(&mut self, vocabulary: Iri, diagram: Iri) {
        self.entry(vocabulary).diagrams.insert(diagram);
    }

    /// Lookup a vocabulary
    #[must_use]
    pub fn get(&self, vocabulary: &str) -> Option<&CachedVocabulary> {
        self.entries.get(vocabulary)
    }

    /// Iterate entries
    pub fn iter(&self) -> impl Iterator<Item = (&Iri, &CachedVocabulary)> {
        self.entries.iter()
    }

    /// Number of indexed vocabularies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
