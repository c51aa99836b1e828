//! Workspace context
//!
//! The single owner of every cache table. Components receive it by `&mut`
//! reference; nothing is process-global, so several workspaces can coexist.

use crate::cache_index::VocabularyCacheIndex;
use crate::entities::{Diagram, Element, Link, Term, User, Vocabulary};
use crate::ids::{DiagramId, Iri, LangMap, LinkId};
use crate::merge::merge_terms;
use indexmap::IndexMap;

/// Main view shown by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Diagram canvas
    #[default]
    Canvas,
    /// Diagram manager listing
    Manager,
}

/// Session settings shared with the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSettings {
    /// Query/transaction endpoint
    pub context_endpoint: String,
    /// Graph holding diagrams, elements and links
    pub application_context: Iri,
    /// Graph holding the vocabulary cache index
    pub cache_context: Option<Iri>,
    /// Resolved vocabulary contexts
    pub context_iris: Vec<Iri>,
    /// Interface language code
    pub interface_language: String,
    /// Workspace display name per language
    pub name: LangMap,
    /// Currently selected diagram
    pub selected_diagram: Option<DiagramId>,
    /// Current main view
    pub view_mode: ViewMode,
}

impl WorkspaceSettings {
    /// Create settings for an endpoint
    #[must_use]
    pub fn new(context_endpoint: impl Into<String>, application_context: impl Into<Iri>) -> Self {
        Self {
            context_endpoint: context_endpoint.into(),
            application_context: application_context.into(),
            cache_context: None,
            context_iris: Vec::new(),
            interface_language: "en".to_string(),
            name: LangMap::new(),
            selected_diagram: None,
            view_mode: ViewMode::default(),
        }
    }
}

/// All cached state of one workspace
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Session settings
    pub settings: WorkspaceSettings,
    /// Vocabularies by IRI
    pub vocabularies: IndexMap<Iri, Vocabulary>,
    /// Terms by IRI
    pub terms: IndexMap<Iri, Term>,
    /// Elements by backing term IRI
    pub elements: IndexMap<Iri, Element>,
    /// Links by id
    pub links: IndexMap<LinkId, Link>,
    /// Diagrams by id
    pub diagrams: IndexMap<DiagramId, Diagram>,
    /// Diagram collaborators by id
    pub users: IndexMap<String, User>,
    /// Vocabulary → diagram index
    pub cache_index: VocabularyCacheIndex,
}

impl Workspace {
    /// Create an empty workspace
    #[must_use]
    pub fn new(settings: WorkspaceSettings) -> Self {
        Self {
            settings,
            vocabularies: IndexMap::new(),
            terms: IndexMap::new(),
            elements: IndexMap::new(),
            links: IndexMap::new(),
            diagrams: IndexMap::new(),
            users: IndexMap::new(),
            cache_index: VocabularyCacheIndex::new(),
        }
    }

    /// Recompute every element's `source_links`/`target_links` from scratch
    ///
    /// Only active links whose both endpoints are elements are indexed.
    pub fn rebuild_link_index(&mut self) {
        for element in self.elements.values_mut() {
            element.source_links.clear();
            element.target_links.clear();
        }
        for (id, link) in &self.links {
            if !link.active
                || !self.elements.contains_key(&link.source)
                || !self.elements.contains_key(&link.target)
            {
                continue;
            }
            if let Some(source) = self.elements.get_mut(&link.source) {
                source.source_links.insert(id.clone());
            }
            if let Some(target) = self.elements.get_mut(&link.target) {
                target.target_links.insert(id.clone());
            }
        }
    }

    /// Insert a link, indexing it when active
    pub fn add_link(&mut self, link: Link) {
        let id = link.id.clone();
        let index = link.active
            && self.elements.contains_key(&link.source)
            && self.elements.contains_key(&link.target);
        if index {
            if let Some(source) = self.elements.get_mut(&link.source) {
                source.source_links.insert(id.clone());
            }
            if let Some(target) = self.elements.get_mut(&link.target) {
                target.target_links.insert(id.clone());
            }
        }
        self.links.insert(id, link);
    }

    /// Mark a link inactive and drop it from the index
    ///
    /// Returns `false` when the link is unknown or already inactive.
    pub fn deactivate_link(&mut self, id: &LinkId) -> bool {
        let Some(link) = self.links.get_mut(id) else {
            return false;
        };
        if !link.active {
            return false;
        }
        link.active = false;
        let (source, target) = (link.source.clone(), link.target.clone());
        self.unindex_link(id, &source, &target);
        true
    }

    fn unindex_link(&mut self, id: &LinkId, source: &Iri, target: &Iri) {
        if let Some(element) = self.elements.get_mut(source) {
            element.source_links.shift_remove(id);
        }
        if let Some(element) = self.elements.get_mut(target) {
            element.target_links.shift_remove(id);
        }
    }

    /// Remove a link entirely
    pub fn remove_link(&mut self, id: &LinkId) -> Option<Link> {
        let link = self.links.shift_remove(id)?;
        self.unindex_link(id, &link.source, &link.target);
        Some(link)
    }

    fn remove_links_touching(&mut self, iri: &Iri) -> Vec<LinkId> {
        let touching: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| &l.source == iri || &l.target == iri)
            .map(|l| l.id.clone())
            .collect();
        for id in &touching {
            self.remove_link(id);
        }
        touching
    }

    /// Delete a concept: its term, its element and every link touching it
    ///
    /// Returns the ids of the removed links.
    pub fn delete_concept(&mut self, iri: &Iri) -> Vec<LinkId> {
        let removed = self.remove_links_touching(iri);
        self.elements.shift_remove(iri);
        self.terms.shift_remove(iri);
        tracing::debug!(concept = %iri, links = removed.len(), "concept deleted");
        removed
    }

    /// Remove a read-only element and its links, keeping the cached term
    pub fn remove_read_only_element(&mut self, iri: &Iri) -> Vec<LinkId> {
        let removed = self.remove_links_touching(iri);
        self.elements.shift_remove(iri);
        removed
    }

    /// Whether `term` is hidden in `diagram`; no recorded state counts as hidden
    #[must_use]
    pub fn is_element_hidden(&self, term: &str, diagram: &DiagramId) -> bool {
        self.elements
            .get(term)
            .and_then(|e| e.hidden.get(diagram))
            .copied()
            .unwrap_or(true)
    }

    /// Owning vocabulary of a term, from its element first, then its term record
    #[must_use]
    pub fn vocabulary_of(&self, term: &str) -> Option<&Iri> {
        self.elements
            .get(term)
            .and_then(|e| e.vocabulary.as_ref())
            .or_else(|| self.terms.get(term).and_then(|t| t.vocabulary.as_ref()))
    }

    /// Whether a vocabulary is registered and read-only
    #[must_use]
    pub fn is_vocabulary_read_only(&self, vocabulary: &str) -> bool {
        self.vocabularies.get(vocabulary).is_some_and(|v| v.read_only)
    }

    /// Whether a term is externally owned
    ///
    /// A term with no known vocabulary, or whose vocabulary is not registered
    /// as writable, is read-only.
    #[must_use]
    pub fn is_term_read_only(&self, term: &str) -> bool {
        match self.vocabulary_of(term) {
            Some(vocabulary) => self
                .vocabularies
                .get(vocabulary)
                .map_or(true, |v| v.read_only),
            None => true,
        }
    }

    /// Merge read-only term records into the term cache
    ///
    /// Unknown owning vocabularies are registered as read-only; elements
    /// without a vocabulary inherit the term's. Returns newly cached terms.
    pub fn insert_cache_terms(&mut self, terms: IndexMap<Iri, Term>) -> usize {
        for term in terms.values() {
            let Some(vocabulary) = &term.vocabulary else {
                continue;
            };
            if !self.vocabularies.contains_key(vocabulary) {
                let names = self
                    .cache_index
                    .get(vocabulary.as_str())
                    .map(|c| c.labels.clone())
                    .unwrap_or_default();
                self.vocabularies.insert(
                    vocabulary.clone(),
                    Vocabulary::read_only(vocabulary.clone()).with_names(names),
                );
            }
            if let Some(element) = self.elements.get_mut(&term.iri) {
                if element.vocabulary.is_none() {
                    element.vocabulary = Some(vocabulary.clone());
                }
            }
        }
        merge_terms(&mut self.terms, terms.into_values())
    }

    /// Give every element a hidden entry for every diagram
    ///
    /// Diagrams an element has no state for start hidden. Returns every
    /// element id, the payload for the element upsert.
    pub fn init_elements(&mut self) -> Vec<Iri> {
        let diagrams: Vec<DiagramId> = self.diagrams.keys().cloned().collect();
        for element in self.elements.values_mut() {
            for diagram in &diagrams {
                element.hidden.entry(diagram.clone()).or_insert(true);
            }
        }
        self.elements.keys().cloned().collect()
    }

    /// Active links
    pub fn active_links(&self) -> impl Iterator<Item = &Link> {
        self.links.values().filter(|l| l.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        let mut ws = Workspace::new(WorkspaceSettings::new("http://endpoint", "http://app"));
        for iri in ["http://a", "http://b", "http://c"] {
            ws.terms.insert(iri.into(), Term::new(iri));
            ws.elements.insert(iri.into(), Element::new(iri));
        }
        ws.add_link(Link::new("l1", "http://a", "http://p", "http://b"));
        ws.add_link(Link::new("l2", "http://b", "http://p", "http://c"));
        ws.add_link(Link::new("l3", "http://a", "http://p", "http://c").inactive());
        ws
    }

    #[test]
    fn index_rebuild_skips_inactive() {
        let mut ws = workspace();
        ws.rebuild_link_index();
        let a = &ws.elements["http://a"];
        assert_eq!(a.source_links.len(), 1);
        assert!(a.source_links.contains(&LinkId::from("l1")));
        assert_eq!(ws.elements["http://c"].target_links.len(), 1);
    }

    #[test]
    fn index_rebuild_is_stable() {
        let mut ws = workspace();
        ws.rebuild_link_index();
        let first = ws.elements.clone();
        ws.rebuild_link_index();
        assert_eq!(first, ws.elements);
    }

    #[test]
    fn delete_concept_cascades() {
        let mut ws = workspace();
        let removed = ws.delete_concept(&"http://b".into());
        assert_eq!(removed.len(), 2);
        assert!(!ws.terms.contains_key("http://b"));
        assert!(!ws.elements.contains_key("http://b"));
        assert!(ws.elements["http://a"].source_links.is_empty());
        assert_eq!(ws.links.len(), 1);
    }

    #[test]
    fn deactivate_unindexes() {
        let mut ws = workspace();
        assert!(ws.deactivate_link(&"l1".into()));
        assert!(!ws.deactivate_link(&"l1".into()));
        assert!(ws.elements["http://a"].source_links.is_empty());
        assert!(!ws.links["l1"].active);
    }

    #[test]
    fn read_only_resolution() {
        let mut ws = workspace();
        ws.vocabularies.insert(
            "http://v-rw".into(),
            Vocabulary::writable("http://v-rw".into(), "http://g".into(), "http://s".into()),
        );
        ws.vocabularies
            .insert("http://v-ro".into(), Vocabulary::read_only("http://v-ro".into()));
        ws.elements["http://a"].vocabulary = Some("http://v-rw".into());
        ws.elements["http://b"].vocabulary = Some("http://v-ro".into());

        assert!(!ws.is_term_read_only("http://a"));
        assert!(ws.is_term_read_only("http://b"));
        assert!(ws.is_term_read_only("http://c"));
    }

    #[test]
    fn insert_cache_terms_registers_vocabulary() {
        let mut ws = workspace();
        ws.cache_index
            .entry("http://v-ext".into())
            .labels
            .insert("en".into(), "External".into());
        let mut terms = IndexMap::new();
        terms.insert(
            Iri::from("http://c"),
            Term::new("http://c").in_vocabulary("http://v-ext"),
        );
        assert_eq!(ws.insert_cache_terms(terms), 0);

        let vocab = &ws.vocabularies["http://v-ext"];
        assert!(vocab.read_only);
        assert_eq!(vocab.names["en"], "External");
        assert_eq!(
            ws.elements["http://c"].vocabulary,
            Some(Iri::from("http://v-ext"))
        );
    }

    #[test]
    fn hidden_state_defaults() {
        let mut ws = workspace();
        ws.diagrams
            .insert("d1".into(), Diagram::new("d1", "http://d1", "One"));
        ws.elements["http://a"].hidden.insert("d1".into(), false);

        let ids = ws.init_elements();
        assert_eq!(ids.len(), 3);
        assert!(!ws.is_element_hidden("http://a", &"d1".into()));
        assert!(ws.is_element_hidden("http://b", &"d1".into()));
        assert!(ws.is_element_hidden("http://b", &"d2".into()));
    }
}
