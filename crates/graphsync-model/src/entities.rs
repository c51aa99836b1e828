//! Cached entities
//!
//! Records held in the [`Workspace`](crate::Workspace) tables. Remote data is
//! validated into these shapes before it reaches the caches.

use crate::ids::{DiagramId, Iri, LangMap, LinkId};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// A vocabulary known to the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Vocabulary IRI
    pub iri: Iri,
    /// Display names per language
    pub names: LangMap,
    /// Graph context the vocabulary lives in
    pub graph: Option<Iri>,
    /// Concept scheme of its terms
    pub glossary: Option<Iri>,
    /// Terms are externally owned and must not be pruned locally
    pub read_only: bool,
    /// Change-tracking context, when the store keeps one
    pub change_context: Option<Iri>,
    /// Namespace prefix of the vocabulary's terms
    pub namespace: Option<String>,
    /// Descriptions per language
    pub descriptions: LangMap,
}

impl Vocabulary {
    /// Create a read-only vocabulary with no metadata
    #[must_use]
    pub fn read_only(iri: Iri) -> Self {
        Self {
            iri,
            names: LangMap::new(),
            graph: None,
            glossary: None,
            read_only: true,
            change_context: None,
            namespace: None,
            descriptions: LangMap::new(),
        }
    }

    /// Create a writable vocabulary bound to `graph` and `glossary`
    #[must_use]
    pub fn writable(iri: Iri, graph: Iri, glossary: Iri) -> Self {
        Self {
            graph: Some(graph),
            glossary: Some(glossary),
            read_only: false,
            ..Self::read_only(iri)
        }
    }

    /// With display names
    #[must_use]
    pub fn with_names(mut self, names: LangMap) -> Self {
        self.names = names;
        self
    }
}

/// A property/target pair attached to a term
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Restriction {
    /// Property the restriction is on
    pub on_property: Iri,
    /// Target term, trope or datatype
    pub target: Iri,
}

impl Restriction {
    /// Create a restriction
    #[inline]
    #[must_use]
    pub fn new(on_property: impl Into<Iri>, target: impl Into<Iri>) -> Self {
        Self {
            on_property: on_property.into(),
            target: target.into(),
        }
    }
}

/// A concept of some vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Term IRI
    pub iri: Iri,
    /// Labels per language
    pub labels: LangMap,
    /// Owning vocabulary, when known
    pub vocabulary: Option<Iri>,
    /// Restrictions (set semantics)
    pub restrictions: IndexSet<Restriction>,
}

impl Term {
    /// Create a bare term
    #[must_use]
    pub fn new(iri: impl Into<Iri>) -> Self {
        Self {
            iri: iri.into(),
            labels: LangMap::new(),
            vocabulary: None,
            restrictions: IndexSet::new(),
        }
    }

    /// With owning vocabulary
    #[must_use]
    pub fn in_vocabulary(mut self, vocabulary: impl Into<Iri>) -> Self {
        self.vocabulary = Some(vocabulary.into());
        self
    }

    /// With a label
    #[must_use]
    pub fn with_label(mut self, lang: &str, label: &str) -> Self {
        self.labels.insert(lang.to_string(), label.to_string());
        self
    }

    /// With a restriction
    #[must_use]
    pub fn with_restriction(mut self, on_property: &str, target: &str) -> Self {
        self.restrictions.insert(Restriction::new(on_property, target));
        self
    }

    /// Targets of restrictions on `property`
    pub fn targets_of<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a Iri> + 'a {
        self.restrictions
            .iter()
            .filter(move |r| r.on_property.as_str() == property)
            .map(|r| &r.target)
    }

    /// Whether the term carries `property → target`
    #[must_use]
    pub fn has_restriction(&self, property: &str, target: &str) -> bool {
        self.targets_of(property).any(|t| t.as_str() == target)
    }
}

/// A diagram node showing a term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Backing term (also the element key)
    pub term: Iri,
    /// Owning vocabulary; read-only terms may lack one
    pub vocabulary: Option<Iri>,
    /// Hidden flag per diagram
    pub hidden: IndexMap<DiagramId, bool>,
    /// Outgoing active links (derived)
    #[serde(skip)]
    pub source_links: IndexSet<LinkId>,
    /// Incoming active links (derived)
    #[serde(skip)]
    pub target_links: IndexSet<LinkId>,
}

impl Element {
    /// Create an element with no diagram state
    #[must_use]
    pub fn new(term: impl Into<Iri>) -> Self {
        Self {
            term: term.into(),
            vocabulary: None,
            hidden: IndexMap::new(),
            source_links: IndexSet::new(),
            target_links: IndexSet::new(),
        }
    }

    /// With owning vocabulary
    #[must_use]
    pub fn in_vocabulary(mut self, vocabulary: impl Into<Iri>) -> Self {
        self.vocabulary = Some(vocabulary.into());
        self
    }

    /// With hidden state in a diagram
    #[must_use]
    pub fn with_hidden(mut self, diagram: impl Into<DiagramId>, hidden: bool) -> Self {
        self.hidden.insert(diagram.into(), hidden);
        self
    }
}

/// A diagram edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link identifier
    pub id: LinkId,
    /// Source element
    pub source: Iri,
    /// Target element
    pub target: Iri,
    /// Relationship type
    pub iri: Iri,
    /// Whether the link is shown and persisted as live
    pub active: bool,
}

impl Link {
    /// Create an active link
    #[must_use]
    pub fn new(
        id: impl Into<LinkId>,
        source: impl Into<Iri>,
        iri: impl Into<Iri>,
        target: impl Into<Iri>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            iri: iri.into(),
            active: true,
        }
    }

    /// Mark inactive
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether this link represents `source -iri-> target`
    #[must_use]
    pub fn connects(&self, source: &str, iri: &str, target: &str) -> bool {
        self.source.as_str() == source && self.iri.as_str() == iri && self.target.as_str() == target
    }
}

/// A diagram of the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagram {
    /// Local key
    pub id: DiagramId,
    /// Diagram IRI
    pub iri: Iri,
    /// Display name
    pub name: String,
    /// Collaborator identifiers
    pub collaborators: Vec<String>,
    /// Scheduled for deletion
    pub to_be_deleted: bool,
}

impl Diagram {
    /// Create a diagram
    #[must_use]
    pub fn new(id: impl Into<DiagramId>, iri: impl Into<Iri>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            iri: iri.into(),
            name: name.into(),
            collaborators: Vec::new(),
            to_be_deleted: false,
        }
    }
}

/// A diagram collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier as listed in [`Diagram::collaborators`]
    pub id: String,
    /// Given name
    pub given_name: String,
    /// Family name
    pub family_name: String,
}

impl User {
    /// Create a user without a name
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            given_name: String::new(),
            family_name: String::new(),
        }
    }

    /// Name for display, falling back to the identifier
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.given_name, self.family_name);
        match name.trim() {
            "" => self.id.clone(),
            trimmed => trimmed.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_display_name_falls_back_to_id() {
        let mut user = User::new("alice");
        assert_eq!(user.display_name(), "alice");
        user.family_name = "Smith".to_string();
        assert_eq!(user.display_name(), "Smith");
        user.given_name = "Alice".to_string();
        assert_eq!(user.display_name(), "Alice Smith");
    }

    #[test]
    fn term_restriction_queries() {
        let term = Term::new("http://example.org/a")
            .with_restriction("http://example.org/p", "http://example.org/b")
            .with_restriction("http://example.org/p", "http://example.org/c")
            .with_restriction("http://example.org/p", "http://example.org/b");

        assert_eq!(term.restrictions.len(), 2);
        assert_eq!(term.targets_of("http://example.org/p").count(), 2);
        assert!(term.has_restriction("http://example.org/p", "http://example.org/c"));
        assert!(!term.has_restriction("http://example.org/q", "http://example.org/c"));
    }

    #[test]
    fn writable_vocabulary_binding() {
        let vocab = Vocabulary::writable("http://v".into(), "http://g".into(), "http://s".into());
        assert!(!vocab.read_only);
        assert_eq!(vocab.graph.as_ref().map(Iri::as_str), Some("http://g"));
    }

    #[test]
    fn element_index_not_serialized() {
        let mut element = Element::new("http://example.org/a").with_hidden("d1", false);
        element.source_links.insert(LinkId::from("l1"));
        let json = serde_json::to_string(&element).unwrap();
        assert!(!json.contains("l1"));
    }
}
