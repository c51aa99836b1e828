//! Typed result records
//!
//! One record type per query issued by the engine. Rows are validated here,
//! before any value reaches the workspace caches.

use crate::error::BindingError;
use crate::results::{Binding, SparqlResults};
use graphsync_model::{DiagramId, Iri, LinkId};

/// A record decodable from one solution
pub trait FromBinding: Sized {
    /// Decode a solution
    fn from_binding(binding: &Binding) -> Result<Self, BindingError>;
}

impl SparqlResults {
    /// Decode every solution as `T`
    ///
    /// # Errors
    /// The first row that fails validation aborts decoding.
    pub fn records<T: FromBinding>(&self) -> Result<Vec<T>, BindingError> {
        self.bindings().map(T::from_binding).collect()
    }
}

/// Language-tagged text; `lang` is empty for untagged literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangText {
    /// Language tag
    pub lang: String,
    /// Text
    pub text: String,
}

impl From<(String, String)> for LangText {
    fn from((lang, text): (String, String)) -> Self {
        Self { lang, text }
    }
}

/// Vocabulary discovered in a graph context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyContextRecord {
    /// Graph context
    pub context: Iri,
    /// Glossary (concept scheme)
    pub glossary: Iri,
    /// Vocabulary IRI
    pub vocabulary: Iri,
    /// One title of the vocabulary
    pub label: LangText,
    /// Change-tracking context
    pub change_context: Option<Iri>,
}

impl FromBinding for VocabularyContextRecord {
    fn from_binding(b: &Binding) -> Result<Self, BindingError> {
        Ok(Self {
            context: b.iri("contextIRI")?,
            glossary: b.iri("scheme")?,
            vocabulary: b.iri("vocabIRI")?,
            label: b.lang_literal("vocabLabel")?.into(),
            change_context: b.opt_iri("changeContext")?,
        })
    }
}

/// Supplementary vocabulary metadata, keyed by glossary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyMetadataRecord {
    /// Glossary
    pub glossary: Iri,
    /// Preferred namespace
    pub namespace: Option<String>,
    /// Description
    pub description: Option<LangText>,
}

impl FromBinding for VocabularyMetadataRecord {
    fn from_binding(b: &Binding) -> Result<Self, BindingError> {
        let namespace = match b.get("namespace") {
            Some(crate::results::RdfTerm::Uri { value }) => Some(value.clone()),
            _ => b.opt_literal("namespace")?.map(str::to_string),
        };
        Ok(Self {
            glossary: b.iri("scheme")?,
            namespace,
            description: b.opt_lang_literal("description")?.map(LangText::from),
        })
    }
}

/// Entry of the vocabulary cache index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVocabularyRecord {
    /// Vocabulary
    pub vocabulary: Iri,
    /// Title
    pub label: Option<LangText>,
    /// Diagram referencing the vocabulary
    pub diagram: Option<Iri>,
}

impl FromBinding for CacheVocabularyRecord {
    fn from_binding(b: &Binding) -> Result<Self, BindingError> {
        Ok(Self {
            vocabulary: b.iri("vocabulary")?,
            label: b.opt_lang_literal("label")?.map(LangText::from),
            diagram: b.opt_iri("diagram")?,
        })
    }
}

/// Diagram of the application context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRecord {
    /// Diagram IRI
    pub iri: Iri,
    /// Local id
    pub id: DiagramId,
    /// Display name
    pub name: String,
    /// One collaborator
    pub collaborator: Option<String>,
}

impl FromBinding for DiagramRecord {
    fn from_binding(b: &Binding) -> Result<Self, BindingError> {
        Ok(Self {
            iri: b.iri("diagram")?,
            id: DiagramId::from(b.literal("id")?),
            name: b.literal("name")?.to_string(),
            collaborator: b.opt_literal("collaborator")?.map(str::to_string),
        })
    }
}

/// Collaborator record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Collaborator identifier
    pub id: String,
    /// Given name
    pub given_name: Option<String>,
    /// Family name
    pub family_name: Option<String>,
}

impl FromBinding for UserRecord {
    fn from_binding(b: &Binding) -> Result<Self, BindingError> {
        Ok(Self {
            id: b.literal("id")?.to_string(),
            given_name: b.opt_literal("givenName")?.map(str::to_string),
            family_name: b.opt_literal("familyName")?.map(str::to_string),
        })
    }
}

/// Element configuration row; one per (element, diagram state)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    /// Backing term
    pub term: Iri,
    /// Owning vocabulary
    pub vocabulary: Option<Iri>,
    /// Diagram the hidden flag applies to
    pub diagram: Option<DiagramId>,
    /// Hidden flag
    pub hidden: Option<bool>,
}

impl FromBinding for ElementRecord {
    fn from_binding(b: &Binding) -> Result<Self, BindingError> {
        Ok(Self {
            term: b.iri("term")?,
            vocabulary: b.opt_iri("vocabulary")?,
            diagram: b.opt_literal("diagramId")?.map(DiagramId::from),
            hidden: b.opt_bool("hidden")?,
        })
    }
}

/// Link configuration row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Link id
    pub id: LinkId,
    /// Source element
    pub source: Iri,
    /// Target element
    pub target: Iri,
    /// Relationship type
    pub iri: Iri,
    /// Active flag
    pub active: bool,
}

impl FromBinding for LinkRecord {
    fn from_binding(b: &Binding) -> Result<Self, BindingError> {
        Ok(Self {
            id: LinkId::from(b.literal("id")?),
            source: b.iri("source")?,
            target: b.iri("target")?,
            iri: b.iri("iri")?,
            active: b.opt_bool("active")?.unwrap_or(true),
        })
    }
}

/// Term of a vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRecord {
    /// Term
    pub term: Iri,
    /// One label
    pub label: Option<LangText>,
}

impl FromBinding for TermRecord {
    fn from_binding(b: &Binding) -> Result<Self, BindingError> {
        Ok(Self {
            term: b.iri("term")?,
            label: b.opt_lang_literal("label")?.map(LangText::from),
        })
    }
}

/// Restriction of a term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionRecord {
    /// Restricted term
    pub term: Iri,
    /// Property
    pub on_property: Iri,
    /// Target
    pub target: Iri,
}

impl FromBinding for RestrictionRecord {
    fn from_binding(b: &Binding) -> Result<Self, BindingError> {
        Ok(Self {
            term: b.iri("term")?,
            on_property: b.iri("onProperty")?,
            target: b.iri("target")?,
        })
    }
}

/// Read-only term row: the term with at most one label and one restriction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOnlyTermRecord {
    /// Term
    pub term: Iri,
    /// Owning vocabulary
    pub vocabulary: Option<Iri>,
    /// One label
    pub label: Option<LangText>,
    /// Restriction property
    pub on_property: Option<Iri>,
    /// Restriction target
    pub target: Option<Iri>,
}

impl FromBinding for ReadOnlyTermRecord {
    fn from_binding(b: &Binding) -> Result<Self, BindingError> {
        Ok(Self {
            term: b.iri("term")?,
            vocabulary: b.opt_iri("vocabulary")?,
            label: b.opt_lang_literal("label")?.map(LangText::from),
            on_property: b.opt_iri("onProperty")?,
            target: b.opt_iri("target")?,
        })
    }
}
