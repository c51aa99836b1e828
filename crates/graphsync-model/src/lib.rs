//! graphsync model
//!
//! The client-side cache of a diagram workspace:
//! - vocabularies and their terms, with restriction lists
//! - diagram elements and links referencing those terms
//! - diagrams, their collaborators and the vocabulary → diagram search index
//!
//! Every table lives in an explicit [`Workspace`] value. The synchronisation
//! engine is its only mutator; presentation code reads it.
//!
//! # Example
//!
//! ```rust
//! use graphsync_model::{Element, Term, Workspace, WorkspaceSettings};
//!
//! let mut ws = Workspace::new(WorkspaceSettings::new(
//!     "http://localhost:7200/repositories/ws",
//!     "http://example.org/application",
//! ));
//! ws.terms.insert("http://example.org/a".into(), Term::new("http://example.org/a"));
//! ws.elements.insert("http://example.org/a".into(), Element::new("http://example.org/a"));
//! ws.rebuild_link_index();
//! assert!(ws.is_term_read_only("http://example.org/a"));
//! ```

#![warn(unreachable_pub)]

pub mod cache_index;
pub mod entities;
pub mod ids;
pub mod merge;
pub mod relations;
pub mod workspace;

pub use cache_index::{CachedVocabulary, VocabularyCacheIndex};
pub use entities::{Diagram, Element, Link, Restriction, Term, User, Vocabulary};
pub use ids::{is_uri_shaped, DiagramId, Iri, LangMap, LinkId};
pub use merge::{merge_term, merge_terms};
pub use workspace::{ViewMode, Workspace, WorkspaceSettings};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
