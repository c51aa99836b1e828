//! Identifier newtypes
//!
//! Terms, vocabularies, glossaries, graph contexts and relationship types all
//! share the [`Iri`] type: the reconciliation rules compare them against each
//! other (an element id is a term id, a link type may be a term id).

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// An IRI as received from the remote store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(String);

impl Iri {
    /// Wrap an IRI string
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw IRI
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier is an absolute URL with a host
    #[inline]
    #[must_use]
    pub fn is_uri_shaped(&self) -> bool {
        is_uri_shaped(&self.0)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Iri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for Iri {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Diagram-edge identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    /// Generate a fresh link identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LinkId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LinkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for LinkId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Diagram identifier (local key, distinct from the diagram IRI)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagramId(String);

impl DiagramId {
    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiagramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DiagramId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DiagramId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for DiagramId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Language tag → text
pub type LangMap = BTreeMap<String, String>;

/// Whether `value` is an absolute URL with a host component.
///
/// `urn:` style identifiers and bare words are rejected.
#[must_use]
pub fn is_uri_shaped(value: &str) -> bool {
    url::Url::parse(value).is_ok_and(|url| url.has_host())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_shape() {
        assert!(is_uri_shaped("http://example.org/vocab/1"));
        assert!(is_uri_shaped("https://slovník.gov.cz/základní/pojem/typ-objektu"));
        assert!(!is_uri_shaped("not-a-uri"));
        assert!(!is_uri_shaped("urn:isbn:0451450523"));
        assert!(!is_uri_shaped(""));
    }

    #[test]
    fn iri_borrows_as_str() {
        let mut map = std::collections::HashMap::new();
        map.insert(Iri::from("http://example.org/a"), 1);
        assert_eq!(map.get("http://example.org/a"), Some(&1));
    }

    #[test]
    fn generated_link_ids_differ() {
        assert_ne!(LinkId::generate(), LinkId::generate());
    }
}
