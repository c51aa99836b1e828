//! SPARQL 1.1 JSON query results
//!
//! Untyped result documents as returned by the store. Typed access goes
//! through the accessors on [`Binding`] and the records in
//! [`records`](crate::records).

use crate::error::BindingError;
use graphsync_model::Iri;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// A result document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparqlResults {
    /// Result header
    #[serde(default)]
    pub head: Head,
    /// Result rows
    #[serde(default)]
    pub results: ResultSet,
}

/// Result header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Head {
    /// Projected variables
    #[serde(default)]
    pub vars: Vec<String>,
}

/// Result rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// One binding per solution
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

impl SparqlResults {
    /// Build a document from rows
    #[must_use]
    pub fn from_bindings(bindings: Vec<Binding>) -> Self {
        Self {
            head: Head::default(),
            results: ResultSet { bindings },
        }
    }

    /// Number of solutions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.bindings.len()
    }

    /// Whether there are no solutions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }

    /// Iterate solutions
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.results.bindings.iter()
    }
}

/// An RDF term bound to a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RdfTerm {
    /// IRI
    #[serde(rename = "uri")]
    Uri {
        /// The IRI
        value: String,
    },
    /// Literal, optionally language-tagged or typed
    #[serde(rename = "literal", alias = "typed-literal")]
    Literal {
        /// Lexical form
        value: String,
        /// Language tag
        #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        /// Datatype IRI
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
    },
    /// Blank node
    #[serde(rename = "bnode")]
    BlankNode {
        /// Node label
        value: String,
    },
}

/// One solution: variable name → term
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Binding(BTreeMap<String, RdfTerm>);

impl Binding {
    /// Empty solution
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With an IRI bound to `var`
    #[must_use]
    pub fn with_uri(mut self, var: &str, value: &str) -> Self {
        self.0.insert(
            var.to_string(),
            RdfTerm::Uri {
                value: value.to_string(),
            },
        );
        self
    }

    /// With a plain literal bound to `var`
    #[must_use]
    pub fn with_literal(mut self, var: &str, value: &str) -> Self {
        self.0.insert(
            var.to_string(),
            RdfTerm::Literal {
                value: value.to_string(),
                lang: None,
                datatype: None,
            },
        );
        self
    }

    /// With a language-tagged literal bound to `var`
    #[must_use]
    pub fn with_lang_literal(mut self, var: &str, value: &str, lang: &str) -> Self {
        self.0.insert(
            var.to_string(),
            RdfTerm::Literal {
                value: value.to_string(),
                lang: Some(lang.to_string()),
                datatype: None,
            },
        );
        self
    }

    /// With an `xsd:boolean` bound to `var`
    #[must_use]
    pub fn with_bool(mut self, var: &str, value: bool) -> Self {
        self.0.insert(
            var.to_string(),
            RdfTerm::Literal {
                value: value.to_string(),
                lang: None,
                datatype: Some(XSD_BOOLEAN.to_string()),
            },
        );
        self
    }

    /// Raw term for `var`
    #[inline]
    #[must_use]
    pub fn get(&self, var: &str) -> Option<&RdfTerm> {
        self.0.get(var)
    }

    /// Required IRI
    pub fn iri(&self, var: &str) -> Result<Iri, BindingError> {
        self.opt_iri(var)?
            .ok_or_else(|| BindingError::Missing(var.to_string()))
    }

    /// Optional IRI
    pub fn opt_iri(&self, var: &str) -> Result<Option<Iri>, BindingError> {
        match self.0.get(var) {
            None => Ok(None),
            Some(RdfTerm::Uri { value }) => Ok(Some(Iri::new(value.clone()))),
            Some(_) => Err(BindingError::WrongKind {
                var: var.to_string(),
                expected: "an IRI",
            }),
        }
    }

    /// Required literal lexical form
    pub fn literal(&self, var: &str) -> Result<&str, BindingError> {
        self.opt_literal(var)?
            .ok_or_else(|| BindingError::Missing(var.to_string()))
    }

    /// Optional literal lexical form
    pub fn opt_literal(&self, var: &str) -> Result<Option<&str>, BindingError> {
        match self.0.get(var) {
            None => Ok(None),
            Some(RdfTerm::Literal { value, .. }) => Ok(Some(value.as_str())),
            Some(_) => Err(BindingError::WrongKind {
                var: var.to_string(),
                expected: "a literal",
            }),
        }
    }

    /// Optional literal with its language tag (empty when untagged)
    pub fn opt_lang_literal(&self, var: &str) -> Result<Option<(String, String)>, BindingError> {
        match self.0.get(var) {
            None => Ok(None),
            Some(RdfTerm::Literal { value, lang, .. }) => {
                Ok(Some((lang.clone().unwrap_or_default(), value.clone())))
            }
            Some(_) => Err(BindingError::WrongKind {
                var: var.to_string(),
                expected: "a literal",
            }),
        }
    }

    /// Required literal with its language tag
    pub fn lang_literal(&self, var: &str) -> Result<(String, String), BindingError> {
        self.opt_lang_literal(var)?
            .ok_or_else(|| BindingError::Missing(var.to_string()))
    }

    /// Optional boolean literal
    pub fn opt_bool(&self, var: &str) -> Result<Option<bool>, BindingError> {
        let Some(value) = self.opt_literal(var)? else {
            return Ok(None);
        };
        match value {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            other => Err(BindingError::Malformed {
                var: var.to_string(),
                expected: "boolean",
                value: other.to_string(),
            }),
        }
    }

    /// Required boolean literal
    pub fn boolean(&self, var: &str) -> Result<bool, BindingError> {
        self.opt_bool(var)?
            .ok_or_else(|| BindingError::Missing(var.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "head": { "vars": ["vocabIRI", "vocabLabel", "flag", "node"] },
        "results": { "bindings": [
            {
                "vocabIRI": { "type": "uri", "value": "http://example.org/v" },
                "vocabLabel": { "type": "literal", "value": "Slovník", "xml:lang": "cs" },
                "flag": { "type": "typed-literal", "value": "true",
                          "datatype": "http://www.w3.org/2001/XMLSchema#boolean" },
                "node": { "type": "bnode", "value": "b0" }
            }
        ] }
    }"#;

    #[test]
    fn decodes_result_document() {
        let results: SparqlResults = serde_json::from_str(DOCUMENT).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.head.vars.len(), 4);

        let row = results.bindings().next().unwrap();
        assert_eq!(row.iri("vocabIRI").unwrap().as_str(), "http://example.org/v");
        assert_eq!(
            row.lang_literal("vocabLabel").unwrap(),
            ("cs".to_string(), "Slovník".to_string())
        );
        assert!(row.boolean("flag").unwrap());
    }

    #[test]
    fn accessor_errors() {
        let results: SparqlResults = serde_json::from_str(DOCUMENT).unwrap();
        let row = results.bindings().next().unwrap();

        assert_eq!(
            row.iri("missing"),
            Err(BindingError::Missing("missing".to_string()))
        );
        assert!(matches!(row.iri("node"), Err(BindingError::WrongKind { .. })));
        assert!(matches!(row.literal("vocabIRI"), Err(BindingError::WrongKind { .. })));
        assert_eq!(row.opt_iri("missing"), Ok(None));
    }

    #[test]
    fn malformed_boolean() {
        let row = Binding::new().with_literal("active", "yes");
        assert!(matches!(row.boolean("active"), Err(BindingError::Malformed { .. })));
    }

    #[test]
    fn empty_document_defaults() {
        let results: SparqlResults = serde_json::from_str("{}").unwrap();
        assert!(results.is_empty());
    }
}
