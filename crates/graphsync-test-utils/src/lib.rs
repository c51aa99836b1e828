//! Testing utilities for the graphsync workspace
//!
//! Shared test helpers: a scripted in-memory gateway, result row builders
//! and workspace fixtures.

#![allow(missing_docs)]

use graphsync_gateway::{query_kind, Binding, GatewayError, SparqlResults, TransactionGateway};
use graphsync_model::{Workspace, WorkspaceSettings};
use parking_lot::Mutex;

pub const ENDPOINT: &str = "http://store.test/repositories/ws";
pub const APP_CONTEXT: &str = "http://example.org/application";

#[derive(Debug, Clone)]
enum Reply {
    Results(SparqlResults),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Rule {
    kind: String,
    needle: Option<String>,
    reply: Reply,
}

impl Rule {
    fn matches(&self, kind: &str, query: &str) -> bool {
        self.kind == kind
            && self
                .needle
                .as_deref()
                .map_or(true, |needle| query.contains(needle))
    }
}

/// In-memory gateway answering by query kind
///
/// Read queries are matched against the scripted rules in insertion order;
/// a rule may also require a substring of the query text. Unmatched reads
/// return empty results. Committed transactions are recorded.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    rules: Mutex<Vec<Rule>>,
    rejected_kinds: Mutex<Vec<String>>,
    reads: Mutex<Vec<String>>,
    transactions: Mutex<Vec<Vec<String>>>,
}

impl ScriptedGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every query of `kind` with `rows`
    #[must_use]
    pub fn respond(self, kind: &str, rows: Vec<Binding>) -> Self {
        self.push(kind, None, Reply::Results(SparqlResults::from_bindings(rows)));
        self
    }

    /// Answer queries of `kind` containing `needle` with `rows`
    #[must_use]
    pub fn respond_matching(self, kind: &str, needle: &str, rows: Vec<Binding>) -> Self {
        self.push(
            kind,
            Some(needle.to_string()),
            Reply::Results(SparqlResults::from_bindings(rows)),
        );
        self
    }

    /// Fail every read query of `kind`
    #[must_use]
    pub fn fail(self, kind: &str) -> Self {
        self.push(kind, None, Reply::Fail(format!("scripted failure for {kind}")));
        self
    }

    /// Reject every transaction containing a query of `kind`
    #[must_use]
    pub fn reject_transactions_with(self, kind: &str) -> Self {
        self.rejected_kinds.lock().push(kind.to_string());
        self
    }

    fn push(&self, kind: &str, needle: Option<String>, reply: Reply) {
        self.rules.lock().push(Rule {
            kind: kind.to_string(),
            needle,
            reply,
        });
    }

    /// Text of every read query, in order
    #[must_use]
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().clone()
    }

    /// Kinds of every read query, in order
    #[must_use]
    pub fn read_kinds(&self) -> Vec<String> {
        self.reads
            .lock()
            .iter()
            .filter_map(|q| query_kind(q).map(str::to_string))
            .collect()
    }

    /// Committed transactions, in order
    #[must_use]
    pub fn transactions(&self) -> Vec<Vec<String>> {
        self.transactions.lock().clone()
    }

    /// Kinds of every committed query, flattened
    #[must_use]
    pub fn committed_kinds(&self) -> Vec<String> {
        self.transactions
            .lock()
            .iter()
            .flatten()
            .filter_map(|q| query_kind(q).map(str::to_string))
            .collect()
    }

    /// Forget recorded reads and transactions, keep the script
    pub fn clear_log(&self) {
        self.reads.lock().clear();
        self.transactions.lock().clear();
    }
}

#[async_trait::async_trait]
impl TransactionGateway for ScriptedGateway {
    async fn run_read_query(
        &self,
        _endpoint: &str,
        query: &str,
    ) -> Result<SparqlResults, GatewayError> {
        self.reads.lock().push(query.to_string());
        let kind = query_kind(query).unwrap_or_default();
        let reply = self
            .rules
            .lock()
            .iter()
            .find(|rule| rule.matches(kind, query))
            .map(|rule| rule.reply.clone());
        match reply {
            Some(Reply::Results(results)) => Ok(results),
            Some(Reply::Fail(message)) => Err(GatewayError::Rejected(message)),
            None => Ok(SparqlResults::default()),
        }
    }

    async fn run_transaction(
        &self,
        _endpoint: &str,
        queries: &[String],
    ) -> Result<(), GatewayError> {
        let rejected = self.rejected_kinds.lock().clone();
        if let Some(kind) = queries
            .iter()
            .filter_map(|q| query_kind(q))
            .find(|kind| rejected.iter().any(|r| r == kind))
        {
            return Err(GatewayError::Rejected(format!("scripted rejection of {kind}")));
        }
        if !queries.is_empty() {
            self.transactions.lock().push(queries.to_vec());
        }
        Ok(())
    }
}

// Result rows, one builder per query shape

pub fn vocabulary_row(context: &str, glossary: &str, vocabulary: &str, label: &str) -> Binding {
    Binding::new()
        .with_uri("contextIRI", context)
        .with_uri("scheme", glossary)
        .with_uri("vocabIRI", vocabulary)
        .with_lang_literal("vocabLabel", label, "en")
}

pub fn metadata_row(glossary: &str, namespace: &str) -> Binding {
    Binding::new()
        .with_uri("scheme", glossary)
        .with_literal("namespace", namespace)
}

pub fn cache_row(vocabulary: &str, diagram: &str) -> Binding {
    Binding::new()
        .with_uri("vocabulary", vocabulary)
        .with_uri("diagram", diagram)
}

pub fn diagram_row(iri: &str, id: &str, name: &str) -> Binding {
    Binding::new()
        .with_uri("diagram", iri)
        .with_literal("id", id)
        .with_literal("name", name)
}

pub fn collaborator_row(iri: &str, id: &str, name: &str, collaborator: &str) -> Binding {
    diagram_row(iri, id, name).with_literal("collaborator", collaborator)
}

pub fn user_row(id: &str, given_name: &str, family_name: &str) -> Binding {
    Binding::new()
        .with_literal("id", id)
        .with_literal("givenName", given_name)
        .with_literal("familyName", family_name)
}

pub fn element_row(term: &str, vocabulary: Option<&str>, state: Option<(&str, bool)>) -> Binding {
    let mut row = Binding::new().with_uri("term", term);
    if let Some(vocabulary) = vocabulary {
        row = row.with_uri("vocabulary", vocabulary);
    }
    if let Some((diagram, hidden)) = state {
        row = row
            .with_literal("diagramId", diagram)
            .with_bool("hidden", hidden);
    }
    row
}

pub fn link_row(id: &str, source: &str, iri: &str, target: &str, active: bool) -> Binding {
    Binding::new()
        .with_literal("id", id)
        .with_uri("source", source)
        .with_uri("iri", iri)
        .with_uri("target", target)
        .with_bool("active", active)
}

pub fn term_row(term: &str, label: &str) -> Binding {
    Binding::new()
        .with_uri("term", term)
        .with_lang_literal("label", label, "en")
}

pub fn restriction_row(term: &str, on_property: &str, target: &str) -> Binding {
    Binding::new()
        .with_uri("term", term)
        .with_uri("onProperty", on_property)
        .with_uri("target", target)
}

pub fn read_only_row(term: &str, vocabulary: &str, restriction: Option<(&str, &str)>) -> Binding {
    let mut row = Binding::new()
        .with_uri("term", term)
        .with_uri("vocabulary", vocabulary);
    if let Some((on_property, target)) = restriction {
        row = row
            .with_uri("onProperty", on_property)
            .with_uri("target", target);
    }
    row
}

// Workspace fixtures

pub fn workspace() -> Workspace {
    Workspace::new(WorkspaceSettings::new(ENDPOINT, APP_CONTEXT))
}
