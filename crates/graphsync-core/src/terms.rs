//! Term cache loading
//!
//! Vocabularies are processed one after another. For each one the term set
//! is merged first, then the restrictions of the terms now cached. Once all
//! are merged the vocabularies become writable and restriction targets
//! still missing from the cache are fetched once.

use crate::error::SyncError;
use crate::fetch::{fetch_read_only_terms, fetch_restrictions, fetch_terms};
use crate::remote::Remote;
use crate::vocabulary::DiscoveredVocabulary;
use graphsync_model::{merge_terms, Iri, Term, Vocabulary, Workspace};
use indexmap::IndexSet;

/// Outcome of a term load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermLoadReport {
    /// Vocabularies processed
    pub vocabularies: usize,
    /// Terms not cached before
    pub new_terms: usize,
    /// Restriction targets fetched from outside the vocabularies
    pub resolved_targets: usize,
}

/// Merge the terms of every discovered vocabulary into the cache
///
/// # Errors
/// The first failed fetch aborts the load. Vocabularies merged before it
/// keep their terms but stay read-only.
pub async fn load_terms(
    ws: &mut Workspace,
    remote: &Remote,
    discovered: &[DiscoveredVocabulary],
) -> Result<TermLoadReport, SyncError> {
    let mut report = TermLoadReport::default();

    for vocabulary in discovered {
        let scope = vocabulary.scope();
        let terms = fetch_terms(remote, &scope).await?;
        let fetched = terms.len();
        report.new_terms += merge_terms(&mut ws.terms, terms.into_values());

        let restrictions = fetch_restrictions(remote, &scope).await?;
        let known: Vec<Term> = restrictions
            .into_values()
            .filter(|term| ws.terms.contains_key(&term.iri))
            .collect();
        merge_terms(&mut ws.terms, known);

        report.vocabularies += 1;
        tracing::debug!(vocabulary = %vocabulary.iri, terms = fetched, "vocabulary terms merged");
    }

    for vocabulary in discovered {
        bind_writable(ws, vocabulary);
    }

    report.resolved_targets = resolve_restriction_targets(ws, remote).await?;
    tracing::info!(
        vocabularies = report.vocabularies,
        new_terms = report.new_terms,
        resolved = report.resolved_targets,
        "term cache loaded"
    );
    Ok(report)
}

fn bind_writable(ws: &mut Workspace, discovered: &DiscoveredVocabulary) {
    let vocabulary = ws
        .vocabularies
        .entry(discovered.iri.clone())
        .or_insert_with(|| Vocabulary::read_only(discovered.iri.clone()));
    vocabulary.read_only = false;
    vocabulary.graph = Some(discovered.graph.clone());
    vocabulary.glossary = Some(discovered.glossary.clone());
    if discovered.change_context.is_some() {
        vocabulary.change_context.clone_from(&discovered.change_context);
    }
}

/// URI-shaped restriction targets of writable terms absent from the cache
#[must_use]
pub fn missing_restriction_targets(ws: &Workspace) -> Vec<Iri> {
    let mut missing: IndexSet<Iri> = IndexSet::new();
    for term in ws.terms.values() {
        let writable = term
            .vocabulary
            .as_ref()
            .is_some_and(|v| ws.vocabularies.get(v).is_some_and(|v| !v.read_only));
        if !writable {
            continue;
        }
        for restriction in &term.restrictions {
            if restriction.target.is_uri_shaped() && !ws.terms.contains_key(&restriction.target) {
                missing.insert(restriction.target.clone());
            }
        }
    }
    missing.into_iter().collect()
}

async fn resolve_restriction_targets(ws: &mut Workspace, remote: &Remote) -> Result<usize, SyncError> {
    let missing = missing_restriction_targets(ws);
    if missing.is_empty() {
        return Ok(0);
    }
    let fetched = fetch_read_only_terms(remote, &missing).await?;
    let found = fetched.len();
    if found < missing.len() {
        tracing::debug!(
            requested = missing.len(),
            found,
            "some restriction targets are not terms of any vocabulary"
        );
    }
    ws.insert_cache_terms(fetched);
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_test_utils::workspace;

    #[test]
    fn missing_targets_only_from_writable_terms() {
        let mut ws = workspace();
        ws.vocabularies.insert(
            "http://v".into(),
            Vocabulary::writable("http://v".into(), "http://g".into(), "http://s".into()),
        );
        ws.vocabularies
            .insert("http://ro".into(), Vocabulary::read_only("http://ro".into()));
        ws.terms.insert(
            "http://a".into(),
            Term::new("http://a")
                .in_vocabulary("http://v")
                .with_restriction("http://p", "http://b")
                .with_restriction("http://p", "http://external")
                .with_restriction("http://p", "literal"),
        );
        ws.terms.insert("http://b".into(), Term::new("http://b").in_vocabulary("http://v"));
        ws.terms.insert(
            "http://c".into(),
            Term::new("http://c")
                .in_vocabulary("http://ro")
                .with_restriction("http://p", "http://elsewhere"),
        );

        assert_eq!(missing_restriction_targets(&ws), vec![Iri::from("http://external")]);
    }
}
