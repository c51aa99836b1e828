//! Graph reconciliation
//!
//! Restores structural integrity of the cached diagram graph once new term
//! data has landed:
//! 1. rebuild the link index from scratch
//! 2. back elements missing from the term cache with read-only terms,
//!    following has-property targets one level
//! 3. deactivate links whose type is neither a term nor a static relation
//! 4. delete elements still without a term
//! 5. upsert the surviving elements in one transaction
//!
//! Every repair is a warning, never an error.

use crate::error::SyncError;
use crate::fetch::fetch_read_only_terms;
use crate::remote::Remote;
use graphsync_model::relations::{is_static_relation, HAS_PROPERTY};
use graphsync_model::{Element, Iri, LinkId, Workspace};
use indexmap::IndexSet;

/// What reconciliation repaired
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Elements that had no cached term
    pub missing_terms: usize,
    /// Read-only terms inserted, trope targets included
    pub read_only_terms: usize,
    /// Links deactivated for an unknown type
    pub invalid_links: Vec<LinkId>,
    /// Links deactivated for an endpoint without a term
    pub dangling_links: Vec<LinkId>,
    /// Elements deleted for lack of a term
    pub deleted_elements: Vec<Iri>,
    /// Elements upserted
    pub upserted: usize,
}

impl ReconcileReport {
    /// Whether anything was repaired locally
    #[must_use]
    pub fn repaired(&self) -> bool {
        !self.invalid_links.is_empty()
            || !self.dangling_links.is_empty()
            || !self.deleted_elements.is_empty()
    }
}

/// Element ids absent from the term cache
#[must_use]
pub fn missing_terms(ws: &Workspace) -> Vec<Iri> {
    ws.elements
        .keys()
        .filter(|id| !ws.terms.contains_key(*id))
        .cloned()
        .collect()
}

/// Run every reconciliation step
///
/// # Errors
/// A failed read-only term fetch stops before any local repair; a failed
/// upsert is returned after the local repairs were applied.
pub async fn reconcile(ws: &mut Workspace, remote: &Remote) -> Result<ReconcileReport, SyncError> {
    let mut report = ReconcileReport::default();

    ws.rebuild_link_index();

    let missing = missing_terms(ws);
    report.missing_terms = missing.len();
    report.read_only_terms = back_missing_terms(ws, remote, &missing).await?;

    report.invalid_links = deactivate_invalid_links(ws);
    report.deleted_elements = delete_unbacked_elements(ws);
    report.dangling_links = deactivate_dangling_links(ws);

    ws.init_elements();
    let elements: Vec<&Element> = ws.elements.values().collect();
    report.upserted = elements.len();
    if !elements.is_empty() {
        let query = remote.queries().upsert_elements(&elements);
        remote.commit("element", vec![query]).await?;
    }

    tracing::info!(
        missing = report.missing_terms,
        read_only = report.read_only_terms,
        invalid_links = report.invalid_links.len(),
        deleted = report.deleted_elements.len(),
        upserted = report.upserted,
        "graph reconciled"
    );
    Ok(report)
}

async fn back_missing_terms(
    ws: &mut Workspace,
    remote: &Remote,
    missing: &[Iri],
) -> Result<usize, SyncError> {
    if missing.is_empty() {
        return Ok(0);
    }
    let read_only = fetch_read_only_terms(remote, missing).await?;

    let tropes: IndexSet<Iri> = read_only
        .values()
        .flat_map(|term| term.targets_of(HAS_PROPERTY))
        .filter(|target| target.is_uri_shaped() && !ws.terms.contains_key(*target))
        .cloned()
        .collect();

    let mut inserted = read_only.len();
    ws.insert_cache_terms(read_only);

    let tropes: Vec<Iri> = tropes
        .into_iter()
        .filter(|target| !ws.terms.contains_key(target))
        .collect();
    if !tropes.is_empty() {
        let trope_terms = fetch_read_only_terms(remote, &tropes).await?;
        inserted += trope_terms.len();
        ws.insert_cache_terms(trope_terms);
    }
    tracing::debug!(requested = missing.len(), inserted, "read-only terms inserted");
    Ok(inserted)
}

fn deactivate_invalid_links(ws: &mut Workspace) -> Vec<LinkId> {
    let invalid: Vec<(LinkId, Iri)> = ws
        .active_links()
        .filter(|link| !ws.terms.contains_key(&link.iri) && !is_static_relation(link.iri.as_str()))
        .map(|link| (link.id.clone(), link.iri.clone()))
        .collect();

    for (id, iri) in &invalid {
        tracing::warn!(
            link = %id,
            iri = %iri,
            "link type not found in vocabulary contexts nor cache contexts"
        );
        ws.deactivate_link(id);
        if ws.elements.contains_key(iri) {
            tracing::warn!(concept = %iri, "relationship type is an element without a term");
            ws.delete_concept(iri);
        }
    }
    invalid.into_iter().map(|(id, _)| id).collect()
}

fn delete_unbacked_elements(ws: &mut Workspace) -> Vec<Iri> {
    let unbacked = missing_terms(ws);
    for id in &unbacked {
        tracing::warn!(term = %id, "term not found in vocabulary contexts nor cache contexts");
        ws.delete_concept(id);
    }
    unbacked
}

fn deactivate_dangling_links(ws: &mut Workspace) -> Vec<LinkId> {
    let dangling: Vec<LinkId> = ws
        .active_links()
        .filter(|link| !ws.terms.contains_key(&link.source) || !ws.terms.contains_key(&link.target))
        .map(|link| link.id.clone())
        .collect();
    for id in &dangling {
        tracing::warn!(link = %id, "link endpoint has no term");
        ws.deactivate_link(id);
    }
    dangling
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_gateway::{kinds, SparqlQueryBuilder};
    use graphsync_model::relations::{HAS_PROPERTY, SPECIALIZATION};
    use graphsync_model::{Link, Term};
    use graphsync_test_utils::{read_only_row, workspace, ScriptedGateway, APP_CONTEXT, ENDPOINT};
    use std::sync::Arc;

    fn remote(gateway: &Arc<ScriptedGateway>) -> Remote {
        Remote::new(
            gateway.clone(),
            Arc::new(SparqlQueryBuilder::new(APP_CONTEXT.into())),
            ENDPOINT,
        )
    }

    fn seeded() -> Workspace {
        let mut ws = workspace();
        for iri in ["http://a", "http://b"] {
            ws.terms.insert(iri.into(), Term::new(iri));
            ws.elements.insert(iri.into(), Element::new(iri));
        }
        ws.elements.insert("http://orphan".into(), Element::new("http://orphan"));
        ws.links.insert(
            "l1".into(),
            Link::new("l1", "http://a", SPECIALIZATION, "http://b"),
        );
        ws.links.insert(
            "l2".into(),
            Link::new("l2", "http://a", "http://unknown-type", "http://b"),
        );
        ws.links.insert(
            "l3".into(),
            Link::new("l3", "http://orphan", SPECIALIZATION, "http://b"),
        );
        ws
    }

    #[tokio::test]
    async fn repairs_and_upserts() {
        let gateway = Arc::new(ScriptedGateway::new());
        let mut ws = seeded();

        let report = reconcile(&mut ws, &remote(&gateway)).await.unwrap();

        assert_eq!(report.missing_terms, 1);
        assert_eq!(report.invalid_links, vec![LinkId::from("l2")]);
        assert_eq!(report.deleted_elements, vec![Iri::from("http://orphan")]);
        assert!(!ws.links["l2"].active);
        assert!(!ws.links.contains_key("l3"));
        assert!(ws.links["l1"].active);
        assert_eq!(ws.elements["http://a"].source_links.len(), 1);
        assert_eq!(gateway.committed_kinds(), vec![kinds::UPSERT_ELEMENTS]);
    }

    #[tokio::test]
    async fn second_pass_is_noop() {
        let gateway = Arc::new(ScriptedGateway::new());
        let mut ws = seeded();
        reconcile(&mut ws, &remote(&gateway)).await.unwrap();
        let elements = ws.elements.clone();
        let links = ws.links.clone();

        let report = reconcile(&mut ws, &remote(&gateway)).await.unwrap();
        assert!(!report.repaired());
        assert_eq!(ws.elements, elements);
        assert_eq!(ws.links, links);
    }

    #[tokio::test]
    async fn read_only_terms_back_elements_and_tropes() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .respond_matching(
                    kinds::READ_ONLY_TERMS,
                    "<http://orphan>",
                    vec![read_only_row(
                        "http://orphan",
                        "http://ext",
                        Some((HAS_PROPERTY, "http://trope")),
                    )],
                )
                .respond_matching(
                    kinds::READ_ONLY_TERMS,
                    "<http://trope>",
                    vec![read_only_row("http://trope", "http://ext", None)],
                ),
        );
        let mut ws = seeded();

        let report = reconcile(&mut ws, &remote(&gateway)).await.unwrap();

        assert_eq!(report.read_only_terms, 2);
        assert!(report.deleted_elements.is_empty());
        assert!(ws.terms.contains_key("http://trope"));
        assert!(ws.vocabularies["http://ext"].read_only);
        assert!(ws.is_term_read_only("http://orphan"));
        assert!(ws.links["l3"].active);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_graph_untouched() {
        let gateway = Arc::new(ScriptedGateway::new().fail(kinds::READ_ONLY_TERMS));
        let mut ws = seeded();

        assert!(reconcile(&mut ws, &remote(&gateway)).await.is_err());
        assert!(ws.elements.contains_key("http://orphan"));
        assert!(ws.links["l2"].active);
        assert!(gateway.transactions().is_empty());
    }
}
