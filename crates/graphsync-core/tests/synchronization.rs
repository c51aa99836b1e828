//! End-to-end synchronisation against a scripted store

use graphsync_core::prelude::*;
use graphsync_core::SyncStep;
use graphsync_gateway::{kinds, Binding};
use graphsync_model::relations::{HAS_PROPERTY, SPECIALIZATION};
use graphsync_model::{DiagramId, Iri, ViewMode};
use graphsync_test_utils::{
    cache_row, diagram_row, element_row, link_row, read_only_row, restriction_row, term_row,
    vocabulary_row, ScriptedGateway, APP_CONTEXT, ENDPOINT,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const CONTEXT: &str = "http://example.org/context/1";
const V1: &str = "http://example.org/vocabulary/1";
const V2: &str = "http://example.org/vocabulary/2";
const GLOSSARY: &str = "http://example.org/vocabulary/1/glosář";
const A: &str = "http://example.org/vocabulary/1/pojem/a";
const B: &str = "http://example.org/vocabulary/1/pojem/b";
const GONE: &str = "http://example.org/vocabulary/1/pojem/gone";
const EXTERNAL: &str = "http://example.org/external/c";

fn store() -> ScriptedGateway {
    store_with_restrictions(vec![restriction_row(A, SPECIALIZATION, B)])
}

fn store_with_restrictions(restrictions: Vec<Binding>) -> ScriptedGateway {
    ScriptedGateway::new()
        .respond(
            kinds::DIAGRAMS,
            vec![
                diagram_row("http://example.org/diagram/1", "d1", "Current"),
                diagram_row("http://example.org/diagram/2", "d2", "Stale"),
            ],
        )
        .respond(
            kinds::CACHE_VOCABULARIES,
            vec![
                cache_row(V1, "http://example.org/diagram/1"),
                cache_row(V2, "http://example.org/diagram/2"),
            ],
        )
        .respond(
            kinds::VOCABULARY_CONTEXTS,
            vec![vocabulary_row(CONTEXT, GLOSSARY, V1, "Vocabulary one")],
        )
        .respond(kinds::TERMS, vec![term_row(A, "A"), term_row(B, "B")])
        .respond(kinds::RESTRICTIONS, restrictions)
        .respond(
            kinds::ELEMENTS_CONFIG,
            vec![
                element_row(A, Some(V1), Some(("d1", false))),
                element_row(B, Some(V1), Some(("d1", false))),
                element_row(GONE, Some(V1), Some(("d1", false))),
            ],
        )
        .respond(
            kinds::LINKS_CONFIG,
            vec![
                link_row("spec", A, SPECIALIZATION, B, true),
                link_row("prop", A, HAS_PROPERTY, B, true),
                link_row("gone", GONE, SPECIALIZATION, B, true),
            ],
        )
}

fn config() -> SyncConfig {
    SyncConfig::new(ENDPOINT, APP_CONTEXT)
        .with_cache_context("http://example.org/cache")
        .with_interface_language("en")
}

fn engine(gateway: &Arc<ScriptedGateway>) -> SyncEngine {
    SyncEngine::new(config(), gateway.clone()).unwrap()
}

#[tokio::test]
async fn full_synchronization() {
    let gateway = Arc::new(store());
    let engine = engine(&gateway);
    let mut ws = engine.workspace();
    ws.settings.view_mode = ViewMode::Manager;

    let report = engine
        .synchronize(&mut ws, &["not-a-uri", CONTEXT], &FixedAnswer(true))
        .await
        .unwrap();

    assert!(report.is_success(), "{:?}", report.failed);
    assert_eq!(report.completed.len(), 5);
    assert_eq!(ws.settings.context_iris, vec![Iri::from(CONTEXT)]);

    let vocabulary = &ws.vocabularies[V1];
    assert!(!vocabulary.read_only);
    assert_eq!(vocabulary.graph, Some(Iri::from(CONTEXT)));
    assert_eq!(ws.settings.name["en"], "Vocabulary one");

    assert!(!ws.elements.contains_key(GONE));
    assert!(!ws.links.contains_key("gone"));
    assert!(ws.links["spec"].active);
    assert!(!ws.links["prop"].active);

    assert!(ws.diagrams["d2"].to_be_deleted);
    assert!(!ws.diagrams["d1"].to_be_deleted);
    assert_eq!(ws.settings.selected_diagram, None);
    assert_eq!(ws.settings.view_mode, ViewMode::Canvas);

    assert_eq!(
        gateway.committed_kinds(),
        vec![
            kinds::UPSERT_ELEMENTS.to_string(),
            kinds::INSERT_LINKS.to_string(),
            kinds::DELETE_DIAGRAM.to_string(),
        ]
    );
}

#[tokio::test]
async fn vocabulary_load_is_idempotent() {
    let gateway = Arc::new(store());
    let engine = engine(&gateway);
    let mut ws = engine.workspace();
    assert!(engine.retrieve_info(&mut ws, &[CONTEXT]).unwrap());

    assert!(engine.retrieve_vocabulary_data(&mut ws).await);
    let vocabularies = ws.vocabularies.clone();
    let terms = ws.terms.clone();

    assert!(engine.retrieve_vocabulary_data(&mut ws).await);
    assert_eq!(ws.vocabularies, vocabularies);
    assert_eq!(ws.terms, terms);
    assert_eq!(ws.terms[A].restrictions.len(), 1);
}

#[tokio::test]
async fn restriction_targets_are_cached() {
    let gateway = Arc::new(
        store_with_restrictions(vec![
            restriction_row(A, SPECIALIZATION, B),
            restriction_row(A, HAS_PROPERTY, EXTERNAL),
        ])
        .respond_matching(
            kinds::READ_ONLY_TERMS,
            "<http://example.org/external/c>",
            vec![read_only_row(EXTERNAL, "http://example.org/external", None)],
        ),
    );
    let engine = engine(&gateway);
    let mut ws = engine.workspace();
    assert!(engine.retrieve_info(&mut ws, &[CONTEXT]).unwrap());

    assert!(engine.retrieve_vocabulary_data(&mut ws).await);

    for term in ws.terms.values() {
        let writable = term
            .vocabulary
            .as_ref()
            .is_some_and(|v| !ws.is_vocabulary_read_only(v.as_str()));
        if !writable {
            continue;
        }
        for restriction in &term.restrictions {
            assert!(
                ws.terms.contains_key(&restriction.target),
                "dangling target {}",
                restriction.target
            );
        }
    }
    assert!(ws.terms.contains_key(EXTERNAL));
    assert!(ws.is_vocabulary_read_only("http://example.org/external"));
}

#[tokio::test]
async fn reconciliation_twice_is_noop() {
    let gateway = Arc::new(store());
    let engine = engine(&gateway);
    let mut ws = engine.workspace();
    assert!(engine.retrieve_info(&mut ws, &[CONTEXT]).unwrap());
    assert!(engine.update_contexts(&mut ws).await);
    assert!(engine.retrieve_vocabulary_data(&mut ws).await);
    assert!(engine.retrieve_context_data(&mut ws).await);

    for link in ws.active_links() {
        assert!(ws.terms.contains_key(&link.source));
        assert!(ws.terms.contains_key(&link.target));
    }

    let remote = graphsync_core::Remote::new(
        gateway.clone(),
        Arc::new(graphsync_gateway::SparqlQueryBuilder::new(APP_CONTEXT.into())),
        ENDPOINT,
    );
    let elements = ws.elements.clone();
    let report = graphsync_core::reconcile(&mut ws, &remote).await.unwrap();
    assert!(!report.repaired());
    assert_eq!(ws.elements, elements);
    assert!(graphsync_core::plan_connections(&ws).is_empty());
}

#[tokio::test]
async fn failed_upsert_reports_false() {
    let gateway = Arc::new(store().reject_transactions_with(kinds::UPSERT_ELEMENTS));
    let engine = engine(&gateway);
    let mut ws = engine.workspace();
    assert!(engine.retrieve_info(&mut ws, &[CONTEXT]).unwrap());
    assert!(engine.retrieve_vocabulary_data(&mut ws).await);

    assert!(!engine.retrieve_context_data(&mut ws).await);
    assert!(!gateway.committed_kinds().contains(&kinds::INSERT_LINKS.to_string()));
}

#[tokio::test]
async fn obsolete_diagram_scenario() {
    let gateway = Arc::new(store());
    let engine = engine(&gateway);
    let mut ws = engine.workspace();
    assert!(engine.retrieve_info(&mut ws, &[CONTEXT]).unwrap());
    assert!(engine.update_contexts(&mut ws).await);
    assert!(engine.retrieve_vocabulary_data(&mut ws).await);
    ws.settings.selected_diagram = Some(DiagramId::from("d1"));

    assert_eq!(
        graphsync_core::find_obsolete_diagrams(&ws),
        vec![DiagramId::from("d2")]
    );

    let declined = engine
        .try_check_for_obsolete_diagrams(&mut ws, &FixedAnswer(false))
        .await
        .unwrap();
    assert!(matches!(declined, ObsoleteOutcome::Declined { .. }));
    assert!(!ws.diagrams["d2"].to_be_deleted);
    assert_eq!(ws.settings.selected_diagram, Some(DiagramId::from("d1")));

    assert!(engine.check_for_obsolete_diagrams(&mut ws, &FixedAnswer(true)).await);
    assert!(ws.diagrams["d2"].to_be_deleted);
    assert_eq!(ws.settings.selected_diagram, None);
}

#[tokio::test]
async fn invalid_selection_stops_before_remote_calls() {
    let gateway = Arc::new(store());
    let engine = engine(&gateway);
    let mut ws = engine.workspace();

    let report = engine
        .synchronize(&mut ws, &["not-a-uri"], &FixedAnswer(true))
        .await
        .unwrap();

    assert!(report.completed.is_empty());
    assert_eq!(report.failed.map(|(step, _)| step), Some(SyncStep::ResolveContexts));
    assert!(ws.settings.context_iris.is_empty());
    assert!(gateway.reads().is_empty());
}

#[tokio::test]
async fn unsupported_language_is_fatal() {
    let gateway = Arc::new(store());
    let engine = engine(&gateway);
    let mut ws = engine.workspace();
    ws.settings.interface_language = "xx".to_string();

    let err = engine
        .synchronize(&mut ws, &[CONTEXT], &FixedAnswer(true))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
}
