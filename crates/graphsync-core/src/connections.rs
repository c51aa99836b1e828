//! Connection validation
//!
//! Compares cached links with the relationship statements implied by the
//! term cache:
//! - a static-type link `(s, p, t)` is backed when the term of `s` carries
//!   the restriction `p → t`
//! - a link typed by a relationship term `R` is backed when `R` carries
//!   `related-element-1 → s` and `related-element-2 → t`
//!
//! [`plan_connections`] is pure. [`apply_plan`] mutates the workspace and
//! [`persist_plan`] writes the changed links in parallel batches.

use crate::error::SyncError;
use crate::remote::Remote;
use graphsync_model::relations::{
    is_static_relation, HAS_PROPERTY, IS_PROPERTY_OF, RELATED_ELEMENT_1, RELATED_ELEMENT_2,
};
use graphsync_model::{Iri, Link, LinkId, Workspace};
use indexmap::{IndexMap, IndexSet};

/// Link endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Source element
    Source,
    /// Target element
    Target,
}

impl Endpoint {
    fn of(self, link: &Link) -> &Iri {
        match self {
            Self::Source => &link.source,
            Self::Target => &link.target,
        }
    }
}

/// A link type never deactivated when one endpoint is externally owned
#[derive(Debug, Clone, Copy)]
pub struct DeactivationExemption {
    /// Link type
    pub relation: &'static str,
    /// Endpoint whose read-only vocabulary protects the link
    pub owner: Endpoint,
}

/// Links owned by read-only vocabularies are not pruned locally
pub const DEACTIVATION_EXEMPTIONS: &[DeactivationExemption] = &[
    DeactivationExemption {
        relation: HAS_PROPERTY,
        owner: Endpoint::Source,
    },
    DeactivationExemption {
        relation: IS_PROPERTY_OF,
        owner: Endpoint::Target,
    },
];

/// How a cascade finds the sibling of a deactivated link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingLookup {
    /// First active, unbacked link whose type equals the deactivated link's
    /// source
    TypeEqualsSource,
}

/// Deactivating a link of a trigger type also deactivates its sibling
#[derive(Debug, Clone, Copy)]
pub struct CascadeRule {
    /// Rule name used in logs
    pub name: &'static str,
    /// Link types that trigger the rule
    pub triggers: &'static [&'static str],
    /// Sibling lookup
    pub sibling: SiblingLookup,
}

/// Reified n-ary relations: the relation node's endpoint bindings and the
/// relation-typed link go together.
///
/// The sibling lookup takes the first unbacked match; it is ambiguous when
/// several unbacked links share the relation node as their type.
pub const CASCADE_RULES: &[CascadeRule] = &[CascadeRule {
    name: "relation-binding",
    triggers: &[RELATED_ELEMENT_1, RELATED_ELEMENT_2],
    sibling: SiblingLookup::TypeEqualsSource,
}];

/// Links to write and links to deactivate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionPlan {
    /// New links and reactivated inactive links, all active
    pub add: Vec<Link>,
    /// Active links to deactivate, cascades included
    pub del: IndexSet<LinkId>,
}

impl ConnectionPlan {
    /// Whether nothing needs to change
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.del.is_empty()
    }
}

type Statement = (Iri, Iri, Iri);

/// Statements between workspace elements implied by the term cache
#[must_use]
pub fn expected_statements(ws: &Workspace) -> IndexSet<Statement> {
    let mut statements = IndexSet::new();
    for source in ws.elements.keys() {
        let Some(term) = ws.terms.get(source) else {
            continue;
        };
        for restriction in &term.restrictions {
            if is_static_relation(restriction.on_property.as_str())
                && ws.elements.contains_key(&restriction.target)
            {
                statements.insert((
                    source.clone(),
                    restriction.on_property.clone(),
                    restriction.target.clone(),
                ));
            }
        }
    }
    for relation in ws.terms.values() {
        for first in relation.targets_of(RELATED_ELEMENT_1) {
            for second in relation.targets_of(RELATED_ELEMENT_2) {
                if ws.elements.contains_key(first) && ws.elements.contains_key(second) {
                    statements.insert((first.clone(), relation.iri.clone(), second.clone()));
                }
            }
        }
    }
    statements
}

/// Whether a link's statement is present in the term cache
#[must_use]
pub fn is_backed(ws: &Workspace, link: &Link) -> bool {
    if is_static_relation(link.iri.as_str()) {
        return ws
            .terms
            .get(&link.source)
            .is_some_and(|term| term.has_restriction(link.iri.as_str(), link.target.as_str()));
    }
    ws.terms.get(&link.iri).is_some_and(|relation| {
        relation.has_restriction(RELATED_ELEMENT_1, link.source.as_str())
            && relation.has_restriction(RELATED_ELEMENT_2, link.target.as_str())
    })
}

fn exemption(ws: &Workspace, link: &Link) -> Option<&'static DeactivationExemption> {
    DEACTIVATION_EXEMPTIONS.iter().find(|rule| {
        link.iri.as_str() == rule.relation
            && ws
                .elements
                .get(rule.owner.of(link))
                .and_then(|element| element.vocabulary.as_ref())
                .is_some_and(|vocabulary| ws.is_vocabulary_read_only(vocabulary.as_str()))
    })
}

/// A sibling whose own statement is present, or whose owner is read-only,
/// is never a cascade target.
fn sibling(ws: &Workspace, link: &Link, rule: &CascadeRule) -> Option<LinkId> {
    match rule.sibling {
        SiblingLookup::TypeEqualsSource => ws
            .active_links()
            .find(|candidate| {
                candidate.iri == link.source
                    && !is_backed(ws, candidate)
                    && exemption(ws, candidate).is_none()
            })
            .map(|candidate| candidate.id.clone()),
    }
}

fn describe(link: &Link) -> String {
    format!("{} -- {} -> {}", link.source, link.iri, link.target)
}

/// Compute the add and delete sets
///
/// Only links between workspace elements are considered. Every deactivation
/// is logged with its edge. A statement reflected by any link active before
/// planning is never added again.
#[must_use]
pub fn plan_connections(ws: &Workspace) -> ConnectionPlan {
    let mut plan = ConnectionPlan::default();

    let candidates = ws.active_links().filter(|link| {
        ws.elements.contains_key(&link.source) && ws.elements.contains_key(&link.target)
    });
    for link in candidates {
        if plan.del.contains(&link.id) || is_backed(ws, link) {
            continue;
        }
        if let Some(rule) = exemption(ws, link) {
            tracing::debug!(
                link = %link.id,
                edge = %describe(link),
                relation = rule.relation,
                "statement missing, kept for read-only owner"
            );
            continue;
        }
        tracing::warn!(
            link = %link.id,
            edge = %describe(link),
            "link deactivated due to its statement counterpart missing"
        );
        plan.del.insert(link.id.clone());

        for rule in CASCADE_RULES {
            if !rule.triggers.iter().any(|t| *t == link.iri.as_str()) {
                continue;
            }
            if let Some(id) = sibling(ws, link, rule) {
                if plan.del.contains(&id) {
                    continue;
                }
                if let Some(related) = ws.links.get(&id) {
                    tracing::warn!(
                        link = %id,
                        edge = %describe(related),
                        rule = rule.name,
                        "related link deactivated due to its statement counterpart missing"
                    );
                }
                plan.del.insert(id);
            }
        }
    }

    let mut inactive: IndexMap<Statement, &Link> = IndexMap::new();
    let mut active: IndexSet<Statement> = IndexSet::new();
    for link in ws.links.values() {
        let statement = (link.source.clone(), link.iri.clone(), link.target.clone());
        if link.active {
            active.insert(statement);
        } else {
            inactive.entry(statement).or_insert(link);
        }
    }
    for statement in expected_statements(ws) {
        if active.contains(&statement) {
            continue;
        }
        let (source, iri, target) = statement.clone();
        let link = match inactive.get(&statement) {
            Some(existing) => Link {
                active: true,
                ..(*existing).clone()
            },
            None => Link::new(LinkId::generate(), source, iri, target),
        };
        plan.add.push(link);
    }
    plan
}

/// Deactivate `del` and store `add` in the workspace
///
/// Returns the ids of every changed link.
pub fn apply_plan(ws: &mut Workspace, plan: &ConnectionPlan) -> Vec<LinkId> {
    let mut changed = Vec::with_capacity(plan.add.len() + plan.del.len());
    for id in &plan.del {
        if ws.deactivate_link(id) {
            changed.push(id.clone());
        }
    }
    for link in &plan.add {
        changed.push(link.id.clone());
        ws.add_link(link.clone());
    }
    changed
}

/// Write the changed links, `batch_size` per transaction, in parallel
///
/// # Errors
/// [`SyncError::TransactionRejected`] when any batch fails.
pub async fn persist_plan(
    ws: &Workspace,
    remote: &Remote,
    changed: &[LinkId],
    batch_size: usize,
) -> Result<(), SyncError> {
    let links: Vec<&Link> = changed.iter().filter_map(|id| ws.links.get(id)).collect();
    let transactions: Vec<Vec<String>> = links
        .chunks(batch_size.max(1))
        .map(|batch| vec![remote.queries().insert_links(batch)])
        .collect();
    remote.commit_parallel("link", transactions).await
}

/// Outcome of connection validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionReport {
    /// Links added or reactivated
    pub added: usize,
    /// Links deactivated
    pub deactivated: usize,
}

/// Plan, apply and persist
///
/// # Errors
/// [`SyncError::TransactionRejected`] when persisting fails; the local
/// changes stay applied.
pub async fn validate_connections(
    ws: &mut Workspace,
    remote: &Remote,
    batch_size: usize,
) -> Result<ConnectionReport, SyncError> {
    let plan = plan_connections(ws);
    let changed = apply_plan(ws, &plan);
    persist_plan(ws, remote, &changed, batch_size).await?;
    tracing::info!(added = plan.add.len(), deactivated = plan.del.len(), "connections validated");
    Ok(ConnectionReport {
        added: plan.add.len(),
        deactivated: plan.del.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_gateway::{kinds, SparqlQueryBuilder};
    use graphsync_model::relations::SPECIALIZATION;
    use graphsync_model::{Element, Term, Vocabulary};
    use graphsync_test_utils::{workspace, ScriptedGateway, APP_CONTEXT, ENDPOINT};
    use std::sync::Arc;

    const A: &str = "http://example.org/a";
    const B: &str = "http://example.org/b";
    const C: &str = "http://example.org/c";
    const REL: &str = "http://example.org/relation";

    fn graph(terms: Vec<Term>) -> Workspace {
        let mut ws = workspace();
        ws.vocabularies.insert(
            "http://v".into(),
            Vocabulary::writable("http://v".into(), "http://g".into(), "http://s".into()),
        );
        ws.vocabularies
            .insert("http://ro".into(), Vocabulary::read_only("http://ro".into()));
        for term in terms {
            let iri = term.iri.clone();
            let vocabulary = term.vocabulary.clone().unwrap_or_else(|| "http://v".into());
            ws.elements
                .insert(iri.clone(), Element::new(iri.clone()).in_vocabulary(vocabulary));
            ws.terms.insert(iri, term);
        }
        ws
    }

    #[test]
    fn backed_links_are_kept() {
        let mut ws = graph(vec![Term::new(A).with_restriction(SPECIALIZATION, B), Term::new(B)]);
        ws.add_link(Link::new("l1", A, SPECIALIZATION, B));

        let plan = plan_connections(&ws);
        assert!(plan.is_empty());
    }

    #[test]
    fn missing_statement_is_added_then_idempotent() {
        let mut ws = graph(vec![Term::new(A).with_restriction(SPECIALIZATION, B), Term::new(B)]);

        let plan = plan_connections(&ws);
        assert_eq!(plan.add.len(), 1);
        assert!(plan.add[0].connects(A, SPECIALIZATION, B));
        assert!(plan.del.is_empty());

        apply_plan(&mut ws, &plan);
        assert!(plan_connections(&ws).is_empty());
    }

    #[test]
    fn inactive_link_is_reactivated() {
        let mut ws = graph(vec![Term::new(A).with_restriction(SPECIALIZATION, B), Term::new(B)]);
        ws.add_link(Link::new("old", A, SPECIALIZATION, B).inactive());

        let plan = plan_connections(&ws);
        assert_eq!(plan.add.len(), 1);
        assert_eq!(plan.add[0].id, LinkId::from("old"));
        assert!(plan.add[0].active);
    }

    #[test]
    fn unbacked_link_is_deactivated() {
        let mut ws = graph(vec![Term::new(A), Term::new(B)]);
        ws.add_link(Link::new("l1", A, SPECIALIZATION, B));

        let plan = plan_connections(&ws);
        assert_eq!(plan.del, IndexSet::from([LinkId::from("l1")]));
        assert!(plan.add.is_empty());

        apply_plan(&mut ws, &plan);
        assert!(!ws.links["l1"].active);
        assert!(plan_connections(&ws).is_empty());
    }

    #[test]
    fn read_only_owner_protects_property_links() {
        let mut ws = graph(vec![
            Term::new(A).in_vocabulary("http://ro"),
            Term::new(B),
        ]);
        ws.add_link(Link::new("has", A, HAS_PROPERTY, B));
        ws.add_link(Link::new("of", B, IS_PROPERTY_OF, A));
        ws.add_link(Link::new("wrong-way", B, HAS_PROPERTY, A));

        let plan = plan_connections(&ws);
        assert_eq!(plan.del, IndexSet::from([LinkId::from("wrong-way")]));
    }

    #[test]
    fn relation_binding_cascades_to_relation_link() {
        let mut ws = graph(vec![
            Term::new(A),
            Term::new(B),
            Term::new(REL).with_restriction(RELATED_ELEMENT_2, B),
        ]);
        ws.add_link(Link::new("bind-1", REL, RELATED_ELEMENT_1, A));
        ws.add_link(Link::new("bind-2", REL, RELATED_ELEMENT_2, B));
        ws.add_link(Link::new("relation", A, REL, B));

        let plan = plan_connections(&ws);
        assert!(plan.del.contains(&LinkId::from("bind-1")));
        assert!(plan.del.contains(&LinkId::from("relation")));
        assert!(!plan.del.contains(&LinkId::from("bind-2")));
    }

    #[test]
    fn cascade_keeps_backed_relation_link() {
        let mut ws = graph(vec![
            Term::new(A),
            Term::new(B),
            Term::new(C),
            Term::new(REL)
                .with_restriction(RELATED_ELEMENT_1, A)
                .with_restriction(RELATED_ELEMENT_2, B),
        ]);
        ws.add_link(Link::new("stale-bind", REL, RELATED_ELEMENT_1, C));
        ws.add_link(Link::new("bind-1", REL, RELATED_ELEMENT_1, A));
        ws.add_link(Link::new("bind-2", REL, RELATED_ELEMENT_2, B));
        ws.add_link(Link::new("relation", A, REL, B));

        let plan = plan_connections(&ws);
        assert_eq!(plan.del, IndexSet::from([LinkId::from("stale-bind")]));
        assert!(plan.add.is_empty(), "{:?}", plan.add);

        apply_plan(&mut ws, &plan);
        assert!(ws.links["relation"].active);
        assert_eq!(ws.links.len(), 4);
        assert!(plan_connections(&ws).is_empty());
    }

    #[test]
    fn cascade_skips_backed_sibling_for_unbacked_one() {
        let mut ws = graph(vec![
            Term::new(A),
            Term::new(B),
            Term::new(C),
            Term::new(REL)
                .with_restriction(RELATED_ELEMENT_1, A)
                .with_restriction(RELATED_ELEMENT_2, B),
        ]);
        ws.add_link(Link::new("stale-bind", REL, RELATED_ELEMENT_1, C));
        ws.add_link(Link::new("relation", A, REL, B));
        ws.add_link(Link::new("stale-relation", C, REL, B));

        let plan = plan_connections(&ws);
        assert_eq!(
            plan.del,
            IndexSet::from([LinkId::from("stale-bind"), LinkId::from("stale-relation")])
        );
        for link in &plan.add {
            for id in &plan.del {
                let deleted = &ws.links[id];
                assert!(!link.connects(
                    deleted.source.as_str(),
                    deleted.iri.as_str(),
                    deleted.target.as_str()
                ));
            }
        }
    }

    #[test]
    fn relationship_term_link_is_backed() {
        let mut ws = graph(vec![
            Term::new(A),
            Term::new(B),
            Term::new(REL)
                .with_restriction(RELATED_ELEMENT_1, A)
                .with_restriction(RELATED_ELEMENT_2, B),
        ]);
        ws.add_link(Link::new("bind-1", REL, RELATED_ELEMENT_1, A));
        ws.add_link(Link::new("bind-2", REL, RELATED_ELEMENT_2, B));
        ws.add_link(Link::new("relation", A, REL, B));

        assert!(plan_connections(&ws).is_empty());
    }

    #[tokio::test]
    async fn changed_links_are_written_in_batches() {
        let targets: Vec<String> = (0..5).map(|i| format!("http://example.org/t{i}")).collect();
        let mut source = Term::new(A);
        let mut terms = Vec::new();
        for target in &targets {
            source = source.with_restriction(SPECIALIZATION, target);
            terms.push(Term::new(target.as_str()));
        }
        terms.push(source);
        let mut ws = graph(terms);

        let gateway = Arc::new(ScriptedGateway::new());
        let remote = Remote::new(
            gateway.clone(),
            Arc::new(SparqlQueryBuilder::new(APP_CONTEXT.into())),
            ENDPOINT,
        );
        let report = validate_connections(&mut ws, &remote, 2).await.unwrap();

        assert_eq!(report.added, 5);
        assert_eq!(gateway.transactions().len(), 3);
        assert!(gateway
            .committed_kinds()
            .iter()
            .all(|kind| kind == kinds::INSERT_LINKS));
        assert_eq!(ws.active_links().count(), 5);
    }
}
