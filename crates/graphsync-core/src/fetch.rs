//! Typed fetches
//!
//! Each function runs one read query and folds its rows into model values.
//! Rows arrive one per (entity, optional attribute) combination, so folding
//! groups them by entity identifier.

use crate::error::SyncError;
use crate::remote::Remote;
use graphsync_gateway::records::{
    CacheVocabularyRecord, DiagramRecord, ElementRecord, LinkRecord, ReadOnlyTermRecord,
    RestrictionRecord, TermRecord, UserRecord, VocabularyMetadataRecord,
};
use graphsync_gateway::VocabularyScope;
use graphsync_model::{
    Diagram, Element, Iri, LangMap, Link, LinkId, Restriction, Term, User, VocabularyCacheIndex,
};
use indexmap::IndexMap;

/// Diagrams of the application context
pub async fn fetch_diagrams(remote: &Remote) -> Result<Vec<Diagram>, SyncError> {
    let rows: Vec<DiagramRecord> = remote.select(&remote.queries().diagrams()).await?;
    Ok(fold_diagrams(rows))
}

pub(crate) fn fold_diagrams(rows: Vec<DiagramRecord>) -> Vec<Diagram> {
    let mut diagrams: IndexMap<String, Diagram> = IndexMap::new();
    for row in rows {
        let diagram = diagrams
            .entry(row.id.as_str().to_string())
            .or_insert_with(|| Diagram::new(row.id.clone(), row.iri.clone(), row.name.clone()));
        if let Some(collaborator) = row.collaborator {
            if !diagram.collaborators.contains(&collaborator) {
                diagram.collaborators.push(collaborator);
            }
        }
    }
    diagrams.into_values().collect()
}

/// Users listed as collaborators; no query when `ids` is empty
pub async fn fetch_users(remote: &Remote, ids: &[String]) -> Result<Vec<User>, SyncError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<UserRecord> = remote.select(&remote.queries().users(ids)).await?;
    Ok(fold_users(rows))
}

pub(crate) fn fold_users(rows: Vec<UserRecord>) -> Vec<User> {
    let mut users: IndexMap<String, User> = IndexMap::new();
    for row in rows {
        let user = users
            .entry(row.id.clone())
            .or_insert_with(|| User::new(row.id.clone()));
        if let Some(given_name) = row.given_name {
            user.given_name = given_name;
        }
        if let Some(family_name) = row.family_name {
            user.family_name = family_name;
        }
    }
    users.into_values().collect()
}

/// Element configuration keyed by term
pub async fn fetch_elements_config(remote: &Remote) -> Result<IndexMap<Iri, Element>, SyncError> {
    let rows: Vec<ElementRecord> = remote.select(&remote.queries().elements_config()).await?;
    Ok(fold_elements(rows))
}

pub(crate) fn fold_elements(rows: Vec<ElementRecord>) -> IndexMap<Iri, Element> {
    let mut elements: IndexMap<Iri, Element> = IndexMap::new();
    for row in rows {
        let element = elements
            .entry(row.term.clone())
            .or_insert_with(|| Element::new(row.term.clone()));
        if element.vocabulary.is_none() {
            element.vocabulary = row.vocabulary;
        }
        if let (Some(diagram), Some(hidden)) = (row.diagram, row.hidden) {
            element.hidden.insert(diagram, hidden);
        }
    }
    elements
}

/// Link configuration keyed by id
pub async fn fetch_links_config(remote: &Remote) -> Result<IndexMap<LinkId, Link>, SyncError> {
    let rows: Vec<LinkRecord> = remote.select(&remote.queries().links_config()).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let link = Link {
                id: row.id,
                source: row.source,
                target: row.target,
                iri: row.iri,
                active: row.active,
            };
            (link.id.clone(), link)
        })
        .collect())
}

/// Terms of one vocabulary, with labels
pub async fn fetch_terms(
    remote: &Remote,
    scope: &VocabularyScope,
) -> Result<IndexMap<Iri, Term>, SyncError> {
    let rows: Vec<TermRecord> = remote.select(&remote.queries().terms(scope)).await?;
    let mut terms: IndexMap<Iri, Term> = IndexMap::new();
    for row in rows {
        let term = terms
            .entry(row.term.clone())
            .or_insert_with(|| Term::new(row.term.clone()).in_vocabulary(scope.vocabulary.clone()));
        if let Some(label) = row.label {
            term.labels.insert(label.lang, label.text);
        }
    }
    Ok(terms)
}

/// Restrictions of one vocabulary, as restriction-only term records
pub async fn fetch_restrictions(
    remote: &Remote,
    scope: &VocabularyScope,
) -> Result<IndexMap<Iri, Term>, SyncError> {
    let rows: Vec<RestrictionRecord> = remote.select(&remote.queries().restrictions(scope)).await?;
    let mut terms: IndexMap<Iri, Term> = IndexMap::new();
    for row in rows {
        terms
            .entry(row.term.clone())
            .or_insert_with(|| Term::new(row.term.clone()))
            .restrictions
            .insert(Restriction {
                on_property: row.on_property,
                target: row.target,
            });
    }
    Ok(terms)
}

/// Terms by IRI regardless of vocabulary
///
/// An empty request issues no query.
pub async fn fetch_read_only_terms(
    remote: &Remote,
    iris: &[Iri],
) -> Result<IndexMap<Iri, Term>, SyncError> {
    if iris.is_empty() {
        return Ok(IndexMap::new());
    }
    let rows: Vec<ReadOnlyTermRecord> =
        remote.select(&remote.queries().read_only_terms(iris)).await?;
    Ok(fold_read_only_terms(rows))
}

pub(crate) fn fold_read_only_terms(rows: Vec<ReadOnlyTermRecord>) -> IndexMap<Iri, Term> {
    let mut terms: IndexMap<Iri, Term> = IndexMap::new();
    for row in rows {
        let term = terms
            .entry(row.term.clone())
            .or_insert_with(|| Term::new(row.term.clone()));
        if term.vocabulary.is_none() {
            term.vocabulary = row.vocabulary;
        }
        if let Some(label) = row.label {
            term.labels.insert(label.lang, label.text);
        }
        if let (Some(on_property), Some(target)) = (row.on_property, row.target) {
            term.restrictions.insert(Restriction { on_property, target });
        }
    }
    terms
}

/// Vocabulary cache index of `cache_context`
pub async fn fetch_cache_index(
    remote: &Remote,
    cache_context: &Iri,
) -> Result<VocabularyCacheIndex, SyncError> {
    let rows: Vec<CacheVocabularyRecord> = remote
        .select(&remote.queries().cache_vocabularies(cache_context))
        .await?;
    let mut index = VocabularyCacheIndex::new();
    for row in rows {
        let entry = index.entry(row.vocabulary.clone());
        if let Some(label) = row.label {
            entry.labels.insert(label.lang, label.text);
        }
        if let Some(diagram) = row.diagram {
            index.add_diagram(row.vocabulary, diagram);
        }
    }
    Ok(index)
}

/// Namespace and descriptions per glossary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyMetadata {
    /// Preferred namespace
    pub namespace: Option<String>,
    /// Descriptions per language
    pub descriptions: LangMap,
}

/// Vocabulary metadata keyed by glossary
pub async fn fetch_vocabulary_metadata(
    remote: &Remote,
    glossaries: &[Iri],
) -> Result<IndexMap<Iri, VocabularyMetadata>, SyncError> {
    let rows: Vec<VocabularyMetadataRecord> = remote
        .select(&remote.queries().vocabulary_metadata(glossaries))
        .await?;
    let mut metadata: IndexMap<Iri, VocabularyMetadata> = IndexMap::new();
    for row in rows {
        let entry = metadata.entry(row.glossary).or_default();
        if entry.namespace.is_none() {
            entry.namespace = row.namespace;
        }
        if let Some(description) = row.description {
            entry.descriptions.insert(description.lang, description.text);
        }
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_gateway::records::LangText;
    use graphsync_model::DiagramId;

    #[test]
    fn user_rows_fold_by_id() {
        let row = |id: &str, given: Option<&str>, family: Option<&str>| UserRecord {
            id: id.to_string(),
            given_name: given.map(str::to_string),
            family_name: family.map(str::to_string),
        };
        let users = fold_users(vec![
            row("alice", Some("Alice"), None),
            row("bob", None, None),
            row("alice", None, Some("Smith")),
        ]);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].display_name(), "Alice Smith");
        assert_eq!(users[1].display_name(), "bob");
    }

    #[test]
    fn diagrams_collect_collaborators() {
        let row = |collaborator: &str| DiagramRecord {
            iri: "http://d1".into(),
            id: "d1".into(),
            name: "One".to_string(),
            collaborator: Some(collaborator.to_string()),
        };
        let diagrams = fold_diagrams(vec![row("alice"), row("bob"), row("alice")]);
        assert_eq!(diagrams.len(), 1);
        assert_eq!(diagrams[0].collaborators, vec!["alice", "bob"]);
    }

    #[test]
    fn elements_group_hidden_states() {
        let row = |diagram: &str, hidden: bool| ElementRecord {
            term: "http://a".into(),
            vocabulary: Some("http://v".into()),
            diagram: Some(DiagramId::from(diagram)),
            hidden: Some(hidden),
        };
        let elements = fold_elements(vec![row("d1", false), row("d2", true)]);
        let element = &elements["http://a"];
        assert_eq!(element.hidden.len(), 2);
        assert_eq!(element.hidden.get("d1"), Some(&false));
        assert_eq!(element.vocabulary, Some(Iri::from("http://v")));
    }

    #[test]
    fn read_only_terms_group_restrictions() {
        let row = |label: Option<&str>, restriction: Option<(&str, &str)>| ReadOnlyTermRecord {
            term: "http://t".into(),
            vocabulary: Some("http://v".into()),
            label: label.map(|text| LangText {
                lang: "en".to_string(),
                text: text.to_string(),
            }),
            on_property: restriction.map(|(p, _)| Iri::from(p)),
            target: restriction.map(|(_, t)| Iri::from(t)),
        };
        let terms = fold_read_only_terms(vec![
            row(Some("Term"), Some(("http://p", "http://x"))),
            row(Some("Term"), Some(("http://p", "http://y"))),
            row(None, None),
        ]);
        let term = &terms["http://t"];
        assert_eq!(term.restrictions.len(), 2);
        assert_eq!(term.labels["en"], "Term");
        assert_eq!(term.vocabulary, Some(Iri::from("http://v")));
    }
}
