//! Vocabulary context loading
//!
//! Discovers which vocabularies live in the resolved contexts, registers them
//! in the workspace and names the workspace after them. Metadata and the
//! cache index are supplementary: their failures are logged and swallowed.

use crate::config::LanguageConfig;
use crate::error::SyncError;
use crate::fetch::{fetch_cache_index, fetch_vocabulary_metadata};
use crate::remote::Remote;
use graphsync_gateway::records::VocabularyContextRecord;
use graphsync_gateway::VocabularyScope;
use graphsync_model::{Iri, LangMap, Vocabulary, Workspace};
use indexmap::IndexMap;

/// A vocabulary found in a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredVocabulary {
    /// Vocabulary
    pub iri: Iri,
    /// Graph context holding it
    pub graph: Iri,
    /// Glossary
    pub glossary: Iri,
    /// Titles per language
    pub names: LangMap,
    /// Change-tracking context, when any binding carries one
    pub change_context: Option<Iri>,
}

impl DiscoveredVocabulary {
    /// Term query scope
    #[must_use]
    pub fn scope(&self) -> VocabularyScope {
        VocabularyScope {
            graph: self.graph.clone(),
            glossary: self.glossary.clone(),
            vocabulary: self.iri.clone(),
        }
    }
}

/// Group discovery rows by vocabulary
///
/// The first row of a vocabulary fixes its graph and glossary.
pub fn group_vocabularies(rows: Vec<VocabularyContextRecord>) -> Vec<DiscoveredVocabulary> {
    let mut grouped: IndexMap<Iri, DiscoveredVocabulary> = IndexMap::new();
    for row in rows {
        let entry = grouped
            .entry(row.vocabulary.clone())
            .or_insert_with(|| DiscoveredVocabulary {
                iri: row.vocabulary.clone(),
                graph: row.context.clone(),
                glossary: row.glossary.clone(),
                names: LangMap::new(),
                change_context: None,
            });
        if row.change_context.is_some() {
            entry.change_context = row.change_context;
        }
        entry.names.insert(row.label.lang, row.label.text);
    }
    grouped.into_values().collect()
}

/// Load the vocabulary cache index; failures are swallowed
///
/// Returns the number of indexed vocabularies.
pub async fn load_cache_index(ws: &mut Workspace, remote: &Remote) -> usize {
    let Some(cache_context) = ws.settings.cache_context.clone() else {
        tracing::debug!("no cache context configured");
        return 0;
    };
    match fetch_cache_index(remote, &cache_context).await {
        Ok(index) => {
            ws.cache_index = index;
            tracing::debug!(vocabularies = ws.cache_index.len(), "cache index loaded");
            ws.cache_index.len()
        }
        Err(e) => {
            tracing::warn!(error = %e, "cache index unavailable");
            0
        }
    }
}

/// Discover vocabularies in the workspace contexts and register them
///
/// Registered vocabularies stay read-only until their terms are loaded.
///
/// # Errors
/// - [`SyncError::NoVocabulariesFound`] when discovery returns no rows
/// - remote failures of the discovery query
pub async fn discover_vocabularies(
    ws: &mut Workspace,
    remote: &Remote,
    languages: &IndexMap<String, LanguageConfig>,
) -> Result<Vec<DiscoveredVocabulary>, SyncError> {
    let contexts = ws.settings.context_iris.clone();
    let rows: Vec<VocabularyContextRecord> = remote
        .select(&remote.queries().vocabulary_contexts(&contexts))
        .await?;
    if rows.is_empty() {
        return Err(SyncError::NoVocabulariesFound {
            contexts: contexts.len(),
        });
    }

    let discovered = group_vocabularies(rows);
    for vocabulary in &discovered {
        register(ws, vocabulary);
    }
    tracing::info!(vocabularies = discovered.len(), "vocabularies discovered");

    let glossaries: Vec<Iri> = discovered.iter().map(|v| v.glossary.clone()).collect();
    match fetch_vocabulary_metadata(remote, &glossaries).await {
        Ok(metadata) => {
            for vocabulary in ws.vocabularies.values_mut() {
                let Some(entry) = vocabulary
                    .glossary
                    .as_ref()
                    .and_then(|glossary| metadata.get(glossary))
                else {
                    continue;
                };
                if entry.namespace.is_some() {
                    vocabulary.namespace.clone_from(&entry.namespace);
                }
                vocabulary
                    .descriptions
                    .extend(entry.descriptions.iter().map(|(l, d)| (l.clone(), d.clone())));
            }
        }
        Err(e) => tracing::warn!(error = %e, "vocabulary metadata unavailable"),
    }

    apply_workspace_name(ws, &discovered, languages);
    Ok(discovered)
}

fn register(ws: &mut Workspace, discovered: &DiscoveredVocabulary) {
    let vocabulary = ws
        .vocabularies
        .entry(discovered.iri.clone())
        .or_insert_with(|| Vocabulary::read_only(discovered.iri.clone()));
    vocabulary.graph = Some(discovered.graph.clone());
    vocabulary.glossary = Some(discovered.glossary.clone());
    vocabulary
        .names
        .extend(discovered.names.iter().map(|(l, n)| (l.clone(), n.clone())));
}

/// Name the workspace after its vocabularies
///
/// One vocabulary lends its titles; several produce "<count> <plural>" per
/// supported language.
pub fn apply_workspace_name(
    ws: &mut Workspace,
    discovered: &[DiscoveredVocabulary],
    languages: &IndexMap<String, LanguageConfig>,
) {
    match discovered {
        [] => {}
        [only] => ws.settings.name = only.names.clone(),
        many => {
            let count = many.len();
            ws.settings.name = languages
                .iter()
                .map(|(lang, config)| (lang.clone(), format!("{count} {}", config.plural_for(count))))
                .collect();
        }
    }
}
