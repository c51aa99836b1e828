//! Synchronisation engine
//!
//! Orchestrates the loaders against one [`Workspace`]:
//! - resolve contexts from externally supplied tokens
//! - load the diagrams of the application context
//! - discover vocabularies and load their terms
//! - load element and link configuration, reconcile, validate connections
//! - detect obsolete diagrams
//!
//! Each step has a `bool` form that logs and swallows failures and a `try_`
//! form returning the error. Steps never run concurrently against the
//! workspace.

use crate::config::SyncConfig;
use crate::connections::{validate_connections, ConnectionReport};
use crate::context::resolve_contexts;
use crate::error::SyncError;
use crate::fetch::{fetch_diagrams, fetch_elements_config, fetch_links_config, fetch_users};
use crate::obsolete::{check_obsolete_diagrams, ConfirmationPrompt, ObsoleteOutcome};
use crate::reconcile::{reconcile, ReconcileReport};
use crate::remote::Remote;
use crate::terms::{load_terms, TermLoadReport};
use crate::vocabulary::{discover_vocabularies, load_cache_index};
use graphsync_gateway::{QueryBuilder, SparqlQueryBuilder, TransactionGateway};
use graphsync_model::{Iri, Workspace};
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;

/// Outcome of a vocabulary load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyLoadReport {
    /// Vocabularies in the cache index
    pub cached_vocabularies: usize,
    /// Vocabularies discovered in the workspace contexts
    pub vocabularies: Vec<Iri>,
    /// Term merge outcome
    pub terms: TermLoadReport,
}

/// Outcome of a context data load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextDataReport {
    /// Elements loaded
    pub elements: usize,
    /// Links loaded
    pub links: usize,
    /// Structural repairs
    pub reconcile: ReconcileReport,
    /// Connection changes
    pub connections: ConnectionReport,
}

/// Synchronisation steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    /// Context token validation
    ResolveContexts,
    /// Diagram load
    UpdateContexts,
    /// Vocabulary discovery and term load
    RetrieveVocabularyData,
    /// Element and link load, reconciliation, connection validation
    RetrieveContextData,
    /// Obsolete diagram check
    CheckObsoleteDiagrams,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolveContexts => "resolve contexts",
            Self::UpdateContexts => "update contexts",
            Self::RetrieveVocabularyData => "retrieve vocabulary data",
            Self::RetrieveContextData => "retrieve context data",
            Self::CheckObsoleteDiagrams => "check obsolete diagrams",
        };
        f.write_str(name)
    }
}

/// Outcome of a full synchronisation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Steps that succeeded
    pub completed: Vec<SyncStep>,
    /// Step that failed and its error message
    pub failed: Option<(SyncStep, String)>,
    /// Resolved contexts
    pub contexts: Vec<Iri>,
    /// Diagrams loaded
    pub diagrams: usize,
    /// Vocabulary load
    pub vocabulary: Option<VocabularyLoadReport>,
    /// Context data load
    pub context_data: Option<ContextDataReport>,
    /// Obsolete diagram check
    pub obsolete: Option<ObsoleteOutcome>,
}

impl SyncReport {
    /// Whether every step succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }

    fn fail(&mut self, step: SyncStep, error: &SyncError) {
        tracing::error!(step = %step, error = %error, "synchronisation stopped");
        self.failed = Some((step, error.to_string()));
    }
}

/// The synchronisation engine
pub struct SyncEngine {
    config: SyncConfig,
    gateway: Arc<dyn TransactionGateway>,
    queries: Arc<dyn QueryBuilder>,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Create engine with the default query builder
    ///
    /// # Errors
    /// [`SyncError::Configuration`] when the configuration is invalid.
    pub fn new(config: SyncConfig, gateway: Arc<dyn TransactionGateway>) -> Result<Self, SyncError> {
        config.validate()?;
        let queries: Arc<dyn QueryBuilder> = Arc::new(SparqlQueryBuilder::new(Iri::from(
            config.application_context.as_str(),
        )));
        Ok(Self {
            config,
            gateway,
            queries,
        })
    }

    /// With a custom query builder
    #[must_use]
    pub fn with_query_builder(mut self, queries: Arc<dyn QueryBuilder>) -> Self {
        self.queries = queries;
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Fresh workspace for the configured store
    #[must_use]
    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.config.workspace_settings())
    }

    fn remote(&self, ws: &Workspace) -> Remote {
        Remote::new(
            self.gateway.clone(),
            self.queries.clone(),
            ws.settings.context_endpoint.clone(),
        )
    }

    /// Validate context tokens into the workspace context list
    ///
    /// # Errors
    /// [`SyncError::Configuration`] or [`SyncError::InvalidContextSelection`].
    pub fn try_retrieve_info<S: AsRef<str>>(
        &self,
        ws: &mut Workspace,
        tokens: &[S],
    ) -> Result<Vec<Iri>, SyncError> {
        resolve_contexts(&mut ws.settings, &self.config, tokens)
    }

    /// Validate context tokens; `false` when none is usable
    ///
    /// # Errors
    /// Only [`SyncError::Configuration`], which must stop startup.
    pub fn retrieve_info<S: AsRef<str>>(
        &self,
        ws: &mut Workspace,
        tokens: &[S],
    ) -> Result<bool, SyncError> {
        match self.try_retrieve_info(ws, tokens) {
            Ok(_) => Ok(true),
            Err(e) if e.is_fatal() => Err(e),
            Err(_) => Ok(false),
        }
    }

    /// Load diagrams and their collaborators, then clear the selected diagram
    ///
    /// # Errors
    /// Remote failures of the diagram or user query. The selection is
    /// cleared even when the user query fails.
    pub async fn try_update_contexts(&self, ws: &mut Workspace) -> Result<usize, SyncError> {
        let remote = self.remote(ws);
        let diagrams = fetch_diagrams(&remote).await?;
        let count = diagrams.len();
        for diagram in diagrams {
            match ws.diagrams.get_mut(&diagram.id) {
                Some(existing) => {
                    existing.iri = diagram.iri;
                    existing.name = diagram.name;
                    existing.collaborators = diagram.collaborators;
                }
                None => {
                    ws.diagrams.insert(diagram.id.clone(), diagram);
                }
            }
        }

        let mut collaborators: IndexSet<String> = IndexSet::new();
        for diagram in ws.diagrams.values() {
            collaborators.extend(diagram.collaborators.iter().cloned());
        }
        let ids: Vec<String> = collaborators.into_iter().collect();
        let users = fetch_users(&remote, &ids).await;

        ws.settings.selected_diagram = None;
        let users = users?;
        tracing::info!(diagrams = count, users = users.len(), "diagrams loaded");
        for user in users {
            ws.users.insert(user.id.clone(), user);
        }
        Ok(count)
    }

    /// Load diagrams; `false` on failure
    pub async fn update_contexts(&self, ws: &mut Workspace) -> bool {
        log_outcome(SyncStep::UpdateContexts, self.try_update_contexts(ws).await)
    }

    /// Load the cache index, discover vocabularies and load their terms
    ///
    /// # Errors
    /// [`SyncError::NoVocabulariesFound`] or remote failures.
    pub async fn try_retrieve_vocabulary_data(
        &self,
        ws: &mut Workspace,
    ) -> Result<VocabularyLoadReport, SyncError> {
        let remote = self.remote(ws);
        let cached_vocabularies = load_cache_index(ws, &remote).await;
        let discovered = discover_vocabularies(ws, &remote, &self.config.languages).await?;
        let terms = load_terms(ws, &remote, &discovered).await?;
        Ok(VocabularyLoadReport {
            cached_vocabularies,
            vocabularies: discovered.into_iter().map(|v| v.iri).collect(),
            terms,
        })
    }

    /// Load vocabulary data; `false` on failure
    pub async fn retrieve_vocabulary_data(&self, ws: &mut Workspace) -> bool {
        log_outcome(
            SyncStep::RetrieveVocabularyData,
            self.try_retrieve_vocabulary_data(ws).await,
        )
    }

    /// Load element and link configuration, reconcile, validate connections
    ///
    /// Both configurations are fetched together and must both succeed
    /// before anything is applied.
    ///
    /// # Errors
    /// Remote failures; transactions acknowledged before the failure stay.
    pub async fn try_retrieve_context_data(
        &self,
        ws: &mut Workspace,
    ) -> Result<ContextDataReport, SyncError> {
        let remote = self.remote(ws);
        let (elements, links) =
            futures::try_join!(fetch_elements_config(&remote), fetch_links_config(&remote))?;

        let mut report = ContextDataReport {
            elements: elements.len(),
            links: links.len(),
            ..ContextDataReport::default()
        };
        for (term, element) in elements {
            match ws.elements.get_mut(&term) {
                Some(existing) => {
                    if element.vocabulary.is_some() {
                        existing.vocabulary = element.vocabulary;
                    }
                    existing.hidden.extend(element.hidden);
                }
                None => {
                    ws.elements.insert(term, element);
                }
            }
        }
        ws.links.extend(links);

        report.reconcile = reconcile(ws, &remote).await?;
        report.connections = validate_connections(ws, &remote, self.config.link_batch_size).await?;
        Ok(report)
    }

    /// Load context data; `false` on failure
    pub async fn retrieve_context_data(&self, ws: &mut Workspace) -> bool {
        log_outcome(
            SyncStep::RetrieveContextData,
            self.try_retrieve_context_data(ws).await,
        )
    }

    /// Detect obsolete diagrams and delete them once confirmed
    ///
    /// # Errors
    /// [`SyncError::TransactionRejected`] when the deletion fails.
    pub async fn try_check_for_obsolete_diagrams(
        &self,
        ws: &mut Workspace,
        prompt: &dyn ConfirmationPrompt,
    ) -> Result<ObsoleteOutcome, SyncError> {
        let remote = self.remote(ws);
        check_obsolete_diagrams(ws, &remote, prompt).await
    }

    /// Check for obsolete diagrams; `false` on failure
    pub async fn check_for_obsolete_diagrams(
        &self,
        ws: &mut Workspace,
        prompt: &dyn ConfirmationPrompt,
    ) -> bool {
        log_outcome(
            SyncStep::CheckObsoleteDiagrams,
            self.try_check_for_obsolete_diagrams(ws, prompt).await,
        )
    }

    /// Run every step in order, stopping at the first failure
    ///
    /// # Errors
    /// Only [`SyncError::Configuration`]; other failures are recorded in the
    /// report.
    pub async fn synchronize<S: AsRef<str>>(
        &self,
        ws: &mut Workspace,
        tokens: &[S],
        prompt: &dyn ConfirmationPrompt,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        match self.try_retrieve_info(ws, tokens) {
            Ok(contexts) => {
                report.contexts = contexts;
                report.completed.push(SyncStep::ResolveContexts);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                report.fail(SyncStep::ResolveContexts, &e);
                return Ok(report);
            }
        }

        match self.try_update_contexts(ws).await {
            Ok(diagrams) => {
                report.diagrams = diagrams;
                report.completed.push(SyncStep::UpdateContexts);
            }
            Err(e) => {
                report.fail(SyncStep::UpdateContexts, &e);
                return Ok(report);
            }
        }

        match self.try_retrieve_vocabulary_data(ws).await {
            Ok(vocabulary) => {
                report.vocabulary = Some(vocabulary);
                report.completed.push(SyncStep::RetrieveVocabularyData);
            }
            Err(e) => {
                report.fail(SyncStep::RetrieveVocabularyData, &e);
                return Ok(report);
            }
        }

        match self.try_retrieve_context_data(ws).await {
            Ok(context_data) => {
                report.context_data = Some(context_data);
                report.completed.push(SyncStep::RetrieveContextData);
            }
            Err(e) => {
                report.fail(SyncStep::RetrieveContextData, &e);
                return Ok(report);
            }
        }

        match self.try_check_for_obsolete_diagrams(ws, prompt).await {
            Ok(outcome) => {
                report.obsolete = Some(outcome);
                report.completed.push(SyncStep::CheckObsoleteDiagrams);
            }
            Err(e) => report.fail(SyncStep::CheckObsoleteDiagrams, &e),
        }

        tracing::info!(
            steps = report.completed.len(),
            success = report.is_success(),
            "synchronisation finished"
        );
        Ok(report)
    }
}

fn log_outcome<T>(step: SyncStep, result: Result<T, SyncError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(step = %step, error = %e, "step failed");
            false
        }
    }
}
