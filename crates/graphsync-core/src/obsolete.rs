//! Obsolete diagram detection
//!
//! A diagram is obsolete when the cache index ties it to vocabularies, none
//! of which is present and writable in the workspace any more. Deleting
//! obsolete diagrams is destructive and waits for explicit confirmation.

use crate::error::SyncError;
use crate::remote::Remote;
use graphsync_model::{DiagramId, Iri, ViewMode, Workspace};
use indexmap::IndexSet;

/// What the user is asked to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    /// Diagrams to delete, with display names
    pub diagrams: Vec<(DiagramId, String)>,
    /// Keep the prompt open until the deletion transaction completes; the
    /// prompt then hears the outcome through [`ConfirmationPrompt::completed`]
    pub wait_for_completion: bool,
}

impl ConfirmationRequest {
    /// Display names of the affected diagrams
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.diagrams.iter().map(|(_, name)| name.as_str())
    }
}

/// Confirmation collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Ask for confirmation; `true` only on explicit acceptance
    async fn confirm(&self, request: &ConfirmationRequest) -> bool;

    /// The accepted deletion finished, successfully or not
    ///
    /// Called only for requests with `wait_for_completion` set.
    async fn completed(&self, request: &ConfirmationRequest, succeeded: bool) {
        let _ = (request, succeeded);
    }
}

/// Prompt with a fixed answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAnswer(pub bool);

#[async_trait::async_trait]
impl ConfirmationPrompt for FixedAnswer {
    async fn confirm(&self, request: &ConfirmationRequest) -> bool {
        tracing::info!(diagrams = request.diagrams.len(), accepted = self.0, "confirmation answered");
        self.0
    }
}

/// Result of an obsolete-diagram check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObsoleteOutcome {
    /// Nothing obsolete
    NoneFound,
    /// Confirmation declined, nothing changed
    Declined {
        /// Obsolete diagrams
        diagrams: Vec<DiagramId>,
    },
    /// Obsolete diagrams deleted
    Deleted {
        /// Deleted diagrams
        diagrams: Vec<DiagramId>,
        /// Read-only elements removed with them
        removed_elements: Vec<Iri>,
    },
}

/// Ids of workspace diagrams that are obsolete, in workspace order
#[must_use]
pub fn find_obsolete_diagrams(ws: &Workspace) -> Vec<DiagramId> {
    let in_cache: IndexSet<&Iri> = ws
        .cache_index
        .iter()
        .flat_map(|(_, cached)| cached.diagrams.iter())
        .collect();
    let with_vocabularies: IndexSet<&Iri> = ws
        .cache_index
        .iter()
        .filter(|(vocabulary, _)| {
            ws.vocabularies
                .get(*vocabulary)
                .is_some_and(|v| !v.read_only)
        })
        .flat_map(|(_, cached)| cached.diagrams.iter())
        .collect();

    ws.diagrams
        .values()
        .filter(|diagram| in_cache.contains(&diagram.iri) && !with_vocabularies.contains(&diagram.iri))
        .map(|diagram| diagram.id.clone())
        .collect()
}

/// Read-only elements left without a visible diagram once `obsolete` goes
#[must_use]
pub fn orphaned_read_only_elements(ws: &Workspace, obsolete: &[DiagramId]) -> Vec<Iri> {
    ws.elements
        .values()
        .filter(|element| ws.is_term_read_only(element.term.as_str()))
        .filter(|element| {
            element
                .hidden
                .keys()
                .all(|diagram| ws.is_element_hidden(element.term.as_str(), diagram) || obsolete.contains(diagram))
        })
        .map(|element| element.term.clone())
        .collect()
}

/// Detect obsolete diagrams and delete them once confirmed
///
/// On acceptance, orphaned read-only elements are removed, obsolete diagrams
/// are flagged for deletion, the selection is cleared and the view returns
/// to the canvas; then one transaction deletes everything. Declining changes
/// nothing.
///
/// # Errors
/// [`SyncError::TransactionRejected`] when the deletion transaction fails;
/// local changes stay applied.
pub async fn check_obsolete_diagrams(
    ws: &mut Workspace,
    remote: &Remote,
    prompt: &dyn ConfirmationPrompt,
) -> Result<ObsoleteOutcome, SyncError> {
    let obsolete = find_obsolete_diagrams(ws);
    if obsolete.is_empty() {
        tracing::debug!("no obsolete diagrams");
        return Ok(ObsoleteOutcome::NoneFound);
    }

    let request = ConfirmationRequest {
        diagrams: obsolete
            .iter()
            .filter_map(|id| ws.diagrams.get(id).map(|d| (id.clone(), d.name.clone())))
            .collect(),
        wait_for_completion: true,
    };
    tracing::info!(diagrams = obsolete.len(), "obsolete diagrams found");
    if !prompt.confirm(&request).await {
        tracing::info!("obsolete diagram deletion declined");
        return Ok(ObsoleteOutcome::Declined { diagrams: obsolete });
    }

    let mut queries = Vec::new();
    let removed = orphaned_read_only_elements(ws, &obsolete);
    for term in &removed {
        ws.remove_read_only_element(term);
        queries.push(remote.queries().remove_element(term));
    }
    for id in &obsolete {
        if let Some(diagram) = ws.diagrams.get_mut(id) {
            diagram.to_be_deleted = true;
            queries.push(remote.queries().delete_diagram(diagram));
        }
    }
    ws.settings.selected_diagram = None;
    ws.settings.view_mode = ViewMode::Canvas;

    let committed = remote.commit("diagram deletion", queries).await;
    if request.wait_for_completion {
        prompt.completed(&request, committed.is_ok()).await;
    }
    committed?;
    tracing::info!(
        diagrams = obsolete.len(),
        elements = removed.len(),
        "obsolete diagrams deleted"
    );
    Ok(ObsoleteOutcome::Deleted {
        diagrams: obsolete,
        removed_elements: removed,
    })
}
