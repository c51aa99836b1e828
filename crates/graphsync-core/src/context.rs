//! Remote context resolution
//!
//! Turns externally supplied context tokens into validated context IRIs on
//! the workspace settings.

use crate::config::SyncConfig;
use crate::error::SyncError;
use graphsync_model::{is_uri_shaped, Iri, WorkspaceSettings};

/// Query parameter carrying context tokens in a workspace URL
pub const CONTEXT_PARAMETER: &str = "vocabulary";

/// Every `vocabulary` parameter of a workspace URL, in order
///
/// An unparseable URL yields no tokens.
#[must_use]
pub fn context_tokens_from_url(workspace_url: &str) -> Vec<String> {
    match url::Url::parse(workspace_url) {
        Ok(url) => url
            .query_pairs()
            .filter(|(key, _)| key == CONTEXT_PARAMETER)
            .map(|(_, value)| value.into_owned())
            .collect(),
        Err(e) => {
            tracing::warn!(url = workspace_url, error = %e, "workspace URL cannot be parsed");
            Vec::new()
        }
    }
}

fn decode(token: &str) -> String {
    urlencoding::decode(token).map_or_else(|_| token.to_string(), |decoded| decoded.into_owned())
}

/// Validate `tokens` and append the accepted ones to the context list
///
/// Tokens are percent-decoded, then accepted when they parse as absolute
/// URLs with a host. Accepted tokens already listed are not appended again.
/// Returns the accepted contexts.
///
/// # Errors
/// - [`SyncError::Configuration`] when the interface language is unsupported
/// - [`SyncError::InvalidContextSelection`] when no token is accepted;
///   nothing is appended
pub fn resolve_contexts<S: AsRef<str>>(
    settings: &mut WorkspaceSettings,
    config: &SyncConfig,
    tokens: &[S],
) -> Result<Vec<Iri>, SyncError> {
    config.ensure_language(&settings.interface_language)?;

    let (accepted, rejected): (Vec<String>, Vec<String>) = tokens
        .iter()
        .map(|token| decode(token.as_ref()))
        .partition(|token| is_uri_shaped(token));

    for token in &rejected {
        tracing::warn!(token = %token, "context token is not an IRI");
    }
    if accepted.is_empty() {
        tracing::error!(rejected = rejected.len(), "unable to parse any vocabulary IRI");
        return Err(SyncError::InvalidContextSelection { rejected });
    }

    let accepted: Vec<Iri> = accepted.into_iter().map(Iri::from).collect();
    for context in &accepted {
        if !settings.context_iris.contains(context) {
            settings.context_iris.push(context.clone());
        }
    }
    tracing::info!(
        accepted = accepted.len(),
        contexts = settings.context_iris.len(),
        "contexts resolved"
    );
    Ok(accepted)
}
