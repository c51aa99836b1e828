//! Error types for the synchronisation engine
//!
//! - [`SyncError::Configuration`] is fatal and stops startup
//! - every other variant is recovered to a `false` at the loader boundary
//!
//! Structural inconsistencies in the cached graph are not errors: they are
//! repaired locally and logged as warnings.

use graphsync_gateway::{BindingError, GatewayError};

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Unsupported interface language or otherwise unusable configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// None of the supplied context tokens is a well-formed IRI
    #[error("no valid context in selection ({} token(s) rejected)", .rejected.len())]
    InvalidContextSelection {
        /// Tokens that failed validation
        rejected: Vec<String>,
    },

    /// Vocabulary discovery returned no bindings
    #[error("no vocabularies found in {contexts} context(s)")]
    NoVocabulariesFound {
        /// Number of contexts queried
        contexts: usize,
    },

    /// A read query failed
    #[error("remote fetch failed: {0}")]
    RemoteFetch(#[from] GatewayError),

    /// A result row failed boundary validation
    #[error("invalid result row: {0}")]
    Binding(#[from] BindingError),

    /// A write transaction was not acknowledged
    #[error("{operation} transaction rejected: {source}")]
    TransactionRejected {
        /// What the transaction was doing
        operation: &'static str,
        /// Gateway failure
        #[source]
        source: GatewayError,
    },
}

impl SyncError {
    /// Create configuration error
    #[inline]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if error must stop startup
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if a caller may retry or proceed without the failed step
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Check if error came from the remote store
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteFetch(_) | Self::Binding(_) | Self::TransactionRejected { .. }
        )
    }
}
