//! graphsync core - workspace synchronisation and consistency engine
//!
//! Keeps a client-side diagram workspace consistent with a remote triple
//! store:
//! - resolves which remote contexts belong to the workspace
//! - pulls vocabularies, terms and restrictions and merges them into the cache
//! - repairs dangling elements and links in the cached diagram graph
//! - reconciles links with the relationship statements of the term cache
//! - detects diagrams made obsolete by missing or read-only vocabularies
//!
//! # Example
//!
//! ```rust,ignore
//! use graphsync_core::{FixedAnswer, SyncConfig, SyncEngine};
//! use graphsync_gateway::HttpGateway;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::load("graphsync.toml")?;
//! let gateway = Arc::new(HttpGateway::new(Duration::from_secs(config.request_timeout_secs))?);
//! let engine = SyncEngine::new(config, gateway)?;
//!
//! let mut ws = engine.workspace();
//! let report = engine
//!     .synchronize(&mut ws, &["http://example.org/vocabulary/1"], &FixedAnswer(false))
//!     .await?;
//! println!("completed {} steps", report.completed.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod connections;
pub mod context;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod obsolete;
pub mod reconcile;
pub mod remote;
pub mod terms;
pub mod vocabulary;

pub use config::{LanguageConfig, SyncConfig, MORE_PLURAL_THRESHOLD};
pub use connections::{
    apply_plan, plan_connections, validate_connections, CascadeRule, ConnectionPlan,
    ConnectionReport, DeactivationExemption, Endpoint, SiblingLookup, CASCADE_RULES,
    DEACTIVATION_EXEMPTIONS,
};
pub use context::{context_tokens_from_url, resolve_contexts};
pub use engine::{ContextDataReport, SyncEngine, SyncReport, SyncStep, VocabularyLoadReport};
pub use error::SyncError;
pub use obsolete::{
    check_obsolete_diagrams, find_obsolete_diagrams, ConfirmationPrompt, ConfirmationRequest,
    FixedAnswer, ObsoleteOutcome,
};
pub use reconcile::{reconcile, ReconcileReport};
pub use remote::Remote;
pub use terms::{load_terms, TermLoadReport};
pub use vocabulary::{discover_vocabularies, DiscoveredVocabulary};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the engine
    pub use crate::{
        ConfirmationPrompt, ConfirmationRequest, FixedAnswer, ObsoleteOutcome, SyncConfig,
        SyncEngine, SyncError, SyncReport,
    };
    pub use graphsync_model::{Workspace, WorkspaceSettings};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
