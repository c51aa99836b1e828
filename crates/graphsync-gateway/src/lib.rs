//! graphsync gateway
//!
//! Everything between the synchronisation engine and the triple store:
//! - [`TransactionGateway`]: read queries and atomic transactions
//! - [`HttpGateway`]: the SPARQL 1.1 protocol transport
//! - [`SparqlResults`] and typed records validated from result rows
//! - [`QueryBuilder`]: the text of every query the engine issues
//!
//! # Example
//!
//! ```rust,ignore
//! use graphsync_gateway::{HttpGateway, QueryBuilder, SparqlQueryBuilder, TransactionGateway};
//! use graphsync_gateway::records::DiagramRecord;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = HttpGateway::new(Duration::from_secs(30))?;
//! let queries = SparqlQueryBuilder::new("http://example.org/application".into());
//!
//! let results = gateway
//!     .run_read_query("http://localhost:7200/repositories/ws", &queries.diagrams())
//!     .await?;
//! let diagrams = results.records::<DiagramRecord>()?;
//! println!("{} diagram rows", diagrams.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod gateway;
pub mod http;
pub mod query;
pub mod records;
pub mod results;

pub use error::{BindingError, GatewayError};
pub use gateway::TransactionGateway;
pub use http::HttpGateway;
pub use query::{kinds, query_kind, QueryBuilder, SparqlQueryBuilder, VocabularyScope};
pub use records::{
    CacheVocabularyRecord, DiagramRecord, ElementRecord, FromBinding, LangText, LinkRecord,
    ReadOnlyTermRecord, RestrictionRecord, TermRecord, UserRecord, VocabularyContextRecord,
    VocabularyMetadataRecord,
};
pub use results::{Binding, RdfTerm, SparqlResults};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the gateway
    pub use crate::{
        Binding, FromBinding, GatewayError, HttpGateway, QueryBuilder, SparqlQueryBuilder,
        SparqlResults, TransactionGateway,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
