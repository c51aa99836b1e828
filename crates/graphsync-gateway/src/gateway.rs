//! Query/transaction gateway contract
//!
//! The engine reaches the triple store only through this trait. Implement it
//! to plug in a transport; [`HttpGateway`](crate::HttpGateway) speaks the
//! SPARQL 1.1 protocol.

use crate::error::GatewayError;
use crate::results::SparqlResults;

/// Remote store access
#[async_trait::async_trait]
pub trait TransactionGateway: Send + Sync {
    /// Run a read query and return its bindings
    async fn run_read_query(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<SparqlResults, GatewayError>;

    /// Run `queries` as one atomic transaction
    ///
    /// An empty slice is a successful no-op.
    async fn run_transaction(&self, endpoint: &str, queries: &[String])
        -> Result<(), GatewayError>;
}
