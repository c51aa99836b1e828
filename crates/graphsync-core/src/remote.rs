//! Remote store access for one workspace
//!
//! Binds a gateway, a query builder and the workspace endpoint. Read results
//! are decoded into typed records here so no raw binding reaches the caches.

use crate::error::SyncError;
use futures::future::join_all;
use graphsync_gateway::{FromBinding, QueryBuilder, TransactionGateway};
use std::fmt;
use std::sync::Arc;

/// Gateway bound to an endpoint
#[derive(Clone)]
pub struct Remote {
    gateway: Arc<dyn TransactionGateway>,
    queries: Arc<dyn QueryBuilder>,
    endpoint: String,
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Remote {
    /// Create remote handle
    #[must_use]
    pub fn new(
        gateway: Arc<dyn TransactionGateway>,
        queries: Arc<dyn QueryBuilder>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            queries,
            endpoint: endpoint.into(),
        }
    }

    /// Query builder
    #[inline]
    #[must_use]
    pub fn queries(&self) -> &dyn QueryBuilder {
        self.queries.as_ref()
    }

    /// Run a read query and decode every row as `T`
    ///
    /// # Errors
    /// [`SyncError::RemoteFetch`] or [`SyncError::Binding`].
    pub async fn select<T: FromBinding>(&self, query: &str) -> Result<Vec<T>, SyncError> {
        let results = self.gateway.run_read_query(&self.endpoint, query).await?;
        let records = results.records::<T>()?;
        tracing::trace!(rows = records.len(), "query answered");
        Ok(records)
    }

    /// Run `queries` as one atomic transaction
    ///
    /// # Errors
    /// [`SyncError::TransactionRejected`] when the gateway fails.
    pub async fn commit(&self, operation: &'static str, queries: Vec<String>) -> Result<(), SyncError> {
        if queries.is_empty() {
            return Ok(());
        }
        tracing::debug!(operation, queries = queries.len(), "committing transaction");
        self.gateway
            .run_transaction(&self.endpoint, &queries)
            .await
            .map_err(|source| SyncError::TransactionRejected { operation, source })
    }

    /// Submit independent transactions together
    ///
    /// Every transaction runs to completion; the first failure is returned.
    ///
    /// # Errors
    /// [`SyncError::TransactionRejected`] when any transaction fails.
    pub async fn commit_parallel(
        &self,
        operation: &'static str,
        transactions: Vec<Vec<String>>,
    ) -> Result<(), SyncError> {
        let count = transactions.len();
        let results = join_all(
            transactions
                .into_iter()
                .map(|queries| self.commit(operation, queries)),
        )
        .await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::error!(operation, failed, total = count, "parallel transactions failed");
        }
        results.into_iter().collect()
    }
}
