//! SPARQL 1.1 protocol gateway over HTTP

use crate::error::GatewayError;
use crate::gateway::TransactionGateway;
use crate::results::SparqlResults;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

const RESULTS_JSON: &str = "application/sparql-results+json";
const BODY_PREVIEW: usize = 512;

/// HTTP gateway
///
/// Read queries are POSTed as `query=` forms; a transaction is one `update=`
/// request whose operations are separated by `;`, which the protocol executes
/// atomically.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    update_suffix: Option<String>,
}

impl HttpGateway {
    /// Create gateway with a request timeout
    ///
    /// # Errors
    /// Fails when the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("graphsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            update_suffix: None,
        })
    }

    /// Send updates to `endpoint` + `suffix` (e.g. `/statements`)
    #[must_use]
    pub fn with_update_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.update_suffix = Some(suffix.into());
        self
    }

    fn update_endpoint(&self, endpoint: &str) -> String {
        match &self.update_suffix {
            Some(suffix) => format!("{}{}", endpoint.trim_end_matches('/'), suffix),
            None => endpoint.to_string(),
        }
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW).collect()
}

#[async_trait::async_trait]
impl TransactionGateway for HttpGateway {
    async fn run_read_query(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<SparqlResults, GatewayError> {
        tracing::trace!(endpoint, query, "read query");
        let response = self
            .client
            .post(endpoint)
            .header(ACCEPT, RESULTS_JSON)
            .form(&[("query", query)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::status(endpoint, status.as_u16(), preview(&body)));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn run_transaction(
        &self,
        endpoint: &str,
        queries: &[String],
    ) -> Result<(), GatewayError> {
        let operations: Vec<&str> = queries
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .collect();
        if operations.is_empty() {
            return Ok(());
        }

        let target = self.update_endpoint(endpoint);
        let update = operations.join(" ;\n");
        tracing::trace!(endpoint = %target, operations = operations.len(), "transaction");
        let response = self
            .client
            .post(&target)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&[("update", update.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::status(target, status.as_u16(), preview(&body)));
        }
        Ok(())
    }
}
