//! Error types for the gateway boundary
//!
//! - [`GatewayError`]: a query or transaction did not complete
//! - [`BindingError`]: a result row does not have the expected shape

/// Remote call failure
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request could not be sent or the response could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("endpoint {endpoint} answered {status}: {body}")]
    Status {
        /// Endpoint URL
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Response body is not a SPARQL JSON result document
    #[error("malformed query results: {0}")]
    Decode(#[from] serde_json::Error),

    /// Store refused the transaction
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

impl GatewayError {
    /// Create a status error
    pub fn status(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }
}

/// Result row validation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// Required variable not bound
    #[error("binding is missing variable ?{0}")]
    Missing(String),

    /// Variable bound to the wrong kind of RDF term
    #[error("?{var} is not {expected}")]
    WrongKind {
        /// Variable name
        var: String,
        /// Expected term kind
        expected: &'static str,
    },

    /// Literal could not be interpreted
    #[error("?{var} holds malformed {expected}: {value}")]
    Malformed {
        /// Variable name
        var: String,
        /// Expected literal kind
        expected: &'static str,
        /// Offending lexical form
        value: String,
    },
}
