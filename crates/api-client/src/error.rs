//! API client error types.

use thiserror::Error;

/// Errors that can occur when configuring or using the API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL is not an absolute http(s) URL.
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// An endpoint with this name is already registered.
    #[error("Endpoint already registered: {0}")]
    DuplicateEndpoint(String),

    /// No endpoint with this name is registered.
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// An endpoint references a tag type the client does not declare.
    #[error("Endpoint '{endpoint}' uses undeclared tag type '{tag}'")]
    UndeclaredTag { endpoint: String, tag: String },

    /// A `{param}` placeholder in an endpoint path has no value.
    #[error("Endpoint '{endpoint}' is missing path parameter '{param}'")]
    MissingPathParam { endpoint: String, param: String },

    /// The request could not be built or sent.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Request to {url} failed with status {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
}

/// Result type for API client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
