//! Client for the backend HTTP API.
//!
//! `ApiClient` holds the base query every request shares (base URL and
//! credential policy), the declared cache tag types, and a registry of named
//! endpoints. The default scaffold is built once per process by [`shared`]
//! and starts with no endpoints; registration returns a new client.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;

pub use client::{ApiClient, ApiClientBuilder, PreparedRequest, shared};
pub use config::{BASE_URL_ENV, CredentialPolicy, DEFAULT_BASE_URL, USER_TAG, resolve_base_url};
pub use endpoint::{EndpointDefinition, EndpointKind};
pub use error::{ClientError, Result};
