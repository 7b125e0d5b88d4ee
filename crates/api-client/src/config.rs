//! Base query configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend URL used when `VITE_BACKEND_URL` is unset or empty.
pub const DEFAULT_BASE_URL: &str = "http://backend:5000";

/// Build-time environment variable holding the backend URL.
pub const BASE_URL_ENV: &str = "VITE_BACKEND_URL";

/// Cache tag type for user data.
pub const USER_TAG: &str = "User";

/// Whether requests carry credentials (cookies), following fetch semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialPolicy {
    /// Never send or store credentials.
    Omit,
    /// Send credentials on every request, cross-origin included.
    Include,
    /// Send credentials only to the client's own origin.
    #[default]
    SameOrigin,
}

impl CredentialPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Omit => "omit",
            Self::Include => "include",
            Self::SameOrigin => "same-origin",
        }
    }

    /// Whether responses may set cookies that later requests send back.
    pub fn stores_cookies(self) -> bool {
        !matches!(self, Self::Omit)
    }
}

impl fmt::Display for CredentialPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `value` when it is set and non-empty, otherwise the default URL.
pub fn resolve_base_url(value: Option<&str>) -> &str {
    match value {
        Some(url) if !url.trim().is_empty() => url,
        _ => DEFAULT_BASE_URL,
    }
}
