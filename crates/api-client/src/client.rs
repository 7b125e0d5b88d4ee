//! API client: base query plus endpoint registry.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{CredentialPolicy, USER_TAG, resolve_base_url};
use crate::endpoint::{EndpointDefinition, Segment};
use crate::error::{ClientError, Result};

static SHARED: OnceLock<ApiClient> = OnceLock::new();

/// Returns the process-wide client built by [`ApiClient::from_build_env`].
///
/// The first successful call builds the client; later calls return the same
/// instance.
pub fn shared() -> Result<&'static ApiClient> {
    if let Some(client) = SHARED.get() {
        return Ok(client);
    }
    let client = ApiClient::from_build_env()?;
    Ok(SHARED.get_or_init(|| client))
}

/// A request built through the base query, stamped with the credential
/// policy of the client that built it.
#[derive(Debug)]
pub struct PreparedRequest {
    endpoint: Option<String>,
    credentials: CredentialPolicy,
    request: reqwest::Request,
}

impl PreparedRequest {
    /// Name of the registered endpoint, or `None` for a raw base query.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn credentials(&self) -> CredentialPolicy {
        self.credentials
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn url(&self) -> &Url {
        self.request.url()
    }

    pub fn request(&self) -> &reqwest::Request {
        &self.request
    }

    pub fn into_request(self) -> reqwest::Request {
        self.request
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug, Clone, Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    credentials: CredentialPolicy,
    tag_types: BTreeSet<String>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    /// Sets the backend URL. Empty values fall back to the default URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn credentials(mut self, credentials: CredentialPolicy) -> Self {
        self.credentials = credentials;
        self
    }

    /// Declares a cache tag type endpoints may provide or invalidate.
    pub fn tag_type(mut self, tag: impl Into<String>) -> Self {
        self.tag_types.insert(tag.into());
        self
    }

    pub fn tag_types<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tag_types.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Total time allowed per request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let raw = resolve_base_url(self.base_url.as_deref()).trim().to_string();
        let base_url = Url::parse(&raw).map_err(|e| ClientError::InvalidBaseUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: raw,
                reason: "expected an absolute http or https URL".to_string(),
            });
        }

        let mut http = reqwest::Client::builder().cookie_store(self.credentials.stores_cookies());
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http.build()?;

        tracing::debug!(
            %base_url,
            credentials = %self.credentials,
            tag_types = self.tag_types.len(),
            "api client configured"
        );

        Ok(ApiClient {
            http,
            base_url,
            credentials: self.credentials,
            tag_types: self.tag_types,
            endpoints: BTreeMap::new(),
        })
    }
}

/// Client for the backend API.
///
/// Configuration is fixed once built. [`ApiClient::register`] consumes the
/// client and returns a new one with the endpoint added, so a shared client
/// is never mutated after requests start flowing through it.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: CredentialPolicy,
    tag_types: BTreeSet<String>,
    endpoints: BTreeMap<String, EndpointDefinition>,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// The application's client: backend URL from `VITE_BACKEND_URL` at
    /// build time (default `http://backend:5000`), credentials included on
    /// every request, `User` tag type, no endpoints.
    pub fn from_build_env() -> Result<Self> {
        Self::builder()
            .base_url(resolve_base_url(option_env!("VITE_BACKEND_URL")))
            .credentials(CredentialPolicy::Include)
            .tag_type(USER_TAG)
            .build()
    }

    /// Returns a client with `endpoint` registered under `name`.
    pub fn register(
        mut self,
        name: impl Into<String>,
        endpoint: EndpointDefinition,
    ) -> Result<Self> {
        let name = name.into();
        if self.endpoints.contains_key(&name) {
            return Err(ClientError::DuplicateEndpoint(name));
        }
        if let Some(tag) = endpoint.tags().find(|tag| !self.tag_types.contains(*tag)) {
            return Err(ClientError::UndeclaredTag {
                endpoint: name,
                tag: tag.to_string(),
            });
        }

        tracing::debug!(
            endpoint = %name,
            method = %endpoint.method(),
            path = endpoint.path(),
            "endpoint registered"
        );
        self.endpoints.insert(name, endpoint);
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> CredentialPolicy {
        self.credentials
    }

    pub fn tag_types(&self) -> impl Iterator<Item = &str> {
        self.tag_types.iter().map(String::as_str)
    }

    pub fn endpoints(&self) -> impl Iterator<Item = (&str, &EndpointDefinition)> {
        self.endpoints.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointDefinition> {
        self.endpoints.get(name)
    }

    /// Names of endpoints whose results carry `tag`.
    pub fn endpoints_providing<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> {
        self.endpoints
            .iter()
            .filter(move |(_, def)| def.provided_tags().iter().any(|t| t == tag))
            .map(|(name, _)| name.as_str())
    }

    /// Names of endpoints that mark `tag` stale.
    pub fn endpoints_invalidating<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> {
        self.endpoints
            .iter()
            .filter(move |(_, def)| def.invalidated_tags().iter().any(|t| t == tag))
            .map(|(name, _)| name.as_str())
    }

    /// Builds a request for `path` relative to the base URL.
    ///
    /// `path` may carry a query string (`/api/users?page=2`).
    pub fn base_request(&self, method: Method, path: &str) -> Result<PreparedRequest> {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };
        let url = self.url_for(path.split('/').filter(|s| !s.is_empty()), query)?;
        let request = self.http.request(method, url).build()?;

        Ok(PreparedRequest {
            endpoint: None,
            credentials: self.credentials,
            request,
        })
    }

    /// Builds a request for the endpoint registered as `name`.
    pub fn prepare(&self, name: &str, params: &[(&str, &str)]) -> Result<PreparedRequest> {
        let request = self.endpoint_request(name, params)?.build()?;
        Ok(self.stamp(name, request))
    }

    /// Builds a request for `name` with `body` sent as JSON.
    pub fn prepare_json<B>(
        &self,
        name: &str,
        params: &[(&str, &str)],
        body: &B,
    ) -> Result<PreparedRequest>
    where
        B: Serialize + ?Sized,
    {
        let request = self.endpoint_request(name, params)?.json(body).build()?;
        Ok(self.stamp(name, request))
    }

    /// Sends a prepared request and returns the response whatever its status.
    pub async fn execute(&self, prepared: PreparedRequest) -> Result<reqwest::Response> {
        tracing::debug!(
            endpoint = prepared.endpoint().unwrap_or("-"),
            method = %prepared.method(),
            url = %prepared.url(),
            credentials = %prepared.credentials(),
            "sending request"
        );
        let response = self.http.execute(prepared.into_request()).await?;
        Ok(response)
    }

    /// Sends the query registered as `name` and decodes a JSON response.
    ///
    /// Non-success statuses are returned as `ClientError::Status`.
    pub async fn query<T>(&self, name: &str, params: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let prepared = self.prepare(name, params)?;
        let url = prepared.url().to_string();
        let response = self.execute(prepared).await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = name, %status, %url, "request failed");
            return Err(ClientError::Status { status, url });
        }
        Ok(response.json().await?)
    }

    fn endpoint_request(
        &self,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<reqwest::RequestBuilder> {
        let endpoint = self
            .endpoints
            .get(name)
            .ok_or_else(|| ClientError::UnknownEndpoint(name.to_string()))?;

        let segments = endpoint
            .segments()
            .map(|segment| match segment {
                Segment::Literal(literal) => Ok(literal),
                Segment::Param(param) => params
                    .iter()
                    .find(|(key, _)| *key == param)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| ClientError::MissingPathParam {
                        endpoint: name.to_string(),
                        param: param.to_string(),
                    }),
            })
            .collect::<Result<Vec<&str>>>()?;

        let url = self.url_for(segments, None)?;
        Ok(self.http.request(endpoint.method().clone(), url))
    }

    fn stamp(&self, name: &str, request: reqwest::Request) -> PreparedRequest {
        PreparedRequest {
            endpoint: Some(name.to_string()),
            credentials: self.credentials,
            request,
        }
    }

    /// Appends `segments` to the base URL path with exactly one `/` between
    /// parts. Segments are percent-encoded.
    fn url_for<'a, I>(&self, segments: I, query: Option<&str>) -> Result<Url>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ClientError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    reason: "URL cannot be a base".to_string(),
                })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        url.set_query(query);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BASE_URL;

    fn client() -> ApiClient {
        ApiClient::builder()
            .base_url("http://localhost:5000")
            .credentials(CredentialPolicy::Include)
            .tag_type(USER_TAG)
            .build()
            .unwrap()
    }

    #[test]
    fn unset_base_url_uses_default() {
        let client = ApiClient::builder().build().unwrap();
        assert_eq!(client.base_url().as_str(), "http://backend:5000/");
        assert_eq!(
            Url::parse(DEFAULT_BASE_URL).unwrap(),
            client.base_url().clone()
        );
    }

    #[test]
    fn empty_base_url_uses_default() {
        let client = ApiClient::builder().base_url("").build().unwrap();
        assert_eq!(client.base_url().as_str(), "http://backend:5000/");
    }

    #[test]
    fn scaffold_configuration() {
        let client = ApiClient::from_build_env().unwrap();
        let expected = Url::parse(resolve_base_url(option_env!("VITE_BACKEND_URL"))).unwrap();

        assert_eq!(client.base_url(), &expected);
        assert_eq!(client.credentials(), CredentialPolicy::Include);
        assert_eq!(client.tag_types().collect::<Vec<_>>(), ["User"]);
        assert_eq!(client.endpoints().count(), 0);
    }

    #[test]
    fn shared_client_is_built_once() {
        let first = shared().unwrap();
        let second = shared().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.credentials(), CredentialPolicy::Include);
    }

    #[test]
    fn rejects_invalid_base_urls() {
        for url in ["not a url", "ftp://files.example.com", "mailto:ops@example.com"] {
            let result = ApiClient::builder().base_url(url).build();
            assert!(
                matches!(result, Err(ClientError::InvalidBaseUrl { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn base_request_carries_include_policy() {
        let client = client();
        for (method, path) in [
            (Method::GET, "/api/health"),
            (Method::POST, "/api/users/login"),
            (Method::DELETE, "api/users/1"),
        ] {
            let prepared = client.base_request(method.clone(), path).unwrap();
            assert_eq!(prepared.credentials(), CredentialPolicy::Include);
            assert_eq!(*prepared.method(), method);
            assert_eq!(prepared.endpoint(), None);
        }
    }

    #[test]
    fn joins_paths_with_a_single_slash() {
        let client = client();
        let cases = [
            ("/api/health", "http://localhost:5000/api/health"),
            ("api/health", "http://localhost:5000/api/health"),
            ("//api//health/", "http://localhost:5000/api/health"),
            ("/api/users?page=2", "http://localhost:5000/api/users?page=2"),
        ];
        for (path, expected) in cases {
            let prepared = client.base_request(Method::GET, path).unwrap();
            assert_eq!(prepared.url().as_str(), expected);
        }
    }

    #[test]
    fn keeps_base_path_prefix() {
        for base in ["http://localhost:5000/v1", "http://localhost:5000/v1/"] {
            let client = ApiClient::builder().base_url(base).build().unwrap();
            let prepared = client.base_request(Method::GET, "/health").unwrap();
            assert_eq!(prepared.url().as_str(), "http://localhost:5000/v1/health");
        }
    }

    #[test]
    fn register_returns_augmented_client() {
        let original = client();
        let extended = original
            .clone()
            .register("getHealth", EndpointDefinition::query("/api/health"))
            .unwrap();

        assert_eq!(original.endpoints().count(), 0);
        assert_eq!(extended.endpoints().count(), 1);
        assert!(extended.endpoint("getHealth").is_some());
    }

    #[test]
    fn register_rejects_duplicates() {
        let result = client()
            .register("getHealth", EndpointDefinition::query("/api/health"))
            .unwrap()
            .register("getHealth", EndpointDefinition::query("/api/status"));
        assert!(matches!(result, Err(ClientError::DuplicateEndpoint(name)) if name == "getHealth"));
    }

    #[test]
    fn register_rejects_undeclared_tags() {
        let result = client().register(
            "getPosts",
            EndpointDefinition::query("/api/posts").provides("Post"),
        );
        assert!(matches!(
            result,
            Err(ClientError::UndeclaredTag { ref tag, .. }) if tag == "Post"
        ));
    }

    #[test]
    fn looks_up_endpoints_by_tag() {
        let client = client()
            .register(
                "getProfile",
                EndpointDefinition::query("/api/users/profile").provides(USER_TAG),
            )
            .unwrap()
            .register(
                "updateProfile",
                EndpointDefinition::mutation(Method::PUT, "/api/users/profile")
                    .invalidates(USER_TAG),
            )
            .unwrap()
            .register("getHealth", EndpointDefinition::query("/api/health"))
            .unwrap();

        assert_eq!(
            client.endpoints_providing(USER_TAG).collect::<Vec<_>>(),
            ["getProfile"]
        );
        assert_eq!(
            client.endpoints_invalidating(USER_TAG).collect::<Vec<_>>(),
            ["updateProfile"]
        );
    }

    #[test]
    fn prepare_fills_and_encodes_path_params() {
        let client = client()
            .register("getUser", EndpointDefinition::query("/api/users/{id}"))
            .unwrap();

        let prepared = client.prepare("getUser", &[("id", "a b/c")]).unwrap();
        assert_eq!(
            prepared.url().as_str(),
            "http://localhost:5000/api/users/a%20b%2Fc"
        );
        assert_eq!(prepared.endpoint(), Some("getUser"));
        assert_eq!(prepared.credentials(), CredentialPolicy::Include);
    }

    #[test]
    fn prepare_reports_missing_params_and_unknown_endpoints() {
        let client = client()
            .register("getUser", EndpointDefinition::query("/api/users/{id}"))
            .unwrap();

        assert!(matches!(
            client.prepare("getUser", &[]),
            Err(ClientError::MissingPathParam { ref param, .. }) if param == "id"
        ));
        assert!(matches!(
            client.prepare("nope", &[]),
            Err(ClientError::UnknownEndpoint(_))
        ));
    }

    #[test]
    fn prepare_json_sets_body_and_content_type() {
        let client = client()
            .register(
                "login",
                EndpointDefinition::mutation(Method::POST, "/api/users/auth"),
            )
            .unwrap();

        let body = serde_json::json!({"email": "a@example.com"});
        let prepared = client.prepare_json("login", &[], &body).unwrap();

        assert_eq!(*prepared.method(), Method::POST);
        assert_eq!(
            prepared.request().headers()[reqwest::header::CONTENT_TYPE],
            "application/json"
        );
        let bytes = prepared.request().body().and_then(|b| b.as_bytes()).unwrap();
        let sent: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(sent, body);
    }
}
