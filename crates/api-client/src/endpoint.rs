//! Endpoint definitions registered on an `ApiClient`.

use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Whether an endpoint reads (and may provide cache tags) or writes (and may
/// invalidate them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Query,
    Mutation,
}

/// One segment of an endpoint path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
}

/// Request definition for a named endpoint.
///
/// Paths are relative to the client's base URL. A whole segment written as
/// `{name}` is a placeholder filled from the parameters passed when the
/// request is prepared, e.g. `/users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDefinition {
    kind: EndpointKind,
    method: Method,
    path: String,
    provides: Vec<String>,
    invalidates: Vec<String>,
}

impl EndpointDefinition {
    /// A `GET` query.
    pub fn query(path: impl Into<String>) -> Self {
        Self::new(EndpointKind::Query, Method::GET, path)
    }

    /// A mutation sent with `method`.
    pub fn mutation(method: Method, path: impl Into<String>) -> Self {
        Self::new(EndpointKind::Mutation, method, path)
    }

    fn new(kind: EndpointKind, method: Method, path: impl Into<String>) -> Self {
        Self {
            kind,
            method,
            path: path.into(),
            provides: Vec::new(),
            invalidates: Vec::new(),
        }
    }

    /// Marks cached results of this endpoint with `tag`.
    pub fn provides(mut self, tag: impl Into<String>) -> Self {
        self.provides.push(tag.into());
        self
    }

    /// Marks `tag` stale once this endpoint succeeds.
    pub fn invalidates(mut self, tag: impl Into<String>) -> Self {
        self.invalidates.push(tag.into());
        self
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn provided_tags(&self) -> &[String] {
        &self.provides
    }

    pub fn invalidated_tags(&self) -> &[String] {
        &self.invalidates
    }

    /// All tags referenced by this endpoint.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.provides
            .iter()
            .chain(self.invalidates.iter())
            .map(String::as_str)
    }

    /// Names of the `{param}` placeholders in the path, in order.
    pub fn path_params(&self) -> impl Iterator<Item = &str> {
        self.segments().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name),
            Segment::Literal(_) => None,
        })
    }

    pub(crate) fn segments(&self) -> impl Iterator<Item = Segment<'_>> {
        self.path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                match segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                {
                    Some(name) if !name.is_empty() => Segment::Param(name),
                    _ => Segment::Literal(segment),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_to_get() {
        let endpoint = EndpointDefinition::query("/api/health");
        assert_eq!(endpoint.kind(), EndpointKind::Query);
        assert_eq!(*endpoint.method(), Method::GET);
        assert_eq!(endpoint.path(), "/api/health");
    }

    #[test]
    fn collects_tags() {
        let endpoint = EndpointDefinition::mutation(Method::PUT, "/api/users/profile")
            .provides("User")
            .invalidates("Session");
        assert_eq!(endpoint.provided_tags(), ["User".to_string()]);
        assert_eq!(endpoint.invalidated_tags(), ["Session".to_string()]);
        assert_eq!(endpoint.tags().collect::<Vec<_>>(), ["User", "Session"]);
    }

    #[test]
    fn splits_path_into_segments() {
        let endpoint = EndpointDefinition::query("/api/users/{id}/posts/{post}/");
        let segments: Vec<_> = endpoint.segments().collect();
        assert_eq!(
            segments,
            [
                Segment::Literal("api"),
                Segment::Literal("users"),
                Segment::Param("id"),
                Segment::Literal("posts"),
                Segment::Param("post"),
            ]
        );
        assert_eq!(endpoint.path_params().collect::<Vec<_>>(), ["id", "post"]);
    }

    #[test]
    fn empty_braces_are_literal() {
        let endpoint = EndpointDefinition::query("/odd/{}");
        assert_eq!(endpoint.path_params().count(), 0);
    }
}
