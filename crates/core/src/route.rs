//! Route groups and the mount table.
//!
//! A [`RouteGroup`] pairs framework-specific routes (`R`) with a manifest of
//! the endpoints they serve. The manifest is what the bootstrap layer reasons
//! about: prefix uniqueness and the final list of mounted endpoints.

use std::fmt;

use crate::error::{BootstrapError, BootstrapResult};

/// HTTP method of a declared endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single method/path pair, path relative to its group prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
}

impl Endpoint {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: normalize_path(&path.into()),
        }
    }

    /// Prefix this endpoint with a parent path.
    pub fn under(&self, prefix: &str) -> Self {
        Self {
            method: self.method,
            path: join(prefix, &self.path),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Everything about a route group except the routes themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteManifest {
    pub prefix: String,
    pub tags: Vec<String>,
    pub endpoints: Vec<Endpoint>,
}

impl RouteManifest {
    /// Endpoints with the group prefix applied.
    pub fn absolute_endpoints(&self) -> impl Iterator<Item = Endpoint> + '_ {
        self.endpoints.iter().map(|e| e.under(&self.prefix))
    }
}

/// A prefix plus a tagged collection of handlers, ready to be mounted.
#[derive(Debug, Clone)]
pub struct RouteGroup<R> {
    manifest: RouteManifest,
    routes: R,
}

impl<R> RouteGroup<R> {
    pub fn new(prefix: impl Into<String>, routes: R) -> Self {
        Self {
            manifest: RouteManifest {
                prefix: normalize_path(&prefix.into()),
                tags: Vec::new(),
                endpoints: Vec::new(),
            },
            routes,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.manifest.tags.contains(&tag) {
            self.manifest.tags.push(tag);
        }
        self
    }

    /// Declare an endpoint served by `routes`, relative to the prefix.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.manifest.endpoints.push(endpoint);
        self
    }

    /// Declare every endpoint of a child group nested under `child_prefix`.
    pub fn with_endpoints_under(mut self, child_prefix: &str, endpoints: &[Endpoint]) -> Self {
        self.manifest
            .endpoints
            .extend(endpoints.iter().map(|e| e.under(child_prefix)));
        self
    }

    pub fn prefix(&self) -> &str {
        &self.manifest.prefix
    }

    pub fn manifest(&self) -> &RouteManifest {
        &self.manifest
    }

    pub fn routes(&self) -> &R {
        &self.routes
    }

    pub fn into_parts(self) -> (RouteManifest, R) {
        (self.manifest, self.routes)
    }
}

/// Record of every mounted group, keyed by prefix.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    groups: Vec<RouteManifest>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a group; a prefix may only be mounted once.
    pub fn mount(&mut self, manifest: RouteManifest) -> BootstrapResult<()> {
        if self.is_mounted(&manifest.prefix) {
            return Err(BootstrapError::routing_conflict(manifest.prefix));
        }
        self.groups.push(manifest);
        Ok(())
    }

    pub fn is_mounted(&self, prefix: &str) -> bool {
        self.groups.iter().any(|g| g.prefix == prefix)
    }

    pub fn groups(&self) -> &[RouteManifest] {
        &self.groups
    }

    /// All mounted endpoints with absolute paths, in mount order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.groups
            .iter()
            .flat_map(|g| g.absolute_endpoints())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Leading slash, no trailing slash (except for the root).
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn join(prefix: &str, path: &str) -> String {
    match (prefix, path) {
        ("/", p) => p.to_string(),
        (p, "/") => p.to_string(),
        (p, q) => format!("{p}{q}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_normalized() {
        assert_eq!(normalize_path("api/v1/"), "/api/v1");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(Endpoint::new(Method::Get, "health").path, "/health");
    }

    #[test]
    fn nested_endpoints_carry_every_prefix() {
        let billing = [Endpoint::new(Method::Get, "/operations-history")];
        let group = RouteGroup::new("/api/v1", ())
            .with_tag("v1")
            .with_endpoints_under("/billing", &billing);

        let all: Vec<String> = group
            .manifest()
            .absolute_endpoints()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(all, vec!["GET /api/v1/billing/operations-history"]);
    }

    #[test]
    fn duplicate_prefix_is_a_conflict() {
        let mut table = RouteTable::new();
        let (first, ()) = RouteGroup::new("/api/v1", ()).into_parts();
        let (second, ()) = RouteGroup::new("api/v1/", ()).into_parts();

        table.mount(first).unwrap();
        let err = table.mount(second).unwrap_err();
        assert!(matches!(err, BootstrapError::RoutingConflict { ref prefix } if prefix == "/api/v1"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn root_prefix_joins_cleanly() {
        let e = Endpoint::new(Method::Post, "/items");
        assert_eq!(e.under("/").path, "/items");
        assert_eq!(Endpoint::new(Method::Get, "/").under("/system").path, "/system");
    }
}
