//! Route table construction and lookup.

use std::fmt;

use hermes_config::GatewayConfig;
use hermes_core::CallDescription;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GatewayError, GatewayResult};

/// One gateway route: requests under `prefix` go to the service owning
/// `namespace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRoute {
    /// Literal path prefix, always starting with `/`.
    pub prefix: String,
    /// Namespace of the call that claimed the prefix.
    pub namespace: String,
    /// Name of the call that claimed the prefix.
    pub name: String,
}

impl GatewayRoute {
    /// Returns `true` if `path` lies under this route's prefix.
    ///
    /// Prefixes match whole segments: `/api/files` covers `/api/files` and
    /// `/api/files/1`, not `/api/filesystem`.
    #[must_use]
    pub fn covers(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// A prefix claimed by calls of two namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixConflict {
    /// The contested prefix.
    pub prefix: String,
    /// `namespace.name` of the call that keeps it.
    pub kept: String,
    /// `namespace.name` of the call that was dropped.
    pub dropped: String,
}

impl fmt::Display for PrefixConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prefix {} is claimed by {} and {}; {} wins",
            self.prefix, self.kept, self.dropped, self.kept
        )
    }
}

/// The gateway routing table.
///
/// Serialized as `{"routes": [{"prefix", "namespace", "name"}]}` for the
/// reverse proxy. Conflicts found while building are kept in memory only.
///
/// # Example
///
/// ```
/// use hermes_gateway::{GatewayRoute, GatewayRouteTable};
///
/// let table = GatewayRouteTable::from_routes(vec![
///     GatewayRoute { prefix: "/api/files".into(), namespace: "files".into(), name: "get".into() },
///     GatewayRoute { prefix: "/api/files/stats".into(), namespace: "files.stats".into(), name: "usage".into() },
/// ]).unwrap();
///
/// assert_eq!(table.resolve("/api/files/stats/usage").unwrap().namespace, "files.stats");
/// assert_eq!(table.resolve("/api/files/42").unwrap().namespace, "files");
/// assert!(table.resolve("/api/projects").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRouteTable {
    routes: Vec<GatewayRoute>,
    #[serde(skip)]
    warnings: Vec<PrefixConflict>,
}

impl GatewayRouteTable {
    /// Creates a table from routes, rejecting relative prefixes.
    pub fn from_routes(routes: Vec<GatewayRoute>) -> GatewayResult<Self> {
        if let Some(route) = routes.iter().find(|r| !r.prefix.starts_with('/')) {
            return Err(GatewayError::InvalidPrefix {
                prefix: route.prefix.clone(),
            });
        }
        Ok(Self {
            routes,
            warnings: Vec::new(),
        })
    }

    /// Routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[GatewayRoute] {
        &self.routes
    }

    /// Prefix conflicts found while building.
    #[must_use]
    pub fn warnings(&self) -> &[PrefixConflict] {
        &self.warnings
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Finds the route with the longest prefix covering `path`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&GatewayRoute> {
        self.routes
            .iter()
            .filter(|route| route.covers(path))
            .max_by_key(|route| route.prefix.len())
    }

    /// Serializes the table for the reverse proxy.
    pub fn to_json(&self) -> GatewayResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a table exported by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> GatewayResult<Self> {
        let table: Self = serde_json::from_str(json)?;
        Self::from_routes(table.routes)
    }
}

/// Builds a [`GatewayRouteTable`] from call descriptions.
///
/// Only calls marked `proxy_to_gateway` are routed. Each contributes the
/// literal prefix of its template (the segments before the first
/// placeholder). Calls of one namespace may share a prefix; when calls of
/// different namespaces claim the same prefix, the first one keeps it and a
/// [`PrefixConflict`] is logged and recorded.
#[derive(Debug, Clone)]
pub struct GatewayTableBuilder {
    enabled: bool,
    base_path: String,
}

impl Default for GatewayTableBuilder {
    fn default() -> Self {
        Self {
            enabled: true,
            base_path: "/".to_string(),
        }
    }
}

impl GatewayTableBuilder {
    /// Creates a builder that mounts routes at `/`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from the `gateway` configuration section.
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        let builder = Self {
            enabled: config.enabled,
            ..Self::default()
        };
        builder.with_base_path(config.base_path.clone())
    }

    /// Mounts every prefix under `base_path` (e.g. `/edge`).
    ///
    /// Fails with [`GatewayError::InvalidPrefix`] unless `base_path` starts
    /// with `/`.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> GatewayResult<Self> {
        let base_path = base_path.into();
        if !base_path.starts_with('/') {
            return Err(GatewayError::InvalidPrefix { prefix: base_path });
        }
        self.base_path = base_path;
        Ok(self)
    }

    /// Builds the table. A disabled gateway yields an empty table.
    pub fn build<'a, I>(&self, descriptions: I) -> GatewayRouteTable
    where
        I: IntoIterator<Item = &'a CallDescription>,
    {
        let mut table = GatewayRouteTable::default();
        if !self.enabled {
            info!("gateway disabled, route table left empty");
            return table;
        }

        for description in descriptions {
            if !description.proxy_to_gateway() {
                debug!(call = %description.full_name(), "not proxied from gateway");
                continue;
            }

            let prefix = self.mount(&description.literal_prefix());
            match table.routes.iter().find(|r| r.prefix == prefix) {
                None => table.routes.push(GatewayRoute {
                    prefix,
                    namespace: description.namespace().to_string(),
                    name: description.name().to_string(),
                }),
                Some(existing) if existing.namespace == description.namespace() => {}
                Some(existing) => {
                    let conflict = PrefixConflict {
                        prefix,
                        kept: format!("{}.{}", existing.namespace, existing.name),
                        dropped: description.full_name(),
                    };
                    warn!(conflict = %conflict, "gateway prefix conflict");
                    table.warnings.push(conflict);
                }
            }
        }

        info!(
            routes = table.routes.len(),
            conflicts = table.warnings.len(),
            "gateway route table built"
        );
        table
    }

    fn mount(&self, prefix: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        if base.is_empty() {
            return prefix.to_string();
        }
        if prefix == "/" {
            return base.to_string();
        }
        format!("{base}{prefix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(prefix: &str, namespace: &str) -> GatewayRoute {
        GatewayRoute {
            prefix: prefix.to_string(),
            namespace: namespace.to_string(),
            name: "call".to_string(),
        }
    }

    #[test]
    fn test_prefix_matches_whole_segments() {
        let files = route("/api/files", "files");
        assert!(files.covers("/api/files"));
        assert!(files.covers("/api/files/1"));
        assert!(!files.covers("/api/filesystem"));
        assert!(!files.covers("/api"));
        assert!(route("/", "root").covers("/anything"));
    }

    #[test]
    fn test_relative_prefix_is_rejected() {
        let err = GatewayRouteTable::from_routes(vec![route("api", "files")]).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidPrefix { .. }));
    }

    #[test]
    fn test_mount_under_base_path() {
        let builder = GatewayTableBuilder::new().with_base_path("/edge/").unwrap();
        assert_eq!(builder.mount("/api/files"), "/edge/api/files");
        assert_eq!(builder.mount("/"), "/edge");
        assert_eq!(GatewayTableBuilder::new().mount("/api"), "/api");
    }

    #[test]
    fn test_relative_base_path_is_rejected() {
        for base in ["edge", "", "edge/"] {
            let err = GatewayTableBuilder::new().with_base_path(base).unwrap_err();
            assert!(matches!(err, GatewayError::InvalidPrefix { prefix } if prefix == base));
        }
    }
}
