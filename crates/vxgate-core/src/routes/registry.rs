//! The ordered route registry.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use super::builtin::vertex_route_specs;
use super::descriptor::{RouteDescriptor, RouteSpec};
use super::{RegistryError, strip_query};
use crate::pattern::ExtractedParams;

/// A successful match: the route and the parameters captured from the URL.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteDescriptor,
    pub params: ExtractedParams,
}

/// Ordered, immutable list of routes. Safe to share across requests.
#[derive(Debug, Clone)]
pub struct RouteRegistry {
    routes: Vec<RouteDescriptor>,
}

impl RouteRegistry {
    /// Compile a registry from specs, keeping their order.
    pub fn from_specs(specs: &[RouteSpec]) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(RegistryError::DuplicateName(spec.name.clone()));
            }
            let route = RouteDescriptor::from_spec(spec)?;
            debug!(
                route = %route.name(),
                params = ?route.pattern().params(),
                streaming = route.is_streaming(),
                "Compiled route"
            );
            routes.push(route);
        }
        Ok(Self { routes })
    }

    /// The built-in Vertex AI registry.
    pub fn vertex_defaults() -> Result<Self, RegistryError> {
        Self::from_specs(&vertex_route_specs())
    }

    /// Parse a registry from a JSON array of route specs.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let specs: Vec<RouteSpec> = serde_json::from_str(json)?;
        Self::from_specs(&specs)
    }

    /// Load a registry from a JSON routes file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        let registry = Self::from_json_str(&json)?;
        info!(path = %path.display(), routes = registry.len(), "Loaded routes file");
        Ok(registry)
    }

    /// Find the first route matching `url`.
    ///
    /// Any query string or fragment is ignored.
    #[must_use]
    pub fn find(&self, url: &str) -> Option<RouteMatch<'_>> {
        let url = strip_query(url);
        self.routes.iter().find_map(|route| {
            route
                .pattern()
                .extract(url)
                .map(|params| RouteMatch { route, params })
        })
    }

    /// Look up a route by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Single alternation regex matching every route, in registry order.
    ///
    /// This is the pattern the browser shim uses to decide which calls to
    /// redirect to the gateway. Alternatives carry no capture groups, so
    /// routes sharing placeholder names combine cleanly.
    #[must_use]
    pub fn shim_pattern(&self) -> String {
        self.routes
            .iter()
            .map(|r| r.pattern().as_unnamed_regex_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}
