//! Route registry and matcher.
//!
//! The registry is an ordered list of upstream API shapes compiled once at
//! startup. Matching walks it in order and the first route whose pattern
//! accepts the URL wins; only the URL shape is considered, never the method
//! or headers.

mod builtin;
mod descriptor;
mod registry;

use thiserror::Error;

use crate::pattern::PatternError;

pub use builtin::vertex_route_specs;
pub use descriptor::{RouteDescriptor, RouteSpec};
pub use registry::{RouteMatch, RouteRegistry};

/// Errors building or loading a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A route's pattern or endpoint template is invalid.
    #[error("Route '{route}': {source}")]
    Pattern {
        route: String,
        #[source]
        source: PatternError,
    },

    /// Two routes share a name.
    #[error("Duplicate route name '{0}'")]
    DuplicateName(String),

    /// The endpoint needs a parameter the pattern never captures.
    #[error("Route '{route}': endpoint uses '{param}' which the pattern does not capture")]
    UnboundEndpointParam { route: String, param: String },

    /// A re-framing transform on a route that does not stream.
    #[error("Route '{0}': transform requires a streaming route")]
    TransformWithoutStreaming(String),

    /// Route name is empty.
    #[error("Route name cannot be empty")]
    EmptyName,

    /// Reading a routes file failed.
    #[error("Failed to read routes file: {0}")]
    Io(#[from] std::io::Error),

    /// A routes file is not valid JSON for `[RouteSpec]`.
    #[error("Invalid routes file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Drop the query string and fragment from a URL before matching.
#[must_use]
pub fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
