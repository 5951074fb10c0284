//! Route descriptors and their serializable specs.

use serde::{Deserialize, Serialize};

use super::RegistryError;
use crate::config::DeploymentContext;
use crate::endpoint::EndpointTemplate;
use crate::pattern::{CompiledPattern, ExtractedParams, PatternError};
use crate::stream::StreamTransform;

/// Static description of one upstream API shape, as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Unique route name, e.g. `VertexGenAi:generateContent`.
    pub name: String,
    /// Inbound URL template with `{{name}}` placeholders.
    pub pattern: String,
    /// Upstream URL template; may also use `{{context.project_id}}` and
    /// `{{context.region}}`.
    pub endpoint: String,
    /// Whether the upstream response is streamed.
    #[serde(default)]
    pub streaming: bool,
    /// How a streamed body is relayed.
    #[serde(default)]
    pub transform: StreamTransform,
}

/// A compiled, validated route. Immutable after construction.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    name: String,
    pattern: CompiledPattern,
    endpoint: EndpointTemplate,
    streaming: bool,
    transform: StreamTransform,
}

impl RouteDescriptor {
    /// Compile and validate a spec.
    pub fn from_spec(spec: &RouteSpec) -> Result<Self, RegistryError> {
        if spec.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let wrap = |source: PatternError| RegistryError::Pattern {
            route: spec.name.clone(),
            source,
        };

        let pattern = CompiledPattern::compile(&spec.pattern).map_err(wrap)?;
        let endpoint = EndpointTemplate::parse(&spec.endpoint).map_err(wrap)?;

        if let Some(param) = endpoint
            .params()
            .find(|param| !pattern.params().iter().any(|p| p == param))
        {
            return Err(RegistryError::UnboundEndpointParam {
                route: spec.name.clone(),
                param: param.to_string(),
            });
        }
        if spec.transform.is_reframing() && !spec.streaming {
            return Err(RegistryError::TransformWithoutStreaming(spec.name.clone()));
        }

        Ok(Self {
            name: spec.name.clone(),
            pattern,
            endpoint,
            streaming: spec.streaming,
            transform: spec.transform,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    #[must_use]
    pub const fn endpoint(&self) -> &EndpointTemplate {
        &self.endpoint
    }

    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Transform applied to streamed bodies. Always `Passthrough` for
    /// non-streaming routes.
    #[must_use]
    pub const fn transform(&self) -> StreamTransform {
        self.transform
    }

    /// Build the concrete upstream URL for a matched request.
    pub fn resolve_endpoint(
        &self,
        context: &DeploymentContext,
        params: &ExtractedParams,
    ) -> Result<String, PatternError> {
        self.endpoint.resolve(context, params)
    }

    /// Convert back to a [`RouteSpec`].
    #[must_use]
    pub fn to_spec(&self) -> RouteSpec {
        RouteSpec {
            name: self.name.clone(),
            pattern: self.pattern.template().to_string(),
            endpoint: self.endpoint.template().to_string(),
            streaming: self.streaming,
            transform: self.transform,
        }
    }
}
