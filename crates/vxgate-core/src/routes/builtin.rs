//! The built-in Vertex AI route table.

use super::RouteSpec;
use crate::stream::StreamTransform;

const MODELS_PATTERN: &str =
    "https://aiplatform.googleapis.com/{{version}}/publishers/google/models/{{model}}";
const MODELS_ENDPOINT: &str = "https://aiplatform.clients6.google.com/{{version}}/projects/{{context.project_id}}/locations/{{context.region}}/publishers/google/models/{{model}}";

const ENGINES_PATTERN: &str = "https://{{endpoint_location}}-aiplatform.googleapis.com/{{version}}/projects/{{project_id}}/locations/{{location_id}}/reasoningEngines/{{engine_id}}";
const ENGINES_ENDPOINT: &str = "https://{{endpoint_location}}-aiplatform.clients6.google.com/v1beta1/projects/{{project_id}}/locations/{{location_id}}/reasoningEngines/{{engine_id}}";

fn route(
    name: &str,
    (pattern, endpoint): (&str, &str),
    method: &str,
    streaming: bool,
    transform: StreamTransform,
) -> RouteSpec {
    RouteSpec {
        name: name.to_string(),
        pattern: format!("{pattern}:{method}"),
        endpoint: format!("{endpoint}:{method}"),
        streaming,
        transform,
    }
}

/// The five Vertex AI shapes, in match order.
#[must_use]
pub fn vertex_route_specs() -> Vec<RouteSpec> {
    let models = (MODELS_PATTERN, MODELS_ENDPOINT);
    let engines = (ENGINES_PATTERN, ENGINES_ENDPOINT);
    vec![
        route(
            "VertexGenAi:generateContent",
            models,
            "generateContent",
            false,
            StreamTransform::Passthrough,
        ),
        route(
            "VertexGenAi:predict",
            models,
            "predict",
            false,
            StreamTransform::Passthrough,
        ),
        route(
            "VertexGenAi:streamGenerateContent",
            models,
            "streamGenerateContent",
            true,
            StreamTransform::JsonArray,
        ),
        route(
            "ReasoningEngine:query",
            engines,
            "query",
            false,
            StreamTransform::Passthrough,
        ),
        route(
            "ReasoningEngine:streamQuery",
            engines,
            "streamQuery",
            true,
            StreamTransform::Passthrough,
        ),
    ]
}
