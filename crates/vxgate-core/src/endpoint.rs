//! Upstream endpoint templates.
//!
//! Endpoint templates use the same `{{name}}` grammar as route patterns.
//! A placeholder is either a parameter captured from the inbound URL or a
//! deployment field written as `{{context.project_id}}` / `{{context.region}}`.

use crate::config::DeploymentContext;
use crate::pattern::{ExtractedParams, PatternError, Segment, is_identifier, segments};

const CONTEXT_PREFIX: &str = "context.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextField {
    ProjectId,
    Region,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param(String),
    Context(ContextField),
}

/// A parsed endpoint template, rendered once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    template: String,
    parts: Vec<Part>,
}

impl EndpointTemplate {
    /// Parse an endpoint template.
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        let mut parts = Vec::new();
        for segment in segments(template) {
            let part = match segment {
                Segment::Literal(text) => Part::Literal(text.to_string()),
                Segment::Placeholder("") => {
                    return Err(PatternError::EmptyPlaceholder {
                        template: template.to_string(),
                    });
                }
                Segment::Placeholder(name) => {
                    if let Some(field) = name.strip_prefix(CONTEXT_PREFIX) {
                        Part::Context(match field {
                            "project_id" => ContextField::ProjectId,
                            "region" => ContextField::Region,
                            other => {
                                return Err(PatternError::UnknownContextField {
                                    field: other.to_string(),
                                    template: template.to_string(),
                                });
                            }
                        })
                    } else if is_identifier(name) {
                        Part::Param(name.to_string())
                    } else {
                        return Err(PatternError::InvalidName {
                            name: name.to_string(),
                            template: template.to_string(),
                        });
                    }
                }
            };
            parts.push(part);
        }

        Ok(Self {
            template: template.to_string(),
            parts,
        })
    }

    /// Template text as written.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Names of the inbound URL parameters this template needs.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Param(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Render the concrete upstream URL.
    pub fn resolve(
        &self,
        context: &DeploymentContext,
        params: &ExtractedParams,
    ) -> Result<String, PatternError> {
        let mut url = String::with_capacity(self.template.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => url.push_str(text),
                Part::Param(name) => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| PatternError::MissingValue(name.clone()))?;
                    url.push_str(value);
                }
                Part::Context(ContextField::ProjectId) => url.push_str(&context.project_id),
                Part::Context(ContextField::Region) => url.push_str(&context.region),
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> DeploymentContext {
        DeploymentContext::new("my-project", "europe-west4")
    }

    #[test]
    fn test_resolve_mixes_context_and_params() {
        let template = EndpointTemplate::parse(
            "https://api.test/{{version}}/projects/{{context.project_id}}/locations/{{context.region}}/models/{{model}}:predict",
        )
        .unwrap();
        let params: ExtractedParams = [("version", "v1"), ("model", "gemini")].into_iter().collect();

        assert_eq!(
            template.resolve(&context(), &params).unwrap(),
            "https://api.test/v1/projects/my-project/locations/europe-west4/models/gemini:predict"
        );
    }

    #[test]
    fn test_params_lists_only_url_parameters() {
        let template =
            EndpointTemplate::parse("https://{{loc}}-api.test/{{context.region}}/{{id}}").unwrap();
        assert_eq!(template.params().collect::<Vec<_>>(), vec!["loc", "id"]);
    }

    #[test]
    fn test_missing_param_is_an_error() {
        let template = EndpointTemplate::parse("https://api.test/{{id}}").unwrap();
        let err = template
            .resolve(&context(), &ExtractedParams::default())
            .unwrap_err();
        assert!(matches!(err, PatternError::MissingValue(name) if name == "id"));
    }

    #[test]
    fn test_unknown_context_field_rejected() {
        let err = EndpointTemplate::parse("https://api.test/{{context.zone}}").unwrap_err();
        assert!(matches!(err, PatternError::UnknownContextField { .. }));
    }

    #[test]
    fn test_template_without_placeholders() {
        let template = EndpointTemplate::parse("https://api.test/static").unwrap();
        assert_eq!(
            template
                .resolve(&context(), &ExtractedParams::default())
                .unwrap(),
            "https://api.test/static"
        );
    }
}
