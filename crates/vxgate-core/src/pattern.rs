//! URL template compilation and parameter extraction.
//!
//! A template is literal text interleaved with `{{name}}` placeholders.
//! Each placeholder matches one non-empty segment that contains no `/`.
//! Literal text is escaped so characters such as `.`, `?` or `:` match
//! themselves.

use std::collections::BTreeMap;

use regex::Regex;
use thiserror::Error;

/// Regex fragment a placeholder expands to.
const PARAM_CLASS: &str = "[^/]+";

/// Characters that carry meaning in pattern syntax and must be escaped.
///
/// Escaping any of these is valid in both Rust `regex` and JavaScript
/// `RegExp`.
const META_CHARS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Errors produced while compiling a template.
#[derive(Debug, Error)]
pub enum PatternError {
    /// `{{}}` with nothing inside.
    #[error("Empty placeholder in template '{template}'")]
    EmptyPlaceholder { template: String },

    /// Placeholder name is not an identifier.
    #[error("Invalid placeholder name '{name}' in template '{template}'")]
    InvalidName { name: String, template: String },

    /// The same placeholder name appears twice.
    #[error("Duplicate placeholder '{name}' in template '{template}'")]
    DuplicatePlaceholder { name: String, template: String },

    /// Two placeholders with no literal text between them.
    #[error("Placeholders '{first}' and '{second}' are adjacent in template '{template}'")]
    AdjacentPlaceholders {
        first: String,
        second: String,
        template: String,
    },

    /// Endpoint template refers to an unknown `context.*` field.
    #[error("Unknown context field '{field}' in template '{template}'")]
    UnknownContextField { field: String, template: String },

    /// No value available for a placeholder while rendering.
    #[error("No value for placeholder '{0}'")]
    MissingValue(String),

    /// The generated regex failed to build.
    #[error("Pattern compilation failed: {0}")]
    Regex(#[from] regex::Error),
}

/// One piece of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split a template into literal and placeholder segments.
///
/// The closing `}}` is the first one after the opening `{{`. An opening
/// `{{` with no closing `}}` stays literal text.
pub(crate) fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        if open > 0 {
            out.push(Segment::Literal(&rest[..open]));
        }
        out.push(Segment::Placeholder(&after_open[..close]));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    out
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Escape literal text for use inside a pattern.
pub(crate) fn escape_literal(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if META_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A compiled URL template.
///
/// Holds the placeholder names in order of appearance and an anchored regex
/// with one named group per placeholder. A second, group-free source is kept
/// for export, since several patterns reuse the same placeholder names.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    params: Vec<String>,
    regex: Regex,
    unnamed: String,
}

impl CompiledPattern {
    /// Compile a template.
    ///
    /// Rejects empty or non-identifier placeholder names, duplicate names,
    /// and placeholders that directly follow one another.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let mut params: Vec<String> = Vec::new();
        let mut source = String::from("^");
        let mut unnamed = String::from("^");
        let mut previous: Option<&str> = None;

        for segment in segments(template) {
            match segment {
                Segment::Literal(text) => {
                    let escaped = escape_literal(text);
                    source.push_str(&escaped);
                    unnamed.push_str(&escaped);
                    previous = None;
                }
                Segment::Placeholder(name) => {
                    validate_name(name, template)?;
                    if let Some(first) = previous {
                        return Err(PatternError::AdjacentPlaceholders {
                            first: first.to_string(),
                            second: name.to_string(),
                            template: template.to_string(),
                        });
                    }
                    if params.iter().any(|p| p == name) {
                        return Err(PatternError::DuplicatePlaceholder {
                            name: name.to_string(),
                            template: template.to_string(),
                        });
                    }
                    source.push_str(&format!("(?<{name}>{PARAM_CLASS})"));
                    unnamed.push_str(PARAM_CLASS);
                    params.push(name.to_string());
                    previous = Some(name);
                }
            }
        }
        source.push('$');
        unnamed.push('$');

        Ok(Self {
            template: template.to_string(),
            params,
            regex: Regex::new(&source)?,
            unnamed,
        })
    }

    /// Template text as written.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order of appearance.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// The anchored regex source, e.g. `^https://a\.b/(?<id>[^/]+)$`.
    #[must_use]
    pub fn as_regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// The same anchored regex with no capture groups, e.g.
    /// `^https://a\.b/[^/]+$`. Safe to combine with other patterns in one
    /// alternation.
    #[must_use]
    pub fn as_unnamed_regex_str(&self) -> &str {
        &self.unnamed
    }

    /// Match `url` and extract every declared placeholder.
    ///
    /// Returns `None` when the URL does not match, or when any placeholder
    /// failed to capture.
    #[must_use]
    pub fn extract(&self, url: &str) -> Option<ExtractedParams> {
        let captures = self.regex.captures(url)?;
        let mut values = BTreeMap::new();
        for name in &self.params {
            let value = captures.name(name)?;
            values.insert(name.clone(), value.as_str().to_string());
        }
        Some(ExtractedParams(values))
    }

    /// Returns true if `url` matches this pattern.
    #[must_use]
    pub fn is_match(&self, url: &str) -> bool {
        self.extract(url).is_some()
    }
}

fn validate_name(name: &str, template: &str) -> Result<(), PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyPlaceholder {
            template: template.to_string(),
        });
    }
    if !is_identifier(name) {
        return Err(PatternError::InvalidName {
            name: name.to_string(),
            template: template.to_string(),
        });
    }
    Ok(())
}

/// Parameter values captured from a matched URL, keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedParams(BTreeMap<String, String>);

impl ExtractedParams {
    /// Value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtractedParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
