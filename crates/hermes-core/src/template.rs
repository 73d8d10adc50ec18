//! Path templates.
//!
//! A call's path is a sequence of literal segments and placeholders, each
//! placeholder naming the request field it fills. The router matches on the
//! same segments, so this module is the one place templates are parsed.

use http::Method;
use thiserror::Error;

/// The verbs a call may be bound to, in `Allow` header order.
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Literal segment that must match exactly (case-sensitive)
    Literal(String),
    /// Placeholder consuming exactly one path component
    Param(String),
}

impl PathSegment {
    /// Returns `true` for placeholder segments.
    #[must_use]
    pub fn is_param(&self) -> bool {
        matches!(self, Self::Param(_))
    }
}

/// A template that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path template '{template}': {reason}")]
pub struct TemplateError {
    /// The offending template.
    pub template: String,
    /// What is wrong with it.
    pub reason: String,
}

/// Parses a template such as `/api/files/{id}/stats` into segments.
///
/// Empty components are skipped, so `/a//b/` and `/a/b` are the same
/// template. Placeholder names must be non-empty, made of ASCII
/// alphanumerics or `_`, and unique within the template.
pub fn parse_template(template: &str) -> Result<Vec<PathSegment>, TemplateError> {
    let invalid = |reason: String| TemplateError {
        template: template.to_string(),
        reason,
    };

    let mut segments = Vec::new();
    for raw in template.split('/').filter(|s| !s.is_empty()) {
        if let Some(name) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid(format!("bad placeholder name '{name}'")));
            }
            if segments
                .iter()
                .any(|s| matches!(s, PathSegment::Param(existing) if existing == name))
            {
                return Err(invalid(format!("placeholder '{name}' appears twice")));
            }
            segments.push(PathSegment::Param(name.to_string()));
        } else if raw.contains('{') || raw.contains('}') {
            return Err(invalid(format!("placeholder must span a whole segment: '{raw}'")));
        } else {
            segments.push(PathSegment::Literal(raw.to_string()));
        }
    }
    Ok(segments)
}
