//! Path template matching.
//!
//! # Responsibilities
//! - Match a request path against a route template segment by segment
//! - Extract `:name` segments as path parameters
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A trailing slash is significant only for the root template
//! - `.` and `..` (raw or percent-encoded) never bind to a parameter, so a
//!   substituted target cannot climb out of its backend prefix
//! - No regex to guarantee O(n) matching

use std::fmt;

use crate::gateway::PathParams;

/// Given a route template and a request path, yields the parameters.
///
/// This is the only piece a router adapter has to provide for route
/// enrichment; any router with its own extraction can implement it.
pub trait ParamExtractor: Send + Sync + fmt::Debug {
    /// Template the extractor was built from.
    fn template(&self) -> &str;

    /// Returns `None` when `path` does not match the template.
    fn extract(&self, path: &str) -> Option<PathParams>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// `/products/:id` style template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    template: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let segments = split(&template)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(segment.to_string()),
            })
            .collect();
        Self { template, segments }
    }

    /// Number of `:name` segments.
    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Param(_)))
            .count()
    }
}

impl ParamExtractor for PathTemplate {
    fn template(&self) -> &str {
        &self.template
    }

    fn extract(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut parts = split(path);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() || is_dot_segment(part) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.split('/').filter(|segment| !segment.is_empty())
}

fn is_dot_segment(part: &str) -> bool {
    let decoded = part.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}
