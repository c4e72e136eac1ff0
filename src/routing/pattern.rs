//! Route pattern compilation and structural matching.
//!
//! # Responsibilities
//! - Split a pattern on `/` into literal, parameter and regex segments
//! - Compute the literal prefix used for coarse dispatch
//! - Match a request path against the compiled segments and bind values
//!
//! # Grammar
//! ```text
//! /v1/customer/:id          literal, literal, param "id"
//! /reg/{[0-9]}              literal, regex bound under its position ("1")
//! /files/{name:[a-z]+\.txt} literal, regex bound under "name"
//! ```
//!
//! # Design Decisions
//! - Regex segments are anchored, so they must match the whole component
//! - Duplicate parameter names are rejected instead of overwriting
//! - No normalization: `/a/` and `/a` are different patterns
//! - Paths are split on `/` first, then each component is percent-decoded
//!   before it is compared or bound, so `%2F` never creates a segment

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use percent_encoding::percent_decode_str;
use regex::Regex;
use thiserror::Error;

/// Error raised when a route pattern cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern {0:?} has no segments")]
    Empty(String),

    #[error("pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    #[error("pattern {pattern:?}: unterminated regex segment {segment:?}")]
    UnterminatedRegex { pattern: String, segment: String },

    #[error("pattern {pattern:?}: invalid regex {expr:?}: {reason}")]
    InvalidRegex {
        pattern: String,
        expr: String,
        reason: String,
    },

    #[error("pattern {0:?}: parameter with empty name")]
    EmptyParamName(String),

    #[error("pattern {pattern:?}: duplicate parameter {name:?}")]
    DuplicateParam { pattern: String, name: String },
}

/// One `/`-delimited unit of a compiled pattern.
#[derive(Debug, Clone)]
pub enum Segment {
    Literal(String),
    Param(String),
    Regex { name: String, regex: Regex },
}

impl Segment {
    /// Binding name for dynamic segments.
    pub fn name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param(name) | Segment::Regex { name, .. } => Some(name),
        }
    }

    fn is_dynamic(&self) -> bool {
        !matches!(self, Segment::Literal(_))
    }

    fn accepts(&self, component: &str) -> bool {
        match self {
            Segment::Literal(text) => text == component,
            Segment::Param(_) => !component.is_empty(),
            Segment::Regex { regex, .. } => regex.is_match(component),
        }
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Param(a), Segment::Param(b)) => a == b,
            (
                Segment::Regex { name: a, regex: ra },
                Segment::Regex { name: b, regex: rb },
            ) => a == b && ra.as_str() == rb.as_str(),
            _ => false,
        }
    }
}

/// A route pattern compiled into ordered segments.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPattern {
    raw: String,
    prefix: String,
    segments: Vec<Segment>,
}

impl CompiledPattern {
    /// The pattern as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Literal segments before the first dynamic one, rejoined with `/`.
    pub fn literal_prefix(&self) -> &str {
        &self.prefix
    }

    /// The part of the pattern after the literal prefix.
    pub fn dynamic_tail(&self) -> &str {
        &self.raw[self.prefix.len()..]
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of dynamic segments.
    pub fn param_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_dynamic()).count()
    }

    /// Structurally match `path`, returning the bound parameters on success.
    ///
    /// The path must have exactly as many components as the pattern has
    /// segments.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let rest = path.strip_prefix('/')?;

        let mut components = rest.split('/');
        let mut params = HashMap::with_capacity(self.param_count());
        for segment in &self.segments {
            let component = decode_component(components.next()?);
            if !segment.accepts(&component) {
                return None;
            }
            if let Some(name) = segment.name() {
                params.insert(name.to_string(), component.into_owned());
            }
        }

        if components.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Percent-decode one path component; invalid UTF-8 is replaced.
fn decode_component(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

/// Compile a route pattern.
pub fn compile(pattern: &str) -> Result<CompiledPattern, PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty(pattern.to_string()));
    }
    let body = pattern
        .strip_prefix('/')
        .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;

    let mut segments = Vec::new();
    for (position, part) in body.split('/').enumerate() {
        segments.push(parse_segment(pattern, position, part)?);
    }

    let mut seen: Vec<&str> = Vec::new();
    for name in segments.iter().filter_map(Segment::name) {
        if seen.contains(&name) {
            return Err(PatternError::DuplicateParam {
                pattern: pattern.to_string(),
                name: name.to_string(),
            });
        }
        seen.push(name);
    }

    let literal_count = segments.iter().take_while(|s| !s.is_dynamic()).count();
    let prefix = if literal_count == segments.len() {
        pattern.to_string()
    } else {
        segments[..literal_count]
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => format!("/{}", text),
                _ => String::new(),
            })
            .collect()
    };

    Ok(CompiledPattern {
        raw: pattern.to_string(),
        prefix,
        segments,
    })
}

fn parse_segment(pattern: &str, position: usize, part: &str) -> Result<Segment, PatternError> {
    if let Some(name) = part.strip_prefix(':') {
        if name.is_empty() {
            return Err(PatternError::EmptyParamName(pattern.to_string()));
        }
        return Ok(Segment::Param(name.to_string()));
    }

    if let Some(inner) = part.strip_prefix('{') {
        let inner = inner
            .strip_suffix('}')
            .ok_or_else(|| PatternError::UnterminatedRegex {
                pattern: pattern.to_string(),
                segment: part.to_string(),
            })?;
        let (name, expr) = split_regex_name(inner).unwrap_or((None, inner));
        let name = name.map_or_else(|| position.to_string(), str::to_string);
        let invalid = |reason: String| PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            expr: expr.to_string(),
            reason,
        };
        if expr.is_empty() {
            return Err(invalid("empty expression".to_string()));
        }
        let regex = Regex::new(&format!("^(?:{})$", expr)).map_err(|e| invalid(e.to_string()))?;
        return Ok(Segment::Regex { name, regex });
    }

    Ok(Segment::Literal(part.to_string()))
}

/// `{name:expr}` names the capture; the name must be a plain identifier so
/// expressions such as `(?:a|b)` are not mistaken for one.
fn split_regex_name(inner: &str) -> Option<(Option<&str>, &str)> {
    let (name, expr) = inner.split_once(':')?;
    let is_ident = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_ident.then_some((Some(name), expr))
}
