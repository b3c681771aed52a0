//! Path and action pattern matching
//!
//! Object patterns are `/`-separated paths where a segment may be:
//! - a literal (`dataset1`), matching only itself
//! - `*`, matching exactly one non-empty segment
//! - `**`, only as the final segment, matching zero or more remaining segments
//!
//! A bare `*` object pattern matches any object. Action patterns are either a
//! literal method name or `*` for any action.
//!
//! Patterns are compiled once when a grant is stored, so evaluation never has
//! to deal with malformed input.

use crate::error::{AuthzError, Result};

const WILDCARD: &str = "*";
const MULTI_WILDCARD: &str = "**";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    One,
    Rest,
}

/// Compiled object pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    /// `None` for the bare `*` pattern
    segments: Option<Vec<Segment>>,
}

impl PathPattern {
    /// Compile an object pattern
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidPattern`] if the pattern is empty, if a
    /// wildcard is mixed with other characters inside a segment, or if `**`
    /// appears anywhere but the last segment.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(AuthzError::invalid_pattern(pattern, "pattern cannot be empty"));
        }

        if pattern == WILDCARD {
            return Ok(Self { segments: None });
        }

        let parts: Vec<&str> = pattern.split('/').collect();
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());

        for (idx, part) in parts.into_iter().enumerate() {
            let segment = match part {
                WILDCARD => Segment::One,
                MULTI_WILDCARD if idx == last => Segment::Rest,
                MULTI_WILDCARD => {
                    return Err(AuthzError::invalid_pattern(
                        pattern,
                        "'**' can only appear as the last segment",
                    ));
                }
                literal if literal.contains('*') => {
                    return Err(AuthzError::invalid_pattern(
                        pattern,
                        format!("wildcards must be standalone segments: '{}'", literal),
                    ));
                }
                literal => Segment::Literal(literal.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            segments: Some(segments),
        })
    }

    /// Checks whether a concrete object path matches this pattern
    pub fn matches(&self, value: &str) -> bool {
        let Some(pattern) = &self.segments else {
            return true;
        };

        let values: Vec<&str> = value.split('/').collect();

        if let Some((Segment::Rest, prefix)) = pattern.split_last() {
            return values.len() >= prefix.len() && segments_match(prefix, &values);
        }

        values.len() == pattern.len() && segments_match(pattern, &values)
    }
}

fn segments_match(pattern: &[Segment], values: &[&str]) -> bool {
    pattern.iter().zip(values).all(|(segment, value)| match segment {
        Segment::Literal(literal) => literal == *value,
        Segment::One => !value.is_empty(),
        Segment::Rest => true,
    })
}

/// Compiled action pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPattern {
    /// Matches every action
    Any,
    /// Matches one action name exactly
    Exact(String),
}

impl ActionPattern {
    /// Compile an action pattern
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidPattern`] for an empty pattern or one that
    /// uses `*` as anything other than the whole pattern.
    pub fn parse(pattern: &str) -> Result<Self> {
        match pattern {
            "" => Err(AuthzError::invalid_pattern(pattern, "pattern cannot be empty")),
            WILDCARD => Ok(Self::Any),
            p if p.contains('*') => Err(AuthzError::invalid_pattern(
                pattern,
                "action wildcard must be exactly '*'",
            )),
            p => Ok(Self::Exact(p.to_string())),
        }
    }

    /// Checks whether a concrete action matches this pattern
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(name) => name == value,
        }
    }
}

/// Match an object path against a pattern
///
/// Total: a pattern that does not compile matches nothing.
pub fn key_match(value: &str, pattern: &str) -> bool {
    PathPattern::parse(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(false)
}

/// Match an action against a pattern (`*` or an exact name)
pub fn action_match(value: &str, pattern: &str) -> bool {
    ActionPattern::parse(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(false)
}
