//! Error types for the authorization engine

use thiserror::Error;

/// Authorization engine errors
///
/// Only construction and mutation can fail. Evaluation never does: a request
/// that matches nothing is simply denied.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Malformed model or policy source, reported with its 1-based line
    ///
    /// A section missing from a model is reported against the last line.
    #[error("Policy format error at line {line}: {message}")]
    PolicyFormat { line: usize, message: String },

    /// A grant's object or action pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// I/O error while reading a model or policy file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthzError {
    pub(crate) fn policy_format(line: usize, message: impl Into<String>) -> Self {
        Self::PolicyFormat {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
