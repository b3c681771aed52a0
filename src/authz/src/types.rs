//! Core authorization types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization request: who wants to do what to which resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request {
    /// Authenticated principal (e.g., the basic-auth username)
    pub subject: String,

    /// Resource path being accessed (e.g., "/dataset1/resource1")
    pub object: String,

    /// Operation being performed (e.g., "GET")
    pub action: String,
}

impl Request {
    /// Create a new request
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.object, self.action)
    }
}

/// Stored permission: `subject` may perform `action` on `object`
///
/// `object` and `action` may be wildcard patterns. `subject` is a literal
/// user or role name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantRule {
    pub subject: String,
    pub object: String,
    pub action: String,
}

impl GrantRule {
    /// Create a new grant rule
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
        }
    }
}

impl fmt::Display for GrantRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p, {}, {}, {}", self.subject, self.object, self.action)
    }
}

/// Membership edge `user -> role`
///
/// `user` may itself be a role, which is how role chains are expressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user: String,
    pub role: String,
}

impl RoleAssignment {
    /// Create a new role assignment
    pub fn new(user: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            role: role.into(),
        }
    }
}

impl fmt::Display for RoleAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g, {}, {}", self.user, self.role)
    }
}
