use serde::{Deserialize, Serialize};
use warden_authz::{GrantRule, RoleAssignment};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Grant add/remove request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRequest {
    pub subject: String,
    pub object: String,
    pub action: String,
}

impl From<GrantRequest> for GrantRule {
    fn from(req: GrantRequest) -> Self {
        GrantRule::new(req.subject, req.object, req.action)
    }
}

/// Role assignment add/remove request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRequest {
    pub user: String,
    pub role: String,
}

/// Result of a grant or role mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Whether the store changed
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListGrantsResponse {
    pub grants: Vec<GrantRule>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRolesResponse {
    pub assignments: Vec<RoleAssignment>,
    pub total: usize,
}

/// Roles held by a single user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRolesResponse {
    pub user: String,
    /// Assigned directly
    pub roles: Vec<String>,
    /// Held transitively, nearest first
    pub implicit_roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeRolesResponse {
    pub user: String,
    pub removed: usize,
}
