use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use warden_authz::GrantRule;

use crate::{
    error::{ApiError, Result},
    models::*,
    state::AppState,
};

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Prometheus text exposition of the decision counters
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.enforcer.stats();
    let grants = state.enforcer.grants().len();
    let assignments = state.enforcer.role_assignments().len();

    let body = format!(
        "# HELP warden_decisions_total Policy evaluations by outcome; requests rejected before evaluation (no principal, undecodable path) are not counted\n\
         # TYPE warden_decisions_total counter\n\
         warden_decisions_total{{decision=\"allow\"}} {}\n\
         warden_decisions_total{{decision=\"deny\"}} {}\n\
         # HELP warden_grants Stored grant rules\n\
         # TYPE warden_grants gauge\n\
         warden_grants {}\n\
         # HELP warden_role_assignments Stored role assignments\n\
         # TYPE warden_role_assignments gauge\n\
         warden_role_assignments {}\n\
         # HELP warden_uptime_seconds Server uptime in seconds\n\
         # TYPE warden_uptime_seconds gauge\n\
         warden_uptime_seconds {}\n",
        stats.allowed,
        stats.denied,
        grants,
        assignments,
        state.uptime_seconds(),
    );

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

// ============================================================================
// Grant management
// ============================================================================

pub async fn list_grants(State(state): State<AppState>) -> Json<ListGrantsResponse> {
    let grants = state.enforcer.grants();
    Json(ListGrantsResponse {
        total: grants.len(),
        grants,
    })
}

/// Add a grant; 201 when stored, 200 when it already existed
pub async fn add_grant(
    State(state): State<AppState>,
    Json(req): Json<GrantRequest>,
) -> Result<(StatusCode, Json<MutationResponse>)> {
    let changed = state.enforcer.add_grant(GrantRule::from(req))?;
    let status = if changed { StatusCode::CREATED } else { StatusCode::OK };

    Ok((status, Json(MutationResponse { changed })))
}

pub async fn remove_grant(
    State(state): State<AppState>,
    Json(req): Json<GrantRequest>,
) -> Json<MutationResponse> {
    let changed = state.enforcer.remove_grant(&GrantRule::from(req));
    Json(MutationResponse { changed })
}

// ============================================================================
// Role management
// ============================================================================

pub async fn list_roles(State(state): State<AppState>) -> Json<ListRolesResponse> {
    let assignments = state.enforcer.role_assignments();
    Json(ListRolesResponse {
        total: assignments.len(),
        assignments,
    })
}

pub async fn add_role(
    State(state): State<AppState>,
    Json(req): Json<RoleRequest>,
) -> Result<(StatusCode, Json<MutationResponse>)> {
    validate_role_request(&req)?;

    let changed = state.enforcer.add_role_for_user(&req.user, &req.role);
    let status = if changed { StatusCode::CREATED } else { StatusCode::OK };

    Ok((status, Json(MutationResponse { changed })))
}

pub async fn remove_role(
    State(state): State<AppState>,
    Json(req): Json<RoleRequest>,
) -> Json<MutationResponse> {
    let changed = state.enforcer.delete_role_for_user(&req.user, &req.role);
    Json(MutationResponse { changed })
}

pub async fn user_roles(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Json<UserRolesResponse> {
    Json(UserRolesResponse {
        roles: state.enforcer.roles_for_user(&user),
        implicit_roles: state.enforcer.implicit_roles_for_user(&user),
        user,
    })
}

/// Revoke every role assigned directly to a user
pub async fn revoke_user_roles(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Json<RevokeRolesResponse> {
    let removed = state.enforcer.delete_roles_for_user(&user);
    Json(RevokeRolesResponse { user, removed })
}

/// Protected resource: reaching it means the request was authorized
pub async fn resource() -> StatusCode {
    StatusCode::OK
}

fn validate_role_request(req: &RoleRequest) -> Result<()> {
    if req.user.trim().is_empty() || req.role.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "user and role must be non-empty".to_string(),
        ));
    }
    Ok(())
}
