//! Route definitions for the API server
//!
//! Everything except `/health` and `/metrics` sits behind the authorization
//! middleware, including the administrative endpoints: an operator needs a
//! grant such as `p, admin, /admin/**, *` to manage the policy over HTTP.

use crate::{
    handlers,
    middleware::{authorize, Authorizer},
    state::AppState,
};
use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

/// Create the application router
pub fn create_router(state: AppState, authorizer: Authorizer) -> Router {
    let protected = Router::new()
        .route(
            "/admin/grants",
            get(handlers::list_grants)
                .post(handlers::add_grant)
                .delete(handlers::remove_grant),
        )
        .route(
            "/admin/roles",
            get(handlers::list_roles)
                .post(handlers::add_role)
                .delete(handlers::remove_role),
        )
        .route(
            "/admin/users/:user/roles",
            get(handlers::user_roles).delete(handlers::revoke_user_roles),
        )
        .fallback(handlers::resource)
        .layer(middleware::from_fn_with_state(authorizer, authorize));

    Router::new()
        // Health and metrics (no authorization)
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
