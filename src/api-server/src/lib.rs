//! HTTP binding for the Warden authorization engine
//!
//! The [`middleware::authorize`] function turns any axum router into a
//! policy-enforced one; the rest of the crate is a small server around it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use middleware::{authorize, AuthenticatedPrincipal, Authorizer, PrincipalSource};
pub use routes::create_router;
pub use state::AppState;
