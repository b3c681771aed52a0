//! HTTP server setup and lifecycle management

use crate::{
    config::ServerConfig,
    middleware::{Authorizer, PrincipalSource},
    routes,
    state::AppState,
};
use anyhow::{Context, Result};
use axum::http::HeaderName;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use warden_authz::{Enforcer, Model, PolicySource};

/// Build the enforcer described by the configuration
///
/// Without a model file the built-in RBAC model is used; without a policy
/// file the store starts empty and every request is denied.
pub fn load_enforcer(config: &ServerConfig) -> Result<Enforcer> {
    let model = match &config.model_path {
        Some(path) => Model::from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?,
        None => Model::default(),
    };

    let source = match &config.policy_path {
        Some(path) => PolicySource::from_file(path)
            .with_context(|| format!("Failed to load policy from {}", path.display()))?,
        None => PolicySource::default(),
    };

    Ok(Enforcer::with_policy(model, source))
}

/// Authorizer reading the principal from the configured source
pub fn build_authorizer(config: &ServerConfig, enforcer: Arc<Enforcer>) -> Result<Authorizer> {
    let authorizer = Authorizer::new(enforcer);

    match &config.principal_header {
        Some(name) => {
            let header = HeaderName::try_from(name.as_str())
                .with_context(|| format!("Invalid principal header name: {}", name))?;
            Ok(authorizer.with_source(PrincipalSource::Header(header)))
        }
        None => Ok(authorizer),
    }
}

/// HTTP server instance
pub struct Server {
    config: ServerConfig,
    state: AppState,
    authorizer: Authorizer,
}

impl Server {
    pub fn new(config: ServerConfig, state: AppState, authorizer: Authorizer) -> Self {
        Self {
            config,
            state,
            authorizer,
        }
    }

    /// Load the policy and build a server from configuration
    pub fn from_config(config: ServerConfig) -> Result<Self> {
        let enforcer = Arc::new(load_enforcer(&config)?);
        let authorizer = build_authorizer(&config, enforcer.clone())?;
        Ok(Self::new(config, AppState::new(enforcer), authorizer))
    }

    /// Serve requests until a shutdown signal arrives
    pub async fn run(self) -> Result<()> {
        let addr = self.config.bind_address();

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        let local_addr = listener.local_addr()?;
        info!("Server listening on http://{}", local_addr);
        info!("Health check endpoint: http://{}/health", local_addr);
        info!("Metrics endpoint: http://{}/metrics", local_addr);

        let app = routes::create_router(self.state, self.authorizer);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("Server shutdown complete");
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use warden_authz::Request;

    #[test]
    fn test_defaults_build_empty_enforcer() {
        let server = Server::from_config(ServerConfig::default()).unwrap();

        assert!(server.state().enforcer.grants().is_empty());
        assert!(!server
            .state()
            .enforcer
            .enforce(&Request::new("alice", "/", "GET")));
    }

    #[test]
    fn test_loads_policy_file() {
        let mut policy = NamedTempFile::new().unwrap();
        writeln!(policy, "p, alice, /dataset1/*, GET").unwrap();
        writeln!(policy, "g, cathy, alice").unwrap();

        let config = ServerConfig {
            policy_path: Some(policy.path().to_path_buf()),
            ..ServerConfig::default()
        };
        let enforcer = load_enforcer(&config).unwrap();

        assert!(enforcer.enforce(&Request::new("cathy", "/dataset1/item", "GET")));
    }

    #[test]
    fn test_missing_policy_file_fails() {
        let config = ServerConfig {
            policy_path: Some("/nonexistent/warden/policy.csv".into()),
            ..ServerConfig::default()
        };

        let err = load_enforcer(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to load policy"));
    }

    #[test]
    fn test_invalid_principal_header_fails() {
        let config = ServerConfig {
            principal_header: Some("not a header".to_string()),
            ..ServerConfig::default()
        };

        assert!(build_authorizer(&config, Arc::new(Enforcer::default())).is_err());
    }
}
