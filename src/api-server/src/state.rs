use std::sync::Arc;
use std::time::Instant;
use warden_authz::Enforcer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Policy engine, shared with the authorization middleware
    pub enforcer: Arc<Enforcer>,

    /// Server start time for uptime calculation
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    pub fn new(enforcer: Arc<Enforcer>) -> Self {
        Self {
            enforcer,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
