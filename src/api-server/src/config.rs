//! Server configuration
//!
//! Environment variables:
//! - `WARDEN_HOST` - bind address (default: 0.0.0.0)
//! - `PORT` - HTTP port (default: 8080)
//! - `WARDEN_MODEL` - model file; the built-in RBAC model when unset
//! - `WARDEN_POLICY` - policy file; an empty rule store when unset
//! - `WARDEN_PRINCIPAL_HEADER` - read the principal from this header instead
//!   of the HTTP basic-auth username
//! - `RUST_LOG` - log filter (default: info)

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Model declaration file
    pub model_path: Option<PathBuf>,

    /// Policy source file
    pub policy_path: Option<PathBuf>,

    /// Header carrying an upstream-authenticated principal
    pub principal_header: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            model_path: None,
            policy_path: None,
            principal_header: None,
        }
    }
}

impl ServerConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("WARDEN_HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            model_path: non_empty("WARDEN_MODEL").map(PathBuf::from),
            policy_path: non_empty("WARDEN_POLICY").map(PathBuf::from),
            principal_header: non_empty("WARDEN_PRINCIPAL_HEADER"),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.model_path.is_none());
        assert!(config.principal_header.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("WARDEN_HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("WARDEN_POLICY", "/etc/warden/policy.csv"),
            ("WARDEN_PRINCIPAL_HEADER", "x-authenticated-user"),
        ]));

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.policy_path, Some(PathBuf::from("/etc/warden/policy.csv")));
        assert_eq!(config.principal_header.as_deref(), Some("x-authenticated-user"));
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "not-a-port"), ("WARDEN_MODEL", " ")]));

        assert_eq!(config.port, 8080);
        assert!(config.model_path.is_none());
    }
}
