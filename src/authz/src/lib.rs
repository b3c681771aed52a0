//! # Warden Authorization Engine
//!
//! Role-based access control for HTTP-style requests: a request is a
//! `(subject, object, action)` triple, and it is allowed when some stored
//! grant matches it.
//!
//! ## Features
//!
//! - **Path wildcards**: `*` matches exactly one path segment, `**` the rest
//! - **Role inheritance**: transitive `user -> role` assignments, cycle safe
//! - **Typed model**: the matching expression is parsed once into conditions
//! - **Live mutation**: grants and roles change under a reader/writer lock
//! - **Default deny**: no grant, no access; there are no deny rules
//!
//! ## Example
//!
//! ```rust
//! use warden_authz::{Enforcer, Model, PolicySource, Request};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = PolicySource::parse(
//!     "p, bob, /dataset2/resource1, *\n\
//!      p, bob, /dataset2/folder1/*, POST\n",
//! )?;
//! let enforcer = Enforcer::with_policy(Model::default(), policy);
//!
//! assert!(enforcer.enforce(&Request::new("bob", "/dataset2/folder1/item1", "POST")));
//! assert!(!enforcer.enforce(&Request::new("bob", "/dataset2/folder1/item1", "GET")));
//! # Ok(())
//! # }
//! ```

pub mod enforcer;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod model;
pub mod roles;
pub mod stats;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use enforcer::Enforcer;
pub use error::{AuthzError, Result};
pub use loader::PolicySource;
pub use matcher::{action_match, key_match, ActionPattern, PathPattern};
pub use model::{Condition, Field, Model, DEFAULT_MODEL_CONF};
pub use roles::RoleGraph;
pub use stats::StatsSnapshot;
pub use store::RuleStore;
pub use types::{GrantRule, Request, RoleAssignment};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
