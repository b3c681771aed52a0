//! Enforcer: the policy engine façade
//!
//! Combines a [`Model`] with a [`RuleStore`] and answers allow/deny for a
//! [`Request`]. One enforcer is shared (usually behind an `Arc`) by every
//! request handler; evaluation only takes the store's read lock, while
//! administrative mutations take the write lock and become visible to the
//! very next decision.
//!
//! # Example
//!
//! ```rust
//! use warden_authz::{Enforcer, GrantRule, Model, Request};
//!
//! let enforcer = Enforcer::new(Model::default());
//! enforcer.add_grant(GrantRule::new("dataset1_admin", "/dataset1/*", "*")).unwrap();
//! enforcer.add_role_for_user("cathy", "dataset1_admin");
//!
//! assert!(enforcer.enforce(&Request::new("cathy", "/dataset1/item", "DELETE")));
//!
//! enforcer.delete_roles_for_user("cathy");
//! assert!(!enforcer.enforce(&Request::new("cathy", "/dataset1/item", "DELETE")));
//! ```

use crate::error::Result;
use crate::loader::PolicySource;
use crate::model::Model;
use crate::stats::{EnforcerStats, StatsSnapshot};
use crate::store::RuleStore;
use crate::types::{GrantRule, Request, RoleAssignment};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Policy engine evaluating requests against a model and rule store
#[derive(Debug)]
pub struct Enforcer {
    model: Model,
    store: RuleStore,
    stats: EnforcerStats,
}

impl Default for Enforcer {
    fn default() -> Self {
        Self::new(Model::default())
    }
}

impl Enforcer {
    /// Create an enforcer with an empty rule store
    pub fn new(model: Model) -> Self {
        Self {
            model,
            store: RuleStore::new(),
            stats: EnforcerStats::new(),
        }
    }

    /// Create an enforcer and populate it from a parsed policy source
    ///
    /// The source's grants were compiled while parsing, so this cannot fail.
    pub fn with_policy(model: Model, source: PolicySource) -> Self {
        let enforcer = Self::new(model);

        for grant in source.grants {
            enforcer.store.insert_grant(grant);
        }
        for assignment in &source.assignments {
            enforcer
                .store
                .add_role_assignment(&assignment.user, &assignment.role);
        }

        info!(
            grants = enforcer.store.read().grants().len(),
            role_assignments = source.assignments.len(),
            "Policy loaded"
        );

        enforcer
    }

    /// Load model and policy files and build an enforcer
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::Io`](crate::AuthzError::Io) if a file cannot be
    /// read and [`AuthzError::PolicyFormat`](crate::AuthzError::PolicyFormat)
    /// if either file is malformed.
    pub fn from_files(model_path: impl AsRef<Path>, policy_path: impl AsRef<Path>) -> Result<Self> {
        let model = Model::from_file(model_path)?;
        let source = PolicySource::from_file(policy_path)?;
        Ok(Self::with_policy(model, source))
    }

    /// The loaded model
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Decide whether the request is allowed
    ///
    /// Never fails: a request no grant matches is denied.
    pub fn enforce(&self, request: &Request) -> bool {
        self.explain(request).is_some()
    }

    /// Return the first grant that allows the request, if any
    pub fn explain(&self, request: &Request) -> Option<GrantRule> {
        let rules = self.store.read();

        let matched = rules
            .grants()
            .iter()
            .find(|grant| self.model.matches(request, grant, rules.roles()))
            .map(|grant| grant.rule().clone());

        self.stats.record(matched.is_some());

        match &matched {
            Some(rule) => debug!(
                subject = %request.subject,
                object = %request.object,
                action = %request.action,
                grant = %rule,
                "Request allowed"
            ),
            None => debug!(
                subject = %request.subject,
                object = %request.object,
                action = %request.action,
                "Request denied: no matching grant"
            ),
        }

        matched
    }

    /// Decision counters since the enforcer was created
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // ========================================================================
    // Grant management
    // ========================================================================

    /// Add a grant rule
    ///
    /// Returns `Ok(false)` if the grant was already present.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidPattern`](crate::AuthzError::InvalidPattern)
    /// if the object or action pattern is malformed; the store is unchanged.
    pub fn add_grant(&self, rule: GrantRule) -> Result<bool> {
        let grant_text = rule.to_string();
        match self.store.add_grant(rule) {
            Ok(added) => {
                if added {
                    info!(grant = %grant_text, "Grant added");
                }
                Ok(added)
            }
            Err(e) => {
                warn!(grant = %grant_text, error = %e, "Grant rejected");
                Err(e)
            }
        }
    }

    /// Remove a grant rule; `false` if it was not present
    pub fn remove_grant(&self, rule: &GrantRule) -> bool {
        let removed = self.store.remove_grant(rule);
        if removed {
            info!(grant = %rule, "Grant removed");
        }
        removed
    }

    pub fn has_grant(&self, rule: &GrantRule) -> bool {
        self.store.has_grant(rule)
    }

    /// All grants in insertion order
    pub fn grants(&self) -> Vec<GrantRule> {
        self.store.list_grants()
    }

    /// Grants naming `user` directly as subject
    pub fn permissions_for_user(&self, user: &str) -> Vec<GrantRule> {
        self.store
            .read()
            .grants()
            .iter()
            .filter(|g| g.rule().subject == user)
            .map(|g| g.rule().clone())
            .collect()
    }

    /// Grants naming `user` or any role `user` holds transitively
    pub fn implicit_permissions_for_user(&self, user: &str) -> Vec<GrantRule> {
        let rules = self.store.read();

        let mut subjects: HashSet<String> = rules.roles().implicit_roles_for_user(user).into_iter().collect();
        subjects.insert(user.to_string());

        rules
            .grants()
            .iter()
            .filter(|g| subjects.contains(&g.rule().subject))
            .map(|g| g.rule().clone())
            .collect()
    }

    // ========================================================================
    // Role management
    // ========================================================================

    /// Assign `role` to `user`; `false` if already assigned
    pub fn add_role_for_user(&self, user: &str, role: &str) -> bool {
        let added = self.store.add_role_assignment(user, role);
        if added {
            info!(user, role, "Role assigned");
        }
        added
    }

    /// Revoke `role` from `user`; `false` if it was not assigned
    pub fn delete_role_for_user(&self, user: &str, role: &str) -> bool {
        let removed = self.store.remove_role_assignment(user, role);
        if removed {
            info!(user, role, "Role revoked");
        }
        removed
    }

    /// Revoke every role assigned directly to `user`
    ///
    /// Grants naming `user` directly are untouched. Returns the number of
    /// assignments removed.
    pub fn delete_roles_for_user(&self, user: &str) -> usize {
        let removed = self.store.remove_all_role_assignments_for_user(user);
        info!(user, removed, "All roles revoked");
        removed
    }

    /// All role assignments, ordered by user then role
    pub fn role_assignments(&self) -> Vec<RoleAssignment> {
        self.store.list_role_assignments()
    }

    /// Whether `user` holds `role`, directly or transitively
    pub fn has_role(&self, user: &str, role: &str) -> bool {
        self.store.read().roles().has_role(user, role)
    }

    /// Roles assigned directly to `user`
    pub fn roles_for_user(&self, user: &str) -> Vec<String> {
        self.store.read().roles().roles_for_user(user)
    }

    /// Every role `user` holds, nearest first
    pub fn implicit_roles_for_user(&self, user: &str) -> Vec<String> {
        self.store.read().roles().implicit_roles_for_user(user)
    }

    /// Names assigned `role` directly
    pub fn users_for_role(&self, role: &str) -> Vec<String> {
        self.store.read().roles().users_for_role(role)
    }
}
