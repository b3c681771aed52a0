//! Rule storage
//!
//! Grants and role assignments live together in one [`RuleSet`] behind a
//! single reader/writer lock. Evaluation holds the read guard for the whole
//! decision, so it always sees both relations from the same point in time.

use crate::error::{AuthzError, Result};
use crate::matcher::{ActionPattern, PathPattern};
use crate::roles::RoleGraph;
use crate::types::{GrantRule, RoleAssignment};
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::debug;

/// Grant rule with its patterns compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGrant {
    rule: GrantRule,
    object: PathPattern,
    action: ActionPattern,
}

impl StoredGrant {
    /// Compile a grant rule
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidPattern`](crate::AuthzError::InvalidPattern)
    /// if the subject is empty or the object or action pattern is malformed.
    pub fn compile(rule: GrantRule) -> Result<Self> {
        if rule.subject.is_empty() {
            return Err(AuthzError::invalid_pattern(
                &rule.subject,
                "subject cannot be empty",
            ));
        }

        let object = PathPattern::parse(&rule.object)?;
        let action = ActionPattern::parse(&rule.action)?;

        Ok(Self { rule, object, action })
    }

    pub fn rule(&self) -> &GrantRule {
        &self.rule
    }

    pub fn object_pattern(&self) -> &PathPattern {
        &self.object
    }

    pub fn action_pattern(&self) -> &ActionPattern {
        &self.action
    }
}

/// Snapshot of both rule relations
#[derive(Debug, Default)]
pub struct RuleSet {
    grants: Vec<StoredGrant>,
    roles: RoleGraph,
}

impl RuleSet {
    /// Stored grants in insertion order
    pub fn grants(&self) -> &[StoredGrant] {
        &self.grants
    }

    /// Role-assignment graph
    pub fn roles(&self) -> &RoleGraph {
        &self.roles
    }

    fn contains_grant(&self, rule: &GrantRule) -> bool {
        self.grants.iter().any(|g| &g.rule == rule)
    }
}

/// Thread-safe store of grant rules and role assignments
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: RwLock<RuleSet>,
}

impl RuleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a read snapshot for evaluation
    ///
    /// Writers wait until the guard is dropped.
    pub fn read(&self) -> RwLockReadGuard<'_, RuleSet> {
        self.rules.read()
    }

    /// Store a grant rule
    ///
    /// Returns `Ok(false)` if an identical grant is already stored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidPattern`](crate::AuthzError::InvalidPattern)
    /// without touching the store if a pattern is malformed.
    pub fn add_grant(&self, rule: GrantRule) -> Result<bool> {
        let grant = StoredGrant::compile(rule)?;
        Ok(self.insert_grant(grant))
    }

    /// Store an already compiled grant
    ///
    /// Returns `false` if an identical grant is already stored.
    pub fn insert_grant(&self, grant: StoredGrant) -> bool {
        let mut rules = self.rules.write();
        if rules.contains_grant(&grant.rule) {
            debug!(grant = %grant.rule, "Grant already present");
            return false;
        }

        rules.grants.push(grant);
        true
    }

    /// Remove a grant rule
    ///
    /// Returns `false` if no such grant was stored.
    pub fn remove_grant(&self, rule: &GrantRule) -> bool {
        let mut rules = self.rules.write();
        let before = rules.grants.len();
        rules.grants.retain(|g| &g.rule != rule);
        rules.grants.len() != before
    }

    /// Check whether an identical grant is stored
    pub fn has_grant(&self, rule: &GrantRule) -> bool {
        self.rules.read().contains_grant(rule)
    }

    /// Assign `role` to `user`
    ///
    /// Returns `false` if the assignment already existed.
    pub fn add_role_assignment(&self, user: &str, role: &str) -> bool {
        self.rules.write().roles.add_link(user, role)
    }

    /// Remove the assignment of `role` to `user`
    ///
    /// Returns `false` if there was no such assignment.
    pub fn remove_role_assignment(&self, user: &str, role: &str) -> bool {
        self.rules.write().roles.delete_link(user, role)
    }

    /// Remove every assignment originating at `user`
    ///
    /// Returns the number of assignments removed.
    pub fn remove_all_role_assignments_for_user(&self, user: &str) -> usize {
        self.rules.write().roles.delete_user(user)
    }

    /// All stored grants in insertion order
    pub fn list_grants(&self) -> Vec<GrantRule> {
        self.rules
            .read()
            .grants
            .iter()
            .map(|g| g.rule.clone())
            .collect()
    }

    /// All role assignments, ordered by user then role
    pub fn list_role_assignments(&self) -> Vec<RoleAssignment> {
        self.rules.read().roles.assignments()
    }
}
