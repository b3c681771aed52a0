//! Policy source loading
//!
//! The policy text holds one rule per line:
//!
//! ```text
//! # grants: p, subject, object, action
//! p, alice, /dataset1/*, GET
//! p, dataset1_admin, /dataset1/*, *
//!
//! # role assignments: g, user, role
//! g, cathy, dataset1_admin
//! ```
//!
//! Every grant is compiled while parsing, so a malformed pattern fails the
//! whole load with the offending line number.

use crate::error::{AuthzError, Result};
use crate::store::StoredGrant;
use crate::types::{GrantRule, RoleAssignment};
use std::path::Path;

/// Parsed policy tables, ready to populate a rule store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySource {
    /// Grants, compiled while parsing
    pub grants: Vec<StoredGrant>,
    pub assignments: Vec<RoleAssignment>,
}

impl PolicySource {
    /// Parse policy text
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::PolicyFormat`] for an unknown rule tag, a wrong
    /// number of fields, an empty field, or a pattern that does not compile.
    pub fn parse(text: &str) -> Result<Self> {
        let mut source = Self::default();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.iter().any(|f| f.is_empty()) {
                return Err(AuthzError::policy_format(line_no, "empty field"));
            }

            match fields.as_slice() {
                ["p", subject, object, action] => {
                    let grant = StoredGrant::compile(GrantRule::new(*subject, *object, *action))
                        .map_err(|e| AuthzError::policy_format(line_no, e.to_string()))?;
                    source.grants.push(grant);
                }
                ["g", user, role] => {
                    source.assignments.push(RoleAssignment::new(*user, *role));
                }
                ["p", ..] => {
                    return Err(AuthzError::policy_format(
                        line_no,
                        format!("grant needs 3 fields, got {}", fields.len() - 1),
                    ));
                }
                ["g", ..] => {
                    return Err(AuthzError::policy_format(
                        line_no,
                        format!("role assignment needs 2 fields, got {}", fields.len() - 1),
                    ));
                }
                [tag, ..] => {
                    return Err(AuthzError::policy_format(
                        line_no,
                        format!("unknown rule type '{}'", tag),
                    ));
                }
                [] => continue,
            }
        }

        Ok(source)
    }

    /// The grant rules as written
    pub fn grant_rules(&self) -> impl Iterator<Item = &GrantRule> {
        self.grants.iter().map(StoredGrant::rule)
    }

    /// Read and parse a policy file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RuleStore;

    #[test]
    fn test_parse_policy() {
        let text = "
            # comment
            p, alice, /dataset1/*, GET

            p, dataset1_admin, /dataset1/*, *
            g, cathy, dataset1_admin
        ";

        let source = PolicySource::parse(text).unwrap();

        assert_eq!(
            source.grant_rules().cloned().collect::<Vec<_>>(),
            vec![
                GrantRule::new("alice", "/dataset1/*", "GET"),
                GrantRule::new("dataset1_admin", "/dataset1/*", "*"),
            ]
        );
        assert_eq!(
            source.assignments,
            vec![RoleAssignment::new("cathy", "dataset1_admin")]
        );
    }

    #[test]
    fn test_grants_are_compiled_once_at_parse() {
        let source = PolicySource::parse("p, bob, /dataset2/folder1/*, POST").unwrap();
        let grant = &source.grants[0];

        assert!(grant.object_pattern().matches("/dataset2/folder1/item1"));
        assert!(!grant.object_pattern().matches("/dataset2/folder1/a/b"));
        assert!(grant.action_pattern().matches("POST"));

        let store = RuleStore::new();
        assert!(store.insert_grant(grant.clone()));
        assert!(!store.insert_grant(grant.clone()));
        assert_eq!(store.list_grants(), vec![grant.rule().clone()]);
    }

    #[test]
    fn test_wrong_arity_reports_line() {
        let text = "p, alice, /dataset1/*, GET\np, bob, /dataset2/*\n";

        match PolicySource::parse(text) {
            Err(AuthzError::PolicyFormat { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected PolicyFormat, got {:?}", other),
        }

        assert!(PolicySource::parse("g, cathy").is_err());
        assert!(PolicySource::parse("g, cathy, admin, extra").is_err());
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            PolicySource::parse("x, alice, /a, GET"),
            Err(AuthzError::PolicyFormat { line: 1, .. })
        ));
    }

    #[test]
    fn test_empty_field() {
        assert!(matches!(
            PolicySource::parse("p, alice, , GET"),
            Err(AuthzError::PolicyFormat { line: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_pattern_is_a_format_error() {
        assert!(matches!(
            PolicySource::parse("\np, alice, /dataset1/**/x, GET"),
            Err(AuthzError::PolicyFormat { line: 2, .. })
        ));
    }
}
