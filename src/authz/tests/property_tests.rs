//! Property tests for enforcement invariants
//!
//! - Default deny with no matching grant
//! - Monotonicity under grant/role addition and removal
//! - Role transitivity

use proptest::prelude::*;
use warden_authz::{Enforcer, GrantRule, Request};

const SUBJECTS: &[&str] = &["alice", "bob", "cathy", "admin", "staff"];
const OBJECTS: &[&str] = &["/a", "/a/b", "/a/c", "/b/x", "/a/b/c"];
const OBJECT_PATTERNS: &[&str] = &["/a", "/a/*", "/a/b", "/b/*", "/a/**", "*"];
const ACTIONS: &[&str] = &["GET", "POST", "DELETE"];
const ACTION_PATTERNS: &[&str] = &["GET", "POST", "DELETE", "*"];

fn grant_strategy() -> impl Strategy<Value = GrantRule> {
    (
        prop::sample::select(SUBJECTS),
        prop::sample::select(OBJECT_PATTERNS),
        prop::sample::select(ACTION_PATTERNS),
    )
        .prop_map(|(s, o, a)| GrantRule::new(s, o, a))
}

fn link_strategy() -> impl Strategy<Value = (&'static str, &'static str)> {
    (prop::sample::select(SUBJECTS), prop::sample::select(SUBJECTS))
}

fn all_requests() -> Vec<Request> {
    let mut requests = Vec::new();
    for s in SUBJECTS {
        for o in OBJECTS {
            for a in ACTIONS {
                requests.push(Request::new(*s, *o, *a));
            }
        }
    }
    requests
}

fn build(grants: &[GrantRule], links: &[(&str, &str)]) -> Enforcer {
    let enforcer = Enforcer::default();
    for grant in grants {
        enforcer.add_grant(grant.clone()).unwrap();
    }
    for (user, role) in links {
        enforcer.add_role_for_user(user, role);
    }
    enforcer
}

fn allowed_set(enforcer: &Enforcer) -> Vec<bool> {
    all_requests().iter().map(|r| enforcer.enforce(r)).collect()
}

proptest! {
    #[test]
    fn test_default_deny(links in prop::collection::vec(link_strategy(), 0..10)) {
        let enforcer = build(&[], &links);
        for request in all_requests() {
            prop_assert!(!enforcer.enforce(&request));
        }
    }

    #[test]
    fn test_adding_grant_only_grows(
        grants in prop::collection::vec(grant_strategy(), 0..8),
        links in prop::collection::vec(link_strategy(), 0..8),
        extra in grant_strategy(),
    ) {
        let enforcer = build(&grants, &links);
        let before = allowed_set(&enforcer);

        enforcer.add_grant(extra).unwrap();
        let after = allowed_set(&enforcer);

        for (b, a) in before.iter().zip(&after) {
            prop_assert!(!b || *a, "adding a grant revoked access");
        }
    }

    #[test]
    fn test_removing_grant_only_shrinks(
        grants in prop::collection::vec(grant_strategy(), 1..8),
        links in prop::collection::vec(link_strategy(), 0..8),
        idx in any::<prop::sample::Index>(),
    ) {
        let enforcer = build(&grants, &links);
        let before = allowed_set(&enforcer);

        enforcer.remove_grant(&grants[idx.index(grants.len())]);
        let after = allowed_set(&enforcer);

        for (b, a) in before.iter().zip(&after) {
            prop_assert!(*b || !a, "removing a grant added access");
        }
    }

    #[test]
    fn test_removing_role_only_shrinks(
        grants in prop::collection::vec(grant_strategy(), 0..8),
        links in prop::collection::vec(link_strategy(), 1..8),
        idx in any::<prop::sample::Index>(),
    ) {
        let enforcer = build(&grants, &links);
        let before = allowed_set(&enforcer);

        let (user, _) = links[idx.index(links.len())];
        enforcer.delete_roles_for_user(user);
        let after = allowed_set(&enforcer);

        for (b, a) in before.iter().zip(&after) {
            prop_assert!(*b || !a, "revoking roles added access");
        }
    }

    #[test]
    fn test_role_transitivity(links in prop::collection::vec(link_strategy(), 0..12)) {
        let enforcer = build(&[], &links);

        for u in SUBJECTS {
            for (r1, r2) in &links {
                if enforcer.has_role(u, r1) {
                    prop_assert!(enforcer.has_role(u, r2));
                }
            }
        }
    }
}
