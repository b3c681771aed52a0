//! Role hierarchy resolution
//!
//! Role assignments form a directed graph of `user -> role` edges. A role can
//! itself be assigned to another role, so membership is resolved transitively
//! with a breadth-first search. The search tracks visited nodes, which keeps
//! it terminating on cyclic graphs.

use crate::types::RoleAssignment;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Directed role-assignment graph
///
/// Edges are kept in ordered sets so listings are deterministic and repeated
/// assignments collapse into one edge.
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    /// Outgoing edges: user -> roles the user is directly assigned
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl RoleGraph {
    /// Create an empty role graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `user -> role` edge
    ///
    /// Returns `false` if the edge already existed.
    pub fn add_link(&mut self, user: &str, role: &str) -> bool {
        self.edges
            .entry(user.to_string())
            .or_default()
            .insert(role.to_string())
    }

    /// Remove a `user -> role` edge
    ///
    /// Returns `false` if there was no such edge.
    pub fn delete_link(&mut self, user: &str, role: &str) -> bool {
        let Some(roles) = self.edges.get_mut(user) else {
            return false;
        };

        let removed = roles.remove(role);
        if roles.is_empty() {
            self.edges.remove(user);
        }
        removed
    }

    /// Remove every edge originating at `user`
    ///
    /// Edges where `user` is the role are left alone, so members who inherit
    /// from `user` keep that membership. Returns the number of edges removed.
    pub fn delete_user(&mut self, user: &str) -> usize {
        self.edges.remove(user).map_or(0, |roles| roles.len())
    }

    /// Check whether `role` is reachable from `user`
    ///
    /// Zero edges count: every name trivially holds the role equal to itself.
    pub fn has_role(&self, user: &str, role: &str) -> bool {
        if user == role {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        visited.insert(user);
        queue.push_back(user);

        while let Some(current) = queue.pop_front() {
            let Some(roles) = self.edges.get(current) else {
                continue;
            };

            for next in roles {
                if next == role {
                    return true;
                }
                if visited.insert(next.as_str()) {
                    queue.push_back(next.as_str());
                }
            }
        }

        false
    }

    /// Roles directly assigned to `user`
    pub fn roles_for_user(&self, user: &str) -> Vec<String> {
        self.edges
            .get(user)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All roles reachable from `user`, nearest first
    ///
    /// The user itself is not included, even when a cycle leads back to it.
    pub fn implicit_roles_for_user(&self, user: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut resolved = Vec::new();

        visited.insert(user);
        queue.push_back(user);

        while let Some(current) = queue.pop_front() {
            let Some(roles) = self.edges.get(current) else {
                continue;
            };

            for next in roles {
                if visited.insert(next.as_str()) {
                    resolved.push(next.clone());
                    queue.push_back(next.as_str());
                }
            }
        }

        resolved
    }

    /// Names directly assigned `role`
    pub fn users_for_role(&self, role: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|(_, roles)| roles.contains(role))
            .map(|(user, _)| user.clone())
            .collect()
    }

    /// All edges, ordered by user then role
    pub fn assignments(&self) -> Vec<RoleAssignment> {
        self.edges
            .iter()
            .flat_map(|(user, roles)| {
                roles
                    .iter()
                    .map(move |role| RoleAssignment::new(user.clone(), role.clone()))
            })
            .collect()
    }
}
