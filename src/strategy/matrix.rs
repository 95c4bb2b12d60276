//! Permission matrix
//!
//! A [`Matrix`] maps each permission to the set of sid strings it is
//! granted to. It only ever grants: a sid missing from the matrix is
//! silent, never denied. Persisted form is one `"<permission id>:<sid>"`
//! line per grant.

use crate::security::{ANONYMOUS_USERNAME, Permission, PermissionRegistry};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    grants: HashMap<Arc<Permission>, BTreeSet<String>>,
}

impl Matrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `permission` to `sid`
    pub fn add(&mut self, permission: &Arc<Permission>, sid: impl Into<String>) {
        self.grants
            .entry(permission.clone())
            .or_default()
            .insert(sid.into());
    }

    /// Parse one persisted line, splitting at the first `:`
    pub fn add_line(&mut self, line: &str, registry: &PermissionRegistry) -> bool {
        let Some((id, sid)) = line.split_once(':') else {
            warn!(line, "Ignoring matrix line without ':'");
            return false;
        };
        if sid.is_empty() {
            warn!(line, "Ignoring matrix line with an empty sid");
            return false;
        }
        match registry.lookup(id) {
            Some(permission) => {
                self.add(&permission, sid);
                true
            }
            None => {
                warn!(permission = id, sid, "Ignoring grant of unknown permission");
                false
            }
        }
    }

    /// Build a matrix from persisted lines.
    ///
    /// Malformed lines and unknown permission ids are skipped; the rest
    /// loads.
    pub fn from_lines<I, S>(lines: I, registry: &PermissionRegistry) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matrix = Self::new();
        let mut skipped = 0usize;
        for line in lines {
            if !matrix.add_line(line.as_ref().trim(), registry) {
                skipped += 1;
            }
        }
        debug!(grants = matrix.len(), skipped, "Loaded permission matrix");
        matrix
    }

    /// Persisted form, sorted by permission id then sid
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .grants
            .iter()
            .flat_map(|(permission, sids)| {
                sids.iter()
                    .map(move |sid| format!("{}:{}", permission.id(), sid))
            })
            .collect();
        lines.sort();
        lines
    }

    /// Whether `sid` holds `permission` directly or through any permission
    /// that implies it
    pub fn has_permission(&self, sid: &str, permission: &Permission) -> bool {
        permission
            .implication_chain()
            .any(|level| self.has_explicit_permission(sid, level))
    }

    /// Whether `sid` was granted exactly `permission`
    pub fn has_explicit_permission(&self, sid: &str, permission: &Permission) -> bool {
        self.grants
            .get(permission)
            .is_some_and(|sids| sids.contains(sid))
    }

    /// Every sid mentioned anywhere in the matrix
    pub fn sids(&self) -> BTreeSet<String> {
        self.grants.values().flatten().cloned().collect()
    }

    /// Every sid a real user could be, i.e. without `anonymous`
    pub fn all_sids(&self) -> BTreeSet<String> {
        let mut sids = self.sids();
        sids.remove(ANONYMOUS_USERNAME);
        sids
    }

    /// Sids granted exactly `permission`
    pub fn sids_for(&self, permission: &Permission) -> BTreeSet<String> {
        self.grants.get(permission).cloned().unwrap_or_default()
    }

    /// Give `item_read` to every sid holding `read`.
    ///
    /// Matrices saved before item-level read existed only granted the
    /// root read permission; those sids must keep seeing items.
    pub fn migrate_legacy_read(&mut self, read: &Arc<Permission>, item_read: &Arc<Permission>) {
        let holders = self.sids_for(read);
        if holders.is_empty() {
            return;
        }
        debug!(
            from = read.id(),
            to = item_read.id(),
            sids = holders.len(),
            "Migrating legacy read grants"
        );
        for sid in holders {
            self.add(item_read, sid);
        }
    }

    /// Number of `(permission, sid)` grants
    pub fn len(&self) -> usize {
        self.grants.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<Permission>, &BTreeSet<String>)> {
        self.grants.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::register_builtins;

    fn registry() -> PermissionRegistry {
        let registry = PermissionRegistry::new();
        register_builtins(&registry).unwrap();
        registry
    }

    #[test]
    fn test_line_splits_at_first_colon() {
        let registry = registry();
        let matrix = Matrix::from_lines(["hudson.model.Item.Read:ldap:alice"], &registry);
        let item_read = registry.lookup("hudson.model.Item.Read").unwrap();

        assert!(matrix.has_explicit_permission("ldap:alice", &item_read));
        assert_eq!(matrix.to_lines(), vec!["hudson.model.Item.Read:ldap:alice"]);
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let registry = registry();
        let matrix = Matrix::from_lines(
            [
                "no-colon",
                "hudson.model.Item.Read:",
                "com.example.Missing.Perm:alice",
                "hudson.model.Item.Build:alice",
            ],
            &registry,
        );
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.to_lines(), vec!["hudson.model.Item.Build:alice"]);
    }

    #[test]
    fn test_has_permission_walks_chain() {
        let registry = registry();
        let administer = registry.lookup("hudson.model.Hudson.Administer").unwrap();
        let item_read = registry.lookup("hudson.model.Item.Read").unwrap();

        let mut matrix = Matrix::new();
        matrix.add(&administer, "bob");

        assert!(matrix.has_permission("bob", &item_read));
        assert!(!matrix.has_explicit_permission("bob", &item_read));
        assert!(!matrix.has_permission("alice", &item_read));
    }

    #[test]
    fn test_all_sids_excludes_anonymous() {
        let registry = registry();
        let matrix = Matrix::from_lines(
            [
                "hudson.model.Hudson.Read:anonymous",
                "hudson.model.Hudson.Read:dev",
                "hudson.model.Item.Build:alice",
            ],
            &registry,
        );
        assert_eq!(
            matrix.sids().into_iter().collect::<Vec<_>>(),
            vec!["alice", "anonymous", "dev"]
        );
        assert_eq!(
            matrix.all_sids().into_iter().collect::<Vec<_>>(),
            vec!["alice", "dev"]
        );
    }

    #[test]
    fn test_migrate_legacy_read() {
        let registry = registry();
        let read = registry.lookup("hudson.model.Hudson.Read").unwrap();
        let item_read = registry.lookup("hudson.model.Item.Read").unwrap();
        let mut matrix = Matrix::from_lines(
            ["hudson.model.Hudson.Read:dev", "hudson.model.Item.Build:ops"],
            &registry,
        );

        matrix.migrate_legacy_read(&read, &item_read);

        assert!(matrix.has_explicit_permission("dev", &item_read));
        assert!(!matrix.has_explicit_permission("ops", &item_read));
        assert_eq!(matrix.len(), 3);
    }
}
