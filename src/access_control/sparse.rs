//! Entry-based ACL
//!
//! A [`SparseAcl`] is an explicit list of `(sid, permission, allow)` entries
//! with an optional parent ACL. Entries are added while the ACL is being
//! built; once it is shared behind an `Arc` it is never changed.

use crate::access_control::acl::Acl;
use crate::access_control::resolver::{SidOracle, resolve};
use crate::security::{Authentication, Permission, Sid};
use std::sync::Arc;
use tracing::trace;

/// One immutable ACL entry
#[derive(Debug, Clone)]
pub struct AclEntry {
    pub sid: Sid,
    pub permission: Arc<Permission>,
    pub allow: bool,
}

/// ACL backed by explicit entries
#[derive(Default)]
pub struct SparseAcl {
    entries: Vec<AclEntry>,
    parent: Option<Arc<dyn Acl>>,
}

impl SparseAcl {
    /// Create an empty ACL, optionally falling back to `parent`
    pub fn new(parent: Option<Arc<dyn Acl>>) -> Self {
        Self {
            entries: Vec::new(),
            parent,
        }
    }

    /// Append an entry.
    ///
    /// When several entries match the same token and permission, the first
    /// one added wins.
    pub fn add(&mut self, sid: Sid, permission: &Arc<Permission>, allow: bool) -> &mut Self {
        self.entries.push(AclEntry {
            sid,
            permission: permission.clone(),
            allow,
        });
        self
    }

    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }

    pub fn parent(&self) -> Option<&Arc<dyn Acl>> {
        self.parent.as_ref()
    }
}

impl SidOracle for SparseAcl {
    fn decide_for(&self, sid: &Sid, permission: &Permission) -> Option<bool> {
        for level in permission.implication_chain() {
            if let Some(entry) = self
                .entries
                .iter()
                .find(|e| &e.sid == sid && *e.permission == *level)
            {
                trace!(
                    sid = %sid,
                    requested = permission.id(),
                    matched = level.id(),
                    allow = entry.allow,
                    "Matched ACL entry"
                );
                return Some(entry.allow);
            }
        }
        None
    }
}

impl Acl for SparseAcl {
    fn has_permission(&self, auth: &Authentication, permission: &Permission) -> bool {
        if auth.is_system() {
            return true;
        }
        if let Some(decision) = resolve(self, auth, permission) {
            return decision;
        }
        match &self.parent {
            Some(parent) => {
                trace!(permission = permission.id(), "Delegating to parent ACL");
                parent.has_permission(auth, permission)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::acl::acl_fn;
    use crate::security::PermissionRegistry;

    struct Chain {
        _registry: PermissionRegistry,
        full: Arc<Permission>,
        create: Arc<Permission>,
        read: Arc<Permission>,
    }

    fn chain() -> Chain {
        let registry = PermissionRegistry::new();
        let full = registry.register("t.Root", "FullControl", None, &[]).unwrap();
        let create = registry
            .register("t.Item", "Create", Some(&full), &[])
            .unwrap();
        let read = registry
            .register("t.Item", "Read", Some(&create), &[])
            .unwrap();
        Chain {
            _registry: registry,
            full,
            create,
            read,
        }
    }

    #[test]
    fn test_empty_acl_denies() {
        let c = chain();
        let acl = SparseAcl::new(None);
        assert!(!acl.has_permission(&Authentication::user("alice"), &c.read));
        assert!(acl.has_permission(&Authentication::system(), &c.read));
    }

    #[test]
    fn test_child_level_checked_before_parent_level() {
        let c = chain();
        let mut acl = SparseAcl::new(None);
        acl.add(Sid::principal("alice"), &c.full, true)
            .add(Sid::principal("alice"), &c.create, false);

        let alice = Authentication::user("alice");
        assert!(!acl.has_permission(&alice, &c.read));
        assert!(!acl.has_permission(&alice, &c.create));
        assert!(acl.has_permission(&alice, &c.full));
    }

    #[test]
    fn test_first_entry_wins_on_duplicates() {
        let c = chain();
        let mut acl = SparseAcl::new(None);
        acl.add(Sid::Everyone, &c.read, false)
            .add(Sid::Everyone, &c.read, true);
        assert!(!acl.has_permission(&Authentication::user("bob"), &c.read));
    }

    #[test]
    fn test_parent_consulted_only_when_all_tiers_silent() {
        let c = chain();
        let parent: Arc<dyn Acl> = Arc::new(acl_fn(|_, _| true));

        let silent = SparseAcl::new(Some(parent.clone()));
        assert!(silent.has_permission(&Authentication::user("alice"), &c.read));

        let mut deny = SparseAcl::new(Some(parent));
        deny.add(Sid::Everyone, &c.full, false);
        assert!(!deny.has_permission(&Authentication::user("alice"), &c.read));
    }

    #[test]
    fn test_oracle_is_silent_for_unknown_sid() {
        let c = chain();
        let mut acl = SparseAcl::new(None);
        acl.add(Sid::group("dev"), &c.create, true);

        assert_eq!(acl.decide_for(&Sid::group("dev"), &c.read), Some(true));
        assert_eq!(acl.decide_for(&Sid::principal("dev"), &c.read), None);
        assert_eq!(acl.decide_for(&Sid::group("dev"), &c.full), None);
        assert_eq!(acl.entries().len(), 1);
        assert!(acl.parent().is_none());
    }
}
