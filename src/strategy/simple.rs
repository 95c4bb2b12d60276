//! Fixed-policy strategies

use crate::access_control::{Acl, SidAcl, SparseAcl, acl_fn};
use crate::security::{BuiltinPermissions, Sid};
use crate::strategy::AuthorizationStrategy;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Everyone may do everything
pub struct Unsecured {
    acl: Arc<dyn Acl>,
}

impl Unsecured {
    pub const KIND: &'static str = "unsecured";

    pub fn new() -> Self {
        Self {
            acl: Arc::new(acl_fn(|_, _| true)),
        }
    }
}

impl Default for Unsecured {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationStrategy for Unsecured {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn root_acl(&self) -> Arc<dyn Acl> {
        self.acl.clone()
    }
}

/// Any authenticated user is an administrator; anonymous users may read
pub struct FullControlOnceLoggedIn {
    acl: Arc<dyn Acl>,
}

impl FullControlOnceLoggedIn {
    pub const KIND: &'static str = "full_control_once_logged_in";

    pub fn new(builtins: &BuiltinPermissions) -> Self {
        let mut acl = SparseAcl::new(None);
        acl.add(Sid::Everyone, &builtins.administer, true)
            .add(Sid::anonymous(), &builtins.administer, false)
            .add(Sid::anonymous(), &builtins.generic_read, true);
        Self {
            acl: Arc::new(SidAcl::new(acl)),
        }
    }
}

impl AuthorizationStrategy for FullControlOnceLoggedIn {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn root_acl(&self) -> Arc<dyn Acl> {
        self.acl.clone()
    }
}

/// Everyone reads; a single principal administers
pub struct LegacyStrategy {
    admin: String,
    acl: Arc<dyn Acl>,
}

impl LegacyStrategy {
    pub const KIND: &'static str = "legacy";

    pub fn new(builtins: &BuiltinPermissions, admin: &str) -> Self {
        let mut acl = SparseAcl::new(None);
        acl.add(Sid::Everyone, &builtins.generic_read, true)
            .add(Sid::principal(admin), &builtins.administer, true);
        Self {
            admin: admin.to_string(),
            acl: Arc::new(SidAcl::new(acl)),
        }
    }

    pub fn admin(&self) -> &str {
        &self.admin
    }
}

impl AuthorizationStrategy for LegacyStrategy {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn root_acl(&self) -> Arc<dyn Acl> {
        self.acl.clone()
    }

    fn sids(&self) -> BTreeSet<String> {
        BTreeSet::from([self.admin.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{Authentication, PermissionRegistry, register_builtins};
    use rstest::rstest;

    fn builtins() -> (PermissionRegistry, BuiltinPermissions) {
        let registry = PermissionRegistry::new();
        let (builtins, _) = register_builtins(&registry).unwrap();
        (registry, builtins)
    }

    #[test]
    fn test_unsecured_allows_anonymous_administer() {
        let (_registry, b) = builtins();
        let acl = Unsecured::new().root_acl();
        assert!(acl.has_permission(&Authentication::anonymous(), &b.administer));
    }

    #[rstest]
    #[case::user_administers(Authentication::user("alice"), "administer", true)]
    #[case::user_reads(Authentication::user("alice"), "item_read", true)]
    #[case::anonymous_cannot_administer(Authentication::anonymous(), "administer", false)]
    #[case::anonymous_cannot_configure(Authentication::anonymous(), "item_configure", false)]
    #[case::anonymous_reads(Authentication::anonymous(), "item_read", true)]
    fn test_full_control_once_logged_in(
        #[case] auth: Authentication,
        #[case] permission: &str,
        #[case] expected: bool,
    ) {
        let (_registry, b) = builtins();
        let permission = match permission {
            "administer" => &b.administer,
            "item_read" => &b.item_read,
            _ => &b.item_configure,
        };
        let acl = FullControlOnceLoggedIn::new(&b).root_acl();
        assert_eq!(acl.has_permission(&auth, permission), expected);
    }

    #[test]
    fn test_legacy_admin_is_a_principal() {
        let (_registry, b) = builtins();
        let strategy = LegacyStrategy::new(&b, "admin");
        let acl = strategy.root_acl();

        assert!(acl.has_permission(&Authentication::user("admin"), &b.administer));
        assert!(acl.has_permission(&Authentication::user("alice"), &b.item_read));
        assert!(!acl.has_permission(&Authentication::user("alice"), &b.item_build));
        // A group called "admin" is not the administrator
        let member = Authentication::user("alice").with_groups(["admin"]);
        assert!(!acl.has_permission(&member, &b.administer));
        assert_eq!(strategy.sids().into_iter().collect::<Vec<_>>(), vec!["admin"]);
    }
}
