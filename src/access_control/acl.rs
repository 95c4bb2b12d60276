//! The access control list abstraction
//!
//! An [`Acl`] answers one question: may this identity use this permission?
//! Everything else (denial reporting, any-of checks) is derived from that.

use crate::access_control::types::AccessTarget;
use crate::error::{AccessDeniedError, AclError, AppError, DeniedPermission};
use crate::security::builtin::ITEM_OWNER;
use crate::security::{Authentication, Permission};
use std::sync::Arc;

/// Decision function over identities and permissions.
///
/// Implementations must allow the system identity unconditionally and must
/// default to deny when nothing matches.
pub trait Acl: Send + Sync {
    /// Check if `auth` holds `permission`
    fn has_permission(&self, auth: &Authentication, permission: &Permission) -> bool;

    /// Check a permission, returning a diagnostic error if denied
    fn check_permission(
        &self,
        auth: &Authentication,
        permission: &Permission,
    ) -> Result<(), AccessDeniedError> {
        if auth.is_system() || self.has_permission(auth, permission) {
            return Ok(());
        }
        Err(AccessDeniedError::new(auth, vec![denied(permission)]))
    }

    /// Check if `auth` holds at least one of `permissions`
    fn has_any_permission(
        &self,
        auth: &Authentication,
        permissions: &[Arc<Permission>],
    ) -> Result<bool, AclError> {
        if permissions.is_empty() {
            return Err(AclError::NoPermissions);
        }
        if auth.is_system() {
            return Ok(true);
        }
        Ok(permissions.iter().any(|p| self.has_permission(auth, p)))
    }

    /// Like [`Acl::has_any_permission`], reporting every alternative on denial
    fn check_any_permission(
        &self,
        auth: &Authentication,
        permissions: &[Arc<Permission>],
    ) -> Result<(), AppError> {
        if self.has_any_permission(auth, permissions)? {
            return Ok(());
        }
        let mut reported: Vec<DeniedPermission> = Vec::with_capacity(permissions.len());
        for permission in permissions {
            let entry = denied(permission);
            if !reported.iter().any(|r| r.id == entry.id) {
                reported.push(entry);
            }
        }
        Err(AccessDeniedError::new(auth, reported).into())
    }

    /// Check if `auth` may create an item of type `kind` inside `container`.
    ///
    /// This narrows `Item.Create` per item type and does not replace it:
    /// callers check both. Allows every type unless overridden.
    fn has_create_permission(
        &self,
        _auth: &Authentication,
        _container: &AccessTarget<'_>,
        _kind: &str,
    ) -> bool {
        true
    }

    /// Like [`Acl::has_create_permission`], reporting `Item.Create/<kind>` on denial
    fn check_create_permission(
        &self,
        auth: &Authentication,
        container: &AccessTarget<'_>,
        kind: &str,
    ) -> Result<(), AccessDeniedError> {
        if auth.is_system() || self.has_create_permission(auth, container, kind) {
            return Ok(());
        }
        Err(AccessDeniedError::new(
            auth,
            vec![DeniedPermission {
                id: format!("{}.Create/{}", ITEM_OWNER, kind),
                implied_by: Vec::new(),
            }],
        ))
    }
}

/// Describe a denied permission the way an administrator can act on it:
/// hidden permissions are reported as their nearest enabled ancestor.
pub(crate) fn denied(permission: &Permission) -> DeniedPermission {
    let reported = permission.nearest_enabled();
    DeniedPermission {
        id: reported.id().to_string(),
        implied_by: reported
            .implication_chain()
            .skip(1)
            .map(|p| p.id().to_string())
            .collect(),
    }
}

/// ACL backed by a closure
pub struct FnAcl<F> {
    decide: F,
}

/// Build an ACL from a plain decision function.
///
/// The system identity is allowed before the closure is consulted.
pub fn acl_fn<F>(decide: F) -> FnAcl<F>
where
    F: Fn(&Authentication, &Permission) -> bool + Send + Sync,
{
    FnAcl { decide }
}

impl<F> Acl for FnAcl<F>
where
    F: Fn(&Authentication, &Permission) -> bool + Send + Sync,
{
    fn has_permission(&self, auth: &Authentication, permission: &Permission) -> bool {
        auth.is_system() || (self.decide)(auth, permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{PermissionDef, PermissionRegistry};

    fn permissions() -> (PermissionRegistry, Arc<Permission>, Arc<Permission>) {
        let registry = PermissionRegistry::new();
        let admin = registry.register("t.Root", "Admin", None, &[]).unwrap();
        let hidden = registry
            .define(
                PermissionDef::new("t.Item", "Workspace")
                    .implied_by(&admin)
                    .disabled(),
            )
            .unwrap();
        (registry, admin, hidden)
    }

    #[test]
    fn test_fn_acl_allows_system() {
        let (_registry, admin, _) = permissions();
        let acl = acl_fn(|_, _| false);
        assert!(acl.has_permission(&Authentication::system(), &admin));
        assert!(!acl.has_permission(&Authentication::user("alice"), &admin));
    }

    #[test]
    fn test_check_permission_reports_nearest_enabled() {
        let (_registry, _, hidden) = permissions();
        let acl = acl_fn(|_, _| false);
        let err = acl
            .check_permission(&Authentication::user("alice"), &hidden)
            .unwrap_err();
        assert_eq!(err.permissions.len(), 1);
        assert_eq!(err.permissions[0].id, "t.Root.Admin");
        assert!(err.permissions[0].implied_by.is_empty());
    }

    #[test]
    fn test_any_permission_requires_input() {
        let acl = acl_fn(|_, _| true);
        assert_eq!(
            acl.has_any_permission(&Authentication::user("alice"), &[]),
            Err(AclError::NoPermissions)
        );
    }

    #[test]
    fn test_any_permission() {
        let (_registry, admin, hidden) = permissions();
        let acl = acl_fn(|_, p: &Permission| p.name() == "Workspace");
        let alice = Authentication::user("alice");

        assert!(
            acl.has_any_permission(&alice, &[admin.clone(), hidden.clone()])
                .unwrap()
        );
        assert!(!acl.has_any_permission(&alice, &[admin.clone()]).unwrap());
        assert!(acl.check_any_permission(&alice, &[admin.clone(), hidden]).is_ok());

        let err = acl.check_any_permission(&alice, &[admin]).unwrap_err();
        assert!(matches!(err, AppError::AccessDenied(_)));
    }

    /// Only lets `alice` create freestyle jobs, and only inside `team/`
    struct FreestyleOnly;

    impl Acl for FreestyleOnly {
        fn has_permission(&self, auth: &Authentication, _: &Permission) -> bool {
            auth.is_system()
        }

        fn has_create_permission(
            &self,
            auth: &Authentication,
            container: &AccessTarget<'_>,
            kind: &str,
        ) -> bool {
            auth.principal() == "alice"
                && kind == "freestyle"
                && container.object_name().is_some_and(|name| name.starts_with("team/"))
        }
    }

    struct Folder(&'static str);

    impl crate::access_control::SecuredObject for Folder {
        fn full_name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_create_permission_defaults_to_allow() {
        let acl = acl_fn(|_, _| false);
        let bob = Authentication::user("bob");
        assert!(acl.has_create_permission(&bob, &AccessTarget::Root, "pipeline"));
        assert!(acl.check_create_permission(&bob, &AccessTarget::Root, "pipeline").is_ok());
    }

    #[test]
    fn test_create_permission_narrowed_by_kind() {
        let folder = Folder("team/tools");
        let target = AccessTarget::Object(&folder);
        let alice = Authentication::user("alice");

        assert!(FreestyleOnly.check_create_permission(&alice, &target, "freestyle").is_ok());
        assert!(!FreestyleOnly.has_create_permission(&alice, &AccessTarget::Root, "freestyle"));

        let err = FreestyleOnly
            .check_create_permission(&alice, &target, "pipeline")
            .unwrap_err();
        assert_eq!(err.permissions.len(), 1);
        assert_eq!(err.permissions[0].id, "hudson.model.Item.Create/pipeline");
        assert!(err.permissions[0].implied_by.is_empty());

        assert!(
            FreestyleOnly
                .check_create_permission(&Authentication::system(), &target, "pipeline")
                .is_ok()
        );
    }

    #[test]
    fn test_check_any_deduplicates_reported_permissions() {
        let (_registry, admin, hidden) = permissions();
        let acl = acl_fn(|_, _| false);
        // The hidden permission is reported as its parent, so both collapse
        let err = acl
            .check_any_permission(&Authentication::user("alice"), &[hidden, admin])
            .unwrap_err();
        match err {
            AppError::AccessDenied(denied) => assert_eq!(denied.permissions.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
