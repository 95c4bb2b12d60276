//! Entry point for permission checks
//!
//! The [`AccessController`] holds the active strategy and the override hooks.
//! Both live in `ArcSwap` cells: publishing a new strategy swaps one pointer,
//! and a check that is already running keeps the instance it started with.

use crate::access_control::acl::Acl;
use crate::access_control::overrides::{AuthorizationOverride, PatternOverride, consult};
use crate::access_control::types::{AccessTarget, SecuredObject};
use crate::config::AuthorizationConfig;
use crate::error::{AccessDeniedError, AclError, AppError, ConfigError};
use crate::security::{Authentication, Permission, PermissionRegistry};
use crate::strategy::{AuthorizationStrategy, StrategyRegistry};
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Hooks = Vec<Arc<dyn AuthorizationOverride>>;

pub struct AccessController {
    strategy: ArcSwap<Box<dyn AuthorizationStrategy>>,
    overrides: ArcSwap<Hooks>,
}

impl AccessController {
    pub fn new(strategy: Box<dyn AuthorizationStrategy>) -> Self {
        info!(strategy = strategy.kind(), "Initialized access controller");
        Self {
            strategy: ArcSwap::from_pointee(strategy),
            overrides: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Build the controller described by an authorization section.
    ///
    /// Disabled permission ids that are not registered are skipped with a
    /// warning; an unknown strategy or a broken override rule is an error.
    pub fn from_config(
        config: &AuthorizationConfig,
        permissions: &PermissionRegistry,
        strategies: &StrategyRegistry,
    ) -> Result<Self, ConfigError> {
        for id in &config.disabled_permissions {
            if let Err(e) = permissions.set_enabled(id, false) {
                warn!(permission = %id, error = %e, "Cannot disable permission");
            }
        }

        let controller = Self::new(strategies.create(config, permissions)?);
        for rule in &config.overrides {
            controller.register_override(Arc::new(PatternOverride::from_config(
                rule,
                permissions,
            )?));
        }
        Ok(controller)
    }

    /// Replace the active strategy
    pub fn publish(&self, strategy: Box<dyn AuthorizationStrategy>) {
        let previous = self.strategy.swap(Arc::new(strategy));
        info!(
            previous = previous.kind(),
            strategy = self.strategy.load().kind(),
            "Published authorization strategy"
        );
    }

    /// The active strategy
    pub fn strategy(&self) -> Arc<Box<dyn AuthorizationStrategy>> {
        self.strategy.load_full()
    }

    /// Append an override hook; hooks run in registration order
    pub fn register_override(&self, hook: Arc<dyn AuthorizationOverride>) {
        debug!(hook = hook.name(), "Registering override hook");
        self.overrides.rcu(|hooks| {
            let mut next = Hooks::clone(hooks);
            next.push(hook.clone());
            Arc::new(next)
        });
    }

    pub fn overrides(&self) -> Arc<Hooks> {
        self.overrides.load_full()
    }

    /// ACL for the root of the object tree, as of now
    pub fn root_acl(&self) -> GuardedAcl<'static> {
        GuardedAcl {
            target: AccessTarget::Root,
            hooks: self.overrides.load_full(),
            inner: self.strategy.load().root_acl(),
        }
    }

    /// ACL for `object`, as of now
    pub fn acl_for<'a>(&self, object: &'a dyn SecuredObject) -> GuardedAcl<'a> {
        GuardedAcl {
            target: AccessTarget::Object(object),
            hooks: self.overrides.load_full(),
            inner: self.strategy.load().acl_for(object),
        }
    }

    pub fn has_permission(&self, auth: &Authentication, permission: &Permission) -> bool {
        self.root_acl().has_permission(auth, permission)
    }

    pub fn check_permission(
        &self,
        auth: &Authentication,
        permission: &Permission,
    ) -> Result<(), AccessDeniedError> {
        self.root_acl().check_permission(auth, permission)
    }

    pub fn has_permission_on(
        &self,
        object: &dyn SecuredObject,
        auth: &Authentication,
        permission: &Permission,
    ) -> bool {
        self.acl_for(object).has_permission(auth, permission)
    }

    pub fn check_permission_on(
        &self,
        object: &dyn SecuredObject,
        auth: &Authentication,
        permission: &Permission,
    ) -> Result<(), AccessDeniedError> {
        self.acl_for(object).check_permission(auth, permission)
    }

    pub fn has_any_permission(
        &self,
        auth: &Authentication,
        permissions: &[Arc<Permission>],
    ) -> Result<bool, AclError> {
        self.root_acl().has_any_permission(auth, permissions)
    }

    pub fn check_any_permission(
        &self,
        auth: &Authentication,
        permissions: &[Arc<Permission>],
    ) -> Result<(), AppError> {
        self.root_acl().check_any_permission(auth, permissions)
    }

    /// Check if `auth` may create a top-level item of type `kind`
    pub fn has_create_permission(&self, auth: &Authentication, kind: &str) -> bool {
        self.root_acl()
            .has_create_permission(auth, &AccessTarget::Root, kind)
    }

    pub fn check_create_permission(
        &self,
        auth: &Authentication,
        kind: &str,
    ) -> Result<(), AccessDeniedError> {
        self.root_acl()
            .check_create_permission(auth, &AccessTarget::Root, kind)
    }

    /// Check if `auth` may create an item of type `kind` inside `container`
    pub fn has_create_permission_in(
        &self,
        container: &dyn SecuredObject,
        auth: &Authentication,
        kind: &str,
    ) -> bool {
        self.acl_for(container)
            .has_create_permission(auth, &AccessTarget::Object(container), kind)
    }

    pub fn check_create_permission_in(
        &self,
        container: &dyn SecuredObject,
        auth: &Authentication,
        kind: &str,
    ) -> Result<(), AccessDeniedError> {
        let acl = self.acl_for(container);
        let result = acl.check_create_permission(auth, acl.target(), kind);
        if result.is_err() {
            debug!(object = %acl.target(), kind, "Item creation denied");
        }
        result
    }
}

/// ACL wrapper running the override hooks before the strategy's ACL
pub struct GuardedAcl<'a> {
    target: AccessTarget<'a>,
    hooks: Arc<Hooks>,
    inner: Arc<dyn Acl>,
}

impl GuardedAcl<'_> {
    pub fn target(&self) -> &AccessTarget<'_> {
        &self.target
    }
}

impl Acl for GuardedAcl<'_> {
    fn has_permission(&self, auth: &Authentication, permission: &Permission) -> bool {
        if auth.is_system() {
            return true;
        }
        debug!(
            object = %self.target,
            principal = auth.principal(),
            permission = permission.id(),
            "Checking permission"
        );
        if let Some(decision) = consult(&self.hooks, &self.target, auth, permission) {
            return decision;
        }
        self.inner.has_permission(auth, permission)
    }

    fn has_create_permission(
        &self,
        auth: &Authentication,
        container: &AccessTarget<'_>,
        kind: &str,
    ) -> bool {
        auth.is_system() || self.inner.has_create_permission(auth, container, kind)
    }
}
