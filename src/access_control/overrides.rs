//! Authorization override hooks
//!
//! Hooks are consulted before the configured strategy and can force an
//! answer for narrow cases (typically callback endpoints that must stay
//! reachable whatever the matrix says). They run on every check, so they
//! must be cheap and must never fail: a panicking hook counts as having no
//! opinion.

use crate::access_control::patterns::PatternMatcher;
use crate::access_control::types::AccessTarget;
use crate::config::{OverrideRuleConfig, RuleDecision};
use crate::error::ConfigError;
use crate::security::{Authentication, Permission, PermissionRegistry};
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Extension point consulted before normal resolution
pub trait AuthorizationOverride: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// `Some(allow)` to force a decision, `None` to let resolution continue
    fn check(
        &self,
        target: &AccessTarget<'_>,
        auth: &Authentication,
        permission: &Permission,
    ) -> Option<bool>;
}

/// Ask each hook in order; the first definite answer wins
pub(crate) fn consult(
    hooks: &[Arc<dyn AuthorizationOverride>],
    target: &AccessTarget<'_>,
    auth: &Authentication,
    permission: &Permission,
) -> Option<bool> {
    for hook in hooks {
        match catch_unwind(AssertUnwindSafe(|| hook.check(target, auth, permission))) {
            Ok(Some(decision)) => {
                debug!(
                    hook = hook.name(),
                    object = %target,
                    principal = auth.principal(),
                    permission = permission.id(),
                    decision,
                    "Override hook decided"
                );
                return Some(decision);
            }
            Ok(None) => {}
            Err(_) => {
                warn!(
                    hook = hook.name(),
                    permission = permission.id(),
                    "Override hook panicked, ignoring it for this check"
                );
            }
        }
    }
    None
}

/// Config-driven override: a fixed decision for matching principals,
/// permissions and (optionally) objects
#[derive(Debug)]
pub struct PatternOverride {
    name: String,
    permissions: HashSet<String>,
    principals: PatternMatcher,
    objects: PatternMatcher,
    decision: bool,
}

impl PatternOverride {
    /// Compile a rule against the permission catalog.
    ///
    /// Permission ids the catalog does not know are skipped with a warning;
    /// a rule left with no known permission is rejected, since it could
    /// never fire.
    pub fn from_config(
        config: &OverrideRuleConfig,
        registry: &PermissionRegistry,
    ) -> Result<Self, ConfigError> {
        if config.permissions.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("override '{}' must list at least one permission", config.name),
            });
        }

        let mut permissions = HashSet::with_capacity(config.permissions.len());
        for id in &config.permissions {
            match registry.lookup(id) {
                Some(permission) => {
                    permissions.insert(permission.id().to_string());
                }
                None => warn!(
                    rule = %config.name,
                    permission = %id,
                    "Ignoring unknown permission in override rule"
                ),
            }
        }
        if permissions.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!(
                    "override '{}' names no registered permission: {}",
                    config.name,
                    config.permissions.join(", ")
                ),
            });
        }

        Ok(Self {
            name: config.name.clone(),
            permissions,
            principals: PatternMatcher::new(&config.principals)?,
            objects: PatternMatcher::new(&config.objects)?,
            decision: config.decision == RuleDecision::Allow,
        })
    }

    /// Ids of the permissions this rule applies to
    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }
}

impl AuthorizationOverride for PatternOverride {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(
        &self,
        target: &AccessTarget<'_>,
        auth: &Authentication,
        permission: &Permission,
    ) -> Option<bool> {
        if !self.permissions.contains(permission.id()) {
            return None;
        }
        if !self.principals.is_empty() {
            let pattern = self.principals.find_match(auth.principal())?;
            trace!(rule = %self.name, pattern, "Principal matched override rule");
        }
        if !self.objects.is_empty() {
            let name = target.object_name()?;
            if !self.objects.matches(name) {
                return None;
            }
        }
        Some(self.decision)
    }
}
