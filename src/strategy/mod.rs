//! Authorization strategies
//!
//! A strategy is the root policy of a deployment. Exactly one is active at
//! a time; configuration changes build a new one and publish it through
//! the [`AccessController`](crate::access_control::AccessController).
//!
//! Strategies are created by name through a [`StrategyRegistry`], so
//! embedders can add their own variants next to the builtin ones:
//!
//! | name                          | policy                                          |
//! |-------------------------------|-------------------------------------------------|
//! | `unsecured`                   | everyone may do everything                      |
//! | `full_control_once_logged_in` | authenticated users are administrators          |
//! | `legacy`                      | everyone reads, one principal administers       |
//! | `global_matrix`               | one matrix for the whole tree                   |
//! | `project_matrix`              | global matrix plus per-object matrices          |

pub mod global_matrix;
pub mod matrix;
pub mod project_matrix;
pub mod property;
pub mod simple;

pub use global_matrix::{GlobalMatrixStrategy, MatrixOracle};
pub use matrix::Matrix;
pub use project_matrix::ProjectMatrixStrategy;
pub use property::{MatrixProperty, PropertyOracle};
pub use simple::{FullControlOnceLoggedIn, LegacyStrategy, Unsecured};

use crate::access_control::{Acl, SecuredObject};
use crate::config::AuthorizationConfig;
use crate::error::ConfigError;
use crate::security::{BuiltinPermissions, PermissionRegistry};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::info;

/// Pluggable root policy
pub trait AuthorizationStrategy: Send + Sync {
    /// Registry name of this variant
    fn kind(&self) -> &'static str;

    /// ACL for the root of the object tree
    fn root_acl(&self) -> Arc<dyn Acl>;

    /// ACL for a specific object; the root ACL unless the variant knows better
    fn acl_for(&self, _object: &dyn SecuredObject) -> Arc<dyn Acl> {
        self.root_acl()
    }

    /// Sids this policy mentions, for administration screens
    fn sids(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Root matrix, for variants that are matrix-based
    fn matrix(&self) -> Option<&Matrix> {
        None
    }
}

/// Builds a strategy from its configuration section
pub type StrategyFactory = Box<
    dyn Fn(&AuthorizationConfig, &PermissionRegistry) -> Result<Box<dyn AuthorizationStrategy>, ConfigError>
        + Send
        + Sync,
>;

/// Maps configuration names to strategy factories
pub struct StrategyRegistry {
    factories: BTreeMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry holding every builtin variant
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert(Unsecured::KIND, |_, _| Ok(Box::new(Unsecured::new())));
        registry.insert(FullControlOnceLoggedIn::KIND, |_, permissions| {
            Ok(Box::new(FullControlOnceLoggedIn::new(&builtins(
                permissions,
            )?)))
        });
        registry.insert(LegacyStrategy::KIND, |config, permissions| {
            Ok(Box::new(LegacyStrategy::new(
                &builtins(permissions)?,
                &config.admin_sid,
            )))
        });
        registry.insert(GlobalMatrixStrategy::KIND, |config, permissions| {
            Ok(Box::new(GlobalMatrixStrategy::from_config(
                config,
                permissions,
            )))
        });
        registry.insert(ProjectMatrixStrategy::KIND, |config, permissions| {
            Ok(Box::new(ProjectMatrixStrategy::from_config(
                config,
                permissions,
            )))
        });
        registry
    }

    fn insert<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&AuthorizationConfig, &PermissionRegistry) -> Result<Box<dyn AuthorizationStrategy>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Register a new variant under `name`
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<(), ConfigError>
    where
        F: Fn(&AuthorizationConfig, &PermissionRegistry) -> Result<Box<dyn AuthorizationStrategy>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        if self.factories.contains_key(name) {
            return Err(ConfigError::Invalid {
                message: format!("authorization strategy '{}' is already registered", name),
            });
        }
        self.insert(name, factory);
        Ok(())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build the strategy named by `config.strategy`
    pub fn create(
        &self,
        config: &AuthorizationConfig,
        permissions: &PermissionRegistry,
    ) -> Result<Box<dyn AuthorizationStrategy>, ConfigError> {
        let factory =
            self.factories
                .get(&config.strategy)
                .ok_or_else(|| ConfigError::UnknownStrategy {
                    name: config.strategy.clone(),
                })?;
        let strategy = factory(config, permissions)?;
        info!(strategy = strategy.kind(), "Created authorization strategy");
        Ok(strategy)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn builtins(permissions: &PermissionRegistry) -> Result<BuiltinPermissions, ConfigError> {
    BuiltinPermissions::from_registry(permissions).ok_or_else(|| ConfigError::Invalid {
        message: "builtin permissions are not registered".to_string(),
    })
}
