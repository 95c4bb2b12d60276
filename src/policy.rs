//! A loaded policy
//!
//! Bundles everything built from one [`AppConfig`]: the permission catalog,
//! the access controller and the configured objects.

use crate::access_control::{AccessController, SecuredObject};
use crate::config::AppConfig;
use crate::error::{ConfigError, RegistryError, Result};
use crate::model::{SecuredItem, items_from_config};
use crate::security::{BuiltinPermissions, PermissionRegistry, register_builtins};
use crate::strategy::StrategyRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub struct Policy {
    registry: PermissionRegistry,
    controller: AccessController,
    items: BTreeMap<String, Arc<SecuredItem>>,
}

impl Policy {
    /// Build a policy with the builtin permissions and strategies
    pub fn load(config: &AppConfig) -> Result<Self> {
        Self::load_with(config, PermissionRegistry::new(), &StrategyRegistry::default())
    }

    /// Build a policy whose catalog is extended by `extend`.
    ///
    /// `extend` runs after the builtins are registered and before any
    /// matrix is parsed, so grants of the permissions it adds load like
    /// builtin ones.
    pub fn load_extended<F>(
        config: &AppConfig,
        strategies: &StrategyRegistry,
        extend: F,
    ) -> Result<Self>
    where
        F: FnOnce(&PermissionRegistry, &BuiltinPermissions) -> std::result::Result<(), RegistryError>,
    {
        let registry = PermissionRegistry::new();
        let (builtins, _) = register_builtins(&registry)?;
        extend(&registry, &builtins)?;
        Self::load_with(config, registry, strategies)
    }

    /// Build a policy on top of an existing catalog and strategy set.
    ///
    /// The builtin permissions are registered unless `registry` already
    /// holds them, so modules can add permissions implied by the builtins
    /// before the matrices are parsed.
    pub fn load_with(
        config: &AppConfig,
        registry: PermissionRegistry,
        strategies: &StrategyRegistry,
    ) -> Result<Self> {
        if BuiltinPermissions::from_registry(&registry).is_none() {
            register_builtins(&registry)?;
        }
        let controller = AccessController::from_config(&config.authorization, &registry, strategies)?;
        let items = items_from_config(&config.objects, &registry);
        info!(
            strategy = controller.strategy().kind(),
            permissions = registry.len(),
            objects = items.len(),
            "Loaded policy"
        );
        Ok(Self {
            registry,
            controller,
            items,
        })
    }

    pub fn registry(&self) -> &PermissionRegistry {
        &self.registry
    }

    pub fn controller(&self) -> &AccessController {
        &self.controller
    }

    pub fn item(&self, name: &str) -> Option<&Arc<SecuredItem>> {
        self.items.get(name)
    }

    /// Like [`Policy::item`], failing for names that are not configured
    pub fn require_item(&self, name: &str) -> Result<&Arc<SecuredItem>> {
        self.item(name).ok_or_else(|| {
            ConfigError::Invalid {
                message: format!("object '{}' is not configured", name),
            }
            .into()
        })
    }

    pub fn items(&self) -> impl Iterator<Item = &Arc<SecuredItem>> {
        self.items.values()
    }

    /// Normalized form of `config`: matrices as they were actually loaded
    /// (unknown and malformed lines dropped, migrations applied, sorted)
    pub fn export(&self, config: &AppConfig) -> AppConfig {
        let mut exported = config.clone();
        if let Some(matrix) = self.controller.strategy().matrix() {
            exported.authorization.grants = matrix.to_lines();
        }
        exported.authorization.migrate_legacy_read = false;
        exported.objects = self
            .items
            .values()
            .filter_map(|item| {
                item.matrix_property()
                    .map(|property| property.to_config(item.full_name()))
            })
            .collect();
        exported
    }
}
