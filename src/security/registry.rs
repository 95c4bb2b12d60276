//! Permission registry
//!
//! The registry is the process-lifetime catalog of permissions, groups and
//! scopes. It is populated during startup by whatever owns the permissions
//! and then only read. It is an explicit object handed to consumers rather
//! than global state, so tests can build isolated catalogs.

use crate::error::RegistryError;
use crate::security::permission::{Permission, PermissionGroup, PermissionScope};
use parking_lot::RwLock;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, trace};

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("permission name pattern is valid")
});

/// Definition of a permission to register
#[derive(Debug, Clone)]
pub struct PermissionDef {
    owner: String,
    name: String,
    description: Option<String>,
    implied_by: Option<Arc<Permission>>,
    enabled: bool,
    scopes: Vec<Arc<PermissionScope>>,
}

impl PermissionDef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            description: None,
            implied_by: None,
            enabled: true,
            scopes: Vec::new(),
        }
    }

    pub fn implied_by(mut self, parent: &Arc<Permission>) -> Self {
        self.implied_by = Some(parent.clone());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn scope(mut self, scope: &Arc<PermissionScope>) -> Self {
        self.scopes.push(scope.clone());
        self
    }

    /// Register the permission hidden from administrators
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Default)]
struct RegistryInner {
    all: Vec<Arc<Permission>>,
    groups: BTreeMap<String, PermissionGroup>,
    scopes: BTreeMap<String, Arc<PermissionScope>>,
}

/// Catalog of every permission, group and scope known to the process
#[derive(Default)]
pub struct PermissionRegistry {
    inner: RwLock<RegistryInner>,
}

impl PermissionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a permission.
    ///
    /// `implied_by` must already be registered here, which keeps implication
    /// chains acyclic.
    pub fn register(
        &self,
        owner: &str,
        name: &str,
        implied_by: Option<&Arc<Permission>>,
        scopes: &[Arc<PermissionScope>],
    ) -> Result<Arc<Permission>, RegistryError> {
        let mut def = PermissionDef::new(owner, name);
        def.implied_by = implied_by.cloned();
        def.scopes = scopes.to_vec();
        self.define(def)
    }

    /// Register a permission from a full definition
    pub fn define(&self, def: PermissionDef) -> Result<Arc<Permission>, RegistryError> {
        if def.owner.is_empty() || def.owner.contains(':') {
            return Err(RegistryError::InvalidOwner { owner: def.owner });
        }
        if !NAME_PATTERN.is_match(&def.name) {
            return Err(RegistryError::InvalidName { name: def.name });
        }

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let id = format!("{}.{}", def.owner, def.name);

        if let Some(parent) = &def.implied_by {
            let known = inner
                .groups
                .get(parent.owner())
                .and_then(|g| g.find(parent.name()))
                .is_some_and(|p| Arc::ptr_eq(p, parent));
            if !known {
                return Err(RegistryError::UnknownParent {
                    id,
                    parent: parent.id().to_string(),
                });
            }
        }

        let group = inner
            .groups
            .entry(def.owner.clone())
            .or_insert_with(|| PermissionGroup::new(&def.owner, None));
        if group.find(&def.name).is_some() {
            return Err(RegistryError::Duplicate { id });
        }

        let permission = Arc::new(Permission::new(
            &def.owner,
            &def.name,
            def.description,
            def.implied_by,
            def.enabled,
            def.scopes,
        ));
        group.push(permission.clone());
        inner.all.push(permission.clone());

        trace!(
            permission = permission.id(),
            implied_by = ?permission.implied_by().map(|p| p.id()),
            "Registered permission"
        );
        Ok(permission)
    }

    /// Create (or retitle) the group for `owner`
    pub fn register_group(&self, owner: &str, title: &str) -> Result<(), RegistryError> {
        if owner.is_empty() || owner.contains(':') {
            return Err(RegistryError::InvalidOwner {
                owner: owner.to_string(),
            });
        }
        let mut inner = self.inner.write();
        inner
            .groups
            .entry(owner.to_string())
            .or_insert_with(|| PermissionGroup::new(owner, None))
            .set_title(title);
        Ok(())
    }

    /// Register a scope contained by `containers`
    pub fn register_scope(
        &self,
        model_type: &str,
        containers: &[Arc<PermissionScope>],
    ) -> Result<Arc<PermissionScope>, RegistryError> {
        let mut inner = self.inner.write();
        if inner.scopes.contains_key(model_type) {
            return Err(RegistryError::DuplicateScope {
                model_type: model_type.to_string(),
            });
        }
        let scope = Arc::new(PermissionScope::new(model_type, containers.to_vec()));
        inner.scopes.insert(model_type.to_string(), scope.clone());
        Ok(scope)
    }

    pub fn scope(&self, model_type: &str) -> Option<Arc<PermissionScope>> {
        self.inner.read().scopes.get(model_type).cloned()
    }

    /// Resolve a persisted `owner.name` id
    pub fn lookup(&self, id: &str) -> Option<Arc<Permission>> {
        let (owner, name) = id.rsplit_once('.')?;
        self.inner
            .read()
            .groups
            .get(owner)
            .and_then(|g| g.find(name))
            .cloned()
    }

    /// Every permission in registration order
    pub fn all(&self) -> Vec<Arc<Permission>> {
        self.inner.read().all.clone()
    }

    /// Every group, sorted by owner name
    pub fn all_groups(&self) -> Vec<PermissionGroup> {
        self.inner.read().groups.values().cloned().collect()
    }

    pub fn group(&self, owner: &str) -> Option<PermissionGroup> {
        self.inner.read().groups.get(owner).cloned()
    }

    /// Show or hide a permission from administrators.
    ///
    /// Disabled permissions still resolve; denials report the nearest
    /// enabled ancestor instead.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), RegistryError> {
        let permission = self
            .lookup(id)
            .ok_or_else(|| RegistryError::UnknownPermission { id: id.to_string() })?;
        permission.set_enabled(enabled);
        debug!(permission = id, enabled, "Changed permission visibility");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().all.is_empty()
    }
}
