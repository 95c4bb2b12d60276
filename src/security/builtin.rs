//! Builtin permission catalog
//!
//! Every deployment registers these before anything else. The ids are part
//! of the persisted matrix format and must not change.

use crate::error::RegistryError;
use crate::security::permission::{Permission, PermissionScope};
use crate::security::registry::{PermissionDef, PermissionRegistry};
use std::sync::Arc;

pub const ROOT_OWNER: &str = "hudson.model.Hudson";
pub const GENERIC_OWNER: &str = "hudson.security.Permission";
pub const ITEM_OWNER: &str = "hudson.model.Item";
pub const VIEW_OWNER: &str = "hudson.model.View";

/// Handles to the builtin permissions
#[derive(Debug, Clone)]
pub struct BuiltinPermissions {
    /// Root of every implication chain
    pub administer: Arc<Permission>,
    pub full_control: Arc<Permission>,
    pub generic_read: Arc<Permission>,
    pub generic_write: Arc<Permission>,
    pub generic_create: Arc<Permission>,
    pub generic_update: Arc<Permission>,
    pub generic_delete: Arc<Permission>,
    pub generic_configure: Arc<Permission>,
    /// Read access to the root object
    pub read: Arc<Permission>,
    pub item_create: Arc<Permission>,
    pub item_delete: Arc<Permission>,
    pub item_configure: Arc<Permission>,
    pub item_read: Arc<Permission>,
    pub item_build: Arc<Permission>,
    pub item_workspace: Arc<Permission>,
    pub view_create: Arc<Permission>,
    pub view_delete: Arc<Permission>,
    pub view_configure: Arc<Permission>,
    pub view_read: Arc<Permission>,
}

/// Handles to the builtin scopes
#[derive(Debug, Clone)]
pub struct BuiltinScopes {
    pub root: Arc<PermissionScope>,
    pub item_group: Arc<PermissionScope>,
    pub item: Arc<PermissionScope>,
    pub run: Arc<PermissionScope>,
    pub computer: Arc<PermissionScope>,
}

/// Register the builtin scopes and permissions
pub fn register_builtins(
    registry: &PermissionRegistry,
) -> Result<(BuiltinPermissions, BuiltinScopes), RegistryError> {
    let root = registry.register_scope("jenkins", &[])?;
    let item_group = registry.register_scope("item_group", &[root.clone()])?;
    let item = registry.register_scope("item", &[item_group.clone()])?;
    let run = registry.register_scope("run", &[item.clone()])?;
    let computer = registry.register_scope("computer", &[root.clone()])?;

    registry.register_group(ROOT_OWNER, "Overall")?;
    registry.register_group(GENERIC_OWNER, "Permission")?;
    registry.register_group(ITEM_OWNER, "Job")?;
    registry.register_group(VIEW_OWNER, "View")?;

    let administer = registry.define(
        PermissionDef::new(ROOT_OWNER, "Administer")
            .description("Make system-wide configuration changes")
            .scope(&root),
    )?;

    let generic = |name: &str, parent: &Arc<Permission>| {
        registry.define(
            PermissionDef::new(GENERIC_OWNER, name)
                .implied_by(parent)
                .scope(&root),
        )
    };
    let full_control = generic("FullControl", &administer)?;
    let generic_read = generic("GenericRead", &administer)?;
    let generic_write = generic("GenericWrite", &administer)?;
    let generic_create = generic("GenericCreate", &generic_write)?;
    let generic_update = generic("GenericUpdate", &generic_write)?;
    let generic_delete = generic("GenericDelete", &generic_write)?;
    let generic_configure = generic("GenericConfigure", &generic_update)?;

    let read = registry.define(
        PermissionDef::new(ROOT_OWNER, "Read")
            .description("See the root object")
            .implied_by(&generic_read)
            .scope(&root),
    )?;

    let item_perm = |name: &str, parent: &Arc<Permission>| {
        registry.define(
            PermissionDef::new(ITEM_OWNER, name)
                .implied_by(parent)
                .scope(&item),
        )
    };
    let item_create = registry.define(
        PermissionDef::new(ITEM_OWNER, "Create")
            .implied_by(&generic_create)
            .scope(&item_group),
    )?;
    let item_delete = item_perm("Delete", &generic_delete)?;
    let item_configure = item_perm("Configure", &generic_configure)?;
    let item_read = item_perm("Read", &generic_read)?;
    let item_build = item_perm("Build", &generic_update)?;
    let item_workspace = item_perm("Workspace", &generic_read)?;

    let view_perm = |name: &str, parent: &Arc<Permission>| {
        registry.define(
            PermissionDef::new(VIEW_OWNER, name)
                .implied_by(parent)
                .scope(&item_group),
        )
    };
    let view_create = view_perm("Create", &generic_create)?;
    let view_delete = view_perm("Delete", &generic_delete)?;
    let view_configure = view_perm("Configure", &generic_configure)?;
    let view_read = view_perm("Read", &generic_read)?;

    Ok((
        BuiltinPermissions {
            administer,
            full_control,
            generic_read,
            generic_write,
            generic_create,
            generic_update,
            generic_delete,
            generic_configure,
            read,
            item_create,
            item_delete,
            item_configure,
            item_read,
            item_build,
            item_workspace,
            view_create,
            view_delete,
            view_configure,
            view_read,
        },
        BuiltinScopes {
            root,
            item_group,
            item,
            run,
            computer,
        },
    ))
}

impl BuiltinPermissions {
    /// Look the builtins up in a registry populated by [`register_builtins`]
    pub fn from_registry(registry: &PermissionRegistry) -> Option<Self> {
        let get = |owner: &str, name: &str| registry.lookup(&format!("{}.{}", owner, name));
        Some(Self {
            administer: get(ROOT_OWNER, "Administer")?,
            full_control: get(GENERIC_OWNER, "FullControl")?,
            generic_read: get(GENERIC_OWNER, "GenericRead")?,
            generic_write: get(GENERIC_OWNER, "GenericWrite")?,
            generic_create: get(GENERIC_OWNER, "GenericCreate")?,
            generic_update: get(GENERIC_OWNER, "GenericUpdate")?,
            generic_delete: get(GENERIC_OWNER, "GenericDelete")?,
            generic_configure: get(GENERIC_OWNER, "GenericConfigure")?,
            read: get(ROOT_OWNER, "Read")?,
            item_create: get(ITEM_OWNER, "Create")?,
            item_delete: get(ITEM_OWNER, "Delete")?,
            item_configure: get(ITEM_OWNER, "Configure")?,
            item_read: get(ITEM_OWNER, "Read")?,
            item_build: get(ITEM_OWNER, "Build")?,
            item_workspace: get(ITEM_OWNER, "Workspace")?,
            view_create: get(VIEW_OWNER, "Create")?,
            view_delete: get(VIEW_OWNER, "Delete")?,
            view_configure: get(VIEW_OWNER, "Configure")?,
            view_read: get(VIEW_OWNER, "Read")?,
        })
    }
}
