//! Secured objects
//!
//! [`SecuredItem`] is the stock [`SecuredObject`]: a named node of the
//! object tree whose matrix property can be replaced while checks against
//! it are running.

use crate::access_control::SecuredObject;
use crate::config::ObjectConfig;
use crate::security::PermissionRegistry;
use crate::strategy::MatrixProperty;
use arc_swap::ArcSwapOption;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct SecuredItem {
    full_name: String,
    property: ArcSwapOption<MatrixProperty>,
}

impl SecuredItem {
    /// An item without a matrix property
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            property: ArcSwapOption::empty(),
        }
    }

    pub fn with_property(full_name: impl Into<String>, property: MatrixProperty) -> Self {
        Self {
            full_name: full_name.into(),
            property: ArcSwapOption::from_pointee(property),
        }
    }

    pub fn from_config(config: &ObjectConfig, registry: &PermissionRegistry) -> Self {
        Self::with_property(
            config.name.as_str(),
            MatrixProperty::from_config(config, registry),
        )
    }

    /// Replace (or remove) the matrix property
    pub fn set_matrix_property(&self, property: Option<MatrixProperty>) {
        self.property.store(property.map(Arc::new));
    }

    /// Edit the matrix property copy-on-write.
    ///
    /// `edit` runs on a private copy (an empty property if there is none)
    /// and the result is swapped in; concurrent checks see either the old
    /// or the new property. `edit` may run more than once under contention.
    pub fn edit_matrix_property<F>(&self, edit: F)
    where
        F: Fn(&mut MatrixProperty),
    {
        self.property.rcu(|current| {
            let mut next = current.as_deref().cloned().unwrap_or_default();
            edit(&mut next);
            Some(Arc::new(next))
        });
        debug!(object = %self.full_name, "Replaced matrix property");
    }
}

impl SecuredObject for SecuredItem {
    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn matrix_property(&self) -> Option<Arc<MatrixProperty>> {
        self.property.load_full()
    }
}

/// Build the configured objects, keyed by full name
pub fn items_from_config(
    objects: &[ObjectConfig],
    registry: &PermissionRegistry,
) -> BTreeMap<String, Arc<SecuredItem>> {
    objects
        .iter()
        .map(|config| {
            (
                config.name.clone(),
                Arc::new(SecuredItem::from_config(config, registry)),
            )
        })
        .collect()
}
