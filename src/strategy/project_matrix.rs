//! Global matrix with per-object matrices

use crate::access_control::{Acl, SecuredObject};
use crate::config::AuthorizationConfig;
use crate::security::PermissionRegistry;
use crate::strategy::{AuthorizationStrategy, GlobalMatrixStrategy, Matrix};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

/// Like [`GlobalMatrixStrategy`], but an object whose matrix property has
/// `use_project_security` set is governed by that matrix instead
pub struct ProjectMatrixStrategy {
    global: GlobalMatrixStrategy,
}

impl ProjectMatrixStrategy {
    pub const KIND: &'static str = "project_matrix";

    pub fn new(matrix: Matrix) -> Self {
        Self {
            global: GlobalMatrixStrategy::new(matrix),
        }
    }

    pub fn from_config(config: &AuthorizationConfig, permissions: &PermissionRegistry) -> Self {
        Self {
            global: GlobalMatrixStrategy::from_config(config, permissions),
        }
    }

    pub fn global(&self) -> &GlobalMatrixStrategy {
        &self.global
    }
}

impl AuthorizationStrategy for ProjectMatrixStrategy {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn root_acl(&self) -> Arc<dyn Acl> {
        self.global.root_acl()
    }

    fn acl_for(&self, object: &dyn SecuredObject) -> Arc<dyn Acl> {
        match object.matrix_property() {
            Some(property) if property.use_project_security() => {
                trace!(
                    object = object.full_name(),
                    inheritance = ?property.inheritance(),
                    "Using object matrix"
                );
                property.acl(self.global.oracle())
            }
            _ => self.root_acl(),
        }
    }

    fn sids(&self) -> BTreeSet<String> {
        AuthorizationStrategy::sids(&self.global)
    }

    fn matrix(&self) -> Option<&Matrix> {
        Some(self.global.matrix())
    }
}
