//! Matrix-based root policy

use crate::access_control::{Acl, SidAcl, SidOracle};
use crate::config::AuthorizationConfig;
use crate::security::{Permission, PermissionRegistry, Sid};
use crate::strategy::{AuthorizationStrategy, Matrix};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

const LEGACY_READ: &str = "hudson.model.Hudson.Read";
const ITEM_READ: &str = "hudson.model.Item.Read";

/// Oracle answering from a matrix: a sid holding the permission or any
/// permission implying it is allowed, anything else is silent
#[derive(Clone)]
pub struct MatrixOracle {
    matrix: Arc<Matrix>,
}

impl MatrixOracle {
    pub fn new(matrix: Arc<Matrix>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }
}

impl SidOracle for MatrixOracle {
    fn decide_for(&self, sid: &Sid, permission: &Permission) -> Option<bool> {
        self.matrix
            .has_permission(sid.as_matrix_str(), permission)
            .then_some(true)
    }
}

/// One matrix for the whole object tree
pub struct GlobalMatrixStrategy {
    oracle: MatrixOracle,
    acl: Arc<SidAcl<MatrixOracle>>,
}

impl GlobalMatrixStrategy {
    pub const KIND: &'static str = "global_matrix";

    pub fn new(matrix: Matrix) -> Self {
        let oracle = MatrixOracle::new(Arc::new(matrix));
        Self {
            acl: Arc::new(SidAcl::new(oracle.clone())),
            oracle,
        }
    }

    /// Build from the `grants` of an authorization section, applying the
    /// legacy read migration when it is enabled
    pub fn from_config(config: &AuthorizationConfig, permissions: &PermissionRegistry) -> Self {
        let mut matrix = Matrix::from_lines(&config.grants, permissions);
        if config.migrate_legacy_read {
            match (permissions.lookup(LEGACY_READ), permissions.lookup(ITEM_READ)) {
                (Some(read), Some(item_read)) => matrix.migrate_legacy_read(&read, &item_read),
                _ => warn!("Legacy read migration requested but read permissions are not registered"),
            }
        }
        debug!(grants = matrix.len(), "Built global matrix");
        Self::new(matrix)
    }

    pub fn matrix(&self) -> &Matrix {
        self.oracle.matrix()
    }

    /// The root matrix as an oracle, for composition with per-object matrices
    pub fn oracle(&self) -> Arc<dyn SidOracle> {
        Arc::new(self.oracle.clone())
    }

    /// Whether `sid` holds `permission` through the matrix, implication included
    pub fn has_permission(&self, sid: &str, permission: &Permission) -> bool {
        self.matrix().has_permission(sid, permission)
    }

    /// Whether `sid` was granted exactly `permission`
    pub fn has_explicit_permission(&self, sid: &str, permission: &Permission) -> bool {
        self.matrix().has_explicit_permission(sid, permission)
    }

    /// Every sid mentioned in the matrix
    pub fn configured_sids(&self) -> BTreeSet<String> {
        self.matrix().sids()
    }
}

impl AuthorizationStrategy for GlobalMatrixStrategy {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn root_acl(&self) -> Arc<dyn Acl> {
        self.acl.clone()
    }

    fn sids(&self) -> BTreeSet<String> {
        self.matrix().all_sids()
    }

    fn matrix(&self) -> Option<&Matrix> {
        Some(self.oracle.matrix())
    }
}
