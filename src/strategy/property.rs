//! Per-object matrix property
//!
//! A [`MatrixProperty`] is attached to a secured object and replaces the
//! root policy for it when `use_project_security` is set. Properties are
//! values: editing one means building a modified copy and swapping it in.

use crate::access_control::{Acl, SidAcl, SidOracle, inheriting};
use crate::config::{Inheritance, ObjectConfig};
use crate::security::{ANONYMOUS_USERNAME, Permission, PermissionRegistry, Sid};
use crate::strategy::Matrix;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixProperty {
    matrix: Arc<Matrix>,
    use_project_security: bool,
    inheritance: Inheritance,
}

impl MatrixProperty {
    pub fn new(matrix: Matrix, use_project_security: bool) -> Self {
        Self {
            matrix: Arc::new(matrix),
            use_project_security,
            inheritance: Inheritance::None,
        }
    }

    pub fn with_inheritance(mut self, inheritance: Inheritance) -> Self {
        self.inheritance = inheritance;
        self
    }

    /// Build from persisted matrix lines, skipping the ones that do not parse
    pub fn from_lines<I, S>(
        lines: I,
        use_project_security: bool,
        registry: &PermissionRegistry,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Matrix::from_lines(lines, registry), use_project_security)
    }

    pub fn from_config(config: &ObjectConfig, registry: &PermissionRegistry) -> Self {
        Self::from_lines(&config.grants, config.use_project_security, registry)
            .with_inheritance(config.inheritance)
    }

    /// Persisted form of this property for the object called `name`
    pub fn to_config(&self, name: &str) -> ObjectConfig {
        ObjectConfig {
            name: name.to_string(),
            use_project_security: self.use_project_security,
            inheritance: self.inheritance,
            grants: self.to_lines(),
        }
    }

    pub fn to_lines(&self) -> Vec<String> {
        self.matrix.to_lines()
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn use_project_security(&self) -> bool {
        self.use_project_security
    }

    pub fn set_use_project_security(&mut self, enabled: bool) {
        self.use_project_security = enabled;
    }

    pub fn inheritance(&self) -> Inheritance {
        self.inheritance
    }

    pub fn set_inheritance(&mut self, inheritance: Inheritance) {
        self.inheritance = inheritance;
    }

    /// Grant `permission` to `sid` on this copy.
    ///
    /// The matrix is shared with every other copy of the property, so it
    /// is cloned first when needed.
    pub fn grant(&mut self, permission: &Arc<Permission>, sid: impl Into<String>) {
        Arc::make_mut(&mut self.matrix).add(permission, sid);
    }

    /// ACL for the object carrying this property.
    ///
    /// `root` is the root matrix oracle, used only in [`Inheritance::Global`]
    /// mode.
    pub fn acl(&self, root: Arc<dyn SidOracle>) -> Arc<dyn Acl> {
        let oracle = PropertyOracle::new(self.matrix.clone());
        match self.inheritance {
            Inheritance::None => Arc::new(SidAcl::new(oracle)),
            Inheritance::Global => Arc::new(inheriting(Arc::new(oracle), root)),
        }
    }
}

/// Oracle over a per-object matrix.
///
/// Anything granted to `anonymous` here counts as granted to every sid, so
/// a project opened to unauthenticated users is not closed to logged-in
/// ones.
pub struct PropertyOracle {
    matrix: Arc<Matrix>,
}

impl PropertyOracle {
    pub fn new(matrix: Arc<Matrix>) -> Self {
        Self { matrix }
    }
}

impl SidOracle for PropertyOracle {
    fn decide_for(&self, sid: &Sid, permission: &Permission) -> Option<bool> {
        let sid = sid.as_matrix_str();
        permission
            .implication_chain()
            .any(|level| {
                self.matrix.has_explicit_permission(sid, level)
                    || self.matrix.has_explicit_permission(ANONYMOUS_USERNAME, level)
            })
            .then_some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{Authentication, register_builtins};

    fn registry() -> PermissionRegistry {
        let registry = PermissionRegistry::new();
        register_builtins(&registry).unwrap();
        registry
    }

    #[test]
    fn test_anonymous_grant_reaches_everybody() {
        let registry = registry();
        let property =
            MatrixProperty::from_lines(["hudson.model.Item.Read:anonymous"], true, &registry);
        let read = registry.lookup("hudson.model.Item.Read").unwrap();
        let create = registry.lookup("hudson.model.Item.Create").unwrap();

        let oracle = PropertyOracle::new(Arc::new(property.matrix().clone()));
        assert_eq!(oracle.decide_for(&Sid::principal("carol"), &read), Some(true));
        assert_eq!(oracle.decide_for(&Sid::principal("carol"), &create), None);

        let silent: Arc<dyn SidOracle> = Arc::new(PropertyOracle::new(Arc::default()));
        let acl = property.acl(silent);
        assert!(acl.has_permission(&Authentication::user("carol"), &read));
        assert!(!acl.has_permission(&Authentication::user("carol"), &create));
    }

    #[test]
    fn test_grant_is_copy_on_write() {
        let registry = registry();
        let build = registry.lookup("hudson.model.Item.Build").unwrap();
        let original = MatrixProperty::new(Matrix::new(), true);

        let mut edited = original.clone();
        edited.grant(&build, "dev");

        assert!(original.matrix().is_empty());
        assert!(edited.matrix().has_explicit_permission("dev", &build));
    }

    #[test]
    fn test_config_round_trip() {
        let registry = registry();
        let config = ObjectConfig {
            name: "team/app".into(),
            use_project_security: true,
            inheritance: Inheritance::Global,
            grants: vec![
                "hudson.model.Item.Read:dev".into(),
                "hudson.model.Item.Build:alice".into(),
            ],
        };
        let property = MatrixProperty::from_config(&config, &registry);
        let exported = property.to_config("team/app");

        assert!(exported.use_project_security);
        assert_eq!(exported.inheritance, Inheritance::Global);
        assert_eq!(
            exported.grants,
            vec!["hudson.model.Item.Build:alice", "hudson.model.Item.Read:dev"]
        );
        assert_eq!(MatrixProperty::from_config(&exported, &registry), property);
    }
}
