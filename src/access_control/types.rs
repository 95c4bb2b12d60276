//! Access control types
//!
//! Core types shared by the ACLs, strategies and override hooks.

use crate::strategy::MatrixProperty;
use std::fmt;
use std::sync::Arc;

/// Trait for domain objects that can carry their own access policy
pub trait SecuredObject: Send + Sync {
    /// Full, unique name of the object (e.g. `folder/job`)
    fn full_name(&self) -> &str;

    /// Per-object matrix, if one is attached
    fn matrix_property(&self) -> Option<Arc<MatrixProperty>> {
        None
    }
}

/// What a permission check is being made against
#[derive(Clone, Copy)]
pub enum AccessTarget<'a> {
    /// The root of the object tree
    Root,
    /// A specific secured object
    Object(&'a dyn SecuredObject),
}

impl AccessTarget<'_> {
    /// Full name of the target object, `None` for the root
    pub fn object_name(&self) -> Option<&str> {
        match self {
            AccessTarget::Root => None,
            AccessTarget::Object(object) => Some(object.full_name()),
        }
    }
}

impl fmt::Display for AccessTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTarget::Root => f.write_str("(root)"),
            AccessTarget::Object(object) => f.write_str(object.full_name()),
        }
    }
}

impl fmt::Debug for AccessTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessTarget({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl SecuredObject for Named {
        fn full_name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_target_names() {
        let job = Named("team/app");
        assert_eq!(AccessTarget::Root.object_name(), None);
        assert_eq!(AccessTarget::Object(&job).object_name(), Some("team/app"));
        assert_eq!(AccessTarget::Root.to_string(), "(root)");
        assert_eq!(AccessTarget::Object(&job).to_string(), "team/app");
        assert!(job.matrix_property().is_none());
    }
}
