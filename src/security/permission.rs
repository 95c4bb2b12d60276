//! Permission, group and scope types
//!
//! A [`Permission`] is a node in an implication forest: each permission may
//! name one broader permission that also grants it. Checks walk from the
//! requested permission up through its `implied_by` ancestors.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

/// A capability that can be granted or denied
pub struct Permission {
    id: String,
    owner: String,
    name: String,
    description: Option<String>,
    implied_by: Option<Arc<Permission>>,
    enabled: AtomicBool,
    scopes: Vec<Arc<PermissionScope>>,
}

impl Permission {
    pub(crate) fn new(
        owner: &str,
        name: &str,
        description: Option<String>,
        implied_by: Option<Arc<Permission>>,
        enabled: bool,
        scopes: Vec<Arc<PermissionScope>>,
    ) -> Self {
        Self {
            id: format!("{}.{}", owner, name),
            owner: owner.to_string(),
            name: name.to_string(),
            description,
            implied_by,
            enabled: AtomicBool::new(enabled),
            scopes,
        }
    }

    /// Persistent id, `owner.name`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The broader permission that also grants this one
    pub fn implied_by(&self) -> Option<&Arc<Permission>> {
        self.implied_by.as_ref()
    }

    /// Iterate this permission followed by each of its ancestors
    pub fn implication_chain(&self) -> ImplicationChain<'_> {
        ImplicationChain { next: Some(self) }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(AtomicOrdering::Relaxed)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, AtomicOrdering::Relaxed);
    }

    /// The closest permission in the chain that is enabled.
    ///
    /// Falls back to the chain root when nothing is enabled.
    pub fn nearest_enabled(&self) -> &Permission {
        let mut current = self;
        while !current.is_enabled() {
            match current.implied_by.as_deref() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    pub fn scopes(&self) -> &[Arc<PermissionScope>] {
        &self.scopes
    }

    /// Check if this permission is contained in the given scope, directly or
    /// indirectly
    pub fn is_contained_by(&self, scope: &PermissionScope) -> bool {
        self.scopes.iter().any(|s| s.is_contained_by(scope))
    }
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Permission {}

impl Hash for Permission {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Permission {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Permission {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permission[{},{}]", self.owner, self.name)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Iterator over a permission and its `implied_by` ancestors
pub struct ImplicationChain<'a> {
    next: Option<&'a Permission>,
}

impl<'a> Iterator for ImplicationChain<'a> {
    type Item = &'a Permission;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.implied_by.as_deref();
        Some(current)
    }
}

/// All permissions owned by one owner type
#[derive(Debug, Clone)]
pub struct PermissionGroup {
    owner: String,
    title: String,
    permissions: Vec<Arc<Permission>>,
}

impl PermissionGroup {
    pub(crate) fn new(owner: &str, title: Option<&str>) -> Self {
        Self {
            owner: owner.to_string(),
            title: title.unwrap_or(owner).to_string(),
            permissions: Vec::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Permissions in registration order
    pub fn permissions(&self) -> &[Arc<Permission>] {
        &self.permissions
    }

    pub fn find(&self, name: &str) -> Option<&Arc<Permission>> {
        self.permissions.iter().find(|p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub(crate) fn push(&mut self, permission: Arc<Permission>) {
        self.permissions.push(permission);
    }
}

/// Kind of model object a permission applies to.
///
/// Scopes form a containment graph (an item is contained by an item group,
/// which is contained by the root).
#[derive(Debug)]
pub struct PermissionScope {
    model_type: String,
    containers: Vec<Arc<PermissionScope>>,
}

impl PermissionScope {
    pub(crate) fn new(model_type: &str, containers: Vec<Arc<PermissionScope>>) -> Self {
        Self {
            model_type: model_type.to_string(),
            containers,
        }
    }

    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn containers(&self) -> &[Arc<PermissionScope>] {
        &self.containers
    }

    /// Reflexive, transitive containment check
    pub fn is_contained_by(&self, other: &PermissionScope) -> bool {
        self == other || self.containers.iter().any(|c| c.is_contained_by(other))
    }
}

impl PartialEq for PermissionScope {
    fn eq(&self, other: &Self) -> bool {
        self.model_type == other.model_type
    }
}

impl Eq for PermissionScope {}
