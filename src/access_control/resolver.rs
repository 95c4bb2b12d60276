//! Tiered access resolution
//!
//! Implements identity-tiered resolution with the following precedence
//! (highest to lowest):
//! 1. The principal itself
//! 2. Each group the principal belongs to, in the order supplied
//! 3. Everyone
//!
//! At each tier a [`SidOracle`] is asked for a decision; the first definite
//! answer wins. The oracle is responsible for walking the permission's
//! implication chain.

use crate::access_control::acl::Acl;
use crate::security::{Authentication, Permission, Sid};
use std::sync::Arc;
use tracing::{debug, trace};

/// Per-token decision source
pub trait SidOracle: Send + Sync {
    /// `Some(allow)` when this oracle has an opinion for `sid`, `None` when
    /// it is silent
    fn decide_for(&self, sid: &Sid, permission: &Permission) -> Option<bool>;
}

impl<T: SidOracle + ?Sized> SidOracle for Arc<T> {
    fn decide_for(&self, sid: &Sid, permission: &Permission) -> Option<bool> {
        (**self).decide_for(sid, permission)
    }
}

/// Walk the tiers for `auth`, returning the first definite answer.
///
/// `None` means no tier had an opinion; converting that to a decision is
/// the caller's business (deny, or ask a parent ACL).
pub fn resolve<O>(oracle: &O, auth: &Authentication, permission: &Permission) -> Option<bool>
where
    O: SidOracle + ?Sized,
{
    for sid in auth.sids() {
        if let Some(decision) = oracle.decide_for(&sid, permission) {
            trace!(
                sid = %sid,
                permission = permission.id(),
                decision,
                "Tier decided"
            );
            return Some(decision);
        }
    }
    trace!(permission = permission.id(), "No tier decided");
    None
}

/// ACL that resolves through tiers and denies when every tier is silent
pub struct SidAcl<O> {
    oracle: O,
}

impl<O: SidOracle> SidAcl<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}

impl<O: SidOracle> Acl for SidAcl<O> {
    fn has_permission(&self, auth: &Authentication, permission: &Permission) -> bool {
        if auth.is_system() {
            return true;
        }
        let decision = resolve(&self.oracle, auth, permission);
        debug!(
            principal = auth.principal(),
            permission = permission.id(),
            decision = ?decision,
            "Resolved permission"
        );
        decision.unwrap_or(false)
    }
}

impl<O: SidOracle> SidOracle for SidAcl<O> {
    fn decide_for(&self, sid: &Sid, permission: &Permission) -> Option<bool> {
        self.oracle.decide_for(sid, permission)
    }
}

/// Oracle that asks `child` first and falls back to `parent` only when the
/// child is silent for that exact token and permission
pub struct InheritingOracle {
    child: Arc<dyn SidOracle>,
    parent: Arc<dyn SidOracle>,
}

impl SidOracle for InheritingOracle {
    fn decide_for(&self, sid: &Sid, permission: &Permission) -> Option<bool> {
        self.child
            .decide_for(sid, permission)
            .or_else(|| self.parent.decide_for(sid, permission))
    }
}

/// Compose two oracles tier by tier.
///
/// Unlike a parent ACL, which only sees requests the child could not decide
/// at any tier, the parent here is merged in at every tier, so a child deny
/// for a group still beats a parent allow for that group while everything
/// the child does not mention is inherited.
pub fn inheriting(
    child: Arc<dyn SidOracle>,
    parent: Arc<dyn SidOracle>,
) -> SidAcl<InheritingOracle> {
    SidAcl::new(InheritingOracle { child, parent })
}
