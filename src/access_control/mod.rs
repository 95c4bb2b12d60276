//! Access control module
//!
//! Decides whether an identity may use a permission, at the root of the
//! object tree or on a specific secured object.
//!
//! ## Resolution Model
//!
//! A check runs through the following stages, and the first stage with an
//! answer decides:
//!
//! 1. **System identity** - always allowed, nothing else is consulted
//! 2. **Override hooks** - in registration order
//! 3. **Tiered resolution** - the principal, then each of its groups in
//!    order, then everyone
//! 4. **Default** - deny
//!
//! At each tier the policy walks the permission's implication chain from
//! the permission itself up to its broadest ancestor, so a grant of
//! `Administer` covers everything it implies.
//!
//! ## Example Configuration
//!
//! ```toml
//! [authorization]
//! strategy = "project_matrix"
//! grants = [
//!     "hudson.model.Hudson.Administer:admins",
//!     "hudson.model.Hudson.Read:role_everyone",
//! ]
//!
//! [[authorization.overrides]]
//! name = "webhook"
//! permissions = ["hudson.model.Item.Build"]
//! principals = ["^github-webhook$"]
//! decision = "allow"
//!
//! [[objects]]
//! name = "prod/app"
//! use_project_security = true
//! grants = ["hudson.model.Item.Read:ops"]
//! ```

pub mod acl;
pub mod controller;
pub mod overrides;
pub mod patterns;
pub mod resolver;
pub mod sparse;
pub mod types;

pub use acl::{Acl, FnAcl, acl_fn};
pub use controller::{AccessController, GuardedAcl};
pub use overrides::{AuthorizationOverride, PatternOverride};
pub use patterns::PatternMatcher;
pub use resolver::{InheritingOracle, SidAcl, SidOracle, inheriting, resolve};
pub use sparse::{AclEntry, SparseAcl};
pub use types::{AccessTarget, SecuredObject};
