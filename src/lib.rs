//! gatekeeper
//!
//! Permission resolution for multi-tenant build platforms.
//!
//! ## Features
//!
//! - **Implication hierarchy** - a grant of a broad permission covers every
//!   permission it implies
//! - **Tiered resolution** - principal, then groups in order, then everyone
//! - **Pluggable strategies** - unsecured, open access, legacy admin-only,
//!   global matrix and per-object matrices
//! - **Override hooks** consulted before the strategy
//! - **Flexible configuration** via TOML files and environment variables
//!
//! ## Resolution Model
//!
//! ```text
//! system identity → override hooks → principal → groups → everyone → deny
//! ```
//!
//! ## Example
//!
//! ```
//! use gatekeeper::{Policy, config::load_config_from_str, security::Authentication};
//!
//! let config = load_config_from_str(r#"
//! [authorization]
//! strategy = "global_matrix"
//! grants = ["hudson.model.Hudson.Administer:admins"]
//! "#).unwrap();
//! let policy = Policy::load(&config).unwrap();
//! let configure = policy.registry().lookup("hudson.model.Item.Configure").unwrap();
//!
//! let alice = Authentication::user("alice").with_groups(["admins"]);
//! assert!(policy.controller().has_permission(&alice, &configure));
//! ```

pub mod access_control;
pub mod config;
pub mod error;
pub mod model;
pub mod policy;
pub mod security;
pub mod strategy;

// Re-export main types
pub use access_control::{AccessController, Acl};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use policy::Policy;
