//! Permissions and identities
//!
//! The vocabulary every access decision is phrased in: the [`Permission`]
//! implication forest held by a [`PermissionRegistry`], and the [`Sid`]
//! tokens derived from an [`Authentication`].

pub mod builtin;
pub mod permission;
pub mod registry;
pub mod sid;

pub use builtin::{BuiltinPermissions, BuiltinScopes, register_builtins};
pub use permission::{ImplicationChain, Permission, PermissionGroup, PermissionScope};
pub use registry::{PermissionDef, PermissionRegistry};
pub use sid::{ANONYMOUS_USERNAME, Authentication, EVERYONE_SID, SYSTEM_USERNAME, Sid};
