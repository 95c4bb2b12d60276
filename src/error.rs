//! Error types for gatekeeper
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors that are part of the API;
//! the binary wraps them in `anyhow` at the boundary.

use crate::security::Authentication;
use std::fmt::Write as _;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Permission registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Access denied: {0}")]
    AccessDenied(#[from] AccessDeniedError),

    #[error("ACL error: {0}")]
    Acl(#[from] AclError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unknown authorization strategy '{name}'")]
    UnknownStrategy { name: String },
}

/// Errors raised while populating the permission registry.
///
/// These are startup-time programming errors: the process should refuse to
/// start rather than run with a partial catalog.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Permission '{id}' is already registered")]
    Duplicate { id: String },

    #[error("'{name}' is not a valid permission name")]
    InvalidName { name: String },

    #[error("'{owner}' is not a valid permission owner")]
    InvalidOwner { owner: String },

    #[error("Permission '{id}' is implied by '{parent}', which is not registered")]
    UnknownParent { id: String, parent: String },

    #[error("Scope '{model_type}' is already registered")]
    DuplicateScope { model_type: String },

    #[error("Unknown permission '{id}'")]
    UnknownPermission { id: String },
}

/// Misuse of the ACL API
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AclError {
    #[error("At least one permission must be provided")]
    NoPermissions,
}

/// A permission the caller was denied, with the implication chain that was
/// walked while resolving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeniedPermission {
    /// Id of the permission reported to the caller
    pub id: String,
    /// Ids of the broader permissions that would also have granted access,
    /// nearest first
    pub implied_by: Vec<String>,
}

/// Access denial raised by the throwing permission checks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{principal} is missing the {} permission", join_ids(.permissions))]
pub struct AccessDeniedError {
    pub principal: String,
    pub groups: Vec<String>,
    pub permissions: Vec<DeniedPermission>,
    /// The caller never logged in, so logging in may be enough
    pub anonymous: bool,
}

impl AccessDeniedError {
    pub fn new(auth: &Authentication, permissions: Vec<DeniedPermission>) -> Self {
        Self {
            principal: auth.principal().to_string(),
            groups: auth.groups().to_vec(),
            permissions,
            anonymous: auth.is_anonymous(),
        }
    }

    /// Diagnostic headers describing the denial.
    ///
    /// Only emitted for a single-permission denial; the implied-by headers
    /// are meaningless when several alternatives were requested.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![("X-You-Are-Authenticated-As", self.principal.clone())];
        for group in &self.groups {
            headers.push(("X-You-Are-In-Group", group.clone()));
        }
        if let [permission] = self.permissions.as_slice() {
            headers.push(("X-Required-Permission", permission.id.clone()));
            for parent in &permission.implied_by {
                headers.push(("X-Permission-Implied-By", parent.clone()));
            }
        }
        headers
    }

    /// Multi-line textual report of the denial
    pub fn report(&self) -> String {
        let mut out = format!("{}\n", self);
        if self.anonymous {
            let _ = writeln!(out, "  not logged in");
        }
        if self.groups.is_empty() {
            let _ = writeln!(out, "  groups: (none)");
        } else {
            let _ = writeln!(out, "  groups: {}", self.groups.join(", "));
        }
        for permission in &self.permissions {
            let _ = writeln!(out, "  required: {}", permission.id);
            for parent in &permission.implied_by {
                let _ = writeln!(out, "    implied by: {}", parent);
            }
        }
        out
    }
}

fn join_ids(permissions: &[DeniedPermission]) -> String {
    permissions
        .iter()
        .map(|p| p.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn denial() -> AccessDeniedError {
        let auth = Authentication::user("alice").with_groups(["dev", "ops"]);
        AccessDeniedError::new(
            &auth,
            vec![DeniedPermission {
                id: "hudson.model.Item.Configure".into(),
                implied_by: vec![
                    "hudson.security.Permission.GenericConfigure".into(),
                    "hudson.model.Hudson.Administer".into(),
                ],
            }],
        )
    }

    #[test]
    fn test_display() {
        assert_eq!(
            denial().to_string(),
            "alice is missing the hudson.model.Item.Configure permission"
        );
    }

    #[test]
    fn test_headers() {
        let headers = denial().headers();
        assert_eq!(headers[0], ("X-You-Are-Authenticated-As", "alice".to_string()));
        assert_eq!(
            headers
                .iter()
                .filter(|(name, _)| *name == "X-You-Are-In-Group")
                .count(),
            2
        );
        assert_eq!(
            headers
                .iter()
                .filter(|(name, _)| *name == "X-Permission-Implied-By")
                .map(|(_, value)| value.as_str())
                .collect::<Vec<_>>(),
            vec![
                "hudson.security.Permission.GenericConfigure",
                "hudson.model.Hudson.Administer"
            ]
        );
    }

    #[test]
    fn test_headers_omit_chain_for_multiple_permissions() {
        let mut err = denial();
        err.permissions.push(DeniedPermission {
            id: "hudson.model.Item.Build".into(),
            implied_by: vec![],
        });
        assert!(
            err.headers()
                .iter()
                .all(|(name, _)| *name != "X-Required-Permission")
        );
        assert!(err.to_string().contains("Configure, hudson.model.Item.Build"));
    }

    #[test]
    fn test_report() {
        insta::assert_snapshot!(denial().report(), @r"
        alice is missing the hudson.model.Item.Configure permission
          groups: dev, ops
          required: hudson.model.Item.Configure
            implied by: hudson.security.Permission.GenericConfigure
            implied by: hudson.model.Hudson.Administer
        ");
    }

    #[test]
    fn test_report_anonymous() {
        let err = AccessDeniedError::new(
            &Authentication::anonymous(),
            vec![DeniedPermission {
                id: "hudson.model.Hudson.Read".into(),
                implied_by: vec!["hudson.model.Hudson.Administer".into()],
            }],
        );
        assert!(err.anonymous);
        assert!(!denial().anonymous);
        insta::assert_snapshot!(err.report(), @r"
        anonymous is missing the hudson.model.Hudson.Read permission
          not logged in
          groups: (none)
          required: hudson.model.Hudson.Read
            implied by: hudson.model.Hudson.Administer
        ");
    }
}
