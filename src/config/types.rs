//! Configuration types for gatekeeper
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root authorization strategy and override hooks
    pub authorization: AuthorizationConfig,

    /// Secured objects carrying their own matrix
    pub objects: Vec<ObjectConfig>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Authorization configuration
///
/// `strategy` names a factory in the strategy registry. The remaining
/// fields are read by the strategies that need them:
/// - `grants`: matrix lines (`"<permission id>:<sid>"`) for the matrix strategies
/// - `admin_sid`: the administrator principal of the `legacy` strategy
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Strategy name (unsecured, full_control_once_logged_in, legacy,
    /// global_matrix, project_matrix)
    pub strategy: String,

    /// Principal granted Administer by the legacy strategy
    pub admin_sid: String,

    /// Root matrix lines
    pub grants: Vec<String>,

    /// Give Item.Read to every sid holding Hudson.Read when loading the matrix
    pub migrate_legacy_read: bool,

    /// Permission ids hidden from administrators
    pub disabled_permissions: Vec<String>,

    /// Override rules, consulted in order before the strategy
    pub overrides: Vec<OverrideRuleConfig>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            strategy: "global_matrix".to_string(),
            admin_sid: "admin".to_string(),
            grants: Vec::new(),
            migrate_legacy_read: false,
            disabled_permissions: Vec::new(),
            overrides: Vec::new(),
        }
    }
}

/// A config-driven override hook
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverrideRuleConfig {
    /// Name used in logs
    pub name: String,

    /// Permission ids the rule applies to
    pub permissions: Vec<String>,

    /// Principal name patterns (regex); empty matches any principal
    #[serde(default)]
    pub principals: Vec<String>,

    /// Object full-name patterns (regex); empty matches any target
    #[serde(default)]
    pub objects: Vec<String>,

    pub decision: RuleDecision,
}

/// Decision forced by an override rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleDecision {
    Allow,
    Deny,
}

/// A secured object and its matrix property
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectConfig {
    /// Full name of the object (e.g. `team/app`)
    pub name: String,

    /// Whether the object's matrix replaces the root policy
    #[serde(default)]
    pub use_project_security: bool,

    /// How the object's matrix combines with the root matrix
    #[serde(default)]
    pub inheritance: Inheritance,

    /// Matrix lines
    #[serde(default)]
    pub grants: Vec<String>,
}

/// How a per-object matrix combines with the root matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Inheritance {
    /// The object's matrix alone decides
    #[default]
    None,
    /// Tokens the object's matrix is silent about fall back to the root matrix
    Global,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
