//! Layered configuration loading
//!
//! Sources, later ones winning:
//! - serde defaults on [`AppConfig`]
//! - one TOML file, explicit or found on [`DEFAULT_CONFIG_PATHS`]
//! - `GATEKEEPER__*` environment variables, `__` separating nested keys
//!   (`GATEKEEPER__LOGGING__LEVEL` sets `logging.level`)

use crate::access_control::PatternMatcher;
use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::collections::HashSet;
use std::path::PathBuf;

/// Files searched when no path is given; the first one present is used
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "gatekeeper.toml",
    ".gatekeeper.toml",
    "~/.config/gatekeeper/config.toml",
    "/etc/gatekeeper/config.toml",
];

const ENV_PREFIX: &str = "GATEKEEPER";

/// Parse and validate a policy held in memory
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    finish(Config::builder().add_source(File::from_str(toml_str, FileFormat::Toml)))
}

/// Load the policy file (explicit or discovered) with environment overrides
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(file) = config_file(config_path)? {
        builder = builder.add_source(File::from(file).format(FileFormat::Toml));
    }
    finish(
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        ),
    )
}

/// Resolve which file to read. An explicit path must exist; discovery may
/// find nothing.
fn config_file(explicit: Option<&str>) -> Result<Option<PathBuf>, ConfigError> {
    match explicit {
        Some(path) => {
            let file = PathBuf::from(shellexpand::tilde(path).as_ref());
            if file.exists() {
                Ok(Some(file))
            } else {
                Err(ConfigError::Load(format!(
                    "Configuration file not found: {}",
                    path
                )))
            }
        }
        None => Ok(DEFAULT_CONFIG_PATHS
            .iter()
            .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
            .find(|file| file.exists())),
    }
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    let app_config: AppConfig = builder
        .build()
        .and_then(Config::try_deserialize)
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    validate_config(&app_config)?;
    Ok(app_config)
}

/// Validate configuration values
///
/// Permission ids in matrices are not checked here: unknown ids are skipped
/// with a warning when the matrix is built, so one stale line does not take
/// the whole policy down.
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let authorization = &config.authorization;

    if authorization.strategy.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "authorization.strategy".to_string(),
        });
    }

    if authorization.admin_sid.trim().is_empty() {
        return Err(ConfigError::Invalid {
            message: "authorization.admin_sid must not be empty".to_string(),
        });
    }

    for (index, rule) in authorization.overrides.iter().enumerate() {
        if rule.name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: format!("authorization.overrides[{}].name", index),
            });
        }
        validate_patterns(
            &rule.principals,
            &format!("authorization.overrides.{}.principals", rule.name),
        )?;
        validate_patterns(
            &rule.objects,
            &format!("authorization.overrides.{}.objects", rule.name),
        )?;
    }

    let mut seen = HashSet::new();
    for object in &config.objects {
        if object.name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "objects.name".to_string(),
            });
        }
        if !seen.insert(object.name.as_str()) {
            return Err(ConfigError::Invalid {
                message: format!("object '{}' is configured more than once", object.name),
            });
        }
    }

    Ok(())
}

fn validate_patterns(patterns: &[String], field_path: &str) -> Result<(), ConfigError> {
    PatternMatcher::new(patterns).map(drop).map_err(|e| match e {
        ConfigError::InvalidPattern { pattern, reason } => ConfigError::InvalidPattern {
            pattern,
            reason: format!("in {}: {}", field_path, reason),
        },
        other => other,
    })
}
