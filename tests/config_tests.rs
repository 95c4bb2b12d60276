//! Configuration integration tests
//!
//! Covers loading from TOML strings and files, environment overrides,
//! validation errors, and building a policy from the loaded result.

use gatekeeper::Policy;
use gatekeeper::config::{LogFormat, RuleDecision, load_config, load_config_from_str};
use gatekeeper::error::{AppError, ConfigError};
use std::env;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_empty_config_is_fail_closed() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.authorization.strategy, "global_matrix");

    let policy = Policy::load(&config).unwrap();
    let read = policy.registry().lookup("hudson.model.Hudson.Read").unwrap();
    assert!(
        !policy
            .controller()
            .has_permission(&gatekeeper::security::Authentication::user("alice"), &read)
    );
}

#[test]
fn test_full_config() {
    let config_str = r#"
[authorization]
strategy = "project_matrix"
admin_sid = "root"
migrate_legacy_read = true
grants = [
    "hudson.model.Hudson.Administer:admins",
    "hudson.model.Hudson.Read:role_everyone",
]
disabled_permissions = ["hudson.model.Item.Workspace"]

[[authorization.overrides]]
name = "status-badge"
permissions = ["hudson.model.Item.Read"]
objects = ["^public/"]
decision = "allow"

[[objects]]
name = "public/site"
use_project_security = true

[logging]
level = "debug"
format = "json"
"#;

    let config = load_config_from_str(config_str).unwrap();
    assert_eq!(config.authorization.strategy, "project_matrix");
    assert_eq!(config.authorization.grants.len(), 2);
    assert!(config.authorization.migrate_legacy_read);
    assert_eq!(config.authorization.overrides[0].decision, RuleDecision::Allow);
    assert!(config.authorization.overrides[0].principals.is_empty());
    assert_eq!(config.objects[0].name, "public/site");
    assert_eq!(config.logging.format, LogFormat::Json);

    let policy = Policy::load(&config).unwrap();
    assert_eq!(policy.controller().overrides().len(), 1);
}

#[test]
fn test_unknown_strategy_fails_policy_build() {
    let config = load_config_from_str(
        r#"
[authorization]
strategy = "role_based"
"#,
    )
    .unwrap();

    match Policy::load(&config) {
        Err(AppError::Config(ConfigError::UnknownStrategy { name })) => {
            assert_eq!(name, "role_based")
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("policy with an unknown strategy must not load"),
    }
}

#[test]
fn test_invalid_override_pattern() {
    let config_str = r#"
[[authorization.overrides]]
name = "broken"
permissions = ["hudson.model.Item.Build"]
objects = ["(unclosed"]
decision = "allow"
"#;

    let result = load_config_from_str(config_str);
    assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
}

#[test]
fn test_override_without_permissions_fails_policy_build() {
    let config = load_config_from_str(
        r#"
[[authorization.overrides]]
name = "empty"
permissions = []
decision = "deny"
"#,
    )
    .unwrap();

    assert!(matches!(
        Policy::load(&config),
        Err(AppError::Config(ConfigError::Invalid { .. }))
    ));
}

#[test]
fn test_override_with_misspelled_permissions_fails_policy_build() {
    let config = load_config_from_str(
        r#"
[[authorization.overrides]]
name = "typo"
permissions = ["hudson.model.Item.Bulid", "hudson.model.Itme.Read"]
principals = ["^ci-"]
decision = "allow"
"#,
    )
    .unwrap();

    match Policy::load(&config) {
        Err(AppError::Config(ConfigError::Invalid { message })) => {
            assert!(message.contains("typo"), "{}", message);
            assert!(message.contains("hudson.model.Itme.Read"), "{}", message);
        }
        other => panic!("expected an invalid override, got {:?}", other.err()),
    }
}

#[test]
fn test_malformed_toml() {
    let result = load_config_from_str("[authorization\nstrategy = ");
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
#[serial_test::serial]
fn test_load_config_from_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("gatekeeper.toml");
    fs::write(
        &config_path,
        r#"
[authorization]
strategy = "legacy"
admin_sid = "ops-lead"
"#,
    )
    .unwrap();

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();
    assert_eq!(config.authorization.strategy, "legacy");
    assert_eq!(config.authorization.admin_sid, "ops-lead");
}

#[test]
#[serial_test::serial]
fn test_missing_explicit_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("absent.toml");

    let result = load_config(Some(config_path.to_str().unwrap()));
    assert!(matches!(result, Err(ConfigError::Load(message)) if message.contains("not found")));
}

#[test]
#[serial_test::serial]
fn test_env_var_overrides_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("gatekeeper.toml");
    fs::write(
        &config_path,
        r#"
[authorization]
strategy = "global_matrix"

[logging]
level = "info"
"#,
    )
    .unwrap();

    unsafe {
        env::set_var("GATEKEEPER__AUTHORIZATION__STRATEGY", "unsecured");
        env::set_var("GATEKEEPER__LOGGING__LEVEL", "trace");
    }

    let config = load_config(Some(config_path.to_str().unwrap()));

    unsafe {
        env::remove_var("GATEKEEPER__AUTHORIZATION__STRATEGY");
        env::remove_var("GATEKEEPER__LOGGING__LEVEL");
    }

    let config = config.unwrap();
    assert_eq!(config.authorization.strategy, "unsecured");
    assert_eq!(config.logging.level, "trace");
}

#[test]
#[serial_test::serial]
fn test_env_var_validation_applies() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("gatekeeper.toml");
    fs::write(&config_path, "[authorization]\nstrategy = \"legacy\"\n").unwrap();

    unsafe {
        env::set_var("GATEKEEPER__AUTHORIZATION__ADMIN_SID", "");
    }

    let result = load_config(Some(config_path.to_str().unwrap()));

    unsafe {
        env::remove_var("GATEKEEPER__AUTHORIZATION__ADMIN_SID");
    }

    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_export_round_trips_through_toml() {
    let config = load_config_from_str(
        r#"
[authorization]
strategy = "project_matrix"
grants = ["hudson.model.Item.Read:dev", "com.example.Gone.Perm:dev"]

[[objects]]
name = "team/app"
use_project_security = true
inheritance = "global"
grants = ["hudson.model.Item.Build:alice"]
"#,
    )
    .unwrap();
    let policy = Policy::load(&config).unwrap();

    let exported = toml::to_string_pretty(&policy.export(&config)).unwrap();
    let reloaded = load_config_from_str(&exported).unwrap();

    assert_eq!(reloaded.authorization.grants, vec!["hudson.model.Item.Read:dev"]);
    assert_eq!(reloaded.objects.len(), 1);
    assert_eq!(reloaded.objects[0].grants, vec!["hudson.model.Item.Build:alice"]);
    assert!(reloaded.objects[0].use_project_security);
}
