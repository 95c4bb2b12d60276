//! gatekeeper
//!
//! Operator CLI: loads a policy file and answers permission queries against it.

use anyhow::Context;
use clap::{Parser, Subcommand};
use gatekeeper::{
    AppError, Policy,
    access_control::Acl,
    config::{AppConfig, LogFormat, load_config},
    security::{Authentication, Permission},
};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Permission resolution for build platforms
#[derive(Parser, Debug)]
#[command(name = "gatekeeper")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "GATEKEEPER_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, env = "GATEKEEPER_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide whether an identity holds a permission
    Check {
        /// Principal name
        #[arg(short = 'u', long, conflicts_with = "anonymous")]
        principal: Option<String>,

        /// Group membership, in resolution order (repeatable)
        #[arg(short, long = "group")]
        groups: Vec<String>,

        /// Check as the unauthenticated user
        #[arg(long)]
        anonymous: bool,

        /// Permission id; when repeated, any one of them suffices
        #[arg(short, long = "permission", required = true)]
        permissions: Vec<String>,

        /// Full name of the object to check against (default: the root)
        #[arg(short, long)]
        object: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the permission catalog
    Permissions,

    /// List the sids the active strategy mentions
    Sids,

    /// Print the configuration with matrices as they were loaded
    Export,

    /// Load the configuration and report problems
    Validate,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    principal: &'a str,
    anonymous: bool,
    groups: &'a [String],
    object: Option<&'a str>,
    permissions: &'a [String],
    allowed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    headers: Vec<(&'static str, String)>,
}

fn init_logging(args: &Args, config: &AppConfig) {
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn resolve_permissions(policy: &Policy, ids: &[String]) -> anyhow::Result<Vec<Arc<Permission>>> {
    ids.iter()
        .map(|id| {
            policy
                .registry()
                .lookup(id)
                .with_context(|| format!("unknown permission '{}'", id))
        })
        .collect()
}

fn run_check(
    policy: &Policy,
    auth: &Authentication,
    ids: &[String],
    object: Option<&str>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let permissions = resolve_permissions(policy, ids)?;
    let item = object.map(|name| policy.require_item(name)).transpose()?;

    let controller = policy.controller();
    let result = match item {
        Some(item) => controller
            .acl_for(&**item)
            .check_any_permission(auth, &permissions),
        None => controller.check_any_permission(auth, &permissions),
    };

    let denial = match result {
        Ok(()) => None,
        Err(AppError::AccessDenied(denied)) => Some(denied),
        Err(e) => return Err(e.into()),
    };
    debug!(allowed = denial.is_none(), "Check finished");

    if json {
        let report = CheckReport {
            principal: auth.principal(),
            anonymous: auth.is_anonymous(),
            groups: auth.groups(),
            object,
            permissions: ids,
            allowed: denial.is_none(),
            headers: denial.as_ref().map(|d| d.headers()).unwrap_or_default(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &denial {
            None => println!("allowed"),
            Some(denied) => print!("denied: {}", denied.report()),
        }
    }

    Ok(if denial.is_none() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn run_permissions(policy: &Policy) {
    for group in policy.registry().all_groups() {
        println!("{} ({})", group.title(), group.owner());
        for permission in group.permissions() {
            let mut line = format!("  {}", permission.id());
            if let Some(parent) = permission.implied_by() {
                line.push_str(&format!(" <- {}", parent.id()));
            }
            if !permission.is_enabled() {
                line.push_str(" [disabled]");
            }
            println!("{}", line);
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("failed to load configuration")?;
    init_logging(&args, &config);

    let policy = Policy::load(&config)
        .inspect_err(|e| error!(error = %e, "Failed to build policy"))?;

    match &args.command {
        Command::Check {
            principal,
            groups,
            anonymous,
            permissions,
            object,
            json,
        } => {
            let auth = match (principal, anonymous) {
                (_, true) => Authentication::anonymous(),
                (Some(name), false) => Authentication::user(name.as_str()),
                (None, false) => anyhow::bail!("either --principal or --anonymous is required"),
            }
            .with_groups(groups.iter().cloned());
            run_check(&policy, &auth, permissions, object.as_deref(), *json)
        }
        Command::Permissions => {
            run_permissions(&policy);
            Ok(ExitCode::SUCCESS)
        }
        Command::Sids => {
            for sid in policy.controller().strategy().sids() {
                println!("{}", sid);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Export => {
            let exported = policy.export(&config);
            print!("{}", toml::to_string_pretty(&exported)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate => {
            let strategy = policy.controller().strategy();
            info!(strategy = strategy.kind(), "Configuration is valid");
            println!(
                "ok: strategy={} permissions={} objects={} overrides={}",
                strategy.kind(),
                policy.registry().len(),
                policy.items().count(),
                policy.controller().overrides().len()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
