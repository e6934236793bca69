#![recursion_limit = "256"]
//! # Main Entry Point
//!
//! Wires the layers together and hands control to the lifecycle manager:
//! - Domain: Configuration, Types and Errors
//! - Infrastructure: Matrix gateway
//! - Application: Registry, Loader, Host, Scheduler, Lifecycle, Logging
//! - Interface: Built-in extensions
//!
//! `main` stays synchronous; the scheduler is built and released by the lifecycle manager.

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;

use anyhow::Result;
use std::time::Duration;

use crate::application::lifecycle::{DEFAULT_DRAIN_DELAY, LifecycleManager};
use crate::application::registry::ExtensionRegistry;
use crate::domain::config::{AppConfig, EnvSettings};
use crate::domain::error::LifecycleError;
use crate::domain::types::{HostExit, join_names};
use crate::infrastructure::matrix::MatrixGateway;
use crate::interface::extensions::builtin_catalog;
use crate::strings::logs;

fn main() -> Result<()> {
    // 1. Load Configuration
    let config = AppConfig::load_default().map_err(LifecycleError::from)?;

    // 2. Logging Setup
    let _guard = application::logging::init(&config.logging)?;
    tracing::info!("{}", logs::config_loaded(&config.matrix.username));

    // 3. Environment
    let env = EnvSettings::from_env().map_err(LifecycleError::from)?;

    // 4. Startup list
    let base = config
        .bot
        .extensions
        .clone()
        .unwrap_or_else(ExtensionRegistry::base);
    let registry = ExtensionRegistry::build(&base, env.debug_repl);
    tracing::info!("{}", logs::startup_list(&join_names(registry.names())));

    let catalog = builtin_catalog(&config.bot);
    let drain_delay = config
        .bot
        .drain_delay_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_DRAIN_DELAY);

    // 5. Run
    let gateway = MatrixGateway::new(&config.matrix);
    let mut manager = LifecycleManager::new(registry, catalog)?.with_drain_delay(drain_delay);
    let report = manager.run(config.bot_configuration(env), Box::new(gateway))?;

    if let HostExit::Failed(reason) = report.exit {
        anyhow::bail!(logs::host_failed(&reason));
    }
    tracing::info!("{}", logs::shutdown_complete(&join_names(&report.loaded)));
    Ok(())
}
