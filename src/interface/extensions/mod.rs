//! # Built-in Extensions
//!
//! Feature modules the loader can attach by name. Each module exposes a
//! `setup` that registers its commands, listeners and tasks on the host.

pub mod admin;
pub mod database;
pub mod gee;
pub mod info;
pub mod repl;
pub mod split;
pub mod thicc;

use crate::application::loader::ExtensionCatalog;
use crate::application::registry::DIAGNOSTIC_EXTENSION;
use crate::domain::config::BotSettings;

/// Every built-in extension, keyed by the name the registry uses.
pub fn builtin_catalog(settings: &BotSettings) -> ExtensionCatalog {
    let mut catalog = ExtensionCatalog::default();
    let database_path = settings.database_path.clone();

    catalog.register_fn("info", info::setup);
    catalog.register_fn("database", move |host| database::setup(host, &database_path));
    catalog.register_fn("admin", admin::setup);
    catalog.register_fn("gee", gee::setup);
    catalog.register_fn("thicc", thicc::setup);
    catalog.register_fn("split", split::setup);
    catalog.register_fn(DIAGNOSTIC_EXTENSION, repl::setup);
    catalog
}
