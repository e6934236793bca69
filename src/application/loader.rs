//! # Extension Loader
//!
//! Attaches the extensions named by an `ExtensionRegistry` to a `BotHost`, one at a
//! time and in order. The first failure stops the walk; whatever loaded before it
//! stays loaded and the caller is expected to abort startup.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::host::BotHost;
use crate::application::registry::ExtensionRegistry;
use crate::domain::error::LoadError;
use crate::domain::types::{ExtensionName, join_names};
use crate::strings::logs;

/// A feature module. `setup` registers commands, listeners and tasks on the host
/// and may assume every earlier registry entry has already been set up.
pub trait Extension: Send + Sync {
    fn setup(&self, host: &mut BotHost) -> Result<()>;
}

impl<F> Extension for F
where
    F: Fn(&mut BotHost) -> Result<()> + Send + Sync,
{
    fn setup(&self, host: &mut BotHost) -> Result<()> {
        (self)(host)
    }
}

/// Maps extension names to their implementations.
#[derive(Default, Clone)]
pub struct ExtensionCatalog {
    entries: HashMap<ExtensionName, Arc<dyn Extension>>,
}

impl ExtensionCatalog {
    pub fn register(&mut self, name: impl Into<ExtensionName>, extension: impl Extension + 'static) {
        self.entries.insert(name.into(), Arc::new(extension));
    }

    pub fn register_fn<F>(&mut self, name: impl Into<ExtensionName>, setup: F)
    where
        F: Fn(&mut BotHost) -> Result<()> + Send + Sync + 'static,
    {
        self.register(name, setup);
    }

    pub fn get(&self, name: &ExtensionName) -> Option<Arc<dyn Extension>> {
        self.entries.get(name).cloned()
    }
}

pub struct ExtensionLoader<'a> {
    catalog: &'a ExtensionCatalog,
}

impl<'a> ExtensionLoader<'a> {
    pub fn new(catalog: &'a ExtensionCatalog) -> Self {
        Self { catalog }
    }

    /// Loads every registry entry into `host`, returning the loaded names in order.
    pub fn load(
        &self,
        host: &mut BotHost,
        registry: &ExtensionRegistry,
    ) -> Result<Vec<ExtensionName>, LoadError> {
        if registry.is_empty() {
            tracing::warn!("{}", logs::NO_EXTENSIONS);
        }
        let mut loaded = Vec::with_capacity(registry.len());

        for name in registry.names() {
            let Some(extension) = self.catalog.get(name) else {
                tracing::error!("{}", logs::extension_unknown(name.as_str()));
                return Err(LoadError::NotFound {
                    name: name.clone(),
                    loaded,
                });
            };

            if let Err(e) = extension.setup(host) {
                tracing::error!("{}", logs::extension_failed(name.as_str(), &format!("{e:#}")));
                return Err(LoadError::Failed {
                    name: name.clone(),
                    loaded,
                    source: e.into(),
                });
            }

            host.record_loaded(name.clone());
            loaded.push(name.clone());
            tracing::info!("{}", logs::extension_loaded(name.as_str()));
        }

        tracing::info!("{}", logs::all_extensions_loaded(&join_names(&loaded)));
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::host::testing::{Ending, ScriptedGateway};
    use crate::application::scheduler::Scheduler;
    use crate::domain::config::{BotConfiguration, CommandPrefix, SecretToken};
    use std::sync::Mutex;

    fn host(scheduler: &Scheduler) -> BotHost {
        BotHost::new(
            BotConfiguration::new(SecretToken::new("t"), CommandPrefix::literal("%")),
            Box::new(ScriptedGateway::new(vec![], Ending::Return)),
            scheduler.handle(),
        )
    }

    fn names(raw: &[&str]) -> Vec<ExtensionName> {
        raw.iter().copied().map(ExtensionName::from).collect()
    }

    /// Catalog whose entries record each attempt; `failing` entries return an error.
    fn tracking_catalog(all: &[&str], failing: &[&str]) -> (ExtensionCatalog, Arc<Mutex<Vec<String>>>) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let mut catalog = ExtensionCatalog::default();
        for name in all {
            let attempts = attempts.clone();
            let label = name.to_string();
            let fails = failing.contains(name);
            catalog.register_fn(*name, move |_host| {
                attempts.lock().unwrap().push(label.clone());
                if fails {
                    anyhow::bail!("{label} is broken");
                }
                Ok(())
            });
        }
        (catalog, attempts)
    }

    #[test]
    fn test_loads_in_registry_order() {
        let scheduler = Scheduler::new().unwrap();
        let (catalog, attempts) = tracking_catalog(&["a", "b", "c"], &[]);
        let registry = ExtensionRegistry::build(&names(&["c", "a", "b"]), false);
        let mut host = host(&scheduler);

        let loaded = ExtensionLoader::new(&catalog).load(&mut host, &registry).unwrap();
        assert_eq!(loaded, names(&["c", "a", "b"]));
        assert_eq!(host.loaded(), loaded.as_slice());
        assert_eq!(*attempts.lock().unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_failure_stops_loading_without_rollback() {
        let all = ["a", "b", "c", "d"];
        for failing_index in 0..all.len() {
            let scheduler = Scheduler::new().unwrap();
            let (catalog, attempts) = tracking_catalog(&all, &[all[failing_index]]);
            let registry = ExtensionRegistry::build(&names(&all), false);
            let mut host = host(&scheduler);

            let err = ExtensionLoader::new(&catalog)
                .load(&mut host, &registry)
                .unwrap_err();
            assert!(matches!(err, LoadError::Failed { .. }));
            assert_eq!(err.name(), &all[failing_index]);
            assert_eq!(err.loaded(), names(&all[..failing_index]).as_slice());
            assert_eq!(host.loaded(), err.loaded());
            // Nothing after the failing entry is attempted.
            assert_eq!(*attempts.lock().unwrap(), all[..=failing_index].to_vec());
        }
    }

    #[test]
    fn test_unknown_extension_is_a_load_error() {
        let scheduler = Scheduler::new().unwrap();
        let (catalog, attempts) = tracking_catalog(&["a", "c"], &[]);
        let registry = ExtensionRegistry::build(&names(&["a", "b", "c"]), false);
        let mut host = host(&scheduler);

        let err = ExtensionLoader::new(&catalog)
            .load(&mut host, &registry)
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert_eq!(err.loaded(), names(&["a"]).as_slice());
        assert_eq!(*attempts.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_empty_registry_loads_nothing() {
        let scheduler = Scheduler::new().unwrap();
        let (catalog, attempts) = tracking_catalog(&["a"], &[]);
        let registry = ExtensionRegistry::build(&[], false);
        assert!(registry.is_empty());
        let mut host = host(&scheduler);

        let loaded = ExtensionLoader::new(&catalog).load(&mut host, &registry).unwrap();
        assert!(loaded.is_empty());
        assert!(attempts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_load_twice() {
        let scheduler = Scheduler::new().unwrap();
        let (catalog, attempts) = tracking_catalog(&["a"], &[]);
        let registry = ExtensionRegistry::build(&names(&["a", "a"]), false);
        let mut host = host(&scheduler);

        let loaded = ExtensionLoader::new(&catalog).load(&mut host, &registry).unwrap();
        assert_eq!(loaded, names(&["a", "a"]));
        assert_eq!(attempts.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_later_extension_sees_earlier_state() {
        let scheduler = Scheduler::new().unwrap();
        let mut catalog = ExtensionCatalog::default();
        catalog.register_fn("store", |host| {
            host.provide_service(Arc::new(Mutex::new(vec![1u32])));
            Ok(())
        });
        catalog.register_fn("reader", |host| {
            host.service::<Mutex<Vec<u32>>>()
                .map(|_| ())
                .ok_or_else(|| anyhow::anyhow!("store is not loaded"))
        });
        let mut host = host(&scheduler);

        let ordered = ExtensionRegistry::build(&names(&["store", "reader"]), false);
        assert!(ExtensionLoader::new(&catalog).load(&mut host, &ordered).is_ok());

        let mut fresh = self::host(&scheduler);
        let reversed = ExtensionRegistry::build(&names(&["reader", "store"]), false);
        let err = ExtensionLoader::new(&catalog)
            .load(&mut fresh, &reversed)
            .unwrap_err();
        assert!(err.loaded().is_empty());
        assert!(err.to_string().contains("store is not loaded"));
    }
}
