//! Plugin discovery contract: loadable units that yield plugin instances
//!
//! A [`PluginSource`] turns one loadable unit into plugin instances. The
//! in-memory [`PluginModule`] is a list of [`PluginFactory`] values; a
//! factory that fails or panics is skipped so the rest of the unit still
//! loads.

use crate::error::PluginError;
use crate::plugin::Plugin;
use crate::utils::guarded;
use compact_str::CompactString;
use std::sync::Arc;
use tracing::{debug, warn};

/// Factory trait for creating plugin instances
pub trait PluginFactory: Send + Sync {
    /// Create a new plugin instance
    fn create(&self) -> Result<Arc<dyn Plugin>, PluginError>;

    /// Get the plugin name
    fn plugin_name(&self) -> &str;
}

/// Plugin factory that wraps a constructor function
pub struct FnPluginFactory {
    name: CompactString,
    constructor: Box<dyn Fn() -> Result<Arc<dyn Plugin>, PluginError> + Send + Sync>,
}

impl FnPluginFactory {
    /// Wrap a fallible constructor
    pub fn new<F>(name: &str, constructor: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        Self {
            name: CompactString::new(name),
            constructor: Box::new(constructor),
        }
    }

    /// Wrap a constructor that cannot fail
    pub fn infallible<P, F>(name: &str, constructor: F) -> Self
    where
        P: Plugin,
        F: Fn() -> P + Send + Sync + 'static,
    {
        Self::new(name, move || Ok(Arc::new(constructor()) as Arc<dyn Plugin>))
    }
}

impl PluginFactory for FnPluginFactory {
    fn create(&self) -> Result<Arc<dyn Plugin>, PluginError> {
        (self.constructor)()
    }

    fn plugin_name(&self) -> &str {
        &self.name
    }
}

/// A loadable unit of plugins
pub trait PluginSource: Send + Sync {
    /// Name used in logs
    fn source_name(&self) -> &str;

    /// Instantiate every plugin the unit provides
    ///
    /// Candidates that cannot be instantiated are skipped, never reported as
    /// an error. Panics are caught when `catch_panics` is set.
    fn instantiate(&self, catch_panics: bool) -> Vec<Arc<dyn Plugin>>;
}

/// In-memory plugin unit
#[derive(Default)]
pub struct PluginModule {
    name: CompactString,
    factories: Vec<Box<dyn PluginFactory>>,
}

impl PluginModule {
    pub fn new(name: &str) -> Self {
        Self {
            name: CompactString::new(name),
            factories: Vec::new(),
        }
    }

    /// Add a factory to the unit
    pub fn with_factory(mut self, factory: impl PluginFactory + 'static) -> Self {
        self.factories.push(Box::new(factory));
        self
    }

    /// Add a plugin constructor to the unit
    pub fn with_plugin<P, F>(self, name: &str, constructor: F) -> Self
    where
        P: Plugin,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.with_factory(FnPluginFactory::infallible(name, constructor))
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl PluginSource for PluginModule {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn instantiate(&self, catch_panics: bool) -> Vec<Arc<dyn Plugin>> {
        self.factories
            .iter()
            .filter_map(|factory| {
                let created = guarded(catch_panics, || factory.create())
                    .unwrap_or_else(|panic| Err(PluginError::Panicked(panic)));

                match created {
                    Ok(plugin) => {
                        debug!("🔍 Instantiated plugin {} from {}", factory.plugin_name(), self.name);
                        Some(plugin)
                    }
                    Err(e) => {
                        warn!(
                            "⚠️ Skipping plugin {} from {}: {}",
                            factory.plugin_name(),
                            self.name,
                            e
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::PluginManager;
    use crate::plugin::Version;

    struct Named(&'static str);

    impl Plugin for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn version(&self) -> Version {
            Version::new(0, 1, 0)
        }
    }

    fn module() -> PluginModule {
        PluginModule::new("bundle")
            .with_plugin("greeter", || Named("greeter"))
            .with_factory(FnPluginFactory::new("broken", || {
                Err(PluginError::InstantiationFailed("missing asset".into()))
            }))
            .with_factory(FnPluginFactory::new("explosive", || panic!("constructor panicked")))
            .with_plugin("logger", || Named("logger"))
    }

    #[test_log::test]
    fn failing_factories_are_skipped() {
        let module = module();
        assert_eq!(module.len(), 4);

        let names: Vec<String> = module
            .instantiate(true)
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, ["greeter", "logger"]);
    }

    #[test_log::test]
    fn manager_loads_a_whole_unit() {
        let manager = PluginManager::new();

        assert_eq!(manager.load_from(&module()), 2);
        assert!(manager.contains("greeter"));
        assert!(manager.contains("logger"));

        // Already loaded plugins are not counted again
        assert_eq!(manager.load_from(&module()), 0);
        assert!(PluginModule::new("empty").is_empty());
    }
}
