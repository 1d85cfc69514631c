//! Plugin registry and lifecycle controller

use crate::bus::EventBus;
use crate::config::ManagerConfig;
use crate::error::{HandlerResult, PluginError, PluginHostError};
use crate::event::{Event, Priority};
use crate::listener::Listener;
use crate::loader::PluginSource;
use crate::plugin::{
    Plugin, PluginDisableEvent, PluginEnableEvent, PluginId, PluginInfo, PluginState, Version,
};
use crate::stats::HostStats;
use crate::utils::guarded;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Registry entry of a loaded plugin
struct LoadedPlugin {
    plugin: Arc<dyn Plugin>,
    version: Version,
    /// Load order, lower loaded earlier
    sequence: u64,
    state: PluginState,
    /// Set while `unload_plugin` tears the plugin down
    unloading: bool,
    /// Set while an enable or disable is delivering its lifecycle event
    transitioning: bool,
}

impl LoadedPlugin {
    fn info(&self, id: &PluginId) -> PluginInfo {
        PluginInfo {
            id: id.clone(),
            version: self.version,
            state: self.state,
            load_order: self.sequence,
        }
    }
}

/// Clears a plugin's transition marker when dropped, unwinding included
struct TransitionGuard<'a> {
    plugins: &'a DashMap<PluginId, LoadedPlugin>,
    id: &'a PluginId,
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        if let Some(mut entry) = self.plugins.get_mut(self.id) {
            entry.transitioning = false;
        }
    }
}

/// Plugin manager owning the event bus and the plugin registry
///
/// Every lifecycle operation runs to completion on the calling thread. No
/// registry lock is held while a hook or handler runs, so hooks may call back
/// into the manager (register handlers, send events, even unload plugins).
///
/// Lifecycle operations on one plugin are expected to be driven from one
/// thread at a time; dispatch and queries may run from any thread.
pub struct PluginManager {
    events: Arc<EventBus>,
    plugins: DashMap<PluginId, LoadedPlugin>,
    next_sequence: AtomicU64,
    config: ManagerConfig,
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugins", &self.plugins.len())
            .field("handlers", &self.events.handler_count())
            .field("config", &self.config)
            .finish()
    }
}

impl PluginManager {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            events: Arc::new(EventBus::with_config(config.clone())),
            plugins: DashMap::new(),
            next_sequence: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Shared handle to the event bus
    ///
    /// Listeners that send events from inside a handler keep this handle.
    /// Holding it from a registered listener forms a reference cycle that is
    /// broken when the owning plugin's handlers are revoked.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    // ---- lifecycle ----

    /// Load a plugin, run its load hook and enable it
    ///
    /// The plugin is recorded before its load hook runs, so handlers it
    /// registers from `on_load` are accepted and owned by it.
    ///
    /// # Arguments
    ///
    /// * `plugin` - The plugin instance; its `name()` becomes its identity
    ///
    /// # Returns
    ///
    /// `false` without touching the plugin if one with the same name is
    /// already loaded. A failing load hook is reported and the plugin is
    /// loaded and enabled regardless.
    pub fn load_plugin(&self, plugin: Arc<dyn Plugin>) -> bool {
        let id = PluginId::new(plugin.name());
        let version = plugin.version();

        match self.plugins.entry(id.clone()) {
            Entry::Occupied(_) => {
                debug!("Plugin {} is already loaded", id);
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(LoadedPlugin {
                    plugin: Arc::clone(&plugin),
                    version,
                    sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
                    state: PluginState::Loaded,
                    unloading: false,
                    transitioning: false,
                });
            }
        }

        info!("🔄 Loading plugin: {} v{}", id, version);
        self.run_hook(&id, "load", || plugin.on_load(self));

        self.enable_plugin(id.as_str());
        info!("✅ Plugin loaded: {}", id);
        true
    }

    /// Disable, revoke and unload a plugin
    ///
    /// The unload hook runs after the plugin is disabled and its handlers
    /// are gone, but before it leaves the registry.
    ///
    /// # Returns
    ///
    /// `false` if the plugin is not loaded or already being unloaded.
    pub fn unload_plugin(&self, name: &str) -> bool {
        let (id, plugin) = {
            let Some(mut entry) = self.plugins.get_mut(name) else {
                debug!("Plugin {} is not loaded, nothing to unload", name);
                return false;
            };
            if entry.unloading {
                return false;
            }
            entry.unloading = true;
            (entry.key().clone(), Arc::clone(&entry.plugin))
        };

        info!("🛑 Unloading plugin: {}", id);
        self.disable_plugin(name);
        self.events.unregister(&id);
        self.run_hook(&id, "unload", || plugin.on_unload(self));

        self.plugins.remove(name);
        info!("✅ Plugin unloaded: {}", id);
        true
    }

    /// Unload every loaded plugin, most recently loaded first
    pub fn unload_plugins(&self) -> usize {
        let names = self.snapshot_newest_first(|_| true);
        if !names.is_empty() {
            info!("🛑 Unloading {} plugins", names.len());
        }

        names
            .iter()
            .filter(|name| self.unload_plugin(name.as_str()))
            .count()
    }

    /// Enable a loaded plugin
    ///
    /// Sends [`PluginEnableEvent`], marks the plugin enabled and runs its
    /// enable hook.
    ///
    /// # Returns
    ///
    /// `true` if the plugin went from loaded to enabled. Unknown, enabled and
    /// unloading plugins are left alone, as is a plugin whose enable or
    /// disable is already in progress further up the stack.
    pub fn enable_plugin(&self, name: &str) -> bool {
        let (id, version, plugin) = {
            let Some(mut entry) = self.plugins.get_mut(name) else {
                debug!("Plugin {} is not loaded, cannot enable", name);
                return false;
            };
            if entry.state == PluginState::Enabled || entry.unloading || entry.transitioning {
                return false;
            }
            entry.transitioning = true;
            (entry.key().clone(), entry.version, Arc::clone(&entry.plugin))
        };

        let transition = TransitionGuard {
            plugins: &self.plugins,
            id: &id,
        };
        self.events.send(PluginEnableEvent {
            plugin: id.clone(),
            version,
        });

        match self.plugins.get_mut(name) {
            Some(mut entry) => entry.state = PluginState::Enabled,
            None => return false,
        }
        drop(transition);

        self.run_hook(&id, "enable", || plugin.on_enable(self));
        info!("🔌 Plugin enabled: {}", id);
        true
    }

    /// Disable an enabled plugin
    ///
    /// Sends [`PluginDisableEvent`], runs the disable hook, then returns the
    /// plugin to the loaded state and revokes every handler it registered.
    ///
    /// # Returns
    ///
    /// `true` if the plugin went from enabled to loaded. A plugin that is not
    /// enabled, or whose disable is already in progress further up the
    /// stack, is left alone.
    pub fn disable_plugin(&self, name: &str) -> bool {
        let (id, version, plugin) = {
            let Some(mut entry) = self.plugins.get_mut(name) else {
                debug!("Plugin {} is not loaded, cannot disable", name);
                return false;
            };
            if entry.state != PluginState::Enabled || entry.transitioning {
                return false;
            }
            entry.transitioning = true;
            (entry.key().clone(), entry.version, Arc::clone(&entry.plugin))
        };

        let transition = TransitionGuard {
            plugins: &self.plugins,
            id: &id,
        };
        self.events.send(PluginDisableEvent {
            plugin: id.clone(),
            version,
        });
        self.run_hook(&id, "disable", || plugin.on_disable(self));

        if let Some(mut entry) = self.plugins.get_mut(name) {
            entry.state = PluginState::Loaded;
        }
        drop(transition);
        let revoked = self.events.unregister(&id);

        info!("⏸️ Plugin disabled: {} ({} handlers revoked)", id, revoked);
        true
    }

    /// Disable every enabled plugin, most recently loaded first
    pub fn disable_plugins(&self) -> usize {
        let names = self.snapshot_newest_first(|plugin| plugin.state == PluginState::Enabled);

        names
            .iter()
            .filter(|name| self.disable_plugin(name.as_str()))
            .count()
    }

    /// Load every plugin a source yields; returns how many were newly loaded
    pub fn load_from(&self, source: &dyn PluginSource) -> usize {
        info!("🔌 Loading plugins from: {}", source.source_name());

        let candidates = source.instantiate(self.config.catch_panics);
        let total = candidates.len();
        let loaded = candidates
            .into_iter()
            .filter(|plugin| self.load_plugin(Arc::clone(plugin)))
            .count();

        info!(
            "🎉 Plugin loading complete: {}/{} plugins loaded from {}",
            loaded,
            total,
            source.source_name()
        );
        loaded
    }

    // ---- queries ----

    /// Enabled plugins in load order
    pub fn get_plugins(&self) -> Vec<Arc<dyn Plugin>> {
        let mut enabled: Vec<(u64, Arc<dyn Plugin>)> = self
            .plugins
            .iter()
            .filter(|entry| entry.state == PluginState::Enabled)
            .map(|entry| (entry.sequence, Arc::clone(&entry.plugin)))
            .collect();
        enabled.sort_by_key(|(sequence, _)| *sequence);
        enabled.into_iter().map(|(_, plugin)| plugin).collect()
    }

    /// The enabled plugin called `name`
    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins
            .get(name)
            .filter(|entry| entry.state == PluginState::Enabled)
            .map(|entry| Arc::clone(&entry.plugin))
    }

    /// Whether a plugin called `name` is enabled
    pub fn contains(&self, name: &str) -> bool {
        self.plugins
            .get(name)
            .is_some_and(|entry| entry.state == PluginState::Enabled)
    }

    /// Whether a plugin called `name` is loaded, enabled or not
    pub fn is_loaded(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn plugin_state(&self, name: &str) -> Option<PluginState> {
        self.plugins.get(name).map(|entry| entry.state)
    }

    pub fn plugin_info(&self, name: &str) -> Option<PluginInfo> {
        self.plugins.get(name).map(|entry| entry.info(entry.key()))
    }

    /// Every loaded plugin in load order
    pub fn loaded_plugins(&self) -> Vec<PluginInfo> {
        let mut infos: Vec<PluginInfo> = self
            .plugins
            .iter()
            .map(|entry| entry.info(entry.key()))
            .collect();
        infos.sort_by_key(|info| info.load_order);
        infos
    }

    // ---- registration and dispatch ----

    /// Register a handler closure on behalf of a loaded plugin
    ///
    /// # Arguments
    ///
    /// * `owner` - Name of the plugin the handler is revoked with
    /// * `priority` - Dispatch tier for the handler
    /// * `handler` - Callback for events of type `E`
    ///
    /// # Returns
    ///
    /// `true` if the handler was added. Unknown or unloading owners, and a
    /// callable already registered for `E` under the same identity, give
    /// `false`.
    pub fn register<E, F>(&self, owner: &str, priority: Priority, handler: F) -> bool
    where
        E: Event,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        match self.registrant(owner) {
            Some(id) => self.events.register(&id, priority, handler),
            None => false,
        }
    }

    /// Register every handler of `listener` on behalf of a loaded plugin
    pub fn register_listener<L: Listener>(&self, owner: &str, listener: &Arc<L>) -> usize {
        match self.registrant(owner) {
            Some(id) => self.events.register_listener(&id, listener),
            None => 0,
        }
    }

    /// Send an event to every handler and return it
    pub fn send<E: Event>(&self, event: E) -> E {
        self.events.send(event)
    }

    /// Build an event from `args` and send it
    pub fn send_from<E, A>(&self, args: A) -> Result<E, PluginHostError>
    where
        E: Event + TryFrom<A>,
        <E as TryFrom<A>>::Error: fmt::Display,
    {
        self.events.send_from(args)
    }

    pub fn stats(&self) -> HostStats {
        self.events.stats()
    }

    // ---- internals ----

    /// Owner key for a registration, if the plugin may register right now
    fn registrant(&self, owner: &str) -> Option<PluginId> {
        match self.plugins.get(owner) {
            Some(entry) if !entry.unloading => Some(entry.key().clone()),
            Some(_) => {
                warn!("⚠️ Plugin {} is unloading, registration refused", owner);
                None
            }
            None => {
                warn!("⚠️ Plugin {} is not loaded, registration refused", owner);
                None
            }
        }
    }

    /// Names of the plugins matching `filter`, most recently loaded first
    fn snapshot_newest_first(&self, filter: impl Fn(&LoadedPlugin) -> bool) -> Vec<PluginId> {
        let mut selected: Vec<(u64, PluginId)> = self
            .plugins
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| (entry.sequence, entry.key().clone()))
            .collect();
        selected.sort_by(|a, b| b.0.cmp(&a.0));
        selected.into_iter().map(|(_, id)| id).collect()
    }

    fn run_hook(&self, id: &PluginId, hook: &str, f: impl FnOnce() -> Result<(), PluginError>) {
        let outcome = guarded(self.config.catch_panics, f)
            .unwrap_or_else(|panic| Err(PluginError::Panicked(panic)));

        if let Err(e) = outcome {
            self.events.record_hook_failure();
            error!("❌ {} hook of plugin {} failed: {}", hook, id, e);
        }
    }
}
