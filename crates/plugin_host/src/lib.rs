//! # Plugin Host
//!
//! An in-process extensibility host. Plugins register interest in event
//! types and are notified in a deterministic, priority-ordered sequence,
//! while the host drives each plugin through its load, enable, disable and
//! unload lifecycle.
//!
//! ## Key Features
//!
//! - **Ordered dispatch**: highest priority first, registration order within
//!   a priority
//! - **Failure isolation**: a handler that errors or panics never stops
//!   delivery to the next one
//! - **Reversible lifecycles**: disabling or unloading a plugin revokes every
//!   handler it registered
//! - **Re-entrant**: handlers and hooks may send events and call back into the
//!   manager
//!
//! ## Architecture
//!
//! - **EventBus**: registration table and dispatch engine
//! - **PluginManager**: plugin registry and lifecycle controller, owning the bus
//! - **Listener**: objects that declare their handler methods through [`Bindings`]
//! - **PluginSource**: loadable units that yield plugin instances
//!
//! ## Usage
//!
//! ```rust
//! use plugin_host::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default)]
//! struct Ping {
//!     handled: bool,
//! }
//! impl_event!(Ping);
//!
//! struct Responder;
//!
//! impl Plugin for Responder {
//!     fn name(&self) -> &str {
//!         "responder"
//!     }
//!
//!     fn version(&self) -> Version {
//!         Version::new(1, 0, 0)
//!     }
//!
//!     fn on_enable(&self, manager: &PluginManager) -> std::result::Result<(), PluginError> {
//!         manager.register(self.name(), Priority::Normal, |ping: &mut Ping| {
//!             ping.handled = true;
//!             Ok(())
//!         });
//!         Ok(())
//!     }
//! }
//!
//! let manager = PluginManager::new();
//! manager.load_plugin(Arc::new(Responder));
//!
//! assert!(manager.send(Ping::default()).handled);
//!
//! manager.unload_plugins();
//! assert!(!manager.send(Ping::default()).handled);
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod event;
pub mod handlers;
pub mod listener;
pub mod loader;
pub mod logging;
pub mod macros;
pub mod manager;
pub mod plugin;
pub mod stats;
pub mod utils;

// Re-exports for convenience
pub use bus::EventBus;
pub use config::{HostConfig, LoggingSettings, ManagerConfig};
pub use error::{HandlerError, HandlerResult, PluginError, PluginHostError, Result};
pub use event::{Cancellable, Event, EventId, Priority};
pub use handlers::{HandlerId, HandlerInfo};
pub use listener::{Bindings, Listener};
pub use loader::{FnPluginFactory, PluginFactory, PluginModule, PluginSource};
pub use logging::setup_logging;
pub use manager::PluginManager;
pub use plugin::{
    Plugin, PluginDisableEvent, PluginEnableEvent, PluginEvent, PluginId, PluginInfo,
    PluginState, Version,
};
pub use stats::HostStats;

/// Crate version, for hosts that report it
pub const PLUGIN_HOST_VERSION: &str = env!("CARGO_PKG_VERSION");
