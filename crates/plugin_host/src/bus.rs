//! Event bus: handler registration and ordered, failure-isolated dispatch

use crate::config::ManagerConfig;
use crate::error::{HandlerError, HandlerResult, PluginHostError};
use crate::event::{Event, EventId, Priority};
use crate::handlers::{ErasedCallback, HandlerEntry, HandlerId, HandlerInfo, HandlerTable};
use crate::listener::{Bindings, Listener};
use crate::plugin::PluginId;
use crate::stats::{HostStats, StatsCounters};
use crate::utils::guarded;
use std::any::Any;
use std::fmt;
use std::mem;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Core event bus
///
/// Handlers are grouped per event type into priority buckets. `send` walks
/// the buckets from highest to lowest priority and each bucket in
/// registration order, running every handler on the caller's thread.
///
/// No lock is held while a handler runs: dispatch iterates over a snapshot,
/// so handlers may send further events or register handlers themselves.
pub struct EventBus {
    /// Event handlers organized by event identity
    handlers: HandlerTable,
    /// Dispatch behaviour
    config: ManagerConfig,
    /// Statistics
    stats: StatsCounters,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            handlers: HandlerTable::new(),
            config,
            stats: StatsCounters::default(),
        }
    }

    /// Register a handler for events of type `E` on behalf of `owner`
    ///
    /// # Arguments
    ///
    /// * `owner` - Plugin the handler is attributed to and revoked with
    /// * `priority` - Bucket the handler runs in
    /// * `handler` - Function or closure receiving each event by mutable reference
    ///
    /// # Returns
    ///
    /// `true` if the handler was added, `false` if it was already registered
    /// for this owner and priority.
    ///
    /// # Identity
    ///
    /// A function, or a closure that captures nothing, is the same handler
    /// every time it is registered. A closure that captures state is a new
    /// handler on every call, since each call carries its own captured values.
    pub fn register<E, F>(&self, owner: &PluginId, priority: Priority, handler: F) -> bool
    where
        E: Event,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        let callback: ErasedCallback =
            Arc::new(move |event: &mut dyn Any| match event.downcast_mut::<E>() {
                Some(event) => handler(event),
                None => Err(HandlerError::TypeMismatch {
                    expected: E::event_type(),
                }),
            });

        // Stateful closures are targeted at their own allocation, which stays
        // unique while the entry holding it is registered
        let target = if mem::size_of::<F>() == 0 {
            0
        } else {
            Arc::as_ptr(&callback) as *const () as usize
        };
        let id = HandlerId::of::<F>(target);

        self.insert(EventId::of::<E>(), owner, priority, id, callback)
    }

    /// Register every handler a listener binds; returns how many were added
    pub fn register_listener<L: Listener>(&self, owner: &PluginId, listener: &Arc<L>) -> usize {
        let bound = Bindings::<L>::collect().attach(listener);
        let declared = bound.len();

        let added = bound
            .into_iter()
            .filter(|handler| {
                self.insert(
                    handler.event,
                    owner,
                    handler.priority,
                    handler.id,
                    handler.callback.clone(),
                )
            })
            .count();

        debug!(
            "📝 Registered listener {} for plugin {} ({}/{} handlers new)",
            std::any::type_name::<L>(),
            owner,
            added,
            declared
        );
        added
    }

    fn insert(
        &self,
        event: EventId,
        owner: &PluginId,
        priority: Priority,
        id: HandlerId,
        callback: ErasedCallback,
    ) -> bool {
        let entry = HandlerEntry {
            owner: owner.clone(),
            id,
            callback,
        };

        let added = self.handlers.insert(event, priority, entry);
        if added {
            debug!("📝 Registered handler {} for {} at {} ({})", id, event, priority, owner);
        } else {
            trace!("Handler {} for {} already registered by {}", id, event, owner);
        }
        added
    }

    /// Remove every handler owned by `owner`; returns how many were removed
    pub fn unregister(&self, owner: &PluginId) -> usize {
        let removed = self.handlers.remove_owner(owner);
        if removed > 0 {
            debug!("🧹 Revoked {} handlers owned by {}", removed, owner);
        }
        removed
    }

    /// Deliver `event` to every matching handler and hand it back
    ///
    /// Handlers run on the calling thread, lowest priority tier first, and
    /// may send further events or register and revoke handlers while they
    /// run. A failing or panicking handler is logged and counted, and the
    /// rest still run.
    ///
    /// # Returns
    ///
    /// The event itself, carrying whatever the handlers changed.
    pub fn send<E: Event>(&self, mut event: E) -> E {
        self.dispatch(&mut event);
        event
    }

    /// Build an event from `args`, then send it
    ///
    /// Construction failure is the one error dispatch propagates: there is
    /// no event to deliver.
    pub fn send_from<E, A>(&self, args: A) -> Result<E, PluginHostError>
    where
        E: Event + TryFrom<A>,
        <E as TryFrom<A>>::Error: fmt::Display,
    {
        let event = E::try_from(args).map_err(|e| PluginHostError::EventConstruction {
            event: E::event_type(),
            reason: e.to_string(),
        })?;

        Ok(self.send(event))
    }

    /// Deliver `event` in place
    ///
    /// Every handler runs even when an earlier one fails or marks the event
    /// cancelled.
    pub fn dispatch<E: Event>(&self, event: &mut E) {
        let event_id = EventId::of::<E>();

        let Some(handlers) = self.handlers.snapshot(&event_id) else {
            self.stats.record_sent(false);
            if self.config.warn_unhandled {
                warn!("⚠️ No handlers for event: {}", event_id);
            } else {
                trace!("No handlers for event: {}", event_id);
            }
            return;
        };

        self.stats.record_sent(true);
        trace!("📤 Sending {} to {} handlers", event_id, handlers.len());

        for handler in handlers.iter() {
            let outcome = guarded(self.config.catch_panics, || (handler.callback)(&mut *event))
                .unwrap_or_else(|panic| Err(HandlerError::Panicked(panic)));

            self.stats.record_invocation(outcome.is_err());

            if let Err(e) = outcome {
                error!(
                    "❌ Handler {} of plugin {} failed on {}: {}",
                    handler.id, handler.owner, event_id, e
                );
            }
        }
    }

    /// Check whether any handler is registered for `E`
    pub fn has_handlers<E: Event>(&self) -> bool {
        self.handlers.contains(&EventId::of::<E>())
    }

    /// Handlers registered for `E`, in dispatch order
    pub fn handlers_for<E: Event>(&self) -> Vec<HandlerInfo> {
        self.handlers.describe(&EventId::of::<E>())
    }

    /// Total registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.handler_count()
    }

    /// Handlers currently owned by `owner`
    pub fn owner_handler_count(&self, owner: &PluginId) -> usize {
        self.handlers.owner_handler_count(owner)
    }

    /// Number of event types with at least one handler
    pub fn event_count(&self) -> usize {
        self.handlers.event_count()
    }

    /// Number of non-empty priority buckets across all events
    pub fn bucket_count(&self) -> usize {
        self.handlers.bucket_count()
    }

    /// Get all event types with registered handlers
    pub fn registered_events(&self) -> Vec<EventId> {
        self.handlers.registered_events()
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Get current statistics
    pub fn stats(&self) -> HostStats {
        self.stats.snapshot(self.handler_count())
    }

    pub(crate) fn record_hook_failure(&self) {
        self.stats.record_hook_failure();
    }
}
