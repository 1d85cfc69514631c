//! Registration table mapping event identities to priority-bucketed handlers

use crate::error::HandlerResult;
use crate::event::{EventId, Priority};
use crate::plugin::PluginId;
use dashmap::DashMap;
use smallvec::SmallVec;
use std::any::{type_name, Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased handler callback
///
/// The table is keyed by [`EventId`], so the callback only ever sees the
/// event type it was registered for; the downcast inside is a formality.
pub(crate) type ErasedCallback = Arc<dyn Fn(&mut dyn Any) -> HandlerResult + Send + Sync>;

/// Identity of a registered handler: target object plus method
///
/// The method is identified by the type of the callable, which is unique per
/// function item and per closure expression. Listener methods target their
/// listener instance, closures with captured state target their own
/// allocation, and functions or stateless closures use a zero target.
#[derive(Clone, Copy)]
pub struct HandlerId {
    target: usize,
    method: TypeId,
    name: &'static str,
}

impl HandlerId {
    pub(crate) fn of<F: 'static>(target: usize) -> Self {
        Self {
            target,
            method: TypeId::of::<F>(),
            name: type_name::<F>(),
        }
    }

    pub(crate) fn with_target(self, target: usize) -> Self {
        Self { target, ..self }
    }

    /// Readable name of the handler's method
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for HandlerId {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target && self.method == other.method
    }
}

impl Eq for HandlerId {}

impl fmt::Debug for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerId")
            .field("target", &format_args!("{:#x}", self.target))
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One registered handler
#[derive(Clone)]
pub(crate) struct HandlerEntry {
    pub owner: PluginId,
    pub id: HandlerId,
    pub callback: ErasedCallback,
}

/// Read-only view of a registered handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInfo {
    pub owner: PluginId,
    pub priority: Priority,
    pub handler: HandlerId,
}

/// Handlers in dispatch order, cloned out of the table
pub(crate) type HandlerSnapshot = SmallVec<[HandlerEntry; 8]>;

/// Event identity -> priority -> handlers in registration order
///
/// Never holds an empty bucket or an event with no buckets: both are pruned
/// as soon as the last entry leaves.
#[derive(Default)]
pub(crate) struct HandlerTable {
    events: DashMap<EventId, BTreeMap<Priority, Vec<HandlerEntry>>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to its bucket; returns `false` if the same owner
    /// already registered the same handler there
    pub fn insert(&self, event: EventId, priority: Priority, entry: HandlerEntry) -> bool {
        let mut buckets = self.events.entry(event).or_default();
        let bucket = buckets.entry(priority).or_default();

        if bucket
            .iter()
            .any(|existing| existing.owner == entry.owner && existing.id == entry.id)
        {
            return false;
        }

        bucket.push(entry);
        true
    }

    /// Remove every entry owned by `owner`; returns how many were removed
    pub fn remove_owner(&self, owner: &PluginId) -> usize {
        let mut removed = 0;

        self.events.retain(|_, buckets| {
            buckets.retain(|_, bucket| {
                let before = bucket.len();
                bucket.retain(|entry| &entry.owner != owner);
                removed += before - bucket.len();
                !bucket.is_empty()
            });
            !buckets.is_empty()
        });

        removed
    }

    /// Handlers for `event`, highest priority first and FIFO within a
    /// priority, or `None` when nothing is registered
    pub fn snapshot(&self, event: &EventId) -> Option<HandlerSnapshot> {
        self.events.get(event).map(|buckets| {
            buckets
                .values()
                .rev()
                .flat_map(|bucket| bucket.iter().cloned())
                .collect()
        })
    }

    pub fn contains(&self, event: &EventId) -> bool {
        self.events.contains_key(event)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn bucket_count(&self) -> usize {
        self.events.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn handler_count(&self) -> usize {
        self.events
            .iter()
            .map(|entry| entry.value().values().map(Vec::len).sum::<usize>())
            .sum()
    }

    pub fn owner_handler_count(&self, owner: &PluginId) -> usize {
        self.events
            .iter()
            .map(|entry| {
                entry
                    .value()
                    .values()
                    .flatten()
                    .filter(|handler| &handler.owner == owner)
                    .count()
            })
            .sum()
    }

    pub fn registered_events(&self) -> Vec<EventId> {
        self.events.iter().map(|entry| *entry.key()).collect()
    }

    /// Handlers for `event` in dispatch order
    pub fn describe(&self, event: &EventId) -> Vec<HandlerInfo> {
        self.events
            .get(event)
            .map(|buckets| {
                buckets
                    .iter()
                    .rev()
                    .flat_map(|(priority, bucket)| {
                        bucket.iter().map(move |entry| HandlerInfo {
                            owner: entry.owner.clone(),
                            priority: *priority,
                            handler: entry.id,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
