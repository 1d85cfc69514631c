//! Event identity, priorities and the cancellation convention

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Trait that all events must implement
///
/// An event is a plain value. `send` hands one instance by mutable reference
/// to every matching handler in turn, so later handlers observe the
/// mutations of earlier ones.
pub trait Event: Any + fmt::Debug {
    /// Returns the event type name used in logs and diagnostics
    fn event_type() -> &'static str
    where
        Self: Sized,
    {
        type_name::<Self>()
    }
}

/// Stable identity shared by every instance of one event type
///
/// Derived from type metadata only; no instance of the event is ever
/// constructed to learn it. Equality and hashing look at the `TypeId`, the
/// name rides along for diagnostics.
#[derive(Clone, Copy)]
pub struct EventId {
    type_id: TypeId,
    name: &'static str,
}

impl EventId {
    /// Identity of the event type `E`
    pub fn of<E: Event>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            name: E::event_type(),
        }
    }

    /// Event type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Underlying type identity
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for EventId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EventId {}

impl Hash for EventId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventId").field(&self.name).finish()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Handler priority
///
/// Higher priorities run first. Handlers sharing a priority run in
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

impl Priority {
    /// Every priority, lowest first
    pub const ALL: [Priority; 5] = [
        Priority::Lowest,
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Highest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Lowest => "lowest",
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Highest => "highest",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cancellation flag carried by events that support it
///
/// Purely a convention between handlers: dispatch never reads the flag and
/// never stops early. Well-behaved handlers check it before acting.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;

    fn set_cancelled(&mut self, cancelled: bool);

    fn cancel(&mut self) {
        self.set_cancelled(true);
    }
}
