//! Listener binding: how an object declares which of its methods handle
//! which events, at which priority.
//!
//! A listener lists its handlers once, in [`Listener::bind`]. Registering a
//! listener instance turns each binding into a handler entry whose target is
//! that instance.
//!
//! ```rust
//! use plugin_host::{Bindings, Event, HandlerResult, Listener, Priority};
//!
//! #[derive(Debug)]
//! struct ChatEvent { message: String, cancelled: bool }
//! impl Event for ChatEvent {}
//!
//! struct ChatListener;
//!
//! impl ChatListener {
//!     fn on_command(&self, event: &mut ChatEvent) -> HandlerResult {
//!         if event.message.starts_with('!') {
//!             event.cancelled = true;
//!         }
//!         Ok(())
//!     }
//!
//!     fn on_say(&self, event: &mut ChatEvent) -> HandlerResult {
//!         if !event.cancelled {
//!             println!("{}", event.message);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Listener for ChatListener {
//!     fn bind(bindings: &mut Bindings<Self>) {
//!         bindings
//!             .on(Priority::High, Self::on_command)
//!             .on(Priority::Normal, Self::on_say);
//!     }
//! }
//! ```

use crate::error::{HandlerError, HandlerResult};
use crate::event::{Event, EventId, Priority};
use crate::handlers::{ErasedCallback, HandlerId};
use std::any::Any;
use std::sync::Arc;

/// An object whose methods handle events
pub trait Listener: Send + Sync + Sized + 'static {
    /// Declare this listener's handler methods
    fn bind(bindings: &mut Bindings<Self>);
}

/// A handler binding resolved against a concrete listener instance
pub(crate) struct BoundHandler {
    pub event: EventId,
    pub priority: Priority,
    pub id: HandlerId,
    pub callback: ErasedCallback,
}

struct Binding<L> {
    event: EventId,
    priority: Priority,
    method: HandlerId,
    attach: Box<dyn Fn(Arc<L>) -> ErasedCallback + Send + Sync>,
}

/// Handler declarations collected from [`Listener::bind`]
///
/// A method qualifies as a handler exactly when it takes the listener and one
/// mutable event. Anything else does not type-check as a binding, so a
/// listener can carry unrelated methods freely.
pub struct Bindings<L> {
    bindings: Vec<Binding<L>>,
}

impl<L: Listener> Bindings<L> {
    pub(crate) fn collect() -> Self {
        let mut bindings = Self {
            bindings: Vec::new(),
        };
        L::bind(&mut bindings);
        bindings
    }

    /// Bind `method` as the handler for events of type `E` at `priority`
    pub fn on<E, F>(&mut self, priority: Priority, method: F) -> &mut Self
    where
        E: Event,
        F: Fn(&L, &mut E) -> HandlerResult + Copy + Send + Sync + 'static,
    {
        let attach = move |target: Arc<L>| -> ErasedCallback {
            Arc::new(move |event: &mut dyn Any| match event.downcast_mut::<E>() {
                Some(event) => method(&target, event),
                None => Err(HandlerError::TypeMismatch {
                    expected: E::event_type(),
                }),
            })
        };

        self.bindings.push(Binding {
            event: EventId::of::<E>(),
            priority,
            method: HandlerId::of::<F>(0),
            attach: Box::new(attach),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Resolve every binding against `target`
    pub(crate) fn attach(self, target: &Arc<L>) -> Vec<BoundHandler> {
        let address = Arc::as_ptr(target) as *const () as usize;

        self.bindings
            .into_iter()
            .map(|binding| BoundHandler {
                event: binding.event,
                priority: binding.priority,
                id: binding.method.with_target(address),
                callback: (binding.attach)(Arc::clone(target)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        hits: u32,
    }
    impl Event for Counter {}

    struct Doubler;

    impl Doubler {
        fn add_one(&self, event: &mut Counter) -> HandlerResult {
            event.hits += 1;
            Ok(())
        }

        fn add_two(&self, event: &mut Counter) -> HandlerResult {
            event.hits += 2;
            Ok(())
        }

        #[allow(dead_code)]
        fn not_a_handler(&self, _a: u32, _b: u32) -> u32 {
            0
        }
    }

    impl Listener for Doubler {
        fn bind(bindings: &mut Bindings<Self>) {
            bindings
                .on(Priority::High, Self::add_one)
                .on(Priority::Low, Self::add_two);
        }
    }

    struct Silent;

    impl Listener for Silent {
        fn bind(_bindings: &mut Bindings<Self>) {}
    }

    #[test]
    fn collects_declared_bindings() {
        let bindings = Bindings::<Doubler>::collect();
        assert_eq!(bindings.len(), 2);
        assert!(Bindings::<Silent>::collect().is_empty());
    }

    #[test]
    fn attached_callbacks_invoke_the_target() {
        let listener = Arc::new(Doubler);
        let bound = Bindings::collect().attach(&listener);

        let mut event = Counter::default();
        for handler in &bound {
            (handler.callback)(&mut event).unwrap();
        }
        assert_eq!(event.hits, 3);
        assert_eq!(bound[0].priority, Priority::High);
        assert_eq!(bound[0].event, EventId::of::<Counter>());
        assert!(bound[0].id.name().ends_with("add_one"));
    }

    #[test]
    fn identity_distinguishes_instances_not_calls() {
        let first = Arc::new(Doubler);
        let second = Arc::new(Doubler);

        let a = Bindings::collect().attach(&first);
        let b = Bindings::collect().attach(&first);
        let c = Bindings::collect().attach(&second);

        assert_eq!(a[0].id, b[0].id);
        assert_ne!(a[0].id, a[1].id);
        assert_ne!(a[0].id, c[0].id);
    }

    #[test]
    fn mismatched_event_is_an_error() {
        let listener = Arc::new(Doubler);
        let bound = Bindings::collect().attach(&listener);

        #[derive(Debug)]
        struct Stray(#[allow(dead_code)] String);
        impl Event for Stray {}

        let mut wrong = Stray("not a counter".to_string());
        let result = (bound[0].callback)(&mut wrong);
        assert!(matches!(result, Err(HandlerError::TypeMismatch { .. })));
    }
}
