//! Macros for event and handler boilerplate

/// Implement [`Event`](crate::Event) for one or more types
///
/// ```rust
/// use plugin_host::{impl_event, Event};
///
/// #[derive(Debug)]
/// struct PlayerJoined { name: String }
///
/// #[derive(Debug)]
/// struct PlayerLeft { name: String }
///
/// #[derive(Debug)]
/// struct Ping;
///
/// impl_event!(PlayerJoined, PlayerLeft);
/// impl_event!(Ping => "ping");
///
/// assert_eq!(Ping::event_type(), "ping");
/// ```
#[macro_export]
macro_rules! impl_event {
    ($name:ty => $event_type:expr) => {
        impl $crate::Event for $name {
            fn event_type() -> &'static str {
                $event_type
            }
        }
    };

    ($($name:ty),+ $(,)?) => {
        $(
            impl $crate::Event for $name {}
        )+
    };
}

/// Register several handler closures for one plugin
///
/// Evaluates to the number of handlers that were newly added.
///
/// ```rust
/// use plugin_host::{impl_event, register_handlers, PluginManager, Priority};
///
/// #[derive(Debug, Default)]
/// struct Tick { count: u32 }
/// impl_event!(Tick);
///
/// let manager = PluginManager::new();
/// // No plugin called "clock" is loaded, so nothing is registered
/// let added = register_handlers!(manager, "clock";
///     Priority::High => |tick: &mut Tick| { tick.count += 1; Ok(()) },
///     Priority::Low => |tick: &mut Tick| { tick.count *= 2; Ok(()) },
/// );
/// assert_eq!(added, 0);
/// ```
#[macro_export]
macro_rules! register_handlers {
    ($manager:expr, $owner:expr; $($priority:expr => $handler:expr),* $(,)?) => {{
        0usize $(
            + usize::from($manager.register($owner, $priority, $handler))
        )*
    }};
}

#[cfg(test)]
mod tests {
    use crate::event::{Event, EventId};
    use crate::plugin::{Plugin, Version};
    use crate::{PluginManager, Priority};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Joined;

    #[derive(Debug)]
    struct Left;

    #[derive(Debug, Default)]
    struct Score {
        points: u32,
    }

    impl_event!(Joined, Left);
    impl_event!(Score => "score");

    struct Scorer;

    impl Plugin for Scorer {
        fn name(&self) -> &str {
            "scorer"
        }

        fn version(&self) -> Version {
            Version::new(1, 0, 0)
        }
    }

    #[test]
    fn impl_event_sets_names() {
        assert_eq!(Score::event_type(), "score");
        assert!(Joined::event_type().ends_with("Joined"));
        assert_ne!(EventId::of::<Joined>(), EventId::of::<Left>());
    }

    #[test]
    fn register_handlers_counts_additions() {
        let manager = PluginManager::new();
        manager.load_plugin(Arc::new(Scorer));

        let added = register_handlers!(manager, "scorer";
            Priority::High => |score: &mut Score| { score.points += 10; Ok(()) },
            Priority::Low => |score: &mut Score| { score.points *= 2; Ok(()) },
        );
        assert_eq!(added, 2);

        let score = manager.send(Score::default());
        assert_eq!(score.points, 20);
    }
}
