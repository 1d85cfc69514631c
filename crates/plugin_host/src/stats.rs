//! Statistics tracking for dispatch and lifecycle hooks

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time host statistics for monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStats {
    /// Events passed to `send` since the bus was created
    pub events_sent: u64,
    /// Sent events that had no registered handler
    pub events_unhandled: u64,
    /// Individual handler invocations
    pub handlers_invoked: u64,
    /// Handler invocations that returned an error or panicked
    pub handler_failures: u64,
    /// Plugin lifecycle hooks that returned an error or panicked
    pub hook_failures: u64,
    /// Handlers currently registered
    pub total_handlers: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    events_sent: AtomicU64,
    events_unhandled: AtomicU64,
    handlers_invoked: AtomicU64,
    handler_failures: AtomicU64,
    hook_failures: AtomicU64,
}

impl StatsCounters {
    pub fn record_sent(&self, handled: bool) {
        self.events_sent.fetch_add(1, Ordering::Relaxed);
        if !handled {
            self.events_unhandled.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_invocation(&self, failed: bool) {
        self.handlers_invoked.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.handler_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_hook_failure(&self) {
        self.hook_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, total_handlers: usize) -> HostStats {
        HostStats {
            events_sent: self.events_sent.load(Ordering::Relaxed),
            events_unhandled: self.events_unhandled.load(Ordering::Relaxed),
            handlers_invoked: self.handlers_invoked.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            hook_failures: self.hook_failures.load(Ordering::Relaxed),
            total_handlers,
        }
    }
}
