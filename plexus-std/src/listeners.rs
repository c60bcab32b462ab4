//! Built-in listeners seeded into the default dispatcher.
//!
//! Both are registered under the root event type and therefore observe every
//! published event.

use futures::future::{self, BoxFuture};
use indexmap::IndexMap;
use parking_lot::Mutex;
use plexus_core::{BoxError, Event, EventListener, EventType, HIGHEST_PRECEDENCE, Prioritized};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Logs every event at `debug` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl Prioritized for TracingListener {
    fn priority(&self) -> i32 {
        HIGHEST_PRECEDENCE
    }
}

impl EventListener for TracingListener {
    fn event_type(&self) -> EventType {
        EventType::any()
    }

    fn name(&self) -> &str {
        "plexus::tracing"
    }

    fn on_event_dyn<'a>(&'a self, event: &'a dyn Event) -> BoxFuture<'a, Result<(), BoxError>> {
        tracing::debug!(event_type = %event.event_type(), ?event, "event published");
        Box::pin(future::ready(Ok(())))
    }
}

/// Counts delivered events, in total and per concrete event type.
#[derive(Debug, Default)]
pub struct EventStatistics {
    total: AtomicU64,
    by_type: Mutex<IndexMap<EventType, u64>>,
}

impl EventStatistics {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total events observed.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Events observed whose concrete type is `event_type`.
    pub fn count(&self, event_type: EventType) -> u64 {
        self.by_type.lock().get(&event_type).copied().unwrap_or(0)
    }

    /// Per-type counts in first-seen order.
    pub fn snapshot(&self) -> Vec<(EventType, u64)> {
        self.by_type
            .lock()
            .iter()
            .map(|(ty, count)| (*ty, *count))
            .collect()
    }

    /// Reset all counters.
    pub fn reset(&self) {
        let mut by_type = self.by_type.lock();
        by_type.clear();
        self.total.store(0, Ordering::Relaxed);
    }
}

impl Prioritized for EventStatistics {
    fn priority(&self) -> i32 {
        HIGHEST_PRECEDENCE
    }
}

impl EventListener for EventStatistics {
    fn event_type(&self) -> EventType {
        EventType::any()
    }

    fn name(&self) -> &str {
        "plexus::statistics"
    }

    fn on_event_dyn<'a>(&'a self, event: &'a dyn Event) -> BoxFuture<'a, Result<(), BoxError>> {
        *self.by_type.lock().entry(event.event_type()).or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::Relaxed);
        Box::pin(future::ready(Ok(())))
    }
}

/// The built-in listeners: statistics first, then tracing.
pub fn builtin_listeners() -> (Arc<EventStatistics>, Vec<Arc<dyn EventListener>>) {
    let statistics = Arc::new(EventStatistics::new());
    let listeners = vec![
        statistics.clone() as Arc<dyn EventListener>,
        Arc::new(TracingListener),
    ];
    (statistics, listeners)
}
