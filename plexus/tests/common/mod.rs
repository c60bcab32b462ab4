#![allow(dead_code)]

use plexus::{BoxError, Event, EventKind, EventListener, FnListener, Subscription};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

// ============================================================================
// Test Event Types
// ============================================================================

#[derive(Clone, Debug, Event)]
pub struct TestEvent {
    pub content: String,
}

#[derive(Clone, Debug, Event)]
pub struct Numbered {
    #[event(parent)]
    pub base: TestEvent,
    pub id: usize,
}

#[derive(Clone, Debug, Event)]
pub struct Unrelated;

pub fn test_event(content: &str) -> TestEvent {
    TestEvent {
        content: content.to_string(),
    }
}

pub fn numbered(id: usize) -> Numbered {
    Numbered {
        base: test_event("numbered"),
        id,
    }
}

// ============================================================================
// Sequence Recorder
// ============================================================================

/// Records `(event id, listener index)` pairs for `Numbered` events.
#[derive(Clone, Default)]
pub struct SequenceRecorder {
    log: Arc<Mutex<Vec<(usize, usize)>>>,
}

impl SequenceRecorder {
    pub fn listener(&self, index: usize, priority: i32) -> Arc<dyn EventListener> {
        let log = self.log.clone();
        Subscription::<Numbered, _>::new(FnListener(move |event: &Numbered| {
            log.lock().unwrap().push((event.id, index));
            Ok::<(), BoxError>(())
        }))
        .with_priority(priority)
        .into_arc()
    }

    /// Listener indices in invocation order, grouped by event id.
    pub fn per_event(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut grouped: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (event, index) in self.log.lock().unwrap().iter() {
            grouped.entry(*event).or_default().push(*index);
        }
        grouped
    }

    /// Invocations per listener index.
    pub fn per_listener(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for (_, index) in self.log.lock().unwrap().iter() {
            *counts.entry(*index).or_insert(0) += 1;
        }
        counts
    }
}

pub fn type_of<E: EventKind>() -> plexus::EventType {
    E::event_type_of()
}
