//! Listener registry backing a dispatcher.
//!
//! Readers load an immutable snapshot without locking; writers clone the
//! snapshot, modify it, and publish it atomically. A writer lock serializes
//! concurrent modifications so no update is lost.
//!
//! Entries under each event type are kept sorted by `(priority, seq)`, where
//! `seq` is a registration counter. Equal priorities therefore run in
//! registration order.

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use plexus_core::{EventListener, EventType};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Identity of a registered listener instance.
///
/// Two registrations of the same `Arc` share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl ListenerId {
    /// The id of `listener`.
    pub fn of(listener: &Arc<dyn EventListener>) -> Self {
        Self(Arc::as_ptr(listener) as *const () as usize)
    }
}

#[derive(Clone)]
struct Entry {
    listener: Arc<dyn EventListener>,
    priority: i32,
    seq: u64,
}

impl Entry {
    fn id(&self) -> ListenerId {
        ListenerId::of(&self.listener)
    }

    fn order(&self) -> (i32, u64) {
        (self.priority, self.seq)
    }
}

#[derive(Clone, Default)]
struct Table {
    by_type: IndexMap<EventType, Vec<Entry>>,
}

/// One registration as seen in a [`ListenerSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredListener {
    /// Listener identity.
    pub id: ListenerId,
    /// Diagnostic name.
    pub name: String,
    /// Effective priority.
    pub priority: i32,
}

/// Point-in-time copy of the registry.
///
/// Event types appear in first-registration order; listeners under each type
/// appear in invocation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerSnapshot {
    entries: IndexMap<EventType, Vec<RegisteredListener>>,
}

impl ListenerSnapshot {
    /// Listeners registered directly under `event_type`.
    pub fn get(&self, event_type: &EventType) -> Option<&[RegisteredListener]> {
        self.entries.get(event_type).map(Vec::as_slice)
    }

    /// Iterate event types with their listeners.
    pub fn iter(&self) -> impl Iterator<Item = (&EventType, &[RegisteredListener])> {
        self.entries.iter().map(|(ty, list)| (ty, list.as_slice()))
    }

    /// The registered event types.
    pub fn event_types(&self) -> impl Iterator<Item = &EventType> {
        self.entries.keys()
    }

    /// Number of event types with at least one listener.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total registrations across all event types.
    pub fn listener_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// Thread-safe map from event type to ordered listeners.
pub struct ListenerRegistry {
    table: ArcSwap<Table>,
    write: Mutex<()>,
    seq: AtomicU64,
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(Table::default()),
            write: Mutex::new(()),
            seq: AtomicU64::new(0),
        }
    }

    /// Register `listener` under `event_type` with `priority`.
    ///
    /// Returns `false` if that exact listener is already registered under
    /// `event_type`; the registry is left unchanged.
    pub fn insert(
        &self,
        event_type: EventType,
        listener: Arc<dyn EventListener>,
        priority: i32,
    ) -> bool {
        let _guard = self.write.lock();
        let current = self.table.load_full();
        let id = ListenerId::of(&listener);
        if current
            .by_type
            .get(&event_type)
            .is_some_and(|entries| entries.iter().any(|e| e.id() == id))
        {
            return false;
        }

        let entry = Entry {
            listener,
            priority,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        };
        let mut next = (*current).clone();
        let entries = next.by_type.entry(event_type).or_default();
        let pos = entries.partition_point(|e| e.order() <= entry.order());
        entries.insert(pos, entry);
        self.table.store(Arc::new(next));
        true
    }

    /// Remove `id` from every event type it is registered under.
    ///
    /// Event types left without listeners are dropped. Returns `false` if the
    /// listener was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let _guard = self.write.lock();
        let current = self.table.load_full();
        if !current
            .by_type
            .values()
            .any(|entries| entries.iter().any(|e| e.id() == id))
        {
            return false;
        }

        let mut next = (*current).clone();
        for entries in next.by_type.values_mut() {
            entries.retain(|e| e.id() != id);
        }
        next.by_type.retain(|_, entries| !entries.is_empty());
        self.table.store(Arc::new(next));
        true
    }

    /// Remove every registration.
    pub fn clear(&self) {
        let _guard = self.write.lock();
        self.table.store(Arc::new(Table::default()));
    }

    /// The listeners an event of `event_type` is delivered to, in invocation
    /// order.
    ///
    /// Collects registrations under the type and each of its supertypes. A
    /// listener registered under several of them is delivered once, at the
    /// position of its most specific registration.
    pub fn resolve(&self, event_type: EventType) -> Vec<Arc<dyn EventListener>> {
        let table = self.table.load();
        let mut matched: Vec<&Entry> = Vec::new();
        for ty in event_type.ancestors() {
            let Some(entries) = table.by_type.get(&ty) else {
                continue;
            };
            for entry in entries {
                let id = entry.id();
                if !matched.iter().any(|m| m.id() == id) {
                    matched.push(entry);
                }
            }
        }
        matched.sort_by_key(|e| e.order());
        matched.into_iter().map(|e| Arc::clone(&e.listener)).collect()
    }

    /// A copy of the current registrations.
    pub fn snapshot(&self) -> ListenerSnapshot {
        let table = self.table.load();
        let entries = table
            .by_type
            .iter()
            .map(|(ty, entries)| {
                let listeners = entries
                    .iter()
                    .map(|e| RegisteredListener {
                        id: e.id(),
                        name: e.listener.name().to_string(),
                        priority: e.priority,
                    })
                    .collect();
                (*ty, listeners)
            })
            .collect();
        ListenerSnapshot { entries }
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        self.table.load().by_type.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.table.load().by_type.is_empty()
    }
}
