//! Testing utilities for Plexus.
//!
//! This module provides listeners that make dispatcher behavior observable
//! in tests.
//!
//! # Features
//!
//! - [`RecordingListener`]: records every event it receives
//! - [`CountingListener`]: counts invocations
//! - [`FailingListener`]: always returns an error
//! - [`PanickingListener`]: always panics
//! - [`OrderProbe`]: records the order in which labelled listeners ran

use parking_lot::Mutex;
use plexus_core::{BoxError, EventKind, EventListener, FnListener, Listener, Subscription};
use std::{
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

// ============================================================================
// Recording Listener
// ============================================================================

/// A listener that records all events it receives.
///
/// Clones share the recording.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingListener::<MyEvent>::new();
/// dispatcher.add_listener(recorder.clone().into_arc())?;
///
/// dispatcher.publish(MyEvent::new())?;
/// assert_eq!(recorder.count(), 1);
/// ```
pub struct RecordingListener<E> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E: Clone> RecordingListener<E> {
    /// Create a new recording listener.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a clone of the recorded events.
    pub fn events(&self) -> Vec<E> {
        self.events.lock().clone()
    }

    /// Get the number of recorded events.
    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    /// Clear all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl<E: EventKind + Clone> RecordingListener<E> {
    /// Erase for registration, with the default priority.
    pub fn into_arc(self) -> Arc<dyn EventListener> {
        Subscription::<E, _>::new(self).into_arc()
    }
}

impl<E: Clone> Default for RecordingListener<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RecordingListener<E> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
        }
    }
}

impl<E: EventKind + Clone> Listener<E> for RecordingListener<E> {
    async fn on_event(&self, event: &E) -> Result<(), BoxError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

// ============================================================================
// Counting Listener
// ============================================================================

/// A listener that counts invocations, for any event type.
#[derive(Clone, Default)]
pub struct CountingListener {
    count: Arc<AtomicUsize>,
}

impl CountingListener {
    /// Create a new counting listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the count to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    /// Erase for registration under `E` with `priority`.
    pub fn subscribe<E: EventKind>(&self, priority: i32) -> Arc<dyn EventListener> {
        Subscription::<E, _>::new(self.clone())
            .with_priority(priority)
            .into_arc()
    }
}

impl<E: EventKind> Listener<E> for CountingListener {
    async fn on_event(&self, _event: &E) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Faulting Listeners
// ============================================================================

/// A listener that fails every invocation with an error.
pub struct FailingListener<E> {
    message: &'static str,
    _event: PhantomData<fn(&E)>,
}

impl<E: EventKind> FailingListener<E> {
    /// Create a listener failing with `message`.
    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            _event: PhantomData,
        }
    }

    /// Erase for registration.
    pub fn into_arc(self) -> Arc<dyn EventListener> {
        let name = self.message;
        Subscription::<E, _>::new(self).named(name).into_arc()
    }
}

impl<E: EventKind> Listener<E> for FailingListener<E> {
    async fn on_event(&self, _event: &E) -> Result<(), BoxError> {
        Err(self.message.into())
    }
}

/// A listener that panics on every invocation.
pub struct PanickingListener<E> {
    message: &'static str,
    _event: PhantomData<fn(&E)>,
}

impl<E: EventKind> PanickingListener<E> {
    /// Create a listener panicking with `message`.
    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            _event: PhantomData,
        }
    }

    /// Erase for registration.
    pub fn into_arc(self) -> Arc<dyn EventListener> {
        let name = self.message;
        Subscription::<E, _>::new(self).named(name).into_arc()
    }
}

impl<E: EventKind> Listener<E> for PanickingListener<E> {
    async fn on_event(&self, _event: &E) -> Result<(), BoxError> {
        panic!("{}", self.message)
    }
}

// ============================================================================
// Order Probe
// ============================================================================

/// Hands out labelled listeners and records the order they run in.
///
/// # Example
///
/// ```rust,ignore
/// let probe = OrderProbe::new();
/// dispatcher.add_listener(probe.listener::<MyEvent>("b", 2))?;
/// dispatcher.add_listener(probe.listener::<MyEvent>("a", 1))?;
///
/// dispatcher.publish(MyEvent)?;
/// assert_eq!(probe.order(), vec!["a", "b"]);
/// ```
#[derive(Clone, Default)]
pub struct OrderProbe {
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl OrderProbe {
    /// Create an empty probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener for `E` that appends `label` when invoked.
    pub fn listener<E: EventKind>(&self, label: &'static str, priority: i32) -> Arc<dyn EventListener> {
        let log = self.log.clone();
        Subscription::<E, _>::new(FnListener(move |_: &E| {
            log.lock().push(label);
            Ok::<(), BoxError>(())
        }))
        .with_priority(priority)
        .named(label)
        .into_arc()
    }

    /// Labels in invocation order.
    pub fn order(&self) -> Vec<&'static str> {
        self.log.lock().clone()
    }

    /// Forget recorded invocations.
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}
