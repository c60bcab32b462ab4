//! # Event Listeners
//!
//! Two layers, mirroring each other:
//!
//! - [`Listener<E>`]: the typed trait users implement, with native `async fn`
//!   for zero-cost static dispatch.
//! - [`EventListener`]: the object-safe form a dispatcher stores. It declares
//!   its event type and priority explicitly, so no runtime type inspection is
//!   needed to route events to it.
//!
//! [`Subscription`] adapts the former into the latter.

use crate::{
    error::BoxError,
    event::{Event, EventKind, EventType},
    handler::Handler,
    priority::{DEFAULT_PRIORITY, Prioritized},
};
use futures::future::{self, BoxFuture};
use std::{fmt, future::Future, marker::PhantomData, sync::Arc};

/// A typed listener for events of type `E` (and, through the hierarchy, its
/// subtypes).
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Listener` for `{E}`",
    label = "missing `Listener` implementation",
    note = "Listeners must implement `on_event` for the event type `{E}`."
)]
pub trait Listener<E: EventKind>: Send + Sync + 'static {
    /// Called once per published event assignable to `E`.
    fn on_event(&self, event: &E) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Dynamic object-safe listener, as stored by a dispatcher.
pub trait EventListener: Prioritized + Send + Sync + 'static {
    /// The declared event type. Events of this type or any subtype are
    /// delivered to this listener.
    fn event_type(&self) -> EventType;

    /// A human readable name for diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Handles one event.
    fn on_event_dyn<'a>(&'a self, event: &'a dyn Event) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl fmt::Debug for dyn EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("name", &self.name())
            .field("event_type", &self.event_type())
            .field("priority", &self.priority())
            .finish()
    }
}

impl Handler<EventType> for dyn EventListener {
    fn accept(&self, request: &EventType) -> bool {
        self.event_type().is_assignable_from(request)
    }
}

/// Binds a typed [`Listener`] to its event type, a priority and a name.
pub struct Subscription<E, L> {
    listener: L,
    priority: i32,
    name: &'static str,
    _event: PhantomData<fn(&E)>,
}

impl<E, L> Subscription<E, L>
where
    E: EventKind,
    L: Listener<E>,
{
    /// Wraps `listener` with the default priority.
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            priority: DEFAULT_PRIORITY,
            name: std::any::type_name::<L>(),
            _event: PhantomData,
        }
    }

    /// Sets the priority (lower runs first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the diagnostic name.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// The wrapped listener.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Erases the subscription for registration with a dispatcher.
    pub fn into_arc(self) -> Arc<dyn EventListener> {
        Arc::new(self)
    }
}

impl<E, L> Prioritized for Subscription<E, L> {
    fn priority(&self) -> i32 {
        self.priority
    }
}

impl<E, L> EventListener for Subscription<E, L>
where
    E: EventKind,
    L: Listener<E>,
{
    fn event_type(&self) -> EventType {
        EventType::of::<E>()
    }

    fn name(&self) -> &str {
        self.name
    }

    fn on_event_dyn<'a>(&'a self, event: &'a dyn Event) -> BoxFuture<'a, Result<(), BoxError>> {
        match event.view::<E>() {
            Some(event) => Box::pin(self.listener.on_event(event)),
            // Not assignable; the dispatcher never routes such events here.
            None => Box::pin(future::ready(Ok(()))),
        }
    }
}

/// A [`Listener`] backed by a synchronous closure.
#[derive(Clone)]
pub struct FnListener<F>(pub F);

impl<E, F> Listener<E> for FnListener<F>
where
    E: EventKind,
    F: Fn(&E) -> Result<(), BoxError> + Send + Sync + 'static,
{
    async fn on_event(&self, event: &E) -> Result<(), BoxError> {
        (self.0)(event)
    }
}

/// Builds an erased listener for `E` from a synchronous closure.
///
/// # Example
///
/// ```rust
/// use plexus_core::{impl_event, listener_fn, EventType};
///
/// #[derive(Debug)]
/// struct Ping;
/// impl_event!(Ping);
///
/// let listener = listener_fn(|_: &Ping| Ok(()));
/// assert_eq!(listener.event_type(), EventType::of::<Ping>());
/// ```
pub fn listener_fn<E, F>(f: F) -> Arc<dyn EventListener>
where
    E: EventKind,
    F: Fn(&E) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Subscription::new(FnListener(f)).into_arc()
}
