//! The event dispatcher.

use super::{
    executor::{DirectExecutor, PooledExecutor, PooledExecutorBuilder},
    table::{ListenerId, ListenerRegistry, ListenerSnapshot},
};
use crate::listeners::{EventStatistics, builtin_listeners};
use futures::FutureExt;
use lazy_static::lazy_static;
use plexus_core::{
    DispatchError, DispatchExecutor, Event, EventListener, EventType, ExecutorDescriptor,
    ListenerError, ServiceEnumerator,
};
use std::{
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

/// Lifecycle of a [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Built; no registration or publish has happened yet.
    Idle,
    /// Accepting registrations and publishes.
    Active,
    /// Shut down; every operation is rejected.
    Shutdown,
}

impl DispatcherState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Active,
            _ => Self::Shutdown,
        }
    }
}

const IDLE: u8 = 0;
const ACTIVE: u8 = 1;
const SHUTDOWN: u8 = 2;

/// Routes published events to registered listeners.
///
/// Listeners registered for an event type also receive every subtype event.
/// Per event, listeners run one at a time in ascending priority order, ties
/// in registration order. A listener that fails or panics is logged and the
/// remaining listeners still run; the publisher never sees listener faults.
///
/// # Example
///
/// ```rust
/// use plexus_core::{impl_event, listener_fn};
/// use plexus_std::Dispatcher;
///
/// #[derive(Debug)]
/// struct Saved { id: u32 }
/// impl_event!(Saved);
///
/// let dispatcher = Dispatcher::direct();
/// dispatcher.add_listener(listener_fn(|e: &Saved| {
///     assert_eq!(e.id, 7);
///     Ok(())
/// })).unwrap();
/// dispatcher.publish(Saved { id: 7 }).unwrap();
/// ```
pub struct Dispatcher {
    listeners: ListenerRegistry,
    executor: Arc<dyn DispatchExecutor>,
    owns_executor: bool,
    state: AtomicU8,
    statistics: Option<Arc<EventStatistics>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state())
            .field("executor", &self.executor.descriptor())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Dispatcher {
    fn with_executor(executor: Arc<dyn DispatchExecutor>, owns_executor: bool) -> Self {
        Self {
            listeners: ListenerRegistry::new(),
            executor,
            owns_executor,
            state: AtomicU8::new(IDLE),
            statistics: None,
        }
    }

    /// A dispatcher with the direct executor and no listeners.
    pub fn direct() -> Self {
        Self::with_executor(Arc::new(DirectExecutor), true)
    }

    /// A dispatcher over a pool of `threads` workers, owned by the
    /// dispatcher.
    pub fn pooled(threads: usize) -> Result<Self, DispatchError> {
        Self::builder().pooled(threads).build()
    }

    /// Start configuring a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// The process-wide dispatcher.
    ///
    /// Uses the direct executor and starts with the built-in listeners.
    pub fn default_instance() -> &'static Dispatcher {
        &DEFAULT_DISPATCHER
    }

    fn seed(&self, listener: Arc<dyn EventListener>, priority: i32) {
        let event_type = listener.event_type();
        self.listeners.insert(event_type, listener, priority);
    }

    fn activate(&self) -> Result<(), DispatchError> {
        match self
            .state
            .compare_exchange(IDLE, ACTIVE, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) | Err(ACTIVE) => Ok(()),
            Err(_) => Err(DispatchError::Closed),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) was called.
    pub fn is_shutdown(&self) -> bool {
        self.state() == DispatcherState::Shutdown
    }

    /// Describes the bound executor.
    pub fn executor(&self) -> ExecutorDescriptor {
        self.executor.descriptor()
    }

    /// Statistics collected by the built-in listener, if this dispatcher was
    /// built with it.
    pub fn statistics(&self) -> Option<&Arc<EventStatistics>> {
        self.statistics.as_ref()
    }

    /// Register `listener` under its declared event type and priority.
    ///
    /// Returns `Ok(false)` if the same listener instance is already
    /// registered for that type.
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) -> Result<bool, DispatchError> {
        let priority = listener.priority();
        self.add_listener_with_priority(listener, priority)
    }

    /// Register `listener` under its declared event type with an explicit
    /// priority.
    pub fn add_listener_with_priority(
        &self,
        listener: Arc<dyn EventListener>,
        priority: i32,
    ) -> Result<bool, DispatchError> {
        self.activate()?;
        let event_type = listener.event_type();
        let name = listener.name().to_string();
        let inserted = self.listeners.insert(event_type, listener, priority);
        tracing::debug!(listener = %name, %event_type, priority, inserted, "add listener");
        Ok(inserted)
    }

    /// Register several listeners. Returns how many were newly added.
    pub fn add_listeners<I>(&self, listeners: I) -> Result<usize, DispatchError>
    where
        I: IntoIterator<Item = Arc<dyn EventListener>>,
    {
        let mut added = 0;
        for listener in listeners {
            if self.add_listener(listener)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Remove `listener` from every event type it is registered under.
    ///
    /// Returns `Ok(false)` if it was not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn EventListener>) -> Result<bool, DispatchError> {
        self.activate()?;
        let removed = self.listeners.remove(ListenerId::of(listener));
        tracing::debug!(listener = %listener.name(), removed, "remove listener");
        Ok(removed)
    }

    /// A snapshot of every registration.
    pub fn all_event_listeners(&self) -> ListenerSnapshot {
        self.listeners.snapshot()
    }

    /// The listeners an event of `event_type` would be delivered to, in
    /// invocation order.
    pub fn listeners_for(&self, event_type: EventType) -> Vec<Arc<dyn EventListener>> {
        self.listeners.resolve(event_type)
    }

    /// Publish `event`.
    ///
    /// With the direct executor this returns after every listener was
    /// attempted; with a pooled executor it returns once the batch is queued.
    pub fn publish<E: Event>(&self, event: E) -> Result<(), DispatchError> {
        self.publish_arc(Arc::new(event))
    }

    /// Publish an already shared event.
    pub fn publish_arc(&self, event: Arc<dyn Event>) -> Result<(), DispatchError> {
        self.activate()?;
        let event_type = event.event_type();
        let listeners = self.listeners.resolve(event_type);
        if listeners.is_empty() {
            tracing::trace!(%event_type, "no listeners for event");
            return Ok(());
        }

        tracing::trace!(%event_type, listeners = listeners.len(), "dispatching event");
        self.executor.execute(Box::pin(deliver(event, listeners)))
    }

    /// Shut the dispatcher down.
    ///
    /// Clears every registration and rejects further operations with
    /// [`DispatchError::Closed`]. An executor created by this dispatcher is
    /// shut down too, draining queued batches first; an executor supplied
    /// through [`DispatcherBuilder::executor`] is left running. Idempotent.
    ///
    /// Called from a listener running on this dispatcher's own pool, it
    /// returns without waiting for queued batches, which may still run
    /// afterwards.
    pub fn shutdown(&self) {
        if self.state.swap(SHUTDOWN, Ordering::AcqRel) == SHUTDOWN {
            return;
        }
        if self.owns_executor {
            self.executor.shutdown();
        }
        self.listeners.clear();
        tracing::debug!(executor = %self.executor.descriptor(), "dispatcher shut down");
    }
}

async fn deliver(event: Arc<dyn Event>, listeners: Vec<Arc<dyn EventListener>>) {
    for listener in listeners {
        let outcome = AssertUnwindSafe(listener.on_event_dyn(event.as_ref()))
            .catch_unwind()
            .await;
        let error = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => ListenerError::Failed(err),
            Err(payload) => ListenerError::from_panic(payload),
        };
        tracing::warn!(
            listener = %listener.name(),
            event = ?event,
            %error,
            "listener faulted; continuing with remaining listeners"
        );
    }
}

lazy_static! {
    static ref DEFAULT_DISPATCHER: Dispatcher = {
        let mut dispatcher = Dispatcher::direct();
        let (statistics, listeners) = builtin_listeners();
        for listener in listeners {
            let priority = listener.priority();
            dispatcher.seed(listener, priority);
        }
        dispatcher.statistics = Some(statistics);
        dispatcher
    };
}

enum ExecutorChoice {
    Direct,
    Pooled(PooledExecutorBuilder),
    External(Arc<dyn DispatchExecutor>),
}

/// Configures a [`Dispatcher`].
///
/// ```rust
/// use plexus_std::Dispatcher;
/// use plexus_core::ExecutorKind;
///
/// let dispatcher = Dispatcher::builder().pooled(2).with_builtins().build().unwrap();
/// assert_eq!(dispatcher.executor().kind, ExecutorKind::Pooled);
/// assert_eq!(dispatcher.all_event_listeners().listener_count(), 2);
/// dispatcher.shutdown();
/// ```
pub struct DispatcherBuilder {
    executor: ExecutorChoice,
    builtins: bool,
    listeners: Vec<(Arc<dyn EventListener>, Option<i32>)>,
    enumerators: Vec<Arc<dyn ServiceEnumerator<dyn EventListener>>>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            executor: ExecutorChoice::Direct,
            builtins: false,
            listeners: Vec::new(),
            enumerators: Vec::new(),
        }
    }
}

impl DispatcherBuilder {
    /// Use the direct executor (the default).
    pub fn direct(mut self) -> Self {
        self.executor = ExecutorChoice::Direct;
        self
    }

    /// Use an owned pool of `threads` workers.
    pub fn pooled(self, threads: usize) -> Self {
        self.pooled_with(PooledExecutor::builder().pool_size(threads))
    }

    /// Use an owned pool configured by `builder`.
    pub fn pooled_with(mut self, builder: PooledExecutorBuilder) -> Self {
        self.executor = ExecutorChoice::Pooled(builder);
        self
    }

    /// Use an externally managed executor. The dispatcher does not shut it
    /// down.
    pub fn executor(mut self, executor: Arc<dyn DispatchExecutor>) -> Self {
        self.executor = ExecutorChoice::External(executor);
        self
    }

    /// Seed the built-in listeners.
    pub fn with_builtins(mut self) -> Self {
        self.builtins = true;
        self
    }

    /// Seed `listener` with its own priority.
    pub fn listener(mut self, listener: Arc<dyn EventListener>) -> Self {
        self.listeners.push((listener, None));
        self
    }

    /// Seed `listener` with an explicit priority.
    pub fn listener_with_priority(mut self, listener: Arc<dyn EventListener>, priority: i32) -> Self {
        self.listeners.push((listener, Some(priority)));
        self
    }

    /// Seed every listener `enumerator` yields at build time.
    pub fn discover<N>(mut self, enumerator: N) -> Self
    where
        N: ServiceEnumerator<dyn EventListener> + 'static,
    {
        self.enumerators.push(Arc::new(enumerator));
        self
    }

    /// Build the dispatcher.
    ///
    /// Fails if the pool cannot be created or an enumerator fails.
    pub fn build(self) -> Result<Dispatcher, DispatchError> {
        let mut dispatcher = match self.executor {
            ExecutorChoice::Direct => Dispatcher::direct(),
            ExecutorChoice::Pooled(builder) => Dispatcher::with_executor(Arc::new(builder.build()?), true),
            ExecutorChoice::External(executor) => Dispatcher::with_executor(executor, false),
        };

        if self.builtins {
            let (statistics, listeners) = builtin_listeners();
            for listener in listeners {
                let priority = listener.priority();
                dispatcher.seed(listener, priority);
            }
            dispatcher.statistics = Some(statistics);
        }

        for (listener, priority) in self.listeners {
            let priority = priority.unwrap_or_else(|| listener.priority());
            dispatcher.seed(listener, priority);
        }

        for enumerator in self.enumerators {
            let discovered = match enumerator.enumerate() {
                Ok(discovered) => discovered,
                Err(err) => {
                    // Release a pool created above before reporting.
                    dispatcher.shutdown();
                    return Err(err.into());
                }
            };
            for listener in discovered {
                let priority = listener.priority();
                dispatcher.seed(listener, priority);
            }
        }

        tracing::debug!(
            executor = %dispatcher.executor(),
            listeners = dispatcher.listeners.len(),
            "dispatcher built"
        );
        Ok(dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingListener, OrderProbe, PanickingListener};
    use plexus_core::{EnumerationError, EventKind, ExecutorKind, impl_event, listener_fn};

    #[derive(Debug)]
    struct Tick;

    impl_event!(Tick);

    #[test]
    fn test_state_transitions() {
        let dispatcher = Dispatcher::direct();
        assert_eq!(dispatcher.state(), DispatcherState::Idle);

        dispatcher.publish(Tick).unwrap();
        assert_eq!(dispatcher.state(), DispatcherState::Active);

        dispatcher.shutdown();
        assert_eq!(dispatcher.state(), DispatcherState::Shutdown);
        dispatcher.shutdown();

        assert!(matches!(dispatcher.publish(Tick), Err(DispatchError::Closed)));
        let listener = listener_fn(|_: &Tick| Ok(()));
        assert!(matches!(
            dispatcher.add_listener(listener.clone()),
            Err(DispatchError::Closed)
        ));
        assert!(matches!(
            dispatcher.remove_listener(&listener),
            Err(DispatchError::Closed)
        ));
    }

    #[test]
    fn test_shutdown_clears_registrations() {
        let dispatcher = Dispatcher::builder().with_builtins().build().unwrap();
        assert_eq!(dispatcher.all_event_listeners().listener_count(), 2);
        dispatcher.shutdown();
        assert!(dispatcher.all_event_listeners().is_empty());
    }

    #[test]
    fn test_faults_do_not_stop_delivery() {
        let probe = OrderProbe::new();
        let dispatcher = Dispatcher::direct();
        dispatcher.add_listener(probe.listener::<Tick>("first", 1)).unwrap();
        dispatcher
            .add_listener_with_priority(FailingListener::<Tick>::new("boom").into_arc(), 2)
            .unwrap();
        dispatcher
            .add_listener_with_priority(PanickingListener::<Tick>::new("kaboom").into_arc(), 3)
            .unwrap();
        dispatcher.add_listener(probe.listener::<Tick>("last", 4)).unwrap();

        dispatcher.publish(Tick).unwrap();
        assert_eq!(probe.order(), vec!["first", "last"]);
    }

    #[test]
    fn test_builder_seeds_listeners_in_priority_order() {
        let probe = OrderProbe::new();
        let dispatcher = Dispatcher::builder()
            .listener(probe.listener::<Tick>("late", 10))
            .listener_with_priority(probe.listener::<Tick>("early", 10), -1)
            .build()
            .unwrap();
        assert_eq!(dispatcher.state(), DispatcherState::Idle);

        dispatcher.publish(Tick).unwrap();
        assert_eq!(probe.order(), vec!["early", "late"]);
    }

    #[test]
    fn test_builder_surfaces_enumeration_failure() {
        let result = Dispatcher::builder()
            .discover(|| -> Result<Vec<Arc<dyn EventListener>>, EnumerationError> {
                Err(EnumerationError::Message("no listeners today".into()))
            })
            .build();
        assert!(matches!(result, Err(DispatchError::Enumeration(_))));
    }

    #[test]
    fn test_default_instance_shape() {
        let dispatcher = Dispatcher::default_instance();
        assert_eq!(dispatcher.executor().kind, ExecutorKind::Direct);
        let snapshot = dispatcher.all_event_listeners();
        assert_eq!(snapshot.listener_count(), 2);
        assert!(snapshot.get(&EventType::any()).is_some());
        assert!(dispatcher.statistics().is_some());
        assert_eq!(dispatcher.listeners_for(Tick::event_type_of()).len(), 2);
    }
}
