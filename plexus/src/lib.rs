//! # plexus - Extension-Point Engine
//!
//! `plexus` lets a host application find implementations of a capability at
//! runtime and broadcast typed events to prioritized listeners.
//!
//! ## Capability resolution
//!
//! ```rust
//! use plexus::ConversionResolver;
//!
//! let resolver = ConversionResolver::default();
//! let chars: Option<Vec<char>> = resolver.convert(Some(&"123".to_string()), None).unwrap();
//! assert_eq!(chars, Some(vec!['1', '2', '3']));
//! ```
//!
//! ## Event dispatch
//!
//! ```rust
//! use plexus::prelude::*;
//!
//! #[derive(Debug, Event)]
//! struct AppEvent { source: &'static str }
//!
//! #[derive(Debug, Event)]
//! struct Started {
//!     #[event(parent)]
//!     base: AppEvent,
//!     port: u16,
//! }
//!
//! let dispatcher = Dispatcher::direct();
//! dispatcher.add_listener(listener_fn(|e: &AppEvent| {
//!     assert_eq!(e.source, "main");
//!     Ok(())
//! })).unwrap();
//! dispatcher.publish(Started { base: AppEvent { source: "main" }, port: 80 }).unwrap();
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use plexus_core::{
    Ancestors,
    // Error types
    BoxError,
    // Conversion
    ConversionError,
    ConversionRequest,
    // Executors
    DispatchError,
    DispatchExecutor,
    DispatchTask,
    EnumerationError,
    // Events
    Event,
    EventKind,
    EventListener,
    EventType,
    ExecutorDescriptor,
    ExecutorKind,
    FnListener,
    // Priority
    HIGHEST_PRECEDENCE,
    // Handlers
    Handler,
    LOWEST_PRECEDENCE,
    Listener,
    ListenerError,
    MultiValueConverter,
    PlexusError,
    Prioritized,
    ServiceEnumerator,
    Subscription,
    TypeKey,
    DEFAULT_PRIORITY,
    impl_event,
    listener_fn,
    panic_message,
};

// Capability resolution
pub use plexus_std::{
    CapabilityRegistry, Discovered, ServiceRegistration, ServiceTable,
    convert::{
        ConversionResolver, StringToCharArrayConverter, StringToMultiValueConverter,
        builtin_converters, convert_if_possible, default_resolver,
    },
};

// Event dispatch
pub use plexus_std::{
    DirectExecutor, Dispatcher, DispatcherBuilder, DispatcherState, ListenerId, ListenerSnapshot,
    PooledExecutor, PooledExecutorBuilder, RegisteredListener,
};

pub use futures::future::BoxFuture;

/// Priority ordering helpers.
pub mod priority {
    pub use plexus_core::priority::{compare, sort_by_priority};
}

/// Built-in listeners.
pub mod listeners {
    pub use plexus_std::listeners::{EventStatistics, TracingListener, builtin_listeners};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use plexus_std::testing::*;
}

/// Prelude module - common imports for Plexus.
///
/// # Usage
///
/// ```rust,ignore
/// use plexus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError,
        ConversionResolver,
        DispatchError,
        Dispatcher,
        Event,
        EventKind,
        EventListener,
        EventType,
        Listener,
        Prioritized,
        ServiceEnumerator,
        Subscription,
        listener_fn,
    };
}

#[cfg(feature = "macros")]
pub use plexus_macros::Event;

pub use inventory;
