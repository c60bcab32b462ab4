//! # plexus-core
//!
//! Core traits for the Plexus extension-point engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! plugins that only need to *provide* handlers, without pulling in the
//! `plexus-std` registries and dispatchers.
//!
//! # Building Blocks
//!
//! ## Priority ([`Prioritized`])
//!
//! A total order over handlers: lower values run first, undeclared
//! priorities sort last, ties keep discovery order.
//!
//! ## Handlers ([`Handler`], [`ServiceEnumerator`])
//!
//! A capability is a trait object type. A [`ServiceEnumerator`] supplies its
//! current implementations; each implementation decides through
//! [`Handler::accept`] whether it serves a given request descriptor.
//!
//! ## Conversion ([`MultiValueConverter`])
//!
//! Converts one value into a container value, matched by a
//! [`ConversionRequest`].
//!
//! ## Events ([`Event`], [`EventType`], [`Listener`], [`EventListener`])
//!
//! Typed events in a single-inheritance hierarchy, multicast to every
//! listener whose declared type is the event's type or one of its
//! supertypes, through a pluggable [`DispatchExecutor`].
//!
//! # Error Types
//!
//! - [`PlexusError`] - Top-level error type
//! - [`EnumerationError`] - Candidate enumeration failed
//! - [`DispatchError`] - Dispatcher-level failures
//! - [`ListenerError`] - Isolated listener faults
//! - [`ConversionError`] - Conversion failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod converter;
mod error;
mod event;
mod executor;
mod handler;
mod listener;
pub mod priority;
mod types;

// Re-exports
pub use converter::{ConversionRequest, MultiValueConverter};
pub use error::{
    BoxError, ConversionError, DispatchError, EnumerationError, ListenerError, PlexusError,
    panic_message,
};
pub use event::{Ancestors, Event, EventKind, EventType};
pub use executor::{DispatchExecutor, DispatchTask, ExecutorDescriptor, ExecutorKind};
pub use handler::{Handler, ServiceEnumerator};
pub use listener::{EventListener, FnListener, Listener, Subscription, listener_fn};
pub use priority::{DEFAULT_PRIORITY, HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE, Prioritized};
pub use types::TypeKey;
