//! # plexus-std
//!
//! Standard implementations for the Plexus extension-point engine.
//!
//! This crate provides:
//! - **Capability resolution**: [`CapabilityRegistry`]
//! - **Service enumerators**: [`ServiceTable`], [`Discovered`], closures
//! - **Conversion**: [`ConversionResolver`] and the built-in converters
//! - **Event dispatch**: [`Dispatcher`], [`DirectExecutor`], [`PooledExecutor`]
//! - **Built-in listeners**: [`EventStatistics`], [`TracingListener`]
//! - **Testing utilities**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use plexus_core;

// Modules
pub mod convert;
pub mod dispatch;
pub mod listeners;
pub mod registry;
pub mod services;
pub mod testing;

pub use convert::{
    ConversionResolver, StringToCharArrayConverter, StringToMultiValueConverter,
    builtin_converters, convert_if_possible, default_resolver,
};
pub use dispatch::{
    DirectExecutor, Dispatcher, DispatcherBuilder, DispatcherState, ListenerId, ListenerRegistry,
    ListenerSnapshot, PooledExecutor, PooledExecutorBuilder, RegisteredListener,
};
pub use listeners::{EventStatistics, TracingListener, builtin_listeners};
pub use registry::CapabilityRegistry;
pub use services::{Discovered, ServiceRegistration, ServiceTable};

pub use inventory;
