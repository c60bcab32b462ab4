//! Error types for Plexus.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`PlexusError`] - Top-level error type for all Plexus operations
//! - [`EnumerationError`] - A service enumerator could not produce candidates
//! - [`DispatchError`] - Errors surfaced by a dispatcher to its caller
//! - [`ListenerError`] - A fault isolated inside a single listener
//! - [`ConversionError`] - Errors from multi-value conversion
//!
//! "No candidate matched" is never an error here; it is an `Option::None`.

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Plexus operations.
#[derive(Error, Debug)]
pub enum PlexusError {
    /// An error occurred during event dispatch.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Candidate handlers could not be enumerated.
    #[error("enumeration error: {0}")]
    Enumeration(#[from] EnumerationError),

    /// A conversion failed.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// The service enumerator could not be consulted.
///
/// Fatal to the resolution call that triggered it.
#[derive(Error, Debug)]
pub enum EnumerationError {
    /// The backing source for a capability is unavailable.
    #[error("services for `{capability}` are unavailable")]
    Unavailable {
        /// Name of the capability being enumerated.
        capability: &'static str,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },

    /// A free-form enumeration failure.
    #[error("{0}")]
    Message(String),
}

impl EnumerationError {
    /// Builds an [`EnumerationError::Unavailable`] for capability `S`.
    pub fn unavailable<S: ?Sized>(source: impl Into<BoxError>) -> Self {
        EnumerationError::Unavailable {
            capability: std::any::type_name::<S>(),
            source: source.into(),
        }
    }
}

/// Errors a dispatcher surfaces to its caller.
///
/// Faults raised by listeners are never reported here; see [`ListenerError`].
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The dispatcher (or its executor) was shut down.
    #[error("dispatcher closed")]
    Closed,

    /// Seeding listeners from a service enumerator failed.
    #[error("listener enumeration failed: {0}")]
    Enumeration(#[from] EnumerationError),

    /// The executor refused or failed to accept work.
    #[error("executor error: {0}")]
    Executor(String),
}

/// A fault raised inside one listener invocation.
///
/// Contained at the dispatch boundary and logged; never propagated to the
/// publisher.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The listener returned an error.
    #[error("listener failed: {0}")]
    Failed(#[source] BoxError),

    /// The listener panicked.
    #[error("listener panicked: {0}")]
    Panic(String),
}

impl ListenerError {
    /// Builds a [`ListenerError::Panic`] from a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        ListenerError::Panic(panic_message(payload.as_ref()))
    }
}

/// Errors that can occur while converting a value.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Converters could not be enumerated.
    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    /// The selected converter failed. The converter's error is kept verbatim.
    #[error("converter `{converter}` failed")]
    Handler {
        /// Name of the failing converter.
        converter: String,
        /// The converter's own error.
        #[source]
        source: BoxError,
    },

    /// The converter produced a value of a different type than requested.
    #[error("converter produced a value that is not `{expected}`")]
    TypeMismatch {
        /// The requested target type.
        expected: &'static str,
    },
}

// Convenience conversions
impl From<BoxError> for PlexusError {
    fn from(err: BoxError) -> Self {
        PlexusError::Custom(err)
    }
}

impl From<BoxError> for ListenerError {
    fn from(err: BoxError) -> Self {
        ListenerError::Failed(err)
    }
}

/// Extracts a readable message from a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
