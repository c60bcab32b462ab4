//! # Handlers and Service Enumeration
//!
//! A [`Handler`] is a registered implementation of some capability. Each
//! capability is expressed as a trait object type (for example
//! `dyn MultiValueConverter`); a [`ServiceEnumerator`] hands out the currently
//! known instances of it, and a registry filters them with
//! [`Handler::accept`] and orders them by [`Prioritized::priority`].
//!
//! How an enumerator finds its instances (static table, link-time
//! registration, configuration) is none of the registry's business.

use crate::{error::EnumerationError, priority::Prioritized};
use std::sync::Arc;

/// A candidate implementation that can be matched against a request `R`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Handler` for `{R}`",
    label = "missing `Handler` implementation",
    note = "Handlers must implement `accept` to decide whether they serve `{R}`."
)]
pub trait Handler<R: ?Sized>: Prioritized + Send + Sync {
    /// Returns `true` if this handler serves `request`.
    ///
    /// Expected to be free of side effects.
    fn accept(&self, request: &R) -> bool;
}

/// Produces the currently known implementations of capability `S`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot enumerate services of type `{S}`",
    label = "missing `ServiceEnumerator` implementation",
    note = "Implement `ServiceEnumerator<{S}>` to supply candidates for this capability."
)]
pub trait ServiceEnumerator<S: ?Sized>: Send + Sync {
    /// Returns the instances in discovery order.
    fn enumerate(&self) -> Result<Vec<Arc<S>>, EnumerationError>;
}

impl<S, F> ServiceEnumerator<S> for F
where
    S: ?Sized,
    F: Fn() -> Result<Vec<Arc<S>>, EnumerationError> + Send + Sync,
{
    fn enumerate(&self) -> Result<Vec<Arc<S>>, EnumerationError> {
        self()
    }
}
