//! Capability registry for runtime handler resolution.
//!
//! Given a capability (a trait object type `S`), the registry asks its
//! [`ServiceEnumerator`] for the current candidates, keeps those whose
//! [`Handler::accept`] returns `true` for the request, and orders them by
//! priority. Nothing is cached: every call re-enumerates.

use plexus_core::{
    EnumerationError, Handler, ServiceEnumerator, panic_message, priority::sort_by_priority,
};
use std::{fmt, panic::AssertUnwindSafe, sync::Arc};

/// Resolves handlers of capability `S`.
pub struct CapabilityRegistry<S: ?Sized + 'static> {
    enumerator: Arc<dyn ServiceEnumerator<S>>,
}

impl<S: ?Sized + 'static> Clone for CapabilityRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            enumerator: Arc::clone(&self.enumerator),
        }
    }
}

impl<S: ?Sized + 'static> fmt::Debug for CapabilityRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capability", &std::any::type_name::<S>())
            .finish()
    }
}

impl<S: ?Sized + 'static> CapabilityRegistry<S> {
    /// Create a registry over `enumerator`.
    pub fn new<N>(enumerator: N) -> Self
    where
        N: ServiceEnumerator<S> + 'static,
    {
        Self {
            enumerator: Arc::new(enumerator),
        }
    }

    /// Create a registry over a shared enumerator.
    pub fn from_shared(enumerator: Arc<dyn ServiceEnumerator<S>>) -> Self {
        Self { enumerator }
    }

    /// The raw candidates in discovery order, unfiltered and unsorted.
    pub fn candidates(&self) -> Result<Vec<Arc<S>>, EnumerationError> {
        self.enumerator.enumerate()
    }

    /// Every handler accepting `request`, in priority order.
    ///
    /// Enumeration failure is returned to the caller. A candidate whose
    /// `accept` panics is logged and left out.
    pub fn resolve_all<R>(&self, request: &R) -> Result<Vec<Arc<S>>, EnumerationError>
    where
        R: ?Sized + fmt::Debug,
        S: Handler<R>,
    {
        let candidates = self.enumerator.enumerate()?;
        let total = candidates.len();

        let mut matched: Vec<Arc<S>> = candidates
            .into_iter()
            .filter(|candidate| accepts(candidate.as_ref(), request))
            .collect();
        sort_by_priority(&mut matched);

        tracing::trace!(
            capability = std::any::type_name::<S>(),
            ?request,
            total,
            matched = matched.len(),
            "resolved handlers"
        );
        Ok(matched)
    }

    /// The handler `resolve_all` would place first, or `None` if nothing
    /// accepts `request`.
    pub fn resolve_first<R>(&self, request: &R) -> Result<Option<Arc<S>>, EnumerationError>
    where
        R: ?Sized + fmt::Debug,
        S: Handler<R>,
    {
        Ok(self.resolve_all(request)?.into_iter().next())
    }
}

fn accepts<S, R>(candidate: &S, request: &R) -> bool
where
    S: ?Sized + Handler<R>,
    R: ?Sized + fmt::Debug,
{
    match std::panic::catch_unwind(AssertUnwindSafe(|| candidate.accept(request))) {
        Ok(accepted) => accepted,
        Err(payload) => {
            tracing::warn!(
                capability = std::any::type_name::<S>(),
                ?request,
                error = %panic_message(payload.as_ref()),
                "handler faulted in accept; excluding it"
            );
            false
        }
    }
}
