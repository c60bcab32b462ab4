//! Service enumerators.
//!
//! Three ways to supply the candidates of a capability:
//!
//! - [`ServiceTable`]: an explicit, thread-safe registration table.
//! - closures `Fn() -> Result<Vec<Arc<S>>, EnumerationError>` (configuration
//!   driven or fallible sources).
//! - [`Discovered`]: registrations collected at link time via `inventory`,
//!   so implementations are found without the registry linking to them.

use parking_lot::RwLock;
use plexus_core::{EnumerationError, EventListener, MultiValueConverter, ServiceEnumerator};
use std::{
    fmt,
    sync::Arc,
};

/// A static registration table.
///
/// Enumeration returns handlers in registration order.
pub struct ServiceTable<S: ?Sized> {
    entries: RwLock<Vec<Arc<S>>>,
}

impl<S: ?Sized> ServiceTable<S> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Create a table holding `entries` in order.
    pub fn with(entries: impl IntoIterator<Item = Arc<S>>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Register a handler.
    pub fn register(&self, handler: Arc<S>) {
        self.entries.write().push(handler);
    }

    /// Get the number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<S: ?Sized> Default for ServiceTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> fmt::Debug for ServiceTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceTable")
            .field("capability", &std::any::type_name::<S>())
            .field("len", &self.len())
            .finish()
    }
}

impl<S: ?Sized + Send + Sync> ServiceEnumerator<S> for ServiceTable<S> {
    fn enumerate(&self) -> Result<Vec<Arc<S>>, EnumerationError> {
        Ok(self.entries.read().clone())
    }
}

/// A link-time registration of a handler, collected with `inventory`.
///
/// The registration is plain data: a name and a factory. Enumeration calls
/// the factory each time, so a factory that should hand out one shared
/// instance returns a clone of a `lazy_static` handler.
///
/// # Example
///
/// ```rust,ignore
/// lazy_static! {
///     static ref MY_CONVERTER: Arc<dyn MultiValueConverter> = Arc::new(MyConverter);
/// }
///
/// fn make() -> Arc<dyn MultiValueConverter> {
///     MY_CONVERTER.clone()
/// }
///
/// inventory::submit! {
///     ServiceRegistration::<dyn MultiValueConverter>::new("my-converter", make)
/// }
/// ```
pub struct ServiceRegistration<S: ?Sized + 'static> {
    name: &'static str,
    factory: fn() -> Arc<S>,
}

impl<S: ?Sized + 'static> ServiceRegistration<S> {
    /// Create a registration entry.
    pub const fn new(name: &'static str, factory: fn() -> Arc<S>) -> Self {
        Self { name, factory }
    }

    /// Name for debugging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The registered handler, as built by the factory.
    pub fn instance(&self) -> Arc<S> {
        (self.factory)()
    }
}

inventory::collect!(ServiceRegistration<dyn MultiValueConverter>);
inventory::collect!(ServiceRegistration<dyn EventListener>);

/// Enumerates handlers submitted with `inventory::submit!`.
///
/// Available for `dyn MultiValueConverter` and `dyn EventListener`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discovered;

impl<S> ServiceEnumerator<S> for Discovered
where
    S: ?Sized + 'static,
    ServiceRegistration<S>: inventory::Collect,
{
    fn enumerate(&self) -> Result<Vec<Arc<S>>, EnumerationError> {
        let handlers: Vec<Arc<S>> = inventory::iter::<ServiceRegistration<S>>
            .into_iter()
            .map(|registration| {
                tracing::trace!(
                    capability = std::any::type_name::<S>(),
                    name = registration.name(),
                    "discovered service"
                );
                registration.instance()
            })
            .collect();
        Ok(handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_core::{Prioritized, TypeKey};

    trait Shape: Prioritized + Send + Sync {
        fn sides(&self) -> u32;
    }

    struct Square;

    impl Prioritized for Square {}

    impl Shape for Square {
        fn sides(&self) -> u32 {
            4
        }
    }

    struct Triangle;

    impl Prioritized for Triangle {}

    impl Shape for Triangle {
        fn sides(&self) -> u32 {
            3
        }
    }

    #[test]
    fn test_table_preserves_registration_order() {
        let table = ServiceTable::<dyn Shape>::new();
        assert!(table.is_empty());
        table.register(Arc::new(Triangle));
        table.register(Arc::new(Square));

        let sides: Vec<_> = table
            .enumerate()
            .unwrap()
            .iter()
            .map(|s| s.sides())
            .collect();
        assert_eq!(sides, vec![3, 4]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_table_enumerations_share_instances() {
        let table = ServiceTable::<dyn Shape>::with([Arc::new(Square) as Arc<dyn Shape>]);
        let a = table.enumerate().unwrap();
        let b = table.enumerate().unwrap();
        assert!(Arc::ptr_eq(&a[0], &b[0]));
    }

    #[test]
    fn test_discovered_converters_include_builtins() {
        let converters: Vec<Arc<dyn MultiValueConverter>> = Discovered.enumerate().unwrap();
        assert!(
            converters
                .iter()
                .any(|c| c.source_type() == TypeKey::of::<String>())
        );

        let again: Vec<Arc<dyn MultiValueConverter>> = Discovered.enumerate().unwrap();
        assert_eq!(converters.len(), again.len());
        for (a, b) in converters.iter().zip(again.iter()) {
            assert!(Arc::ptr_eq(a, b));
        }
    }
}
