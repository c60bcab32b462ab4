//! Multi-value conversion capability.
//!
//! A [`MultiValueConverter`] turns one source value into a container value
//! (`Vec<T>`, `VecDeque<T>`, `BTreeSet<T>`, ...). Converters are discovered
//! through a service enumerator and matched with a [`ConversionRequest`].

use crate::{error::BoxError, handler::Handler, priority::Prioritized, types::TypeKey};
use std::any::Any;

/// Request descriptor for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversionRequest {
    /// Type of the source value.
    pub source: TypeKey,
    /// The multi-value type to produce.
    pub target: TypeKey,
    /// Optional element type hint.
    pub element: Option<TypeKey>,
}

impl ConversionRequest {
    /// A request converting `S` into `T`.
    pub fn of<S: ?Sized + Any, T: Any>() -> Self {
        Self {
            source: TypeKey::of::<S>(),
            target: TypeKey::of::<T>(),
            element: None,
        }
    }

    /// Sets the element type hint.
    pub fn with_element(mut self, element: Option<TypeKey>) -> Self {
        self.element = element;
        self
    }
}

/// Converts a source-typed value into a multi-valued target.
///
/// The source type is declared explicitly through
/// [`source_type`](MultiValueConverter::source_type).
pub trait MultiValueConverter: Prioritized + Send + Sync + 'static {
    /// The source type this converter reads.
    fn source_type(&self) -> TypeKey;

    /// Returns `true` if this converter handles `source` into `multi_value`.
    ///
    /// Decided from the types alone.
    fn accept(&self, source: TypeKey, multi_value: TypeKey) -> bool;

    /// Converts `source` into `multi_value`.
    ///
    /// `None` as source is valid input; converters decide what it means
    /// (usually `Ok(None)`).
    fn convert(
        &self,
        source: Option<&dyn Any>,
        multi_value: TypeKey,
        element: Option<TypeKey>,
    ) -> Result<Option<Box<dyn Any + Send>>, BoxError>;

    /// A human readable name for diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<C: MultiValueConverter + ?Sized> Handler<ConversionRequest> for C {
    fn accept(&self, request: &ConversionRequest) -> bool {
        MultiValueConverter::accept(self, request.source, request.target)
    }
}
