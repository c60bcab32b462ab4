//! Conversion resolver.

use super::builtin::builtin_converters;
use crate::{
    registry::CapabilityRegistry,
    services::{Discovered, ServiceTable},
};
use lazy_static::lazy_static;
use plexus_core::{
    ConversionError, ConversionRequest, EnumerationError, MultiValueConverter, ServiceEnumerator,
    TypeKey,
};
use std::{any::Any, sync::Arc};

/// Finds the best [`MultiValueConverter`] for a request and runs it.
#[derive(Debug, Clone)]
pub struct ConversionResolver {
    registry: CapabilityRegistry<dyn MultiValueConverter>,
}

impl ConversionResolver {
    /// Create a resolver over `enumerator`.
    pub fn new<N>(enumerator: N) -> Self
    where
        N: ServiceEnumerator<dyn MultiValueConverter> + 'static,
    {
        Self {
            registry: CapabilityRegistry::new(enumerator),
        }
    }

    /// A resolver over every converter submitted to `inventory`.
    pub fn discovered() -> Self {
        Self::new(Discovered)
    }

    /// A resolver over the built-in converters only.
    pub fn builtin() -> Self {
        Self::new(ServiceTable::with(builtin_converters()))
    }

    /// The underlying capability registry.
    pub fn registry(&self) -> &CapabilityRegistry<dyn MultiValueConverter> {
        &self.registry
    }

    /// The highest-precedence converter for `source` into `target`.
    pub fn find(
        &self,
        source: TypeKey,
        target: TypeKey,
    ) -> Result<Option<Arc<dyn MultiValueConverter>>, EnumerationError> {
        self.registry.resolve_first(&ConversionRequest {
            source,
            target,
            element: None,
        })
    }

    /// Every converter for `source` into `target`, in priority order.
    pub fn find_all(
        &self,
        source: TypeKey,
        target: TypeKey,
    ) -> Result<Vec<Arc<dyn MultiValueConverter>>, EnumerationError> {
        self.registry.resolve_all(&ConversionRequest {
            source,
            target,
            element: None,
        })
    }

    /// Converts `source` into `T`.
    ///
    /// Returns `Ok(None)` when no converter accepts the request, or when the
    /// selected converter maps the source (for example a `None` source) to
    /// nothing. Converter failures are returned verbatim inside
    /// [`ConversionError::Handler`].
    pub fn convert<S, T>(
        &self,
        source: Option<&S>,
        element: Option<TypeKey>,
    ) -> Result<Option<T>, ConversionError>
    where
        S: Any,
        T: Any,
    {
        let request = ConversionRequest::of::<S, T>().with_element(element);
        let Some(converter) = self.registry.resolve_first(&request)? else {
            tracing::debug!(?request, "no converter found");
            return Ok(None);
        };

        let produced = converter
            .convert(
                source.map(|s| s as &dyn Any),
                request.target,
                request.element,
            )
            .map_err(|source| ConversionError::Handler {
                converter: converter.name().to_string(),
                source,
            })?;

        match produced {
            None => Ok(None),
            Some(value) => value
                .downcast::<T>()
                .map(|value| Some(*value))
                .map_err(|_| ConversionError::TypeMismatch {
                    expected: std::any::type_name::<T>(),
                }),
        }
    }
}

impl Default for ConversionResolver {
    fn default() -> Self {
        Self::discovered()
    }
}

lazy_static! {
    static ref DEFAULT_RESOLVER: ConversionResolver = ConversionResolver::discovered();
}

/// The process-wide resolver over discovered converters.
pub fn default_resolver() -> &'static ConversionResolver {
    &DEFAULT_RESOLVER
}

/// Converts `source` into `T` with the process-wide resolver, if any
/// discovered converter can.
pub fn convert_if_possible<S, T>(
    source: Option<&S>,
    element: Option<TypeKey>,
) -> Result<Option<T>, ConversionError>
where
    S: Any,
    T: Any,
{
    default_resolver().convert(source, element)
}
