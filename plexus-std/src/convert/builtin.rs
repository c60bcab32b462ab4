//! Built-in multi-value converters.
//!
//! Both are submitted to `inventory` and are therefore visible through
//! [`Discovered`](crate::services::Discovered).

use crate::services::ServiceRegistration;
use lazy_static::lazy_static;
use plexus_core::{BoxError, MultiValueConverter, Prioritized, TypeKey};
use std::{
    any::Any,
    collections::{BTreeSet, VecDeque},
    str::FromStr,
    sync::Arc,
};

/// Priority of [`StringToCharArrayConverter`]; ahead of the generic
/// splitting converter, which also produces `Vec<char>`.
pub const CHAR_ARRAY_PRIORITY: i32 = 0;

/// Separator used by [`StringToMultiValueConverter`].
pub const SEPARATOR: char = ',';

/// Converts a `String` into its characters (`Vec<char>`).
///
/// A `None` source converts to `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringToCharArrayConverter;

impl Prioritized for StringToCharArrayConverter {
    fn priority(&self) -> i32 {
        CHAR_ARRAY_PRIORITY
    }
}

impl MultiValueConverter for StringToCharArrayConverter {
    fn source_type(&self) -> TypeKey {
        TypeKey::of::<String>()
    }

    fn accept(&self, source: TypeKey, multi_value: TypeKey) -> bool {
        source.is::<String>() && multi_value.is::<Vec<char>>()
    }

    fn convert(
        &self,
        source: Option<&dyn Any>,
        _multi_value: TypeKey,
        _element: Option<TypeKey>,
    ) -> Result<Option<Box<dyn Any + Send>>, BoxError> {
        let Some(source) = source else {
            return Ok(None);
        };
        let text = source_as::<String>(source, self.name())?;
        Ok(Some(Box::new(text.chars().collect::<Vec<char>>())))
    }
}

/// Splits a `String` on [`SEPARATOR`], trims each part and parses it into the
/// element type of the target container.
///
/// Supported containers are `Vec<E>`, `VecDeque<E>` and `BTreeSet<E>` for
/// `E` in `String`, `char`, `bool`, `i32`, `i64`, `u32`, `u64`, plus `Vec<f64>`
/// and `VecDeque<f64>`. An empty source yields an empty container.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringToMultiValueConverter;

type Build = fn(&[&str]) -> Result<Box<dyn Any + Send>, BoxError>;

struct Target {
    container: TypeKey,
    element: TypeKey,
    build: Build,
}

fn build<C, E>(parts: &[&str]) -> Result<Box<dyn Any + Send>, BoxError>
where
    C: FromIterator<E> + Any + Send,
    E: FromStr,
    E::Err: std::error::Error + Send + Sync + 'static,
{
    let values = parts
        .iter()
        .map(|part| part.parse::<E>().map_err(|e| Box::new(e) as BoxError))
        .collect::<Result<C, BoxError>>()?;
    Ok(Box::new(values))
}

fn target<C, E>() -> Target
where
    C: FromIterator<E> + Any + Send,
    E: FromStr + Any,
    E::Err: std::error::Error + Send + Sync + 'static,
{
    Target {
        container: TypeKey::of::<C>(),
        element: TypeKey::of::<E>(),
        build: build::<C, E>,
    }
}

macro_rules! containers_of {
    ($($elem:ty),* $(,)?) => {
        vec![
            $(
                target::<Vec<$elem>, $elem>(),
                target::<VecDeque<$elem>, $elem>(),
                target::<BTreeSet<$elem>, $elem>(),
            )*
        ]
    };
}

lazy_static! {
    static ref TARGETS: Vec<Target> = {
        let mut targets = containers_of![String, char, bool, i32, i64, u32, u64];
        targets.push(target::<Vec<f64>, f64>());
        targets.push(target::<VecDeque<f64>, f64>());
        targets
    };
}

fn lookup(container: TypeKey) -> Option<&'static Target> {
    TARGETS.iter().find(|t| t.container == container)
}

impl Prioritized for StringToMultiValueConverter {}

impl MultiValueConverter for StringToMultiValueConverter {
    fn source_type(&self) -> TypeKey {
        TypeKey::of::<String>()
    }

    fn accept(&self, source: TypeKey, multi_value: TypeKey) -> bool {
        source.is::<String>() && lookup(multi_value).is_some()
    }

    fn convert(
        &self,
        source: Option<&dyn Any>,
        multi_value: TypeKey,
        element: Option<TypeKey>,
    ) -> Result<Option<Box<dyn Any + Send>>, BoxError> {
        let Some(source) = source else {
            return Ok(None);
        };
        let text = source_as::<String>(source, self.name())?;
        let target = lookup(multi_value)
            .ok_or_else(|| format!("unsupported multi-value type `{multi_value}`"))?;
        if let Some(element) = element {
            if element != target.element {
                return Err(format!(
                    "element type `{element}` does not match `{multi_value}`"
                )
                .into());
            }
        }

        let trimmed = text.trim();
        let parts: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split(SEPARATOR).map(str::trim).collect()
        };
        (target.build)(&parts).map(Some)
    }
}

fn source_as<'a, T: Any>(source: &'a dyn Any, converter: &str) -> Result<&'a T, BoxError> {
    source.downcast_ref::<T>().ok_or_else(|| {
        format!(
            "`{converter}` expects a `{}` source",
            std::any::type_name::<T>()
        )
        .into()
    })
}

lazy_static! {
    static ref STRING_TO_CHAR_ARRAY: Arc<dyn MultiValueConverter> =
        Arc::new(StringToCharArrayConverter);
    static ref STRING_TO_MULTI_VALUE: Arc<dyn MultiValueConverter> =
        Arc::new(StringToMultiValueConverter);
}

fn string_to_char_array() -> Arc<dyn MultiValueConverter> {
    STRING_TO_CHAR_ARRAY.clone()
}

fn string_to_multi_value() -> Arc<dyn MultiValueConverter> {
    STRING_TO_MULTI_VALUE.clone()
}

inventory::submit! {
    ServiceRegistration::<dyn MultiValueConverter>::new("string-to-char-array", string_to_char_array)
}

inventory::submit! {
    ServiceRegistration::<dyn MultiValueConverter>::new("string-to-multi-value", string_to_multi_value)
}

/// The built-in converters, in declaration order.
///
/// Returns the same shared instances on every call.
pub fn builtin_converters() -> Vec<Arc<dyn MultiValueConverter>> {
    vec![string_to_char_array(), string_to_multi_value()]
}
