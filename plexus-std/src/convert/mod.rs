//! Multi-value conversion.
//!
//! A [`ConversionResolver`] is a capability registry specialised for
//! `dyn MultiValueConverter`: it derives the request descriptor from the
//! source and target types, picks the highest-precedence converter and
//! checks that the produced value really is the requested type.

pub mod builtin;
pub mod resolver;

pub use builtin::{StringToCharArrayConverter, StringToMultiValueConverter, builtin_converters};
pub use resolver::{ConversionResolver, convert_if_possible, default_resolver};
