//! Procedural macros for Plexus.
//!
//! - `#[derive(Event)]` - implements `Event` and `EventKind`, optionally
//!   linking the event to a supertype through an `#[event(parent)]` field.

use proc_macro::TokenStream;

mod event;

/// Derive macro implementing `Event` and `EventKind`.
///
/// Mark at most one field with `#[event(parent)]` to declare the field's
/// type as this event's supertype. Listeners registered for the supertype
/// then receive this event, viewed through that field.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Event)]
/// struct AppEvent { source: &'static str }
///
/// #[derive(Debug, Event)]
/// struct Started {
///     #[event(parent)]
///     base: AppEvent,
///     port: u16,
/// }
/// ```
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    event::derive_event_impl(input)
}
