//! # Events and Event Types
//!
//! Events form a single-inheritance hierarchy. A subtype event embeds its
//! supertype value as a field and declares that link through
//! [`EventKind::parent_type`]; every chain ends at the root type
//! [`EventType::any`], which matches every event.
//!
//! A listener registered for a supertype receives every subtype event,
//! viewed as the supertype through [`Event::as_type`].
//!
//! # Example
//!
//! ```rust
//! use plexus_core::{impl_event, Event, EventKind, EventType};
//!
//! #[derive(Debug)]
//! struct AppEvent { source: &'static str }
//!
//! #[derive(Debug)]
//! struct Started { base: AppEvent, port: u16 }
//!
//! impl_event!(AppEvent);
//! impl_event!(Started, parent = AppEvent, field = base);
//!
//! let started = Started { base: AppEvent { source: "main" }, port: 80 };
//! let event: &dyn Event = &started;
//! assert_eq!(event.view::<AppEvent>().map(|e| e.source), Some("main"));
//! assert!(EventType::of::<AppEvent>().is_assignable_from(&Started::event_type_of()));
//! ```

use crate::types::TypeKey;
use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

/// An event instance that can be published.
///
/// Object safe; dispatchers handle events as `&dyn Event`.
pub trait Event: Any + Send + Sync + fmt::Debug {
    /// The runtime type of this event.
    fn event_type(&self) -> EventType;

    /// Views this event as the type identified by `ty`, if `ty` is this
    /// event's own type or one of its supertypes.
    fn as_type(&self, ty: TypeId) -> Option<&dyn Any>;
}

impl dyn Event {
    /// Views this event as `E` (its own type or a supertype).
    pub fn view<E: Event>(&self) -> Option<&E> {
        self.as_type(TypeId::of::<E>())?.downcast_ref::<E>()
    }

    /// Returns `true` if this event is an `E` or a subtype of `E`.
    pub fn is<E: Event>(&self) -> bool {
        self.as_type(TypeId::of::<E>()).is_some()
    }
}

/// The static side of an event type.
pub trait EventKind: Event + Sized {
    /// The direct supertype of this event, if any.
    fn parent_type() -> Option<EventType> {
        None
    }

    /// The [`EventType`] of `Self`.
    fn event_type_of() -> EventType {
        EventType::of::<Self>()
    }
}

/// Describes an event type and its position in the hierarchy.
///
/// Equality and hashing consider the type identity only.
#[derive(Clone, Copy)]
pub struct EventType {
    key: TypeKey,
    parent: fn() -> Option<EventType>,
}

fn no_parent() -> Option<EventType> {
    None
}

impl EventType {
    /// The event type of `E`.
    pub fn of<E: EventKind>() -> Self {
        Self {
            key: TypeKey::of::<E>(),
            parent: E::parent_type,
        }
    }

    /// The root type. Every event is assignable to it.
    pub fn any() -> Self {
        Self {
            key: TypeKey::of::<dyn Event>(),
            parent: no_parent,
        }
    }

    /// Returns `true` if this is the root type.
    pub fn is_any(&self) -> bool {
        self.key.is::<dyn Event>()
    }

    /// The type key.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The Rust type name.
    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    /// The direct supertype. Types without a declared parent report the root
    /// type; the root type reports `None`.
    pub fn parent(&self) -> Option<EventType> {
        if self.is_any() {
            return None;
        }
        Some((self.parent)().unwrap_or_else(EventType::any))
    }

    /// Iterates this type, then each supertype up to and including the root.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors { next: Some(*self) }
    }

    /// Returns `true` if an event of type `other` may be delivered to a
    /// listener declared for `self`.
    pub fn is_assignable_from(&self, other: &EventType) -> bool {
        other.ancestors().any(|ty| ty == *self)
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.name())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Iterator over an event type and its supertypes.
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<EventType>,
}

impl Iterator for Ancestors {
    type Item = EventType;

    fn next(&mut self) -> Option<EventType> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// Implements [`Event`] and [`EventKind`] for a type.
///
/// With `parent = P, field = f`, the type becomes a subtype of `P` whose
/// supertype view is `self.f`.
#[macro_export]
macro_rules! impl_event {
    ($ty:ty) => {
        impl $crate::Event for $ty {
            fn event_type(&self) -> $crate::EventType {
                $crate::EventType::of::<Self>()
            }

            fn as_type(
                &self,
                ty: ::std::any::TypeId,
            ) -> ::core::option::Option<&dyn ::std::any::Any> {
                if ty == ::std::any::TypeId::of::<Self>() {
                    ::core::option::Option::Some(self)
                } else {
                    ::core::option::Option::None
                }
            }
        }

        impl $crate::EventKind for $ty {}
    };
    ($ty:ty, parent = $parent:ty, field = $field:ident) => {
        impl $crate::Event for $ty {
            fn event_type(&self) -> $crate::EventType {
                $crate::EventType::of::<Self>()
            }

            fn as_type(
                &self,
                ty: ::std::any::TypeId,
            ) -> ::core::option::Option<&dyn ::std::any::Any> {
                if ty == ::std::any::TypeId::of::<Self>() {
                    ::core::option::Option::Some(self)
                } else {
                    $crate::Event::as_type(&self.$field, ty)
                }
            }
        }

        impl $crate::EventKind for $ty {
            fn parent_type() -> ::core::option::Option<$crate::EventType> {
                ::core::option::Option::Some($crate::EventType::of::<$parent>())
            }
        }
    };
}
