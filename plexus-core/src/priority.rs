//! # Priority Ordering
//!
//! A total order over handlers. Lower numeric values run first; handlers that
//! do not declare a priority get [`DEFAULT_PRIORITY`], which is the lowest
//! possible precedence and therefore sorts last.
//!
//! Sorting is always stable: handlers with equal priority keep the order in
//! which they were discovered or registered.

use std::{cmp::Ordering, rc::Rc, sync::Arc};

/// The highest possible precedence (sorts first).
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// The lowest possible precedence (sorts last).
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Priority used by handlers that do not declare one.
pub const DEFAULT_PRIORITY: i32 = LOWEST_PRECEDENCE;

/// Something that carries an ordering priority.
///
/// Lower values take precedence.
pub trait Prioritized {
    /// The priority of this handler. Defaults to [`DEFAULT_PRIORITY`].
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }
}

impl<T: Prioritized + ?Sized> Prioritized for &T {
    fn priority(&self) -> i32 {
        (**self).priority()
    }
}

impl<T: Prioritized + ?Sized> Prioritized for Box<T> {
    fn priority(&self) -> i32 {
        (**self).priority()
    }
}

impl<T: Prioritized + ?Sized> Prioritized for Arc<T> {
    fn priority(&self) -> i32 {
        (**self).priority()
    }
}

impl<T: Prioritized + ?Sized> Prioritized for Rc<T> {
    fn priority(&self) -> i32 {
        (**self).priority()
    }
}

/// Compares two handlers by priority.
pub fn compare<A, B>(a: &A, b: &B) -> Ordering
where
    A: Prioritized + ?Sized,
    B: Prioritized + ?Sized,
{
    a.priority().cmp(&b.priority())
}

/// Sorts handlers by ascending priority, keeping discovery order for ties.
pub fn sort_by_priority<T: Prioritized>(items: &mut [T]) {
    // `sort_by` is a stable merge sort.
    items.sort_by(|a, b| compare(a, b));
}
