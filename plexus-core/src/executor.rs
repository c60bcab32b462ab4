//! Dispatch executor abstraction.
//!
//! An executor runs one unit of dispatch work: the ordered listener batch for
//! a single published event. It is chosen once when a dispatcher is built.

use crate::error::DispatchError;
use futures::future::BoxFuture;
use std::fmt;

/// One unit of dispatch work.
pub type DispatchTask = BoxFuture<'static, ()>;

/// The execution model of an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorKind {
    /// Synchronous, on the publishing thread.
    Direct,
    /// Asynchronous, on a worker pool.
    Pooled,
}

/// Describes an executor for introspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutorDescriptor {
    /// The execution model.
    pub kind: ExecutorKind,
    /// The executor's name.
    pub name: String,
}

impl ExecutorDescriptor {
    /// Descriptor of the direct executor.
    pub fn direct() -> Self {
        Self {
            kind: ExecutorKind::Direct,
            name: "direct".to_string(),
        }
    }
}

impl fmt::Display for ExecutorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.kind)
    }
}

/// Strategy for running dispatch work.
///
/// This abstraction allows different execution models (caller thread,
/// worker pool) to be plugged into a dispatcher.
pub trait DispatchExecutor: Send + Sync + 'static {
    /// Describes this executor.
    fn descriptor(&self) -> ExecutorDescriptor;

    /// Runs or submits `task`.
    ///
    /// Direct executors return after the task completed; pooled executors
    /// return once the task is queued.
    fn execute(&self, task: DispatchTask) -> Result<(), DispatchError>;

    /// Stops accepting work and drains what was already submitted.
    fn shutdown(&self) {}

    /// Returns `true` once [`shutdown`](DispatchExecutor::shutdown) ran.
    fn is_shutdown(&self) -> bool {
        false
    }
}
