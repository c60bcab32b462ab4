//! Event dispatch: listener registry, executors and the dispatcher.

pub mod dispatcher;
pub mod executor;
pub mod table;

pub use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherState};
pub use executor::{DirectExecutor, PooledExecutor, PooledExecutorBuilder};
pub use table::{ListenerId, ListenerRegistry, ListenerSnapshot, RegisteredListener};
