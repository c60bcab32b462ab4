//! Dispatch executors.
//!
//! - [`DirectExecutor`]: runs the batch on the publishing thread and returns
//!   once every listener was attempted.
//! - [`PooledExecutor`]: submits the batch to a `futures` thread pool and
//!   returns once it is queued. Shutdown drains queued batches before the
//!   pool is released.

use futures::{
    executor::ThreadPool,
    task::{self, ArcWake},
};
use parking_lot::{Condvar, Mutex};
use plexus_core::{DispatchError, DispatchExecutor, DispatchTask, ExecutorDescriptor, ExecutorKind};
use std::{
    cell::Cell,
    future::Future,
    sync::Arc,
    task::{Context, Poll},
    thread::{self, Thread},
};

// ============================================================================
// DirectExecutor
// ============================================================================

/// Runs dispatch work synchronously on the caller's thread.
///
/// Re-entrant: a listener may publish again from inside a direct dispatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectExecutor;

impl DispatchExecutor for DirectExecutor {
    fn descriptor(&self) -> ExecutorDescriptor {
        ExecutorDescriptor::direct()
    }

    fn execute(&self, task: DispatchTask) -> Result<(), DispatchError> {
        run_to_completion(task);
        Ok(())
    }
}

struct ThreadWaker(Thread);

impl ArcWake for ThreadWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.unpark();
    }
}

/// Drives `future` on the current thread, parking between polls.
///
/// Unlike `futures::executor::block_on` this does not refuse to run inside
/// another executor, so nested publishes from listeners work.
fn run_to_completion<F: Future>(future: F) -> F::Output {
    let mut future = std::pin::pin!(future);
    let waker = task::waker(Arc::new(ThreadWaker(thread::current())));
    let mut cx = Context::from_waker(&waker);
    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(output) => return output,
            Poll::Pending => thread::park(),
        }
    }
}

// ============================================================================
// PooledExecutor
// ============================================================================

thread_local! {
    // Identity of the pool owning the current worker thread, 0 elsewhere.
    static CURRENT_POOL: Cell<usize> = const { Cell::new(0) };
}

struct Inner {
    name: String,
    pool: Mutex<Option<ThreadPool>>,
    pending: Mutex<usize>,
    drained: Condvar,
}

impl Inner {
    fn id(self: &Arc<Self>) -> usize {
        Arc::as_ptr(self) as usize
    }

    fn finish_one(&self) {
        let mut pending = self.pending.lock();
        *pending -= 1;
        if *pending == 0 {
            self.drained.notify_all();
        }
    }
}

// Decrements the pending count even if the batch unwinds.
struct PendingGuard(Arc<Inner>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.finish_one();
    }
}

/// Runs dispatch work on a worker pool.
///
/// Each submitted task is one ordered listener batch, so listeners for the
/// same event never interleave. Batches from different publishes may run
/// concurrently and in any order.
#[derive(Clone)]
pub struct PooledExecutor {
    inner: Arc<Inner>,
}

impl PooledExecutor {
    /// Create a pooled executor with `pool_size` worker threads.
    pub fn new(pool_size: usize) -> Result<Self, DispatchError> {
        Self::builder().pool_size(pool_size).build()
    }

    /// Start configuring a pooled executor.
    pub fn builder() -> PooledExecutorBuilder {
        PooledExecutorBuilder::default()
    }

    /// Number of submitted batches that have not finished yet.
    pub fn pending(&self) -> usize {
        *self.inner.pending.lock()
    }

    /// Blocks until every submitted batch has finished.
    ///
    /// Returns immediately when called from one of this pool's workers.
    pub fn wait_idle(&self) {
        if CURRENT_POOL.with(Cell::get) == self.inner.id() {
            tracing::debug!(executor = %self.inner.name, "wait_idle called from a worker; not waiting");
            return;
        }
        let mut pending = self.inner.pending.lock();
        while *pending > 0 {
            self.inner.drained.wait(&mut pending);
        }
    }
}

impl std::fmt::Debug for PooledExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledExecutor")
            .field("name", &self.inner.name)
            .field("pending", &self.pending())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

impl DispatchExecutor for PooledExecutor {
    fn descriptor(&self) -> ExecutorDescriptor {
        ExecutorDescriptor {
            kind: ExecutorKind::Pooled,
            name: self.inner.name.clone(),
        }
    }

    fn execute(&self, task: DispatchTask) -> Result<(), DispatchError> {
        // Spawning under the pool lock orders submissions against shutdown.
        let pool = self.inner.pool.lock();
        let Some(pool) = pool.as_ref() else {
            return Err(DispatchError::Closed);
        };
        *self.inner.pending.lock() += 1;
        let guard = PendingGuard(Arc::clone(&self.inner));
        pool.spawn_ok(async move {
            let _guard = guard;
            task.await;
        });
        Ok(())
    }

    fn shutdown(&self) {
        let Some(pool) = self.inner.pool.lock().take() else {
            return;
        };
        tracing::debug!(executor = %self.inner.name, pending = self.pending(), "draining pooled executor");
        self.wait_idle();
        drop(pool);
        tracing::debug!(executor = %self.inner.name, "pooled executor shut down");
    }

    fn is_shutdown(&self) -> bool {
        self.inner.pool.lock().is_none()
    }
}

/// Builder for [`PooledExecutor`].
#[derive(Debug, Clone)]
pub struct PooledExecutorBuilder {
    pool_size: Option<usize>,
    name_prefix: String,
}

impl Default for PooledExecutorBuilder {
    fn default() -> Self {
        Self {
            pool_size: None,
            name_prefix: "plexus-dispatch-".to_string(),
        }
    }
}

impl PooledExecutorBuilder {
    /// Number of worker threads. Defaults to the number of CPUs.
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size.max(1));
        self
    }

    /// Prefix for worker thread names.
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Build the executor and start its workers.
    pub fn build(self) -> Result<PooledExecutor, DispatchError> {
        let inner = Arc::new(Inner {
            name: self.name_prefix.trim_end_matches('-').to_string(),
            pool: Mutex::new(None),
            pending: Mutex::new(0),
            drained: Condvar::new(),
        });

        let pool_id = inner.id();
        let mut builder = ThreadPool::builder();
        builder
            .name_prefix(self.name_prefix)
            .after_start(move |_| CURRENT_POOL.with(|c| c.set(pool_id)));
        if let Some(size) = self.pool_size {
            builder.pool_size(size);
        }
        let pool = builder
            .create()
            .map_err(|e| DispatchError::Executor(e.to_string()))?;

        *inner.pool.lock() = Some(pool);
        Ok(PooledExecutor { inner })
    }
}
