use super::builder::Config;
use super::executor::{Executor, Handle};
use super::task::{JoinHandle, spawn_on};

use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// The main runtime handle.
///
/// `Runtime` is responsible for:
/// - spawning asynchronous tasks,
/// - driving task execution and timers on the calling thread,
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// Dropping the runtime drops every task that has not completed.
pub struct Runtime {
    /// Task executor responsible for scheduling and running futures.
    executor: Handle,
}

impl Runtime {
    /// Creates a new runtime instance from a builder configuration.
    pub(crate) fn new(config: Config) -> Self {
        Self {
            executor: Rc::new(Executor::new(config)),
        }
    }

    /// Spawns a future onto the runtime.
    ///
    /// The task starts running on the next call to
    /// [`block_on`](Self::block_on), or right away if called from inside one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let runtime = fastlane::RuntimeBuilder::new().build();
    /// let handle = runtime.spawn(async { 7 });
    ///
    /// assert_eq!(runtime.block_on(handle), 7);
    /// ```
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        spawn_on(&self.executor, future)
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// This method is the synchronous entry point of the runtime (e.g. in
    /// `main` or tests). Spawned tasks make progress while it runs.
    ///
    /// If the future can never complete (for instance because it waits on a
    /// mutex whose key was leaked), this call never returns.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let runtime = fastlane::RuntimeBuilder::new().build();
    /// let result = runtime.block_on(async { 42 });
    ///
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.executor.block_on(future)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime").finish_non_exhaustive()
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime, dropping unfinished tasks and timers.
    fn drop(&mut self) {
        self.executor.shutdown();
    }
}
