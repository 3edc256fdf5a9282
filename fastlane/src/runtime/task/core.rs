use super::handle::JoinHandle;
use crate::runtime::context;
use crate::runtime::executor::Executor;

use std::future::Future;

/// Error returned by [`try_spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    /// No runtime is driving the current thread.
    #[error("no fastlane runtime is running on this thread")]
    NoRuntime,
}

/// Spawns a future as a task onto the current runtime.
///
/// The task is queued behind every task that is already runnable.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    match try_spawn(future) {
        Ok(handle) => handle,
        Err(err) => panic!("spawn must be called within the context of a runtime: {err}"),
    }
}

/// Spawns a future as a task onto the current runtime, or reports that there
/// is none.
pub fn try_spawn<F>(future: F) -> Result<JoinHandle<F::Output>, SpawnError>
where
    F: Future + 'static,
    F::Output: 'static,
{
    let executor = context::current().ok_or(SpawnError::NoRuntime)?;

    Ok(spawn_on(&executor, future))
}

/// Spawns `future` on a specific executor.
pub(crate) fn spawn_on<F>(executor: &Executor, future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    let (handle, completion) = JoinHandle::pair();

    executor.spawn(Box::pin(async move {
        let output = future.await;
        completion.complete(output);
    }));

    handle
}
