//! Asynchronous task primitives.
//!
//! This module defines how futures become tasks on the current-thread
//! runtime:
//! - task state management and the notifier behind every waker,
//! - join handles for awaiting task completion,
//! - [`spawn`] and [`try_spawn`].
//!
//! Spawned futures do not need to be `Send`: they never leave the thread
//! that runs `block_on`.

mod core;
mod handle;

pub(crate) mod state;
pub(crate) mod waker;

pub use self::core::{SpawnError, spawn, try_spawn};
pub use self::handle::JoinHandle;

pub(crate) use self::core::spawn_on;
