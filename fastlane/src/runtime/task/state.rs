//! Scheduling states of a task's [`Notifier`](super::waker::Notifier).
//!
//! Transitions:
//!
//! ```text
//! IDLE --wake--> QUEUED --poll--> RUNNING --Pending--> IDLE
//!                                    |  \--wake--> NOTIFIED --Pending--> QUEUED
//!                                    \--Ready--> COMPLETED
//! ```

/// Task is idle and not scheduled.
///
/// The task exists but is not currently queued or running.
pub(crate) const IDLE: usize = 0;

/// Task is queued for execution.
///
/// The task's target sits in the ready queue exactly once.
pub(crate) const QUEUED: usize = 1;

/// Task is currently being polled by the executor.
pub(crate) const RUNNING: usize = 2;

/// Task has completed execution.
///
/// The future has returned `Poll::Ready` and will not be polled again.
pub(crate) const COMPLETED: usize = 3;

/// Task has been woken while being polled.
///
/// It goes straight back to the ready queue once the current poll returns.
pub(crate) const NOTIFIED: usize = 4;
