use crate::utils::SlotId;

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::Duration;

/// Something the executor can poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// The future passed to `block_on`.
    Root,

    /// A spawned task, addressed by its slot in the task arena.
    Task(SlotId),
}

/// FIFO queue of targets that have been woken and wait to be polled.
///
/// Wakers may fire from any thread, so the queue is lock-protected and
/// pairs with a condition variable the run loop parks on when it has
/// nothing to do.
pub(crate) struct ReadyQueue {
    /// Woken targets in wake-up order.
    queue: Mutex<VecDeque<Target>>,

    /// Condition variable used to wake the parked run loop.
    condvar: Condvar,
}

impl ReadyQueue {
    /// Creates an empty ready queue.
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
        }
    }

    /// Pushes a woken target and unparks the run loop.
    pub(crate) fn push(&self, target: Target) {
        self.queue.lock().push_back(target);
        self.condvar.notify_one();
    }

    /// Takes the oldest woken target, if any.
    pub(crate) fn pop(&self) -> Option<Target> {
        self.queue.lock().pop_front()
    }

    /// Returns `true` if nothing is waiting to be polled.
    pub(crate) fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Parks the current thread until a target is pushed or `timeout`
    /// elapses.
    ///
    /// Returns immediately if the queue is not empty.
    pub(crate) fn park(&self, timeout: Duration) {
        let mut queue = self.queue.lock();

        if !queue.is_empty() {
            return;
        }

        let _ = self.condvar.wait_for(&mut queue, timeout);
    }
}
