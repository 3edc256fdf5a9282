use super::state::{COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::runtime::executor::ready::{ReadyQueue, Target};

use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{RawWaker, RawWakerVTable, Waker};

/// Wake-up bookkeeping for one schedulable unit (a spawned task or the
/// future driven by `block_on`).
///
/// The executor keeps futures on its own thread; only the notifier travels
/// inside wakers. It guarantees that a target sits in the ready queue at most
/// once, however many times it is woken.
pub(crate) struct Notifier {
    /// What to run when this notifier fires.
    target: Target,

    /// Current scheduling state (see [`super::state`]).
    state: AtomicUsize,

    /// Queue the target is pushed onto when woken.
    ready: Arc<ReadyQueue>,
}

impl Notifier {
    /// Creates an idle notifier for `target`.
    pub(crate) fn new(target: Target, ready: Arc<ReadyQueue>) -> Self {
        Self {
            target,
            state: AtomicUsize::new(IDLE),
            ready,
        }
    }

    /// Signals the target to be rescheduled.
    ///
    /// If the target is `IDLE`, it moves to `QUEUED` and is pushed to the
    /// ready queue. If it is `RUNNING`, it moves to `NOTIFIED` so it is
    /// re-queued right after its current poll.
    pub(crate) fn wake(&self) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            match state {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.ready.push(self.target);
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Already queued, already notified, or finished.
                _ => return,
            }
        }
    }

    /// Moves a queued target to `RUNNING`.
    ///
    /// Returns `false` if the target was not queued, in which case it must
    /// not be polled.
    pub(crate) fn begin_poll(&self) -> bool {
        self.state
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Settles the state after a poll returned `Poll::Pending`.
    ///
    /// Returns to `IDLE`, unless a wake-up arrived during the poll, in which
    /// case the target is queued again.
    pub(crate) fn end_poll(&self) {
        if self
            .state
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.state.store(QUEUED, Ordering::Release);
            self.ready.push(self.target);
        }
    }

    /// Marks the target as finished. Later wake-ups are ignored.
    pub(crate) fn complete(&self) {
        self.state.store(COMPLETED, Ordering::Release);
    }
}

static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

/// Creates a [`Waker`] that fires `notifier` when woken.
///
/// The pointer stored inside the `RawWaker` originates from
/// `Arc::into_raw` and every vtable function keeps the reference count
/// balanced.
pub(crate) fn make_waker(notifier: Arc<Notifier>) -> Waker {
    unsafe { Waker::from_raw(RawWaker::new(Arc::into_raw(notifier) as *const (), &VTABLE)) }
}

/// Clones the raw waker, incrementing the reference count.
fn clone_raw(ptr: *const ()) -> RawWaker {
    let arc = unsafe { Arc::<Notifier>::from_raw(ptr as *const Notifier) };
    let cloned = arc.clone();
    mem::forget(arc);

    RawWaker::new(Arc::into_raw(cloned) as *const (), &VTABLE)
}

/// Wakes the target and consumes the waker.
fn wake_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<Notifier>::from_raw(ptr as *const Notifier) };
    arc.wake();
}

/// Wakes the target without consuming the waker.
fn wake_by_ref_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<Notifier>::from_raw(ptr as *const Notifier) };
    arc.wake();
    mem::forget(arc);
}

/// Drops the raw waker, decrementing the reference count.
fn drop_raw(ptr: *const ()) {
    unsafe { Arc::<Notifier>::from_raw(ptr as *const Notifier) };
}
