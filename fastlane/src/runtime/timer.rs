use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::task::Waker;
use std::time::Instant;

/// An entry in the runtime timer queue.
///
/// `TimerEntry` represents a scheduled wake-up at a specific deadline. The
/// entry may be cancelled before it fires.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Registration order, used to break ties between equal deadlines.
    pub(crate) seq: u64,

    /// Waker to notify when the deadline is reached.
    pub(crate) waker: Waker,

    /// Cancellation flag shared with the associated sleep future.
    pub(crate) cancelled: Rc<Cell<bool>>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by deadline, then by registration order.
    ///
    /// The comparison is **reversed** so that a `BinaryHeap<TimerEntry>`
    /// behaves as a min-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Smallest heap size at which cancelled entries are swept out.
const MIN_COMPACT: usize = 64;

/// Min-heap of pending timers, owned by the executor.
///
/// A cancelled entry stays in the heap until it reaches the top or the heap
/// doubles in size since the last sweep, whichever comes first.
pub(crate) struct TimerQueue {
    heap: BinaryHeap<TimerEntry>,
    next_seq: u64,

    /// Heap size that triggers the next sweep of cancelled entries.
    compact_at: usize,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
            compact_at: MIN_COMPACT,
        }
    }

    /// Schedules `waker` to be woken at `deadline` unless `cancelled` is set
    /// first.
    pub(crate) fn insert(&mut self, deadline: Instant, waker: Waker, cancelled: Rc<Cell<bool>>) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.heap.push(TimerEntry {
            deadline,
            seq,
            waker,
            cancelled,
        });

        if self.heap.len() >= self.compact_at {
            self.compact();
        }
    }

    /// Drops every cancelled entry, wherever it sits in the heap.
    fn compact(&mut self) {
        let before = self.heap.len();
        self.heap.retain(|entry| !entry.cancelled.get());

        self.compact_at = (self.heap.len() * 2).max(MIN_COMPACT);
        tracing::trace!(
            removed = before - self.heap.len(),
            live = self.heap.len(),
            "swept cancelled timers"
        );
    }

    /// Earliest deadline among live timers.
    ///
    /// Cancelled entries sitting at the top of the heap are discarded.
    pub(crate) fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(entry) = self.heap.peek() {
            if !entry.cancelled.get() {
                return Some(entry.deadline);
            }
            self.heap.pop();
        }
        None
    }

    /// Removes every timer whose deadline is at or before `now` and returns
    /// the wakers of those that were not cancelled, in firing order.
    ///
    /// Waking is left to the caller so no borrow of the queue is held while
    /// wakers run.
    pub(crate) fn expire(&mut self, now: Instant) -> Vec<Waker> {
        let mut fired = Vec::new();

        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }

            let Some(entry) = self.heap.pop() else {
                break;
            };

            if !entry.cancelled.get() {
                fired.push(entry.waker);
            }
        }

        fired
    }

    /// Number of timers still registered, cancelled ones included.
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}
