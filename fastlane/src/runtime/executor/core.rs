use super::ready::{ReadyQueue, Target};
use crate::runtime::builder::Config;
use crate::runtime::context::enter_context;
use crate::runtime::task::waker::{Notifier, make_waker};
use crate::runtime::timer::TimerQueue;
use crate::utils::{Slab, SlotId};

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::mem;
use std::pin::{Pin, pin};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Instant;

/// Shared handle to the executor, installed in the thread-local context
/// while `block_on` runs.
pub(crate) type Handle = Rc<Executor>;

/// A spawned future together with its wake-up bookkeeping.
struct LocalTask {
    /// The future, taken out of the arena while it is being polled so that
    /// it can spawn without re-borrowing the arena.
    future: Option<Pin<Box<dyn Future<Output = ()>>>>,

    /// Notifier shared with every waker handed to the future.
    notifier: Arc<Notifier>,
}

/// Current-thread task executor.
///
/// The `Executor` is responsible for:
/// - storing spawned tasks in a slab arena,
/// - polling woken tasks in FIFO order,
/// - firing expired timers,
/// - parking the thread when nothing is runnable.
///
/// Every future runs on the thread that calls [`block_on`](Self::block_on);
/// futures therefore do not need to be `Send`.
pub(crate) struct Executor {
    /// Spawned tasks that have not completed yet.
    tasks: RefCell<Slab<LocalTask>>,

    /// Targets woken since they were last polled.
    ready: Arc<ReadyQueue>,

    /// Pending `sleep` deadlines.
    timers: RefCell<TimerQueue>,

    /// Tuning knobs from the builder.
    config: Config,

    /// Total number of polls performed, used to interleave timer checks.
    ticks: Cell<usize>,
}

impl Executor {
    /// Creates an executor with no tasks.
    pub(crate) fn new(config: Config) -> Self {
        Self {
            tasks: RefCell::new(Slab::new(config.task_capacity)),
            ready: Arc::new(ReadyQueue::new()),
            timers: RefCell::new(TimerQueue::new()),
            config,
            ticks: Cell::new(0),
        }
    }

    /// Stores `future` as a new task and schedules its first poll.
    pub(crate) fn spawn(&self, future: Pin<Box<dyn Future<Output = ()>>>) -> SlotId {
        let mut scheduled = None;

        let id = self.tasks.borrow_mut().insert_with(|id| {
            let notifier = Arc::new(Notifier::new(Target::Task(id), self.ready.clone()));
            scheduled = Some(notifier.clone());

            LocalTask {
                future: Some(future),
                notifier,
            }
        });

        if let Some(notifier) = scheduled {
            notifier.wake();
        }

        tracing::trace!(task = id.index(), "task spawned");
        id
    }

    /// Registers a timer that wakes `waker` at `deadline`.
    pub(crate) fn register_timer(&self, deadline: Instant, waker: Waker, cancelled: Rc<Cell<bool>>) {
        self.timers.borrow_mut().insert(deadline, waker, cancelled);
    }

    /// Runs `future` to completion on the current thread, driving every
    /// spawned task alongside it.
    ///
    /// The loop performs the following steps:
    /// 1. Poll woken targets in FIFO order, checking timers every
    ///    `event_interval` polls
    /// 2. Fire expired timers
    /// 3. Park until the next timer deadline or an external wake-up
    pub(crate) fn block_on<F: Future>(self: &Rc<Self>, future: F) -> F::Output {
        enter_context(self.clone(), || {
            let root = Arc::new(Notifier::new(Target::Root, self.ready.clone()));
            let waker = make_waker(root.clone());
            let mut cx = Context::from_waker(&waker);
            let mut future = pin!(future);

            root.wake();

            loop {
                while let Some(target) = self.ready.pop() {
                    match target {
                        Target::Root => {
                            if !root.begin_poll() {
                                continue;
                            }

                            if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                                root.complete();
                                return output;
                            }

                            root.end_poll();
                        }
                        Target::Task(id) => self.run_task(id),
                    }

                    let ticks = self.ticks.get().wrapping_add(1);
                    self.ticks.set(ticks);

                    if ticks % self.config.event_interval == 0 {
                        self.fire_timers();
                    }
                }

                self.fire_timers();

                if self.ready.is_empty() {
                    self.park();
                }
            }
        })
    }

    /// Polls a single spawned task.
    fn run_task(&self, id: SlotId) {
        let taken = self
            .tasks
            .borrow_mut()
            .get_mut(id)
            .and_then(|task| Some((task.future.take()?, task.notifier.clone())));

        // Stale wake-up for a task that already completed.
        let Some((mut future, notifier)) = taken else {
            return;
        };

        if !notifier.begin_poll() {
            self.put_back(id, future);
            return;
        }

        let waker = make_waker(notifier.clone());
        let mut cx = Context::from_waker(&waker);

        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                notifier.complete();
                let finished = self.tasks.borrow_mut().remove(id);
                drop(finished);

                tracing::trace!(task = id.index(), "task completed");
            }
            Poll::Pending => {
                self.put_back(id, future);
                notifier.end_poll();
            }
        }
    }

    /// Returns a future to its arena slot after a poll.
    fn put_back(&self, id: SlotId, future: Pin<Box<dyn Future<Output = ()>>>) {
        if let Some(task) = self.tasks.borrow_mut().get_mut(id) {
            task.future = Some(future);
        }
    }

    /// Wakes every timer whose deadline has passed.
    fn fire_timers(&self) {
        let fired = self.timers.borrow_mut().expire(Instant::now());

        for waker in fired {
            waker.wake();
        }
    }

    /// Parks until the next timer deadline, bounded by `park_timeout`.
    fn park(&self) {
        let timeout = match self.timers.borrow_mut().next_deadline() {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(self.config.park_timeout),
            None => self.config.park_timeout,
        };

        if !timeout.is_zero() {
            self.ready.park(timeout);
        }
    }

    /// Drops every unfinished task.
    ///
    /// Task destructors run inside the runtime context, so anything they
    /// spawn lands in the arena and is dropped on the next round.
    pub(crate) fn shutdown(self: &Rc<Self>) {
        enter_context(self.clone(), || {
            loop {
                let tasks = mem::replace(&mut *self.tasks.borrow_mut(), Slab::new(0));

                if tasks.is_empty() {
                    break;
                }

                tracing::debug!(pending = tasks.len(), "dropping unfinished tasks");
                drop(tasks);
            }

            let timers = self.timers.borrow().len();
            if timers > 0 {
                tracing::debug!(timers, "discarding pending timers");
            }
            *self.timers.borrow_mut() = TimerQueue::new();
        });
    }
}
