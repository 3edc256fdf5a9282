use crate::runtime::context;

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Creates a future that completes after the given duration.
///
/// The returned sleep future registers a timer with the current
/// runtime and completes once the duration has elapsed. Sleeps with the
/// same deadline complete in the order they were first polled.
///
/// # Panics
///
/// Panics if polled outside of a running runtime.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// let runtime = fastlane::RuntimeBuilder::new().build();
/// runtime.block_on(fastlane::time::sleep(Duration::from_millis(1)));
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration)
}

/// A future that completes once a specific deadline is reached.
///
/// `Sleep` registers a timer on first poll. The timer is cancelled if the
/// future is dropped before completion.
///
/// This future is **cancel-safe**: dropping it will prevent the timer
/// from waking the task.
#[derive(Debug)]
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Waker the current timer registration will wake.
    registered: Option<Waker>,

    /// Cancellation flag of the current registration.
    cancelled: Rc<Cell<bool>>,
}

impl Sleep {
    /// Creates a new `Sleep` future that completes after `duration`.
    ///
    /// The timer is not registered until the future is first polled.
    pub(crate) fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            registered: None,
            cancelled: Rc::new(Cell::new(false)),
        }
    }

    /// The instant at which this sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    /// On the first poll, the timer is registered with the runtime. If the
    /// future later moves to another task, the old registration is
    /// cancelled and a new one is made for the new waker.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        if this
            .registered
            .as_ref()
            .is_some_and(|waker| waker.will_wake(cx.waker()))
        {
            return Poll::Pending;
        }

        let Some(executor) = context::current() else {
            panic!("Sleep polled outside of runtime");
        };

        if this.registered.is_some() {
            this.cancelled.set(true);
            this.cancelled = Rc::new(Cell::new(false));
        }

        executor.register_timer(this.deadline, cx.waker().clone(), this.cancelled.clone());
        this.registered = Some(cx.waker().clone());

        Poll::Pending
    }
}

impl Drop for Sleep {
    /// Cancels the timer if the sleep future is dropped before completion.
    fn drop(&mut self) {
        self.cancelled.set(true);
    }
}
