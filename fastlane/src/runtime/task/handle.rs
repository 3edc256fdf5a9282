use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Result slot shared between a task and its [`JoinHandle`].
struct JoinState<T> {
    /// Output of the task, until the handle takes it.
    output: Option<T>,

    /// Whether the task has completed.
    finished: bool,

    /// Waker of the task awaiting the handle.
    waker: Option<Waker>,
}

/// Write side of a [`JoinHandle`], owned by the spawned task.
pub(crate) struct Completion<T> {
    state: Rc<RefCell<JoinState<T>>>,
}

impl<T> Completion<T> {
    /// Stores the task output and wakes whoever awaits the handle.
    pub(crate) fn complete(self, output: T) {
        let waker = {
            let mut state = self.state.borrow_mut();
            state.output = Some(output);
            state.finished = true;
            state.waker.take()
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// A handle to a spawned task.
///
/// A `JoinHandle` allows awaiting the result of a task spawned onto the
/// runtime. It implements [`Future`] and resolves once the task has
/// completed.
///
/// Dropping the `JoinHandle` does **not** cancel the task; it only discards
/// the ability to observe its result.
pub struct JoinHandle<T> {
    state: Rc<RefCell<JoinState<T>>>,
}

impl<T> JoinHandle<T> {
    /// Creates a handle and the completion its task will resolve.
    pub(crate) fn pair() -> (Self, Completion<T>) {
        let state = Rc::new(RefCell::new(JoinState {
            output: None,
            finished: false,
            waker: None,
        }));

        let completion = Completion {
            state: state.clone(),
        };

        (Self { state }, completion)
    }

    /// Returns `true` once the task has produced its output.
    pub fn is_finished(&self) -> bool {
        self.state.borrow().finished
    }
}

impl<T> Future for JoinHandle<T> {
    /// The output of the spawned task.
    type Output = T;

    /// If the task has already completed, its result is returned
    /// immediately. Otherwise the current waker is registered.
    ///
    /// # Panics
    ///
    /// Panics if polled again after returning the output.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut state = self.state.borrow_mut();

        if let Some(output) = state.output.take() {
            return Poll::Ready(output);
        }

        assert!(!state.finished, "JoinHandle polled after completion");

        match &mut state.waker {
            Some(waker) if waker.will_wake(cx.waker()) => {}
            slot => *slot = Some(cx.waker().clone()),
        }

        Poll::Pending
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}
