use super::chain::{Chain, Phase, TicketId};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// An asynchronous mutex for tasks sharing one thread.
///
/// `Mutex` guards a critical section rather than a value: callers receive a
/// [`Key`] once it is their turn and give it back to let the next caller in.
/// Tasks that cannot enter are suspended and woken when their turn comes;
/// the thread itself never blocks.
///
/// Admission is strictly first-come, first-served. A caller takes its place
/// when it calls [`acquire`](Self::acquire), not when it first polls the
/// returned future.
///
/// # Examples
///
/// ```rust
/// use fastlane::sync::Mutex;
///
/// let runtime = fastlane::RuntimeBuilder::new().build();
/// let mutex = Mutex::new();
///
/// runtime.block_on(async {
///     let key = mutex.acquire().await;
///     assert!(mutex.is_locked());
///     key.release();
///     assert!(!mutex.is_locked());
/// });
/// ```
pub struct Mutex {
    chain: RefCell<Chain>,
}

impl Mutex {
    /// Creates a new, unlocked mutex.
    pub fn new() -> Self {
        Self {
            chain: RefCell::new(Chain::new(true)),
        }
    }

    /// Takes a place in line and returns a future resolving to the key once
    /// every earlier caller has released.
    ///
    /// Dropping the future before it resolves gives the place up.
    pub fn acquire(&self) -> Acquire<'_> {
        let ticket = self.chain.borrow_mut().push();

        Acquire {
            mutex: self,
            ticket: Some(ticket),
        }
    }

    /// Runs `task` inside the critical section.
    ///
    /// The place in line is taken immediately. The key is released however
    /// the task ends: normal return, error value, panic, or the returned
    /// future being dropped. The task's output is passed through unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fastlane::sync::Mutex;
    ///
    /// let runtime = fastlane::RuntimeBuilder::new().build();
    /// let mutex = Mutex::new();
    ///
    /// let doubled = runtime.block_on(mutex.run(|| async { 21 * 2 }));
    /// assert_eq!(doubled, 42);
    /// ```
    pub fn run<'a, F, Fut>(&'a self, task: F) -> impl Future<Output = Fut::Output> + 'a
    where
        F: FnOnce() -> Fut + 'a,
        Fut: Future + 'a,
    {
        let acquire = self.acquire();

        async move {
            let _key = acquire.await;
            task().await
        }
    }

    /// Returns `true` if some caller currently holds the key.
    pub fn is_locked(&self) -> bool {
        self.chain.borrow().holder().is_some()
    }

    /// Number of callers waiting for their turn, the holder excluded.
    pub fn waiters(&self) -> usize {
        let chain = self.chain.borrow();
        chain.len() - usize::from(chain.holder().is_some())
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("locked", &self.is_locked())
            .field("waiters", &self.waiters())
            .finish()
    }
}

/// Future returned by [`Mutex::acquire`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Acquire<'a> {
    mutex: &'a Mutex,
    ticket: Option<TicketId>,
}

impl<'a> Future for Acquire<'a> {
    type Output = Key<'a>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(ticket) = self.ticket else {
            panic!("Acquire polled after completion");
        };

        match self.mutex.chain.borrow_mut().poll_admitted(ticket, cx) {
            Poll::Ready(()) => {}
            Poll::Pending => return Poll::Pending,
        }

        self.ticket = None;

        Poll::Ready(Key {
            mutex: self.mutex,
            ticket,
            released: Cell::new(false),
        })
    }
}

impl Drop for Acquire<'_> {
    /// Gives up the place in line. A ticket that was already admitted is
    /// released so later callers are not stranded.
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };

        let phase = self.mutex.chain.borrow_mut().withdraw(ticket);

        if phase == Some(Phase::Holding) {
            tracing::trace!(ticket = ticket.index(), "admitted acquire dropped, released");
        } else {
            tracing::trace!(ticket = ticket.index(), "pending acquire withdrawn");
        }
    }
}

impl fmt::Debug for Acquire<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acquire")
            .field("done", &self.ticket.is_none())
            .finish()
    }
}

/// Proof of holding a [`Mutex`].
///
/// Dropping the key releases it.
pub struct Key<'a> {
    mutex: &'a Mutex,
    ticket: TicketId,
    released: Cell<bool>,
}

impl Key<'_> {
    /// Leaves the critical section and admits the next caller in line.
    ///
    /// Only the first call has an effect.
    pub fn release(&self) {
        if self.released.replace(true) {
            return;
        }

        self.mutex.chain.borrow_mut().release(self.ticket);
    }
}

impl Drop for Key<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("released", &self.released.get())
            .finish()
    }
}
