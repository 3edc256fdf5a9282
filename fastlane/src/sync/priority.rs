use super::chain::{Chain, Phase, TicketId};
use super::mutex::Mutex;
use crate::runtime::task::{self, JoinHandle};

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Which line a [`PriorityMutex`] request joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// First-come, first-served line.
    Ordinary,

    /// Fast lane, served ahead of queued ordinary requests.
    Vip,
}

/// An asynchronous mutex with a priority (VIP) lane.
///
/// Ordinary requests are served in arrival order. VIP requests are served
/// in arrival order among themselves, but whenever one is waiting when an
/// ordinary holder releases, every waiting VIP request (including those that
/// show up while the hand-off is in progress) gets its turn before the next
/// ordinary request.
///
/// A VIP request arriving at an idle mutex has nobody to overtake and joins
/// the ordinary line. The lane is picked when the request is made, whether
/// or not the returned future is ever polled.
///
/// Releasing from the ordinary lane is asynchronous: it waits until every
/// admitted VIP has released. The hand-off runs as its own task, so it
/// completes even if the releasing caller goes away.
///
/// # Examples
///
/// ```rust
/// use fastlane::sync::PriorityMutex;
///
/// let runtime = fastlane::RuntimeBuilder::new().build();
/// let mutex = PriorityMutex::new();
///
/// runtime.block_on(async {
///     let total = mutex.run_vip(|| async { 40 + 2 }).await;
///     assert_eq!(total, 42);
/// });
/// ```
pub struct PriorityMutex {
    inner: Rc<Inner>,
}

struct Inner {
    /// Held by the release-time drain. VIP requests made while it is held
    /// wait in `late`.
    guard: Mutex,

    lanes: RefCell<Lanes>,
}

struct Lanes {
    /// Always open. Its length is the number of ordinary requests queued
    /// or holding.
    ordinary: Chain,

    /// Closed except while an ordinary holder is draining it.
    vip: Chain,

    /// Never opened. Holds VIP requests made while a drain owns the guard,
    /// until that drain moves them into `vip`.
    late: Chain,

    /// Where each moved `late` ticket landed in `vip`, until its `Lock`
    /// picks up the new id.
    moved: HashMap<TicketId, TicketId>,

    /// Number of drains started so far.
    episodes: u64,
}

impl Lanes {
    fn chain(&mut self, lane: Lane) -> &mut Chain {
        match lane {
            Lane::Ordinary => &mut self.ordinary,
            Lane::Vip => &mut self.vip,
        }
    }
}

impl PriorityMutex {
    /// Creates a new, unlocked mutex.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                guard: Mutex::new(),
                lanes: RefCell::new(Lanes {
                    ordinary: Chain::new(true),
                    vip: Chain::new(false),
                    late: Chain::new(false),
                    moved: HashMap::new(),
                    episodes: 0,
                }),
            }),
        }
    }

    /// Joins the ordinary line.
    pub fn lock(&self) -> Lock<'_> {
        self.lock_with(false)
    }

    /// Requests the VIP lane.
    pub fn lock_vip(&self) -> Lock<'_> {
        self.lock_with(true)
    }

    /// Requests the VIP lane when `priority` is set, the ordinary line
    /// otherwise.
    ///
    /// The request is registered immediately. A VIP request picks its lane
    /// on the spot, unless an ordinary release is draining the VIP lane: it
    /// then waits aside and joins the VIP lane as soon as that drain
    /// unwinds, ahead of the next ordinary request.
    pub fn lock_with(&self, priority: bool) -> Lock<'_> {
        let mut lanes = self.inner.lanes.borrow_mut();

        let state = if !priority {
            State::Queued {
                lane: Lane::Ordinary,
                ticket: lanes.ordinary.push(),
            }
        } else if self.inner.guard.is_locked() {
            let ticket = lanes.late.push();
            tracing::trace!(ticket = ticket.index(), "vip request arrived during drain");

            State::Late { ticket }
        } else {
            let lane = if lanes.ordinary.is_empty() {
                Lane::Ordinary
            } else {
                Lane::Vip
            };

            let ticket = lanes.chain(lane).push();
            tracing::trace!(ticket = ticket.index(), ?lane, "vip request joined lane");

            State::Queued { lane, ticket }
        };

        Lock { mutex: self, state }
    }

    /// Runs `task` as an ordinary request.
    ///
    /// See [`run_with`](Self::run_with).
    pub fn run<'a, F, Fut>(&'a self, task: F) -> impl Future<Output = Fut::Output> + 'a
    where
        F: FnOnce() -> Fut + 'a,
        Fut: Future + 'a,
    {
        self.run_with(false, task)
    }

    /// Runs `task` as a VIP request.
    ///
    /// See [`run_with`](Self::run_with).
    pub fn run_vip<'a, F, Fut>(&'a self, task: F) -> impl Future<Output = Fut::Output> + 'a
    where
        F: FnOnce() -> Fut + 'a,
        Fut: Future + 'a,
    {
        self.run_with(true, task)
    }

    /// Runs `task` inside the critical section and passes its output
    /// through unchanged.
    ///
    /// The request is registered immediately. After the task returns, the
    /// returned future also waits for the release hand-off to finish. If the
    /// task panics, or the future is dropped, the release still happens in
    /// the background.
    pub fn run_with<'a, F, Fut>(
        &'a self,
        priority: bool,
        task: F,
    ) -> impl Future<Output = Fut::Output> + 'a
    where
        F: FnOnce() -> Fut + 'a,
        Fut: Future + 'a,
    {
        let lock = self.lock_with(priority);

        async move {
            let mut key = lock.await;
            let output = task().await;

            key.release().await;
            output
        }
    }

    /// Returns `true` if a request holds the mutex in either lane.
    pub fn is_locked(&self) -> bool {
        let lanes = self.inner.lanes.borrow();
        lanes.ordinary.holder().is_some() || lanes.vip.holder().is_some()
    }

    /// Number of ordinary requests queued or holding.
    pub fn ordinary_waiters(&self) -> usize {
        self.inner.lanes.borrow().ordinary.len()
    }

    /// Number of VIP requests in the VIP lane, queued or holding, including
    /// those waiting for the current drain to take them in.
    pub fn vip_waiters(&self) -> usize {
        let lanes = self.inner.lanes.borrow();
        lanes.vip.len() + lanes.late.len()
    }

    /// Returns `true` while an ordinary release is draining the VIP lane.
    pub fn is_draining(&self) -> bool {
        self.inner.lanes.borrow().vip.is_open()
    }
}

impl Default for PriorityMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PriorityMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lanes = self.inner.lanes.borrow();

        f.debug_struct("PriorityMutex")
            .field("ordinary", &lanes.ordinary.len())
            .field("vip", &lanes.vip.len())
            .field("late", &lanes.late.len())
            .field("draining", &lanes.vip.is_open())
            .finish()
    }
}

#[derive(Clone, Copy)]
enum State {
    /// VIP request made during a drain, not yet moved into the VIP lane.
    Late { ticket: TicketId },

    /// In line, waiting to be admitted.
    Queued { lane: Lane, ticket: TicketId },

    Done,
}

/// Future returned by [`PriorityMutex::lock`] and its variants.
///
/// Dropping it before it resolves withdraws the request.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Lock<'a> {
    mutex: &'a PriorityMutex,
    state: State,
}

impl<'a> Future for Lock<'a> {
    type Output = PriorityKey<'a>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mutex = this.mutex;
        let inner = &mutex.inner;

        loop {
            match this.state {
                State::Late { ticket } => {
                    let mut lanes = inner.lanes.borrow_mut();

                    if let Some(moved) = lanes.moved.remove(&ticket) {
                        this.state = State::Queued {
                            lane: Lane::Vip,
                            ticket: moved,
                        };
                        continue;
                    }

                    // The late chain never opens; this only stores the waker,
                    // which moves along with the ticket.
                    let _ = lanes.late.poll_admitted(ticket, cx);
                    return Poll::Pending;
                }
                State::Queued { lane, ticket } => {
                    match inner.lanes.borrow_mut().chain(lane).poll_admitted(ticket, cx) {
                        Poll::Ready(()) => {}
                        Poll::Pending => return Poll::Pending,
                    }

                    this.state = State::Done;

                    return Poll::Ready(PriorityKey {
                        mutex,
                        lane,
                        ticket,
                        released: false,
                    });
                }
                State::Done => panic!("Lock polled after completion"),
            }
        }
    }
}

impl Drop for Lock<'_> {
    fn drop(&mut self) {
        let inner = &self.mutex.inner;

        let (lane, ticket) = match std::mem::replace(&mut self.state, State::Done) {
            State::Late { ticket } => {
                let mut lanes = inner.lanes.borrow_mut();

                match lanes.moved.remove(&ticket) {
                    Some(moved) => (Lane::Vip, moved),
                    None => {
                        lanes.late.withdraw(ticket);
                        tracing::trace!(ticket = ticket.index(), "late vip request withdrawn");
                        return;
                    }
                }
            }
            State::Queued { lane, ticket } => (lane, ticket),
            State::Done => return,
        };

        let phase = inner.lanes.borrow_mut().chain(lane).phase(ticket);

        if lane == Lane::Ordinary && phase == Some(Phase::Holding) {
            // Already admitted: hand over the same way a key would.
            if let Release {
                state: ReleaseState::Inline(_),
            } = start_hand_off(inner.clone(), ticket)
            {
                tracing::error!(
                    ticket = ticket.index(),
                    "no runtime to hand off a dropped lock, the mutex stays locked"
                );
            }
            return;
        }

        inner.lanes.borrow_mut().chain(lane).withdraw(ticket);
        tracing::trace!(ticket = ticket.index(), ?lane, "pending lock withdrawn");
    }
}

impl fmt::Debug for Lock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Late { .. } => "late",
            State::Queued { .. } => "queued",
            State::Done => "done",
        };

        f.debug_struct("Lock").field("state", &state).finish()
    }
}

/// Proof of holding a [`PriorityMutex`].
///
/// Release it with [`release`](Self::release). Dropping an unreleased key
/// starts the release in the background, which requires a running runtime
/// for keys from the ordinary lane.
pub struct PriorityKey<'a> {
    mutex: &'a PriorityMutex,
    lane: Lane,
    ticket: TicketId,
    released: bool,
}

impl PriorityKey<'_> {
    /// The lane this request was admitted from.
    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// Leaves the critical section.
    ///
    /// From the VIP lane, the next VIP request is admitted right away. From
    /// the ordinary lane, every VIP request is served first; the returned
    /// future resolves once the next ordinary request has been admitted.
    /// The hand-off proceeds even if the future is dropped, provided a
    /// runtime is running.
    ///
    /// Only the first call has an effect; later calls return a future that
    /// is already complete.
    pub fn release(&mut self) -> Release {
        if std::mem::replace(&mut self.released, true) {
            return Release::done();
        }

        let inner = &self.mutex.inner;

        match self.lane {
            Lane::Vip => {
                inner.lanes.borrow_mut().vip.release(self.ticket);
                Release::done()
            }
            Lane::Ordinary => start_hand_off(inner.clone(), self.ticket),
        }
    }
}

impl Drop for PriorityKey<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        if let Release {
            state: ReleaseState::Inline(_),
        } = self.release()
        {
            tracing::error!(
                ticket = self.ticket.index(),
                "no runtime to release a dropped priority key, the mutex stays locked"
            );
        }
    }
}

impl fmt::Debug for PriorityKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityKey")
            .field("lane", &self.lane)
            .field("released", &self.released)
            .finish()
    }
}

enum ReleaseState {
    Done,

    /// Hand-off running as its own task.
    Detached(JoinHandle<()>),

    /// Hand-off driven by whoever polls the release, when no runtime was
    /// available to spawn it.
    Inline(Pin<Box<dyn Future<Output = ()>>>),
}

/// Future returned by [`PriorityKey::release`].
pub struct Release {
    state: ReleaseState,
}

impl Release {
    fn done() -> Self {
        Self {
            state: ReleaseState::Done,
        }
    }
}

impl Future for Release {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        let ready = match &mut this.state {
            ReleaseState::Done => true,
            ReleaseState::Detached(handle) => Pin::new(handle).poll(cx).is_ready(),
            ReleaseState::Inline(future) => future.as_mut().poll(cx).is_ready(),
        };

        if !ready {
            return Poll::Pending;
        }

        this.state = ReleaseState::Done;
        Poll::Ready(())
    }
}

impl fmt::Debug for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            ReleaseState::Done => "done",
            ReleaseState::Detached(_) => "detached",
            ReleaseState::Inline(_) => "inline",
        };

        f.debug_struct("Release").field("state", &state).finish()
    }
}

fn start_hand_off(inner: Rc<Inner>, ticket: TicketId) -> Release {
    let state = match task::try_spawn(hand_off(inner.clone(), ticket)) {
        Ok(handle) => ReleaseState::Detached(handle),
        Err(_) => ReleaseState::Inline(Box::pin(hand_off(inner, ticket))),
    };

    Release { state }
}

/// Release sequence of an ordinary holder.
///
/// Holds the guard for the whole sequence. Drains the VIP lane, then moves
/// in the VIP requests made during the drain and drains again, until a
/// drain ends with none. Only then is the next ordinary request admitted.
async fn hand_off(inner: Rc<Inner>, ticket: TicketId) {
    let guard = inner.guard.acquire().await;

    loop {
        let episode = {
            let mut lanes = inner.lanes.borrow_mut();
            lanes.episodes += 1;

            tracing::debug!(
                episode = lanes.episodes,
                queued = lanes.vip.len(),
                "draining vip lane"
            );

            lanes.vip.open();
            lanes.episodes
        };

        poll_fn(|cx| inner.lanes.borrow_mut().vip.poll_unwound(cx)).await;

        let late = {
            let mut lanes = inner.lanes.borrow_mut();
            let Lanes {
                vip, late, moved, ..
            } = &mut *lanes;

            vip.close();

            let transferred = late.transfer_to(vip);
            let count = transferred.len();
            moved.extend(transferred);
            count
        };

        tracing::debug!(episode, "vip lane unwound");

        if late == 0 {
            break;
        }

        tracing::debug!(episode, late, "vip requests arrived during drain, draining again");
    }

    inner.lanes.borrow_mut().ordinary.release(ticket);
    guard.release();
}
