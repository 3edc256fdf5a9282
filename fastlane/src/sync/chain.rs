//! FIFO admission chain shared by both mutex flavours.
//!
//! A chain is an ordered list of tickets. The head ticket is admitted
//! (moves from [`Phase::Queued`] to [`Phase::Holding`]) as soon as the chain
//! is open; removing the holder admits the next ticket. A closed chain keeps
//! its head queued until someone opens it.

use crate::utils::{Slab, SlotId};

use std::collections::VecDeque;
use std::task::{Context, Poll, Waker};

/// Identifier of a ticket inside its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TicketId(SlotId);

impl TicketId {
    pub(crate) fn index(&self) -> usize {
        self.0.index()
    }
}

/// Where a ticket stands in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Queued,
    Holding,
}

struct Ticket {
    phase: Phase,
    waker: Option<Waker>,
}

pub(crate) struct Chain {
    tickets: Slab<Ticket>,

    /// Ticket ids in arrival order. The front is the head.
    order: VecDeque<TicketId>,

    /// Head sentinel. While `false` the head ticket is not admitted.
    open: bool,

    /// Waker of the task waiting for the chain to become empty.
    unwound: Option<Waker>,
}

impl Chain {
    pub(crate) fn new(open: bool) -> Self {
        Self {
            tickets: Slab::new(4),
            order: VecDeque::new(),
            open,
            unwound: None,
        }
    }

    /// Number of tickets, queued or holding.
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    /// The ticket currently holding, if any.
    pub(crate) fn holder(&self) -> Option<TicketId> {
        let head = *self.order.front()?;

        (self.phase(head) == Some(Phase::Holding)).then_some(head)
    }

    pub(crate) fn phase(&self, id: TicketId) -> Option<Phase> {
        self.tickets.get(id.0).map(|ticket| ticket.phase)
    }

    /// Appends a ticket at the tail. It is admitted at once if it lands at
    /// the head of an open chain.
    pub(crate) fn push(&mut self) -> TicketId {
        let id = TicketId(self.tickets.insert(Ticket {
            phase: Phase::Queued,
            waker: None,
        }));

        self.order.push_back(id);
        tracing::trace!(ticket = id.index(), position = self.order.len() - 1, "ticket enqueued");

        self.admit_head();
        id
    }

    /// Resolves once `id` is holding.
    ///
    /// # Panics
    ///
    /// Panics if `id` already left the chain.
    pub(crate) fn poll_admitted(&mut self, id: TicketId, cx: &mut Context<'_>) -> Poll<()> {
        let Some(ticket) = self.tickets.get_mut(id.0) else {
            panic!("ticket {} polled after leaving its chain", id.index());
        };

        match ticket.phase {
            Phase::Holding => Poll::Ready(()),
            Phase::Queued => {
                match &mut ticket.waker {
                    Some(waker) if waker.will_wake(cx.waker()) => {}
                    slot => *slot = Some(cx.waker().clone()),
                }
                Poll::Pending
            }
        }
    }

    /// Removes the holding ticket `id` and admits the next one.
    ///
    /// Returns `false` if `id` is no longer in the chain.
    pub(crate) fn release(&mut self, id: TicketId) -> bool {
        match self.withdraw(id) {
            Some(phase) => {
                debug_assert_eq!(phase, Phase::Holding, "released a ticket that never held");
                tracing::trace!(ticket = id.index(), "ticket released");
                true
            }
            None => false,
        }
    }

    /// Removes `id` wherever it stands and returns the phase it had.
    ///
    /// Removing the head admits the next ticket when the chain is open.
    pub(crate) fn withdraw(&mut self, id: TicketId) -> Option<Phase> {
        let ticket = self.tickets.remove(id.0)?;
        let position = self.order.iter().position(|queued| *queued == id)?;

        self.order.remove(position);

        if position == 0 {
            self.admit_head();
        }

        if self.order.is_empty() {
            if let Some(waker) = self.unwound.take() {
                waker.wake();
            }
        }

        Some(ticket.phase)
    }

    /// Moves every ticket, in order, to the tail of `into`, carrying their
    /// wakers along. Returns the old and new id of each moved ticket.
    pub(crate) fn transfer_to(&mut self, into: &mut Chain) -> Vec<(TicketId, TicketId)> {
        let mut moved = Vec::with_capacity(self.order.len());

        while let Some(old) = self.order.pop_front() {
            let Some(ticket) = self.tickets.remove(old.0) else {
                continue;
            };

            let new = into.push();

            if let Some(waker) = ticket.waker {
                into.attach(new, waker);
            }

            tracing::trace!(from = old.index(), to = new.index(), "ticket transferred");
            moved.push((old, new));
        }

        if let Some(waker) = self.unwound.take() {
            waker.wake();
        }

        moved
    }

    /// Lifts the head sentinel, admitting the head ticket.
    pub(crate) fn open(&mut self) {
        self.open = true;
        self.admit_head();
    }

    /// Re-arms the head sentinel. Later tickets stay queued until the next
    /// [`open`](Self::open).
    pub(crate) fn close(&mut self) {
        debug_assert!(self.holder().is_none(), "closed a chain with a holder");
        self.open = false;
    }

    /// Resolves once every ticket has left the chain.
    pub(crate) fn poll_unwound(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        if self.order.is_empty() {
            return Poll::Ready(());
        }

        self.unwound = Some(cx.waker().clone());
        Poll::Pending
    }

    /// Hands `waker` to ticket `id`, waking it at once if it already holds.
    fn attach(&mut self, id: TicketId, waker: Waker) {
        let Some(ticket) = self.tickets.get_mut(id.0) else {
            return;
        };

        match ticket.phase {
            Phase::Holding => waker.wake(),
            Phase::Queued => ticket.waker = Some(waker),
        }
    }

    fn admit_head(&mut self) {
        if !self.open {
            return;
        }

        let Some(&head) = self.order.front() else {
            return;
        };

        let Some(ticket) = self.tickets.get_mut(head.0) else {
            return;
        };

        if ticket.phase == Phase::Holding {
            return;
        }

        ticket.phase = Phase::Holding;
        tracing::trace!(ticket = head.index(), "ticket admitted");

        if let Some(waker) = ticket.waker.take() {
            waker.wake();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::task::Waker;

    fn poll(chain: &mut Chain, id: TicketId) -> Poll<()> {
        let mut cx = Context::from_waker(Waker::noop());
        chain.poll_admitted(id, &mut cx)
    }

    #[test]
    fn open_chain_admits_in_arrival_order() {
        let mut chain = Chain::new(true);
        let a = chain.push();
        let b = chain.push();
        let c = chain.push();

        assert_eq!(chain.holder(), Some(a));
        assert_eq!(poll(&mut chain, b), Poll::Pending);

        assert!(chain.release(a));
        assert_eq!(chain.holder(), Some(b));
        assert_eq!(chain.phase(c), Some(Phase::Queued));

        assert!(chain.release(b));
        assert_eq!(poll(&mut chain, c), Poll::Ready(()));
    }

    #[test]
    fn closed_chain_waits_for_open() {
        let mut chain = Chain::new(false);
        let a = chain.push();

        assert_eq!(chain.holder(), None);
        assert_eq!(poll(&mut chain, a), Poll::Pending);

        chain.open();
        assert_eq!(chain.holder(), Some(a));
    }

    #[test]
    fn second_release_is_ignored() {
        let mut chain = Chain::new(true);
        let a = chain.push();
        let b = chain.push();

        assert!(chain.release(a));
        assert!(!chain.release(a));
        assert_eq!(chain.holder(), Some(b));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn withdrawing_a_queued_ticket_keeps_the_holder() {
        let mut chain = Chain::new(true);
        let a = chain.push();
        let b = chain.push();
        let c = chain.push();

        assert_eq!(chain.withdraw(b), Some(Phase::Queued));
        assert_eq!(chain.holder(), Some(a));

        chain.release(a);
        assert_eq!(chain.holder(), Some(c));
    }

    #[test]
    fn unwound_after_last_ticket_leaves() {
        let mut chain = Chain::new(false);
        let a = chain.push();
        let mut cx = Context::from_waker(Waker::noop());

        assert_eq!(chain.poll_unwound(&mut cx), Poll::Pending);

        chain.open();
        chain.release(a);
        assert_eq!(chain.poll_unwound(&mut cx), Poll::Ready(()));

        chain.close();
        assert!(!chain.is_open());
    }

    #[test]
    fn transfer_keeps_order_and_wakers() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::task::Wake;

        struct Count(AtomicUsize);

        impl Wake for Count {
            fn wake(self: Arc<Self>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let count = Arc::new(Count(AtomicUsize::new(0)));
        let waker = Waker::from(count.clone());
        let mut cx = Context::from_waker(&waker);

        let mut parked = Chain::new(false);
        let mut target = Chain::new(false);
        let a = parked.push();
        let b = parked.push();
        assert_eq!(parked.poll_admitted(a, &mut cx), Poll::Pending);

        let moved = parked.transfer_to(&mut target);

        assert!(parked.is_empty());
        assert_eq!(moved.len(), 2);
        assert_eq!(moved[0].0, a);
        assert_eq!(moved[1].0, b);
        assert_eq!(parked.phase(a), None);

        target.open();
        assert_eq!(target.holder(), Some(moved[0].1));
        assert_eq!(count.0.load(Ordering::SeqCst), 1, "carried waker fires on admission");
    }

    #[test]
    #[should_panic(expected = "polled after leaving its chain")]
    fn polling_a_released_ticket_panics() {
        let mut chain = Chain::new(true);
        let a = chain.push();
        chain.release(a);

        let _ = poll(&mut chain, a);
    }
}
