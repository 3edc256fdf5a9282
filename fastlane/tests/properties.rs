//! Randomized interleavings of ordinary and VIP requests.
//!
//! Each request waits a random number of scheduler turns before calling
//! `lock`, waits again before awaiting the returned future, then holds the
//! mutex for a random number of turns.

use fastlane::sync::{Lane, Mutex, PriorityMutex};
use fastlane::{RuntimeBuilder, task, yield_now};
use proptest::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy)]
struct Request {
    vip: bool,
    delay: usize,
    /// Turns between making the request and first awaiting it.
    await_delay: usize,
    hold: usize,
}

fn arb_request() -> impl Strategy<Value = Request> {
    (any::<bool>(), 0usize..4, 0usize..4, 0usize..3).prop_map(|(vip, delay, await_delay, hold)| {
        Request {
            vip,
            delay,
            await_delay,
            hold,
        }
    })
}

#[derive(Default)]
struct Outcome {
    /// Request indices in the order `lock` was called.
    called: Vec<usize>,
    /// Request indices in the order they entered the critical section.
    entered: Vec<usize>,
    /// Most requests ever inside the critical section at once.
    peak: usize,
    /// One entry per release from the ordinary lane: how many requests had
    /// entered by then, and the VIP requests already made but not entered.
    ordinary_releases: Vec<(usize, Vec<usize>)>,
}

async fn turns(n: usize) {
    for _ in 0..n {
        yield_now().await;
    }
}

fn run_priority(requests: &[Request]) -> Outcome {
    let runtime = RuntimeBuilder::new().build();
    let mutex = Rc::new(PriorityMutex::new());
    let outcome = Rc::new(RefCell::new(Outcome::default()));
    let inside = Rc::new(Cell::new(0usize));
    let vips: Rc<[bool]> = requests.iter().map(|request| request.vip).collect();

    runtime.block_on(async {
        let handles: Vec<_> = requests
            .iter()
            .copied()
            .enumerate()
            .map(|(i, request)| {
                let (mutex, outcome, inside) = (mutex.clone(), outcome.clone(), inside.clone());
                let vips = vips.clone();

                task::spawn(async move {
                    turns(request.delay).await;

                    let lock = mutex.lock_with(request.vip);
                    outcome.borrow_mut().called.push(i);

                    turns(request.await_delay).await;
                    let mut key = lock.await;

                    inside.set(inside.get() + 1);
                    {
                        let mut outcome = outcome.borrow_mut();
                        outcome.entered.push(i);
                        outcome.peak = outcome.peak.max(inside.get());
                    }

                    turns(request.hold).await;
                    inside.set(inside.get() - 1);

                    if key.lane() == Lane::Ordinary {
                        let mut outcome = outcome.borrow_mut();
                        let pending: Vec<usize> = outcome
                            .called
                            .iter()
                            .copied()
                            .filter(|&j| j != i && vips[j] && !outcome.entered.contains(&j))
                            .collect();
                        let position = outcome.entered.len();
                        outcome.ordinary_releases.push((position, pending));
                    }

                    key.release().await;
                })
            })
            .collect();

        for handle in handles {
            handle.await;
        }
    });

    assert!(!mutex.is_locked());
    Rc::try_unwrap(outcome)
        .map(RefCell::into_inner)
        .unwrap_or_default()
}

fn lane(order: &[usize], requests: &[Request], vip: bool) -> Vec<usize> {
    order
        .iter()
        .copied()
        .filter(|&i| requests[i].vip == vip)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Never two requests in the critical section, and every request gets in.
    #[test]
    fn priority_mutex_excludes(requests in prop::collection::vec(arb_request(), 1..12)) {
        let outcome = run_priority(&requests);

        prop_assert_eq!(outcome.peak, 1);
        prop_assert_eq!(outcome.entered.len(), requests.len());
    }

    /// Within each lane, requests enter in the order they called `lock`.
    #[test]
    fn priority_mutex_lanes_are_fifo(requests in prop::collection::vec(arb_request(), 1..12)) {
        let outcome = run_priority(&requests);

        prop_assert_eq!(
            lane(&outcome.entered, &requests, false),
            lane(&outcome.called, &requests, false)
        );
        prop_assert_eq!(
            lane(&outcome.entered, &requests, true),
            lane(&outcome.called, &requests, true)
        );
    }

    /// VIP requests waiting when an ordinary holder releases all get in
    /// before the next ordinary request does.
    #[test]
    fn priority_mutex_waiting_vips_precede_next_ordinary(
        requests in prop::collection::vec(arb_request(), 1..12)
    ) {
        let outcome = run_priority(&requests);

        for (position, pending) in &outcome.ordinary_releases {
            let after = &outcome.entered[*position..];
            let next_ordinary = after
                .iter()
                .position(|&j| !requests[j].vip)
                .unwrap_or(after.len());

            for vip in pending {
                prop_assert!(
                    after[..next_ordinary].contains(vip),
                    "vip {} waiting at release {:?} entered after ordinary: {:?}",
                    vip,
                    position,
                    outcome.entered
                );
            }
        }
    }

    /// The plain mutex admits strictly in call order.
    #[test]
    fn mutex_is_fifo(requests in prop::collection::vec(arb_request(), 1..12)) {
        let runtime = RuntimeBuilder::new().build();
        let mutex = Rc::new(Mutex::new());
        let called = Rc::new(RefCell::new(Vec::new()));
        let entered = Rc::new(RefCell::new(Vec::new()));

        runtime.block_on(async {
            let handles: Vec<_> = requests
                .iter()
                .copied()
                .enumerate()
                .map(|(i, request)| {
                    let (mutex, called, entered) = (mutex.clone(), called.clone(), entered.clone());

                    task::spawn(async move {
                        turns(request.delay).await;

                        let acquire = mutex.acquire();
                        called.borrow_mut().push(i);

                        turns(request.await_delay).await;
                        let key = acquire.await;

                        entered.borrow_mut().push(i);
                        turns(request.hold).await;
                        key.release();
                    })
                })
                .collect();

            for handle in handles {
                handle.await;
            }
        });

        let entered = entered.borrow().clone();
        let called = called.borrow().clone();
        prop_assert_eq!(entered, called);
    }
}
