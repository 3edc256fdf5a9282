mod common;

use common::Log;
use fastlane::sync::Mutex;
use fastlane::task;
use fastlane::time::{sleep, timeout};
use fastlane::yield_now;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[fastlane::test]
async fn test_mutex_admits_in_call_order() {
    common::init_test_logging();

    let mutex = Rc::new(Mutex::new());
    let log = Log::default();
    let key = mutex.acquire().await;

    let handles = ["a", "b", "c"].map(|name| {
        let (mutex, log) = (mutex.clone(), log.clone());
        task::spawn(async move {
            let _key = mutex.acquire().await;
            log.push(name);
            sleep(Duration::from_millis(1)).await;
        })
    });

    yield_now().await;
    assert!(mutex.is_locked());
    assert_eq!(mutex.waiters(), 3);

    key.release();

    for handle in handles {
        handle.await;
    }

    assert_eq!(log.entries(), ["a", "b", "c"]);
    assert!(!mutex.is_locked());
}

#[fastlane::test]
async fn test_mutex_place_taken_at_call_time() {
    let mutex = Mutex::new();

    let first = mutex.acquire();
    let mut second = mutex.acquire();

    assert!(mutex.is_locked());
    assert!(
        timeout(Duration::from_millis(5), &mut second).await.is_err(),
        "second caller must wait for the first"
    );

    drop(first);

    let key = timeout(Duration::from_millis(5), second).await;
    assert!(key.is_ok(), "dropping an admitted acquire must let the next in");
}

#[fastlane::test]
async fn test_mutex_excludes_across_await_points() {
    let mutex = Rc::new(Mutex::new());
    let inside = Rc::new(Cell::new(0));
    let peak = Rc::new(Cell::new(0));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let (mutex, inside, peak) = (mutex.clone(), inside.clone(), peak.clone());
            task::spawn(async move {
                mutex
                    .run(|| async {
                        inside.set(inside.get() + 1);
                        peak.set(peak.get().max(inside.get()));
                        sleep(Duration::from_millis(1)).await;
                        inside.set(inside.get() - 1);
                    })
                    .await;
            })
        })
        .collect();

    for handle in handles {
        handle.await;
    }

    assert_eq!(peak.get(), 1);
}

#[fastlane::test]
async fn test_mutex_release_is_idempotent() {
    let mutex = Mutex::new();
    let key = mutex.acquire().await;

    let a = mutex.acquire();
    let b = mutex.acquire();

    key.release();
    key.release();

    assert!(mutex.is_locked());
    assert_eq!(mutex.waiters(), 1, "second release must not admit another caller");

    let key_a = a.await;
    drop(key);
    assert_eq!(mutex.waiters(), 1);

    key_a.release();
    let _key_b = b.await;
    assert_eq!(mutex.waiters(), 0);
}

#[fastlane::test]
async fn test_mutex_run_passes_task_errors_through() {
    let mutex = Mutex::new();

    let failed: Result<(), &str> = mutex.run(|| async { Err("boom") }).await;
    assert_eq!(failed, Err("boom"));
    assert!(!mutex.is_locked());

    let ok = mutex.run(|| async { 7 }).await;
    assert_eq!(ok, 7);
}

#[fastlane::test]
async fn test_mutex_abandoned_run_releases() {
    let mutex = Mutex::new();

    let abandoned = timeout(
        Duration::from_millis(5),
        mutex.run(|| sleep(Duration::from_secs(5))),
    )
    .await;

    assert!(abandoned.is_err());
    assert!(!mutex.is_locked());
    assert_eq!(mutex.run(|| async { "next" }).await, "next");
}

#[fastlane::test]
async fn test_mutex_forgotten_key_stalls_later_callers() {
    let mutex = Mutex::new();

    std::mem::forget(mutex.acquire().await);

    let stalled = timeout(Duration::from_millis(20), mutex.acquire()).await;
    assert!(stalled.is_err());
    assert_eq!(mutex.waiters(), 0, "timed out caller withdrew");
}

#[fastlane::test]
async fn test_mutex_dropped_acquire_withdraws() {
    let mutex = Mutex::new();
    let key = mutex.acquire().await;

    let pending = mutex.acquire();
    let later = mutex.acquire();
    assert_eq!(mutex.waiters(), 2);

    drop(pending);
    assert_eq!(mutex.waiters(), 1);

    key.release();
    let admitted = timeout(Duration::from_millis(5), later).await;
    assert!(admitted.is_ok(), "withdrawn waiter must not block the next one");
}
