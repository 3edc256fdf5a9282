use fastlane::task::{self, SpawnError};
use fastlane::{RuntimeBuilder, yield_now};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

#[test]
fn test_block_on_returns_output() {
    let rt = RuntimeBuilder::new().build();

    assert_eq!(rt.block_on(async { 1 + 1 }), 2);
}

#[test]
fn test_spawn_from_runtime_handle() {
    let rt = RuntimeBuilder::new().task_capacity(1).build();

    let handles: Vec<_> = (0..8).map(|i| rt.spawn(async move { i * i })).collect();

    let total = rt.block_on(async {
        let mut total = 0;
        for handle in handles {
            total += handle.await;
        }
        total
    });

    assert_eq!(total, 140);
}

#[fastlane::test]
async fn test_spawned_tasks_run_in_fifo_order() {
    let order = Rc::new(RefCell::new(Vec::new()));

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let order = order.clone();
            task::spawn(async move { order.borrow_mut().push(i) })
        })
        .collect();

    for handle in handles {
        handle.await;
    }

    assert_eq!(*order.borrow(), [0, 1, 2, 3, 4]);
}

#[fastlane::test]
async fn test_yield_now_lets_other_tasks_run() {
    let flag = Rc::new(Cell::new(false));

    let other = {
        let flag = flag.clone();
        task::spawn(async move { flag.set(true) })
    };

    assert!(!flag.get());
    yield_now().await;
    assert!(flag.get());
    assert!(other.is_finished());
}

#[fastlane::test]
async fn test_dropped_join_handle_detaches() {
    let done = Rc::new(Cell::new(false));

    drop({
        let done = done.clone();
        task::spawn(async move {
            fastlane::time::sleep(Duration::from_millis(5)).await;
            done.set(true);
        })
    });

    fastlane::time::sleep(Duration::from_millis(20)).await;
    assert!(done.get());
}

#[fastlane::main(task_capacity = 4, event_interval = 2)]
async fn tuned_main() -> usize {
    let handles: Vec<_> = (0..10).map(|i| task::spawn(async move { i })).collect();

    let mut sum = 0;
    for handle in handles {
        sum += handle.await;
    }
    sum
}

#[test]
fn test_main_attribute_accepts_tuning() {
    assert_eq!(tuned_main(), 45);
}

#[test]
fn test_try_spawn_outside_runtime() {
    let err = task::try_spawn(async {}).unwrap_err();

    assert_eq!(err, SpawnError::NoRuntime);
}

#[test]
#[should_panic(expected = "spawn must be called within the context of a runtime")]
fn test_spawn_outside_runtime_panics() {
    let _ = task::spawn(async {});
}

#[test]
fn test_drop_runtime_drops_pending_tasks() {
    struct Flag(Rc<Cell<bool>>);

    impl Drop for Flag {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    let dropped = Rc::new(Cell::new(false));
    let rt = RuntimeBuilder::new()
        .park_timeout(Duration::from_millis(1))
        .build();

    let flag = Flag(dropped.clone());
    let _handle = rt.spawn(async move {
        let _flag = flag;
        std::future::pending::<()>().await;
    });

    rt.block_on(yield_now());
    assert!(!dropped.get());

    drop(rt);
    assert!(dropped.get());
}

#[test]
#[should_panic(expected = "task_capacity must be > 0")]
fn test_builder_rejects_zero_capacity() {
    let _ = RuntimeBuilder::new().task_capacity(0);
}
