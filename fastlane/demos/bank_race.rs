//! Four shops sell $50 of goods each into one account that starts empty.
//!
//! Run with `cargo run --example bank_race`. Set `RUST_LOG=fastlane=trace`
//! to watch tickets move through the mutex.

use fastlane::bank::Account;
use fastlane::sync::{Mutex, PriorityMutex};
use fastlane::{join, task};

use std::cell::RefCell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

async fn unguarded() {
    let account = Account::new(0);

    let _ = join!(
        account.sell(50),
        account.sell(50),
        account.sell(50),
        account.sell(50),
    );

    println!("unguarded: ${} (expected $200)", account.snapshot());
}

async fn guarded() {
    let account = Account::new(0);
    let mutex = Mutex::new();

    let _ = join!(
        mutex.run(|| account.sell(50)),
        mutex.run(|| account.sell(50)),
        mutex.run(|| account.sell(50)),
        mutex.run(|| account.sell(50)),
    );

    println!("guarded:   ${}", account.snapshot());
}

async fn vip_order() {
    let mutex = Rc::new(PriorityMutex::new());
    let order = Rc::new(RefCell::new(Vec::new()));

    let requests = [
        ("o1", false),
        ("o2", false),
        ("o3", false),
        ("o4", false),
        ("v1", true),
        ("v2", true),
    ];

    let mut handles = Vec::new();

    for (name, vip) in requests {
        let mutex = mutex.clone();
        let order = order.clone();

        handles.push(task::spawn(async move {
            mutex
                .run_with(vip, || async {
                    order.borrow_mut().push(name);
                    fastlane::time::sleep(Account::DEFAULT_LATENCY).await;
                })
                .await;
        }));
    }

    for handle in handles {
        handle.await;
    }

    println!("vip order: {}", order.borrow().join(", "));
}

#[fastlane::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    unguarded().await;
    guarded().await;
    vip_order().await;
}
