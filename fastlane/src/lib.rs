//! # fastlane
//!
//! **fastlane** is a current-thread async runtime built around a mutex with
//! a priority lane.
//!
//! Tasks that share one thread can still interleave inside a critical
//! section whenever they await halfway through it. [`sync::Mutex`] lets
//! them take turns in arrival order. [`sync::PriorityMutex`] adds a VIP
//! lane: when an ordinary holder releases, every waiting VIP request is
//! served before the next ordinary one.
//!
//! The crate provides:
//!
//! - A **current-thread executor** with `spawn`, join handles and
//!   [`yield_now`]
//! - **Timer primitives**: [`time::sleep`] and [`time::timeout`]
//! - **Mutual exclusion** with and without a priority lane
//! - A simulated **account store** ([`bank::Account`]) that loses updates
//!   without a mutex
//! - **Ergonomic macros**: `#[fastlane::main]`, `#[fastlane::test]` and
//!   `join!`
//!
//! ## Quick Start
//!
//! ```rust
//! use fastlane::sync::PriorityMutex;
//! use fastlane::task;
//! use std::rc::Rc;
//!
//! #[fastlane::main]
//! async fn main() {
//!     let mutex = Rc::new(PriorityMutex::new());
//!     let order = Rc::new(std::cell::RefCell::new(Vec::new()));
//!
//!     let key = mutex.lock().await;
//!
//!     let waiters = ["ordinary", "vip"].map(|name| {
//!         let (mutex, order) = (mutex.clone(), order.clone());
//!         task::spawn(async move {
//!             let mut key = mutex.lock_with(name == "vip").await;
//!             order.borrow_mut().push(name);
//!             key.release().await;
//!         })
//!     });
//!
//!     drop(key);
//!     for waiter in waiters {
//!         waiter.await;
//!     }
//!
//!     assert_eq!(*order.borrow(), ["vip", "ordinary"]);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sync`]: `Mutex` and `PriorityMutex`
//! - [`task`]: spawning and joining tasks
//! - [`time`]: sleep and timeout
//! - [`bank`]: the simulated account store

mod runtime;
mod utils;

pub mod bank;
pub mod sync;
pub mod time;

pub use runtime::builder::RuntimeBuilder;
pub use runtime::core::Runtime;
pub use runtime::task;
pub use runtime::yield_now::yield_now;

pub use fastlane_macros::*;
