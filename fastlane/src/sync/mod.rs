//! Synchronization primitives for tasks sharing one thread.
//!
//! - [`Mutex`]: first-come, first-served mutual exclusion.
//! - [`PriorityMutex`]: the same, plus a VIP lane whose requests overtake
//!   queued ordinary requests at release time.
//!
//! Both guard a critical section rather than a value and hand out keys in
//! the order requests were made. They are `!Send` and `!Sync`: every task
//! using one runs on the same runtime thread.
//!
//! Neither detects a key that is never released. A lost key stalls every
//! later request; scoped helpers such as [`Mutex::run`] and
//! [`PriorityMutex::run`] release on every exit path.

mod chain;
mod mutex;
mod priority;

pub use mutex::{Acquire, Key, Mutex};
pub use priority::{Lane, Lock, PriorityKey, PriorityMutex, Release};
