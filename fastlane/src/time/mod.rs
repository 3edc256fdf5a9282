//! Time utilities.
//!
//! This module provides time-related asynchronous utilities that
//! integrate with the runtime timer queue.
//!
//! It includes:
//! - [`sleep`] for suspending a task until a deadline,
//! - [`timeout`] for bounding how long a future may take.

mod sleep;
mod timeout;

#[doc(inline)]
pub use sleep::{Sleep, sleep};

#[doc(inline)]
pub use timeout::{Elapsed, Timeout, timeout};
