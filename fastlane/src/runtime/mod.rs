//! Core runtime components.
//!
//! This module contains the building blocks of the current-thread runtime
//! that drives the synchronization primitives.
//!
//! It is responsible for:
//! - executing asynchronous tasks on the calling thread,
//! - keeping the FIFO ready queue and the timer queue,
//! - providing the thread-local runtime context,
//! - enabling cooperative multitasking via yielding.
//!
//! Most users will interact with [`RuntimeBuilder`](builder::RuntimeBuilder),
//! [`task::spawn`] and [`yield_now`](yield_now::yield_now).

mod executor;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod core;
pub(crate) mod timer;
pub(crate) mod yield_now;

pub mod task;
