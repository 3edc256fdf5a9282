//! Task executor implementation.
//!
//! This module contains the components responsible for executing
//! asynchronous tasks on the current thread.
//!
//! It is composed of:
//! - [`core`]: the executor, its task arena and its run loop,
//! - [`ready`]: the FIFO queue of woken targets the run loop drains and
//!   parks on.

pub(crate) mod core;
pub(crate) mod ready;

pub(crate) use self::core::{Executor, Handle};
