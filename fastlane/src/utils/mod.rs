//! Utilities for memory-efficient data structures.
//!
//! This module provides low-level utilities used internally by the runtime
//! and the synchronization primitives. In particular, it exposes a [`Slab`]
//! arena used for tasks and mutex tickets, addressed by generational
//! [`SlotId`]s.

mod slab;

pub(crate) use slab::{Slab, SlotId};
