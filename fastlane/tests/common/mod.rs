#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

/// Installs a test-writer subscriber once per test binary.
///
/// Filtering follows `RUST_LOG`, e.g. `RUST_LOG=fastlane=trace`.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared record of the order in which tasks entered a critical section.
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<&'static str>>>);

impl Log {
    pub fn push(&self, name: &'static str) {
        self.0.borrow_mut().push(name);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.borrow().clone()
    }
}
