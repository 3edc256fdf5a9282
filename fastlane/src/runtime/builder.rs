use super::core::Runtime;

use std::time::Duration;

/// Tuning knobs shared by the builder and the executor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Config {
    /// Initial number of task slots in the arena.
    pub(crate) task_capacity: usize,

    /// Number of task polls between two timer checks.
    pub(crate) event_interval: usize,

    /// Longest single park of an idle run loop.
    pub(crate) park_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            task_capacity: 64,
            event_interval: 61,
            park_timeout: Duration::from_millis(10),
        }
    }
}

/// Builder for configuring and creating a runtime.
///
/// `RuntimeBuilder` allows customizing runtime parameters before
/// constructing the runtime. Every runtime drives its tasks on the thread
/// that calls [`Runtime::block_on`].
///
/// # Examples
///
/// ```rust
/// use fastlane::RuntimeBuilder;
///
/// let runtime = RuntimeBuilder::new()
///     .task_capacity(128)
///     .build();
///
/// assert_eq!(runtime.block_on(async { 1 + 1 }), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    config: Config,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    ///
    /// Defaults: 64 task slots, a timer check every 61 polls, and a park
    /// timeout of 10ms.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Sets the number of task slots allocated up front.
    ///
    /// The arena still grows past this on demand.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn task_capacity(mut self, n: usize) -> Self {
        assert!(n > 0, "task_capacity must be > 0");

        self.config.task_capacity = n;
        self
    }

    /// Sets how many tasks are polled between two checks of the timer
    /// queue while tasks keep waking each other.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn event_interval(mut self, n: usize) -> Self {
        assert!(n > 0, "event_interval must be > 0");

        self.config.event_interval = n;
        self
    }

    /// Sets the longest time the run loop parks in one go when nothing is
    /// runnable.
    ///
    /// # Panics
    ///
    /// Panics if `timeout` is zero.
    pub fn park_timeout(mut self, timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "park_timeout must be non-zero");

        self.config.park_timeout = timeout;
        self
    }

    /// Builds the runtime with the configured options.
    pub fn build(self) -> Runtime {
        Runtime::new(self.config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
