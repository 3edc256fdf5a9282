use crate::runtime::executor::Handle;

use std::cell::RefCell;

thread_local! {
    /// Thread-local handle to the executor currently driving this thread.
    ///
    /// This is set while `block_on` runs and allows runtime components
    /// (spawning, timers, the mutex hand-off) to reach the executor without
    /// explicit parameter passing.
    static CURRENT: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

/// Restores the previously installed handle when dropped, so the context is
/// unwound even if the closure panics.
struct Restore(Option<Handle>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        CURRENT.with(|current| current.replace(previous));
    }
}

/// Enters the runtime execution context for the current thread.
///
/// The handle is installed for the duration of the closure `f`. After the
/// closure completes, the previous context is restored.
pub(crate) fn enter_context<R>(handle: Handle, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT.with(|current| current.replace(Some(handle)));
    let _restore = Restore(previous);

    f()
}

/// Returns the handle of the executor driving this thread, if any.
pub(crate) fn current() -> Option<Handle> {
    CURRENT.with(|current| current.borrow().clone())
}
