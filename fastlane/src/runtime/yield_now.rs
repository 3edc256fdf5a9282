use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that yields execution back to the executor exactly once.
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    /// On the first poll, the task wakes itself and returns
    /// `Poll::Pending`, which puts it at the back of the ready queue.
    /// On the second poll, the future completes.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Yields execution back to the executor.
///
/// Every task that was already runnable gets polled before the current task
/// continues, since the ready queue is FIFO.
///
/// # Examples
///
/// ```rust
/// use fastlane::yield_now;
///
/// # fastlane::RuntimeBuilder::new().build().block_on(async {
/// // Let other tasks reach their next suspension point first.
/// yield_now().await;
/// # });
/// ```
pub async fn yield_now() {
    YieldOnce { yielded: false }.await
}
