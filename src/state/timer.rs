//! Cancellable delayed callbacks driving the time-based session transitions.

use std::{
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use tokio::{task::AbortHandle, time::sleep};
use tracing::trace;

/// Identifier of a scheduled timer, unique for the lifetime of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Handle returned by [`TimerService::schedule_after`]; pass it to
/// [`TimerService::cancel`] to drop the pending callback.
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    abort: AbortHandle,
}

impl TimerHandle {
    /// Identifier the callback can compare against when it fires.
    pub fn id(&self) -> TimerId {
        self.id
    }
}

/// Schedules callbacks on the Tokio runtime after a delay.
///
/// Cancelling aborts the sleeping task. A callback that already started may
/// still be waiting for a lock when it is cancelled, so callbacks must
/// re-validate whatever they are about to change.
#[derive(Default)]
pub struct TimerService {
    next_id: AtomicU64,
    live: Arc<DashMap<TimerId, ()>>,
}

impl TimerService {
    /// Create an empty timer service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` once `delay` has elapsed unless cancelled first.
    pub fn schedule_after<F, Fut>(&self, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce(TimerId) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.live.insert(id, ());

        let live = Arc::clone(&self.live);
        let task = tokio::spawn(async move {
            sleep(delay).await;
            live.remove(&id);
            trace!(timer = %id, "timer fired");
            callback(id).await;
        });

        TimerHandle {
            id,
            abort: task.abort_handle(),
        }
    }

    /// Cancel a pending timer. Returns `false` when it had already fired.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        handle.abort.abort();
        let pending = self.live.remove(&handle.id).is_some();
        trace!(timer = %handle.id, pending, "timer cancelled");
        pending
    }

    /// Number of timers scheduled but not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn callback_runs_after_delay() {
        let timers = TimerService::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let handle = timers.schedule_after(Duration::from_secs(3), move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(timers.pending(), 1);

        sleep(Duration::from_millis(2_900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timers.pending(), 0);
        assert!(!timers.cancel(handle));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_callback_never_runs() {
        let timers = TimerService::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let handle = timers.schedule_after(Duration::from_secs(1), move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timers.cancel(handle));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(timers.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn callback_receives_its_own_id() {
        let timers = TimerService::new();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let handle = timers.schedule_after(Duration::from_millis(10), move |id| async move {
            let _ = tx.send(id);
        });
        let expected = handle.id();

        assert_eq!(rx.await.unwrap(), expected);
    }
}
