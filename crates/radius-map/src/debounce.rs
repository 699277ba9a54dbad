//! Shared debounce: only the latest call inside the window gets to run

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Delays work by a fixed window and drops it if another call arrives
/// before the window elapses. One instance is one shared timer.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: AtomicU64::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait out the window, then run `task` unless a newer call superseded
    /// this one. Returns `None` when superseded; `task` is never invoked then.
    pub async fn run<F, Fut, T>(&self, task: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.window).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            return None;
        }
        Some(task().await)
    }

    /// Supersede whatever is currently waiting
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
