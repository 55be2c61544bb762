//! Trailing-edge debounce for viewport-driven fetches.
//!
//! Each settled viewport re-arms the timer; only the last arm within the
//! window fires. Cancellation covers the armed timer only: once the delay
//! elapses the work future is handed off to its own task, and a stale result
//! is discarded at apply time by the sequence gate rather than by aborting
//! the fetch.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct QueryDebouncer {
    delay: Duration,
    armed: Option<JoinHandle<()>>,
}

impl QueryDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, armed: None }
    }

    /// Arms the timer with `work`, discarding any previously armed work that
    /// has not fired yet.
    pub fn arm<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.armed = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detach so a later cancel() cannot abort in-flight work.
            tokio::spawn(work);
        }));
    }

    /// Drops pending work that has not fired yet. No-op otherwise.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.armed.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for QueryDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
