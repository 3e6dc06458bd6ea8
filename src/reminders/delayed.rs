//! Delayed reminder scheduler: one-shot "Lembrar Depois" timers.
//!
//! Each timer runs as a tokio task that sleeps until its deadline and then
//! runs its action. Timers live only as long as the runtime: nothing is
//! persisted, so a snooze pending at shutdown is lost.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::AbortHandle;
use tokio::time::Instant;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DelayError {
    #[error("No async runtime available to hold the timer")]
    NoRuntime,
}

/// Handle for scheduling delayed actions. Clones share the same timers.
#[derive(Clone, Default)]
pub struct DelayedReminderScheduler {
    pending: Arc<AtomicUsize>,
    timers: Arc<Mutex<Vec<AbortHandle>>>,
}

impl DelayedReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a timer could be set from here.
    pub fn ensure_available(&self) -> Result<(), DelayError> {
        runtime().map(|_| ())
    }

    /// Run `action` once, `interval` after this call.
    pub fn after<F>(&self, interval: Duration, action: F) -> Result<(), DelayError>
    where
        F: FnOnce() + Send + 'static,
    {
        let runtime = runtime()?;
        // Deadline is fixed now, not when the task first gets polled.
        let deadline = Instant::now() + interval;
        let pending = self.pending.clone();
        pending.fetch_add(1, Ordering::SeqCst);

        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            pending.fetch_sub(1, Ordering::SeqCst);
            action();
        });

        if let Ok(mut timers) = self.timers.lock() {
            timers.retain(|t| !t.is_finished());
            timers.push(task.abort_handle());
        }
        tracing::debug!(delay_secs = interval.as_secs(), "Delayed reminder scheduled");
        Ok(())
    }

    /// Timers scheduled but not yet fired.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Drop every outstanding timer without running it.
    pub fn cancel_all(&self) {
        let Ok(mut timers) = self.timers.lock() else {
            return;
        };
        let mut cancelled = 0usize;
        for timer in timers.drain(..) {
            if !timer.is_finished() {
                timer.abort();
                cancelled += 1;
            }
        }
        self.pending.fetch_sub(
            cancelled.min(self.pending.load(Ordering::SeqCst)),
            Ordering::SeqCst,
        );
        if cancelled > 0 {
            tracing::info!(cancelled, "Pending delayed reminders dropped");
        }
    }
}

fn runtime() -> Result<tokio::runtime::Handle, DelayError> {
    tokio::runtime::Handle::try_current().map_err(|_| DelayError::NoRuntime)
}
