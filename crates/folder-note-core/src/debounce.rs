//! Supersede-on-reschedule delayed tasks.

use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs at most one delayed action at a time.
///
/// Scheduling while an action is still waiting aborts the waiting one, so a
/// burst of schedules inside one window collapses into the last action.
/// Must be used from within a Tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Run `action` after the delay, replacing any action still waiting.
    pub fn schedule(&mut self, action: impl FnOnce() + Send + 'static) {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Abort the waiting action. Returns true if one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
