//! Periodic refetching.
//!
//! [`spawn_poll`] runs a task on a fixed interval until the returned
//! [`PollHandle`] is cancelled or dropped. A tick that is already running
//! finishes; no new tick starts after cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle for a running poll task. Dropping it cancels the poll.
pub struct PollHandle {
    name: &'static str,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Cancel and wait for the poll loop to exit.
    pub async fn join(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(poll = self.name, error = %e, "poll task ended abnormally");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `tick` every `every`, starting immediately.
///
/// Ticks never overlap: if one runs longer than `every`, the next starts
/// when it finishes.
pub fn spawn_poll<F, Fut>(name: &'static str, every: Duration, mut tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (cancel, mut cancelled) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(poll = name, every_ms = every.as_millis() as u64, "poll started");

        loop {
            tokio::select! {
                biased;
                changed = cancelled.changed() => {
                    // Err: every handle is gone.
                    if changed.is_err() || *cancelled.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => tick().await,
            }
        }

        tracing::info!(poll = name, "poll stopped");
    });

    PollHandle {
        name,
        cancel,
        task: Some(task),
    }
}
