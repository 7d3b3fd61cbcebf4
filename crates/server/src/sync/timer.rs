//! Single repeating background timer.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

struct Scheduled {
    period: Duration,
    /// Dropping the sender stops the loop at its next wait.
    _stop: watch::Sender<()>,
    task: JoinHandle<()>,
}

/// Owns at most one repeating task.
///
/// Scheduling always replaces the previous task, so at most one loop waits
/// for its next tick. Stopping a loop never interrupts a tick that is
/// already running; it only ends the wait for the next one.
#[derive(Default)]
pub struct RefreshTimer {
    scheduled: Mutex<Option<Scheduled>>,
}

impl RefreshTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Scheduled>> {
        self.scheduled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop the current loop, then run `tick` every `period` if one is given.
    ///
    /// The first run happens one full period after scheduling. Returns true
    /// if a task is now scheduled.
    pub fn schedule<F, Fut>(&self, period: Option<Duration>, mut tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot();
        *slot = None;

        let Some(period) = period.filter(|p| !p.is_zero()) else {
            tracing::info!("periodic refresh disabled");
            return false;
        };

        let (stop, mut stopped) = watch::channel(());
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // Skip the first immediate tick
            loop {
                tokio::select! {
                    biased;
                    _ = stopped.changed() => break,
                    _ = interval.tick() => {}
                }
                tick().await;
            }
            tracing::debug!(period_secs = period.as_secs(), "periodic refresh stopped");
        });

        tracing::info!(period_secs = period.as_secs(), "scheduled periodic refresh");
        *slot = Some(Scheduled { period, _stop: stop, task });
        true
    }

    /// Stop the current loop. A tick already running is left to finish.
    /// Returns true if a loop was scheduled.
    pub fn cancel(&self) -> bool {
        self.slot().take().is_some()
    }

    /// Period of the live task, if any.
    pub fn period(&self) -> Option<Duration> {
        self.slot()
            .as_ref()
            .filter(|s| !s.task.is_finished())
            .map(|s| s.period)
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
