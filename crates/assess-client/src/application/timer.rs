//! Cancelable timers backed by tokio tasks.
//!
//! A [`Timer`] is an id plus the task that waits on the clock.  Cancelling the
//! timer, or simply dropping it, aborts that task, so a timer can never fire
//! against an owner that has already been torn down.
//!
//! The callback runs on the timer's own task.  Callers that need the work done
//! on their own execution context post a message from the callback instead of
//! doing the work inline (the connection manager posts into its input queue).

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Identifies one armed timer.  Ids are never reused by a single owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// A running one-shot or repeating timer.
///
/// Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct Timer {
    id: TimerId,
    task: JoinHandle<()>,
}

impl Timer {
    /// Calls `on_fire` once after `delay`.
    pub fn once<F>(id: TimerId, delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        });
        Self { id, task }
    }

    /// Calls `on_tick` every `period`, first after one full period.
    ///
    /// Ticks missed because the runtime stalled are not replayed in a burst;
    /// the schedule restarts from the late tick.
    ///
    /// A `period` too long to add to the current instant schedules the first
    /// tick roughly thirty years out instead.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero (validated away by `ClientConfig::validate`).
    pub fn repeating<F>(id: TimerId, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(first_tick_after(period), period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                on_tick();
            }
        });
        Self { id, task }
    }

    /// The id this timer was armed with.
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Stops the timer.  A callback that has not started yet will not run.
    pub fn cancel(self) {
        self.task.abort();
    }

    /// `true` once a one-shot timer has fired or any timer was aborted.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// `now + period`, clamped to a far-future instant on overflow.
fn first_tick_after(period: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(period).unwrap_or_else(|| now + FAR_FUTURE)
}

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

// ── Tests ─────────────────────────────────────────────────────────────────────
