use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodic "now" used to refresh human-relative timestamps.
///
/// Only emits the current time; it never touches the conversation store.
pub struct TimestampTicker {
    now: watch::Receiver<DateTime<Utc>>,
    task: JoinHandle<()>,
}

impl TimestampTicker {
    pub fn spawn(period: Duration) -> Self {
        let (tx, now) = watch::channel(Utc::now());

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if tx.send(Utc::now()).is_err() {
                    break;
                }
            }
        });

        Self { now, task }
    }

    /// Time of the latest tick
    pub fn now(&self) -> DateTime<Utc> {
        *self.now.borrow()
    }

    /// Receiver that changes on every tick; await `changed()` to re-render
    pub fn subscribe(&self) -> watch::Receiver<DateTime<Utc>> {
        self.now.clone()
    }
}

impl Drop for TimestampTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
