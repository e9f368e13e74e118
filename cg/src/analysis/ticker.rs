//! Cosmetic progress ticker
//!
//! While an analysis request is outstanding the indicator creeps up by a
//! random step every tick and stops at the ceiling. It measures nothing; it
//! only shows the request is alive.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::config::ProgressConfig;

/// Owned handle to a running ticker task
///
/// The task is aborted when the handle is dropped, so a cancelled request or
/// a torn-down view never leaves a timer behind.
pub struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Reset `progress` to 0 and start incrementing it
    pub fn start(progress: Arc<watch::Sender<f64>>, config: &ProgressConfig) -> Self {
        debug!(tick_ms = config.tick_ms, max_step = config.max_step, ceiling = config.ceiling, "ProgressTicker::start");
        progress.send_replace(0.0);

        let tick = Duration::from_millis(config.tick_ms.max(1));
        let max_step = config.max_step.max(0.0);
        let ceiling = config.ceiling.clamp(0.0, 100.0);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            let mut current = 0.0_f64;
            while current < ceiling {
                interval.tick().await;
                let step = if max_step > 0.0 {
                    rand::rng().random_range(0.0..max_step)
                } else {
                    0.0
                };
                current = (current + step).min(ceiling);
                progress.send_replace(current);
            }
            debug!(ceiling, "ProgressTicker: reached ceiling");
        });

        Self { handle: Some(handle) }
    }

    /// Abort the task and wait until it has stopped
    ///
    /// After this returns the ticker will not publish again.
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        debug!("ProgressTicker::stop: stopped");
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("ProgressTicker::drop: aborting ticker task");
            handle.abort();
        }
    }
}
