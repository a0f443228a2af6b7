use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::trace;

use ibft_core_types::{Context, LinearTimeouts, Timeout};
use ibft_events::DutyEvent;

use crate::Msg;

/// Round timers. Each scheduled timer is a task that posts a
/// [`DutyEvent::Timeout`] into the engine queue when it expires.
pub struct Timers<Ctx: Context> {
    config: LinearTimeouts,
    timeouts: Arc<Mutex<HashMap<Timeout, JoinHandle<()>>>>,
    timeout_elapsed: mpsc::WeakSender<Msg<Ctx>>,
}

impl<Ctx: Context> Timers<Ctx> {
    /// Timers do not keep the queue open: once every other sender is gone, expiries are dropped.
    pub fn new(config: LinearTimeouts, timeout_elapsed: &mpsc::Sender<Msg<Ctx>>) -> Self {
        Self {
            config,
            timeouts: Arc::new(Mutex::new(HashMap::new())),
            timeout_elapsed: timeout_elapsed.downgrade(),
        }
    }

    /// Cancel every pending timer.
    pub async fn reset(&mut self) {
        for (_, handle) in self.timeouts.lock().await.drain() {
            handle.abort();
        }
    }

    pub async fn scheduled(&self) -> usize {
        self.timeouts.lock().await.len()
    }

    pub async fn schedule_timeout(&mut self, timeout: Timeout) {
        let tx = self.timeout_elapsed.clone();
        let duration = self.config.duration(timeout.round);

        trace!(%timeout, ?duration, "Scheduling timeout");

        let timeouts = Arc::clone(&self.timeouts);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            timeouts.lock().await.remove(&timeout);

            let Some(tx) = tx.upgrade() else {
                return;
            };

            // The engine may have stopped in the meantime.
            let _ = tx.send(Msg::Duty(DutyEvent::Timeout(timeout.into()))).await;
        });

        if let Some(previous) = self.timeouts.lock().await.insert(timeout, handle) {
            previous.abort();
        }
    }

    /// Cancel every pending timer and start the one for `timeout`.
    pub async fn replace(&mut self, timeout: Timeout) {
        self.reset().await;
        self.schedule_timeout(timeout).await;
    }

    pub async fn cancel_timeout(&mut self, timeout: &Timeout) {
        if let Some(handle) = self.timeouts.lock().await.remove(timeout) {
            handle.abort();
        }
    }
}
