use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::polling::client::PollingClient;

/// Fixed-interval driver of `PollingClient::update`.
///
/// Ticks run one after another inside a single task; a tick that overruns the
/// interval makes the driver skip the missed slots instead of bursting.
#[derive(Debug)]
pub struct PeriodicUpdate {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PeriodicUpdate {
    /// First tick fires one `period` after the call.
    pub fn start(client: Arc<PollingClient>, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(client = %client.unique_id(), period_ms = period.as_millis() as u64, "periodic update started");
            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                        client.update().await;
                    }
                }
            }
            debug!(client = %client.unique_id(), "periodic update loop exited");
        });
        Self { stop_tx, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// No tick starts after this returns. A tick already in flight is abandoned.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        self.handle.abort();
        let _ = self.handle.await;
        info!("periodic update stopped");
    }
}
