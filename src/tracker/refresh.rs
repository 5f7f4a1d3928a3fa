use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::session::TrackingSession;
use crate::map::MapWidget;

/// Fires [`TrackingSession::tick`] on a fixed interval.
///
/// Ticks are spawned, not awaited, so a slow tick may overlap the next one.
/// Dropping the handle stops the timer; ticks already running finish.
#[derive(Debug)]
pub struct RefreshLoop {
    stop_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<u64>,
}

impl RefreshLoop {
    pub fn spawn<M: MapWidget>(session: TrackingSession<M>, every: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let join = tokio::spawn(async move {
            // The first tick comes from the category selection itself.
            let mut timer = interval_at(Instant::now() + every, every);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut fired = 0u64;

            loop {
                let should_stop = tokio::select! {
                    _ = timer.tick() => false,
                    _ = &mut stop_rx => true,
                };
                if should_stop {
                    break;
                }

                fired += 1;
                log::debug!("Refresh tick {}", fired);
                let session = session.clone();
                tokio::spawn(async move { session.tick().await });
            }

            log::info!("Refresh loop stopped after {} ticks", fired);
            fired
        });

        Self {
            stop_tx: Some(stop_tx),
            join,
        }
    }

    /// Stops the timer and returns how many ticks it fired.
    pub async fn stop(mut self) -> u64 {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        match (&mut self.join).await {
            Ok(fired) => fired,
            Err(e) => {
                log::error!("Refresh loop task failed: {}", e);
                0
            }
        }
    }
}
