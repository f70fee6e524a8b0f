use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::session::SessionEvent;

/// Recurring partial-transcription trigger for one session.
///
/// Fires a tick into the session's event channel at a fixed interval.
/// Holds no buffer state: whether a tick leads to an inference call is
/// entirely the session controller's decision.
pub struct PartialScheduler {
    handle: JoinHandle<()>,
}

impl PartialScheduler {
    pub fn spawn(interval: Duration, events: mpsc::Sender<SessionEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval yields immediately on first poll; a partial right at
            // session start would always see an empty buffer
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if events.send(SessionEvent::PartialTick).await.is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Cancels the timer and waits for the task to actually finish, so a
    /// late tick can never race a session that is being torn down.
    pub async fn shutdown(self) {
        self.handle.abort();
        if let Err(e) = self.handle.await
            && !e.is_cancelled()
        {
            debug!(%e, "partial scheduler task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ticks_arrive_at_the_configured_cadence() {
        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = PartialScheduler::spawn(Duration::from_millis(20), tx);

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(first, Ok(Some(SessionEvent::PartialTick))));
        let second = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(second, Ok(Some(SessionEvent::PartialTick))));

        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn no_tick_fires_after_shutdown_completes() {
        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = PartialScheduler::spawn(Duration::from_millis(10), tx);

        // Let it tick at least once, then tear down.
        let _ = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        scheduler.shutdown().await;

        // Drain anything sent before the abort landed.
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }
}
