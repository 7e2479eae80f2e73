//! # Alert Dispatcher
//!
//! Decouples the polling loops from alert delivery. `publish` only enqueues;
//! a worker task delivers through the configured `AlertSink`, retrying with
//! exponential backoff up to `max_attempts`.
//!
//! The worker exits once every `AlertDispatcher` handle is dropped and the
//! queue is drained.

use crate::config::DispatcherConfig;
use shared_types::{Alert, AlertPublisher, AlertSink};
use sl_telemetry::metrics::{ALERTS_RAISED, ALERT_DELIVERIES};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Non-blocking publisher backed by a bounded queue.
#[derive(Clone)]
pub struct AlertDispatcher {
    tx: mpsc::Sender<Alert>,
}

impl AlertDispatcher {
    /// Start the delivery worker on the current runtime.
    pub fn spawn(sink: Arc<dyn AlertSink>, config: DispatcherConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let worker = AlertWorker { sink, config, rx };
        let handle = tokio::spawn(worker.run());
        (Self { tx }, handle)
    }
}

impl AlertPublisher for AlertDispatcher {
    fn publish(&self, alert: Alert) {
        ALERTS_RAISED.with_label_values(&[alert.kind.as_str()]).inc();
        debug!(kind = %alert.kind, message = %alert.message(), "Alert raised");

        match self.tx.try_send(alert) {
            Ok(()) => {}
            Err(TrySendError::Full(alert)) => {
                ALERT_DELIVERIES.with_label_values(&["dropped"]).inc();
                warn!(kind = %alert.kind, "Alert queue full, dropping alert");
            }
            Err(TrySendError::Closed(alert)) => {
                ALERT_DELIVERIES.with_label_values(&["dropped"]).inc();
                warn!(kind = %alert.kind, "Alert worker stopped, dropping alert");
            }
        }
    }
}

struct AlertWorker {
    sink: Arc<dyn AlertSink>,
    config: DispatcherConfig,
    rx: mpsc::Receiver<Alert>,
}

impl AlertWorker {
    async fn run(mut self) {
        while let Some(alert) = self.rx.recv().await {
            self.deliver(&alert).await;
        }
        debug!("Alert worker drained and stopped");
    }

    async fn deliver(&self, alert: &Alert) {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let error = match tokio::time::timeout(self.config.send_timeout, self.sink.send(alert)).await {
                Ok(Ok(())) => {
                    ALERT_DELIVERIES.with_label_values(&["delivered"]).inc();
                    debug!(kind = %alert.kind, attempt, "Alert delivered");
                    return;
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => "delivery timed out".to_string(),
            };

            if attempt == max_attempts {
                ALERT_DELIVERIES.with_label_values(&["failed"]).inc();
                error!(kind = %alert.kind, attempts = attempt, error = %error, "Alert delivery failed, giving up");
                return;
            }

            let delay = backoff_delay(self.config.initial_backoff, attempt);
            ALERT_DELIVERIES.with_label_values(&["retried"]).inc();
            warn!(
                kind = %alert.kind,
                attempt,
                retry_in_ms = delay.as_millis() as u64,
                error = %error,
                "Alert delivery failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Delay after failed attempt `attempt` (1-based): `initial * 2^(attempt-1)`.
fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    initial.saturating_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::test_utils::RecordingAlertSink;
    use async_trait::async_trait;
    use shared_types::{AlertError, AlertKind, Timestamp};

    fn alert(balance: u64) -> Alert {
        Alert::over_leased(balance, 100, Timestamp::new(1))
    }

    fn config(max_attempts: u32) -> DispatcherConfig {
        DispatcherConfig {
            capacity: 8,
            max_attempts,
            initial_backoff: Duration::from_millis(500),
            send_timeout: Duration::from_secs(1),
        }
    }

    /// Sink that never answers.
    struct HangingSink;

    #[async_trait]
    impl AlertSink for HangingSink {
        async fn send(&self, _alert: &Alert) -> Result<(), AlertError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_delivered() {
        let sink = Arc::new(RecordingAlertSink::failing_first(2));
        let (dispatcher, worker) = AlertDispatcher::spawn(sink.clone(), config(3));
        let started = tokio::time::Instant::now();

        dispatcher.publish(alert(1));
        drop(dispatcher);
        worker.await.unwrap();

        assert_eq!(sink.attempts(), 3);
        assert_eq!(sink.delivered().len(), 1);
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let sink = Arc::new(RecordingAlertSink::failing_first(10));
        let (dispatcher, worker) = AlertDispatcher::spawn(sink.clone(), config(3));

        dispatcher.publish(alert(1));
        drop(dispatcher);
        worker.await.unwrap();

        assert_eq!(sink.attempts(), 3);
        assert!(sink.delivered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_sink_times_out() {
        let (dispatcher, worker) = AlertDispatcher::spawn(Arc::new(HangingSink), config(2));

        dispatcher.publish(alert(1));
        drop(dispatcher);

        tokio::time::timeout(Duration::from_secs(10), worker)
            .await
            .expect("worker should give up")
            .unwrap();
    }

    #[tokio::test]
    async fn test_drains_queue_in_order_on_shutdown() {
        let sink = Arc::new(RecordingAlertSink::new());
        let (dispatcher, worker) = AlertDispatcher::spawn(sink.clone(), config(1));

        for balance in 1..=5 {
            dispatcher.publish(alert(balance));
        }
        drop(dispatcher);
        worker.await.unwrap();

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 5);
        assert!(delivered.iter().all(|a| a.kind == AlertKind::OverLeased));
        assert_eq!(delivered[0].detail["stake_balance"], 1);
        assert_eq!(delivered[4].detail["stake_balance"], 5);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (tx, _rx) = mpsc::channel(1);
        let dispatcher = AlertDispatcher { tx };

        dispatcher.publish(alert(1));
        dispatcher.publish(alert(2));
    }
}
