//! Write-behind delivery of table events to an external collaborator
//! (persistence, broadcast). The table actor never waits on it.

use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::EventEnvelope;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),
    #[error("encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receiver of committed table events. Delivery is at-least-once: a failed
/// envelope is retried until it succeeds, so implementations should be
/// idempotent on `(table_id, sequence)`.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, envelope: &EventEnvelope) -> Result<(), SinkError>;
}

/// Writes every envelope as one JSON log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn deliver(&self, envelope: &EventEnvelope) -> Result<(), SinkError> {
        let line = serde_json::to_string(envelope)?;
        info!("{line}");
        Ok(())
    }
}

/// Backoff between failed deliveries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Backoff to use after `failures` consecutive failures (1-based).
    #[must_use]
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Spawn the publisher task. Envelopes are delivered in order; the task
/// ends once every sender is dropped and the queue is drained.
pub fn spawn_publisher(
    sink: Arc<dyn EventSink>,
    policy: RetryPolicy,
) -> (mpsc::UnboundedSender<EventEnvelope>, JoinHandle<()>) {
    let (sender, mut queue) = mpsc::unbounded_channel::<EventEnvelope>();
    let task = tokio::spawn(async move {
        while let Some(envelope) = queue.recv().await {
            let mut failures = 0;
            while let Err(err) = sink.deliver(&envelope).await {
                failures += 1;
                let backoff = policy.backoff(failures);
                warn!(
                    "Table {}: delivery of event {} failed ({err}), retry {failures} in {backoff:?}",
                    envelope.table_id, envelope.sequence
                );
                tokio::time::sleep(backoff).await;
            }
        }
    });
    (sender, task)
}
