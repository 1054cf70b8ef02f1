//! Fire-and-forget webhook notifications.
//!
//! Producers enqueue payloads onto a bounded channel and return at once.
//! A separate delivery worker drains the channel into a `WebhookSink`.
//!
//! RULES:
//!   - `notify` never blocks. A full or closed queue drops the payload.
//!   - Delivery is attempted once. Failures are logged, never retried.
//!   - No ordering guarantee across payloads.

use crate::{config::RiskConfig, error::RiskResult, monitor::BalanceMonitor};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc::{self, Receiver, SyncSender, TrySendError},
        Arc,
    },
    thread::{self, JoinHandle},
};

// ── Payload ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    pub data: serde_json::Value,
    /// Callback URL of the originating record, if any. Not part of the body.
    #[serde(skip)]
    pub target: Option<String>,
}

impl WebhookPayload {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
            target: None,
        }
    }

    /// `{event, data: <monitor record>}`, targeted at the monitor's callback.
    pub fn for_monitor(event: &str, monitor: &BalanceMonitor) -> serde_json::Result<Self> {
        Ok(Self {
            event: event.to_string(),
            data: serde_json::to_value(monitor)?,
            target: monitor.call_back_url.clone(),
        })
    }
}

// ── Producer side ────────────────────────────────────────────────────────────

/// Accepts payloads without waiting for their delivery.
pub trait Notifier: Send + Sync {
    fn notify(&self, payload: WebhookPayload);
}

#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: SyncSender<WebhookPayload>,
    dropped: Arc<AtomicU64>,
}

impl ChannelNotifier {
    /// Payloads dropped because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, payload: WebhookPayload) {
        match self.sender.try_send(payload) {
            Ok(()) => {}
            Err(TrySendError::Full(p)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("notification: queue full, dropped '{}' event", p.event);
            }
            Err(TrySendError::Disconnected(p)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("notification: delivery worker gone, dropped '{}' event", p.event);
            }
        }
    }
}

// ── Consumer side ────────────────────────────────────────────────────────────

/// Final hop of a webhook: an HTTP client, a log, a test recorder.
pub trait WebhookSink: Send + 'static {
    fn deliver(&mut self, target: Option<&str>, payload: &WebhookPayload) -> anyhow::Result<()>;
}

/// Writes each payload to the log as JSON.
#[derive(Debug, Default)]
pub struct LogSink;

impl WebhookSink for LogSink {
    fn deliver(&mut self, target: Option<&str>, payload: &WebhookPayload) -> anyhow::Result<()> {
        let body = serde_json::to_string(payload)?;
        log::info!("webhook -> {}: {body}", target.unwrap_or("<default>"));
        Ok(())
    }
}

/// Keeps delivered payloads in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    delivered: Arc<Mutex<Vec<WebhookPayload>>>,
}

impl MemorySink {
    pub fn delivered(&self) -> Vec<WebhookPayload> {
        self.delivered.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.delivered.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WebhookSink for MemorySink {
    fn deliver(&mut self, _target: Option<&str>, payload: &WebhookPayload) -> anyhow::Result<()> {
        self.delivered.lock().push(payload.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Owns the thread that drains the notification queue.
#[derive(Debug)]
pub struct DeliveryWorker {
    handle: JoinHandle<DeliveryStats>,
}

impl DeliveryWorker {
    /// Start a worker with a queue of `capacity` payloads.
    /// Returns the worker and a notifier feeding it.
    pub fn spawn<S: WebhookSink>(capacity: usize, sink: S) -> RiskResult<(Self, ChannelNotifier)> {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        let handle = thread::Builder::new()
            .name("webhook-delivery".to_string())
            .spawn(move || drain(receiver, sink))
            .map_err(|e| anyhow::anyhow!("Cannot spawn webhook delivery thread: {e}"))?;

        let notifier = ChannelNotifier {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        Ok((Self { handle }, notifier))
    }

    pub fn from_config<S: WebhookSink>(
        config: &RiskConfig,
        sink: S,
    ) -> RiskResult<(Self, ChannelNotifier)> {
        Self::spawn(config.notification_queue, sink)
    }

    /// Wait for the queue to drain. Returns once every notifier clone
    /// has been dropped and all queued payloads were handled.
    pub fn shutdown(self) -> DeliveryStats {
        self.handle.join().unwrap_or_else(|_| {
            log::warn!("notification: delivery worker panicked");
            DeliveryStats::default()
        })
    }
}

fn drain<S: WebhookSink>(receiver: Receiver<WebhookPayload>, mut sink: S) -> DeliveryStats {
    let mut stats = DeliveryStats::default();
    for payload in receiver {
        match sink.deliver(payload.target.as_deref(), &payload) {
            Ok(()) => stats.delivered += 1,
            Err(e) => {
                stats.failed += 1;
                log::warn!("notification: delivery of '{}' failed: {e}", payload.event);
            }
        }
    }
    log::debug!(
        "notification: worker stopped, delivered={} failed={}",
        stats.delivered,
        stats.failed
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl WebhookSink for FailingSink {
        fn deliver(&mut self, _: Option<&str>, _: &WebhookPayload) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    #[test]
    fn worker_delivers_everything_queued() {
        let sink = MemorySink::default();
        let (worker, notifier) = DeliveryWorker::spawn(16, sink.clone()).expect("spawn");
        for i in 0..5 {
            notifier.notify(WebhookPayload::new("balance.monitor", serde_json::json!({ "n": i })));
        }
        drop(notifier);

        let stats = worker.shutdown();
        assert_eq!(stats, DeliveryStats { delivered: 5, failed: 0 });
        assert_eq!(sink.len(), 5);
    }

    #[test]
    fn failures_are_counted_not_retried() {
        let (worker, notifier) = DeliveryWorker::spawn(4, FailingSink).expect("spawn");
        notifier.notify(WebhookPayload::new("balance.monitor", serde_json::Value::Null));
        notifier.notify(WebhookPayload::new("balance.monitor", serde_json::Value::Null));
        drop(notifier);

        let stats = worker.shutdown();
        assert_eq!(stats, DeliveryStats { delivered: 0, failed: 2 });
    }

    #[test]
    fn notify_after_worker_gone_drops_without_blocking() {
        let (sender, receiver) = mpsc::sync_channel(1);
        drop(receiver);
        let notifier = ChannelNotifier {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        notifier.notify(WebhookPayload::new("balance.monitor", serde_json::Value::Null));
        assert_eq!(notifier.dropped(), 1);
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let (sender, _receiver) = mpsc::sync_channel(1);
        let notifier = ChannelNotifier {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        notifier.notify(WebhookPayload::new("a", serde_json::Value::Null));
        notifier.notify(WebhookPayload::new("b", serde_json::Value::Null));
        assert_eq!(notifier.dropped(), 1);
    }

    #[test]
    fn body_has_event_and_data_only() {
        let mut payload = WebhookPayload::new("balance.monitor", serde_json::json!({ "k": 1 }));
        payload.target = Some("https://example.test/hook".into());
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json, serde_json::json!({ "event": "balance.monitor", "data": { "k": 1 } }));
    }
}
