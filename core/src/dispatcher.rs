//! Monitor evaluation and alert dispatch.
//!
//! For every balance update:
//!   1. Fetch the monitors watching the balance (fetch errors count as none)
//!   2. Evaluate each monitor's condition against the new snapshot
//!   3. Submit one `balance.monitor` webhook per satisfied monitor
//!
//! Submission is fire-and-forget. Nothing here retries or deduplicates.

use crate::{
    balance::Balance,
    config::DEFAULT_MONITOR_EVENT,
    datasource::Datasource,
    notification::{Notifier, WebhookPayload},
};
use std::sync::Arc;

pub struct MonitorDispatcher {
    datasource: Arc<dyn Datasource>,
    notifier: Arc<dyn Notifier>,
    event: String,
}

impl MonitorDispatcher {
    pub fn new(datasource: Arc<dyn Datasource>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            datasource,
            notifier,
            event: DEFAULT_MONITOR_EVENT.to_string(),
        }
    }

    /// Override the event name carried by every payload.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Check every monitor on `updated` and notify for those that hold.
    /// Returns how many notifications were submitted.
    pub fn check_monitors(&self, updated: &Balance) -> usize {
        let monitors = match self.datasource.get_balance_monitors(&updated.balance_id) {
            Ok(monitors) => monitors,
            Err(e) => {
                log::warn!(
                    "monitors: fetch failed for balance {}, skipping checks: {e}",
                    updated.balance_id
                );
                Vec::new()
            }
        };

        let mut submitted = 0;
        for monitor in monitors.iter().filter(|m| m.check_condition(updated)) {
            log::info!(
                "monitors: condition met for monitor {} on balance {} ({})",
                monitor.monitor_id,
                updated.balance_id,
                monitor.condition
            );

            match WebhookPayload::for_monitor(&self.event, monitor) {
                Ok(payload) => {
                    self.notifier.notify(payload);
                    submitted += 1;
                }
                Err(e) => {
                    log::warn!("monitors: cannot encode monitor {}: {e}", monitor.monitor_id);
                }
            }
        }
        submitted
    }
}
