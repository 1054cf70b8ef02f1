//! The risk engine: the entry point the posting pipeline calls.
//!
//! After a balance is committed the caller runs two independent paths:
//!   - `apply_fraud_score`:      tracker -> fraud score engine
//!   - `check_balance_monitors`: datasource -> conditions -> notifier
//!
//! `on_balance_committed` runs both at once. Their relative completion
//! order is unspecified.
//!
//! The CRUD methods forward to the datasource and return its errors as-is.

use crate::{
    balance::Balance,
    config::RiskConfig,
    datasource::Datasource,
    dispatcher::MonitorDispatcher,
    error::RiskResult,
    monitor::BalanceMonitor,
    notification::Notifier,
    tracker::BalanceTracker,
};
use std::{sync::Arc, thread};

pub struct RiskEngine {
    datasource: Arc<dyn Datasource>,
    tracker: Arc<BalanceTracker>,
    dispatcher: MonitorDispatcher,
}

impl RiskEngine {
    pub fn new(
        datasource: Arc<dyn Datasource>,
        tracker: Arc<BalanceTracker>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let dispatcher = MonitorDispatcher::new(Arc::clone(&datasource), notifier);
        Self {
            datasource,
            tracker,
            dispatcher,
        }
    }

    /// Build a fully wired engine from config.
    /// Call this instead of constructing the tracker by hand.
    pub fn build(
        config: &RiskConfig,
        datasource: Arc<dyn Datasource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let tracker = match config.tracker_capacity {
            Some(cap) => BalanceTracker::with_capacity(config.score_model, cap),
            None => BalanceTracker::new(config.score_model),
        };
        let dispatcher = MonitorDispatcher::new(Arc::clone(&datasource), notifier)
            .with_event(config.monitor_event.clone());
        Self {
            datasource,
            tracker: Arc::new(tracker),
            dispatcher,
        }
    }

    pub fn tracker(&self) -> &Arc<BalanceTracker> {
        &self.tracker
    }

    // ── Scoring and alerting ───────────────────────────────────

    /// Record the new snapshot and return its fraud score in [0, 1].
    pub fn apply_fraud_score(&self, new_balance: &Balance, amount: i64) -> f64 {
        self.tracker.apply(new_balance, amount)
    }

    /// Evaluate the balance's monitors and notify for each one that holds.
    pub fn check_balance_monitors(&self, updated: &Balance) -> usize {
        self.dispatcher.check_monitors(updated)
    }

    /// Score and check monitors concurrently. Returns the score.
    pub fn on_balance_committed(&self, balance: &Balance, amount: i64) -> f64 {
        thread::scope(|s| {
            let monitors = s.spawn(|| self.check_balance_monitors(balance));
            let score = self.apply_fraud_score(balance, amount);
            if monitors.join().is_err() {
                log::warn!("engine: monitor check panicked for balance {}", balance.balance_id);
            }
            score
        })
    }

    // ── Balances ───────────────────────────────────────────────

    pub fn create_balance(&self, balance: Balance) -> RiskResult<Balance> {
        self.datasource.create_balance(balance)
    }

    pub fn get_balance_by_id(&self, id: &str, include: &[&str]) -> RiskResult<Balance> {
        self.datasource.get_balance_by_id(id, include)
    }

    pub fn get_all_balances(&self) -> RiskResult<Vec<Balance>> {
        self.datasource.get_all_balances()
    }

    // ── Monitors ───────────────────────────────────────────────

    pub fn create_monitor(&self, monitor: BalanceMonitor) -> RiskResult<BalanceMonitor> {
        self.datasource.create_monitor(monitor)
    }

    pub fn get_monitor_by_id(&self, id: &str) -> RiskResult<BalanceMonitor> {
        self.datasource.get_monitor_by_id(id)
    }

    pub fn get_all_monitors(&self) -> RiskResult<Vec<BalanceMonitor>> {
        self.datasource.get_all_monitors()
    }

    pub fn get_balance_monitors(&self, balance_id: &str) -> RiskResult<Vec<BalanceMonitor>> {
        self.datasource.get_balance_monitors(balance_id)
    }

    pub fn update_monitor(&self, monitor: &BalanceMonitor) -> RiskResult<()> {
        self.datasource.update_monitor(monitor)
    }

    pub fn delete_monitor(&self, id: &str) -> RiskResult<()> {
        self.datasource.delete_monitor(id)
    }
}
