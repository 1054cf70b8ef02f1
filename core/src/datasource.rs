//! Storage capability for balances and monitors.
//!
//! RULE: the risk core never talks to a database directly. It goes
//! through this trait. `SqliteStore` is the bundled implementation.

use crate::{
    balance::Balance,
    error::RiskResult,
    monitor::BalanceMonitor,
};

/// Include-list value that attaches a balance's monitors.
pub const INCLUDE_MONITORS: &str = "monitors";

pub trait Datasource: Send + Sync {
    // ── Balances ───────────────────────────────────────────────

    /// Persist a new balance. An empty id is replaced with a generated one.
    fn create_balance(&self, balance: Balance) -> RiskResult<Balance>;

    /// Fetch one balance. `include` names optional relations to attach.
    fn get_balance_by_id(&self, id: &str, include: &[&str]) -> RiskResult<Balance>;

    fn get_all_balances(&self) -> RiskResult<Vec<Balance>>;

    // ── Monitors ───────────────────────────────────────────────

    /// Persist a new monitor. An empty id is replaced with a generated one.
    fn create_monitor(&self, monitor: BalanceMonitor) -> RiskResult<BalanceMonitor>;

    fn get_monitor_by_id(&self, id: &str) -> RiskResult<BalanceMonitor>;

    fn get_all_monitors(&self) -> RiskResult<Vec<BalanceMonitor>>;

    /// Every monitor watching `balance_id`.
    fn get_balance_monitors(&self, balance_id: &str) -> RiskResult<Vec<BalanceMonitor>>;

    fn update_monitor(&self, monitor: &BalanceMonitor) -> RiskResult<()>;

    fn delete_monitor(&self, id: &str) -> RiskResult<()>;
}
