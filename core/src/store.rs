//! SQLite persistence layer.
//!
//! RULE: Only store.rs and store/*.rs talk to the database.
//! Everything else goes through the `Datasource` trait.

mod balance;
mod monitor;

use crate::{
    balance::Balance,
    datasource::Datasource,
    error::{RiskError, RiskResult},
    monitor::BalanceMonitor,
};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{types::Type, Connection};

pub struct SqliteStore {
    // rusqlite connections are Send but not Sync.
    conn: Mutex<Connection>,
    path: Option<String>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> RiskResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> RiskResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// In-memory store with the schema applied.
    pub fn in_memory_migrated() -> RiskResult<Self> {
        let store = Self::in_memory()?;
        store.migrate()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> RiskResult<()> {
        let conn = self.conn.lock();
        conn.execute_batch(include_str!("../../migrations/001_balances.sql"))?;
        conn.execute_batch(include_str!("../../migrations/002_monitors.sql"))?;
        Ok(())
    }
}

impl Datasource for SqliteStore {
    fn create_balance(&self, balance: Balance) -> RiskResult<Balance> {
        self.insert_balance(balance)
    }

    fn get_balance_by_id(&self, id: &str, include: &[&str]) -> RiskResult<Balance> {
        let mut balance = self
            .balance_by_id(id)?
            .ok_or_else(|| RiskError::balance_not_found(id))?;
        if include.contains(&crate::datasource::INCLUDE_MONITORS) {
            balance.monitors = self.monitors_for_balance(id)?;
        }
        Ok(balance)
    }

    fn get_all_balances(&self) -> RiskResult<Vec<Balance>> {
        self.all_balances()
    }

    fn create_monitor(&self, monitor: BalanceMonitor) -> RiskResult<BalanceMonitor> {
        self.insert_monitor(monitor)
    }

    fn get_monitor_by_id(&self, id: &str) -> RiskResult<BalanceMonitor> {
        self.monitor_by_id(id)?
            .ok_or_else(|| RiskError::monitor_not_found(id))
    }

    fn get_all_monitors(&self) -> RiskResult<Vec<BalanceMonitor>> {
        self.all_monitors()
    }

    fn get_balance_monitors(&self, balance_id: &str) -> RiskResult<Vec<BalanceMonitor>> {
        self.monitors_for_balance(balance_id)
    }

    fn update_monitor(&self, monitor: &BalanceMonitor) -> RiskResult<()> {
        if self.replace_monitor(monitor)? == 0 {
            return Err(RiskError::monitor_not_found(&monitor.monitor_id));
        }
        Ok(())
    }

    fn delete_monitor(&self, id: &str) -> RiskResult<()> {
        if self.remove_monitor(id)? == 0 {
            return Err(RiskError::monitor_not_found(id));
        }
        Ok(())
    }
}

// ── Column helpers ─────────────────────────────────────────────

fn timestamp_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn timestamp_from_sql(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_column<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = RiskError>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
