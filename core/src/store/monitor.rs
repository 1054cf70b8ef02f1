use super::{parse_column, timestamp_from_sql, timestamp_to_sql, SqliteStore};
use crate::{
    error::RiskResult,
    monitor::{AlertCondition, BalanceMonitor, MONITOR_ID_PREFIX},
};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const MONITOR_COLUMNS: &str =
    "monitor_id, balance_id, field, operator, value, description, call_back_url, created_at";

impl SqliteStore {
    // ── Monitor ───────────────────────────────────────────────────

    pub(crate) fn insert_monitor(&self, mut monitor: BalanceMonitor) -> RiskResult<BalanceMonitor> {
        if monitor.monitor_id.is_empty() {
            monitor.monitor_id = format!("{MONITOR_ID_PREFIX}{}", Uuid::new_v4());
        }

        self.conn.lock().execute(
            "INSERT INTO balance_monitor
                (monitor_id, balance_id, field, operator, value, description, call_back_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                monitor.monitor_id,
                monitor.balance_id,
                monitor.condition.field.as_str(),
                monitor.condition.operator.as_str(),
                monitor.condition.value,
                monitor.description,
                monitor.call_back_url,
                timestamp_to_sql(&monitor.created_at),
            ],
        )?;
        Ok(monitor)
    }

    pub(crate) fn monitor_by_id(&self, monitor_id: &str) -> RiskResult<Option<BalanceMonitor>> {
        let conn = self.conn.lock();
        let monitor = conn
            .query_row(
                &format!("SELECT {MONITOR_COLUMNS} FROM balance_monitor WHERE monitor_id = ?1"),
                params![monitor_id],
                monitor_from_row,
            )
            .optional()?;
        Ok(monitor)
    }

    pub(crate) fn all_monitors(&self) -> RiskResult<Vec<BalanceMonitor>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MONITOR_COLUMNS} FROM balance_monitor ORDER BY created_at ASC, monitor_id ASC"
        ))?;
        let rows = stmt.query_map([], monitor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub(crate) fn monitors_for_balance(&self, balance_id: &str) -> RiskResult<Vec<BalanceMonitor>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MONITOR_COLUMNS} FROM balance_monitor
             WHERE balance_id = ?1
             ORDER BY created_at ASC, monitor_id ASC"
        ))?;
        let rows = stmt.query_map(params![balance_id], monitor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Returns the number of rows changed (0 when the monitor is unknown).
    pub(crate) fn replace_monitor(&self, monitor: &BalanceMonitor) -> RiskResult<usize> {
        let changed = self.conn.lock().execute(
            "UPDATE balance_monitor
             SET balance_id = ?2, field = ?3, operator = ?4, value = ?5,
                 description = ?6, call_back_url = ?7
             WHERE monitor_id = ?1",
            params![
                monitor.monitor_id,
                monitor.balance_id,
                monitor.condition.field.as_str(),
                monitor.condition.operator.as_str(),
                monitor.condition.value,
                monitor.description,
                monitor.call_back_url,
            ],
        )?;
        Ok(changed)
    }

    pub(crate) fn remove_monitor(&self, monitor_id: &str) -> RiskResult<usize> {
        let changed = self.conn.lock().execute(
            "DELETE FROM balance_monitor WHERE monitor_id = ?1",
            params![monitor_id],
        )?;
        Ok(changed)
    }
}

fn monitor_from_row(row: &Row<'_>) -> rusqlite::Result<BalanceMonitor> {
    let field: String = row.get(2)?;
    let operator: String = row.get(3)?;
    let created_at: String = row.get(7)?;
    Ok(BalanceMonitor {
        monitor_id: row.get(0)?,
        balance_id: row.get(1)?,
        condition: AlertCondition {
            field: parse_column(2, &field)?,
            operator: parse_column(3, &operator)?,
            value: row.get(4)?,
        },
        description: row.get(5)?,
        call_back_url: row.get(6)?,
        created_at: timestamp_from_sql(7, &created_at)?,
    })
}
