use super::{timestamp_from_sql, timestamp_to_sql, SqliteStore};
use crate::{
    balance::{Balance, BALANCE_ID_PREFIX},
    error::RiskResult,
};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const BALANCE_COLUMNS: &str =
    "balance_id, ledger_id, currency, balance, credit_balance, debit_balance, created_at";

impl SqliteStore {
    // ── Balance ───────────────────────────────────────────────────

    pub(crate) fn insert_balance(&self, mut balance: Balance) -> RiskResult<Balance> {
        if balance.balance_id.is_empty() {
            balance.balance_id = format!("{BALANCE_ID_PREFIX}{}", Uuid::new_v4());
        }
        balance.monitors.clear();

        self.conn.lock().execute(
            "INSERT INTO balance (balance_id, ledger_id, currency, balance, credit_balance, debit_balance, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                balance.balance_id,
                balance.ledger_id,
                balance.currency,
                balance.balance,
                balance.credit_balance,
                balance.debit_balance,
                timestamp_to_sql(&balance.created_at),
            ],
        )?;
        Ok(balance)
    }

    pub(crate) fn balance_by_id(&self, balance_id: &str) -> RiskResult<Option<Balance>> {
        let conn = self.conn.lock();
        let balance = conn
            .query_row(
                &format!("SELECT {BALANCE_COLUMNS} FROM balance WHERE balance_id = ?1"),
                params![balance_id],
                balance_from_row,
            )
            .optional()?;
        Ok(balance)
    }

    pub(crate) fn all_balances(&self) -> RiskResult<Vec<Balance>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {BALANCE_COLUMNS} FROM balance ORDER BY created_at ASC, balance_id ASC"
        ))?;
        let rows = stmt.query_map([], balance_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn balance_from_row(row: &Row<'_>) -> rusqlite::Result<Balance> {
    let created_at: String = row.get(6)?;
    Ok(Balance {
        balance_id: row.get(0)?,
        ledger_id: row.get(1)?,
        currency: row.get(2)?,
        balance: row.get(3)?,
        credit_balance: row.get(4)?,
        debit_balance: row.get(5)?,
        created_at: timestamp_from_sql(6, &created_at)?,
        monitors: Vec::new(),
    })
}
