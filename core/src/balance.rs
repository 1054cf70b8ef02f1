//! Ledger balance snapshot.
//!
//! Balances are owned by the ledger posting pipeline. This crate only
//! observes whole replacement snapshots of them.

use crate::{
    monitor::BalanceMonitor,
    types::{BalanceId, LedgerId, MinorUnits},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const BALANCE_ID_PREFIX: &str = "bln_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default)]
    pub balance_id: BalanceId,
    #[serde(default)]
    pub ledger_id: LedgerId,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub balance: MinorUnits,
    #[serde(default)]
    pub credit_balance: MinorUnits,
    #[serde(default)]
    pub debit_balance: MinorUnits,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Attached only when requested through the include list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub monitors: Vec<BalanceMonitor>,
}

impl Balance {
    /// A fresh, unsaved balance. The store assigns the id on create.
    pub fn new(ledger_id: impl Into<LedgerId>, currency: impl Into<String>) -> Self {
        Self {
            balance_id: String::new(),
            ledger_id: ledger_id.into(),
            currency: currency.into(),
            balance: 0,
            credit_balance: 0,
            debit_balance: 0,
            created_at: Utc::now(),
            monitors: Vec::new(),
        }
    }

    /// Snapshot with the given amounts, keeping identity fields.
    pub fn with_amounts(
        &self,
        balance: MinorUnits,
        credit_balance: MinorUnits,
        debit_balance: MinorUnits,
    ) -> Self {
        Self {
            balance,
            credit_balance,
            debit_balance,
            ..self.clone()
        }
    }

    /// Apply a posting: positive amounts credit, negative amounts debit.
    /// Net balance is always credit minus debit.
    pub fn post(&self, amount: MinorUnits) -> Self {
        let (credit, debit) = if amount >= 0 {
            (self.credit_balance + amount, self.debit_balance)
        } else {
            (self.credit_balance, self.debit_balance + amount.abs())
        };
        self.with_amounts(credit - debit, credit, debit)
    }

    /// True when credit or debit differ. The net field is ignored.
    pub fn credit_or_debit_changed(&self, other: &Balance) -> bool {
        self.credit_balance != other.credit_balance || self.debit_balance != other.debit_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_credit_and_debit() {
        let b = Balance::new("ldg_1", "USD").post(500).post(-200);
        assert_eq!(b.credit_balance, 500);
        assert_eq!(b.debit_balance, 200);
        assert_eq!(b.balance, 300);
    }

    #[test]
    fn net_only_change_is_not_a_change() {
        let a = Balance::new("ldg_1", "USD").with_amounts(10, 100, 0);
        let b = a.with_amounts(99, 100, 0);
        assert!(!a.credit_or_debit_changed(&b));
        assert!(a.credit_or_debit_changed(&a.with_amounts(10, 100, 1)));
    }

    #[test]
    fn monitors_omitted_from_json_when_empty() {
        let json = serde_json::to_value(Balance::new("ldg_1", "USD")).expect("serialize");
        assert!(json.get("monitors").is_none());
        assert_eq!(json["currency"], "USD");
    }
}
