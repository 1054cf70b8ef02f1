//! Balance monitors and their alert conditions.
//!
//! A monitor watches one balance. Its condition is evaluated against
//! every new snapshot of that balance; when it holds, the dispatcher
//! emits a webhook carrying the monitor record.

use crate::{
    balance::Balance,
    error::{RiskError, RiskResult},
    types::{BalanceId, MinorUnits, MonitorId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const MONITOR_ID_PREFIX: &str = "mon_";

/// Capability to decide whether a balance satisfies a rule.
pub trait Condition {
    fn check(&self, balance: &Balance) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceField {
    Balance,
    CreditBalance,
    DebitBalance,
}

impl BalanceField {
    pub fn read(&self, balance: &Balance) -> MinorUnits {
        match self {
            Self::Balance => balance.balance,
            Self::CreditBalance => balance.credit_balance,
            Self::DebitBalance => balance.debit_balance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::CreditBalance => "credit_balance",
            Self::DebitBalance => "debit_balance",
        }
    }
}

impl FromStr for BalanceField {
    type Err = RiskError;

    fn from_str(s: &str) -> RiskResult<Self> {
        match s {
            "balance" => Ok(Self::Balance),
            "credit_balance" => Ok(Self::CreditBalance),
            "debit_balance" => Ok(Self::DebitBalance),
            other => Err(anyhow::anyhow!("unknown balance field '{other}'").into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Operator {
    pub fn apply(&self, lhs: MinorUnits, rhs: MinorUnits) -> bool {
        match self {
            Self::GreaterThan => lhs > rhs,
            Self::LessThan => lhs < rhs,
            Self::GreaterThanOrEqual => lhs >= rhs,
            Self::LessThanOrEqual => lhs <= rhs,
            Self::Equal => lhs == rhs,
            Self::NotEqual => lhs != rhs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThanOrEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }
}

impl FromStr for Operator {
    type Err = RiskError;

    fn from_str(s: &str) -> RiskResult<Self> {
        match s {
            ">" => Ok(Self::GreaterThan),
            "<" => Ok(Self::LessThan),
            ">=" => Ok(Self::GreaterThanOrEqual),
            "<=" => Ok(Self::LessThanOrEqual),
            "==" => Ok(Self::Equal),
            "!=" => Ok(Self::NotEqual),
            other => Err(anyhow::anyhow!("unknown operator '{other}'").into()),
        }
    }
}

/// Threshold rule: `<field> <operator> <value>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCondition {
    pub field: BalanceField,
    pub operator: Operator,
    pub value: MinorUnits,
}

impl Condition for AlertCondition {
    fn check(&self, balance: &Balance) -> bool {
        self.operator.apply(self.field.read(balance), self.value)
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field.as_str(), self.operator.as_str(), self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceMonitor {
    #[serde(default)]
    pub monitor_id: MonitorId,
    pub balance_id: BalanceId,
    pub condition: AlertCondition,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_back_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl BalanceMonitor {
    /// A fresh, unsaved monitor. The store assigns the id on create.
    pub fn new(balance_id: impl Into<BalanceId>, condition: AlertCondition) -> Self {
        Self {
            monitor_id: String::new(),
            balance_id: balance_id.into(),
            condition,
            description: String::new(),
            call_back_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_call_back_url(mut self, url: impl Into<String>) -> Self {
        self.call_back_url = Some(url.into());
        self
    }

    pub fn check_condition(&self, balance: &Balance) -> bool {
        self.condition.check(balance)
    }
}
