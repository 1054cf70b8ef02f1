//! Shared primitive types used across the risk core.

/// Stable, unique identifier of a ledger balance (`bln_…`).
pub type BalanceId = String;

/// Stable, unique identifier of a balance monitor (`mon_…`).
pub type MonitorId = String;

/// Identifier of the ledger a balance belongs to.
pub type LedgerId = String;

/// Amounts are integers in minor currency units.
pub type MinorUnits = i64;
