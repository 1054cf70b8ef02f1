//! Balance tracker: last-seen snapshot and change frequency per account.
//!
//! RULE: both maps are read and written only while holding `state`.
//! The read-check-increment-write sequence in `apply` is one critical
//! section. Scoring runs after the lock is released, on values captured
//! inside it.
//!
//! State is volatile. It starts empty and is never persisted.

use crate::{
    balance::Balance,
    fraud_score::{FraudFeatures, FraudScoreModel},
    types::BalanceId,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct TrackerState {
    balances: HashMap<BalanceId, Balance>,
    frequencies: HashMap<BalanceId, u64>,
    // Recency index for eviction: stamp -> account, account -> stamp.
    recency: BTreeMap<u64, BalanceId>,
    stamps: HashMap<BalanceId, u64>,
    next_stamp: u64,
}

impl TrackerState {
    fn observe(
        &mut self,
        new_balance: &Balance,
        amount: i64,
        capacity: Option<usize>,
    ) -> FraudFeatures {
        let id = &new_balance.balance_id;

        let changed = match self.balances.get(id) {
            Some(old) => old.credit_or_debit_changed(new_balance),
            None => {
                if let Some(cap) = capacity {
                    while self.balances.len() >= cap {
                        if !self.evict_oldest() {
                            break;
                        }
                    }
                }
                false
            }
        };

        if changed {
            *self.frequencies.entry(id.clone()).or_insert(0) += 1;
        }

        let mut snapshot = new_balance.clone();
        snapshot.monitors.clear();
        self.balances.insert(id.clone(), snapshot);
        self.touch(id);

        FraudFeatures {
            change_frequency: self.frequencies.get(id).copied().unwrap_or(0) as f64,
            transaction_amount: amount as f64,
            current_balance: new_balance.balance as f64,
            credit_balance: new_balance.credit_balance as f64,
            debit_balance: new_balance.debit_balance as f64,
        }
    }

    fn touch(&mut self, id: &BalanceId) {
        if let Some(old) = self.stamps.remove(id) {
            self.recency.remove(&old);
        }
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.recency.insert(stamp, id.clone());
        self.stamps.insert(id.clone(), stamp);
    }

    fn evict_oldest(&mut self) -> bool {
        let Some((_, id)) = self.recency.pop_first() else {
            return false;
        };
        self.stamps.remove(&id);
        self.balances.remove(&id);
        self.frequencies.remove(&id);
        log::debug!("tracker: evicted least recently updated balance {id}");
        true
    }
}

/// Process-lifetime cache of balance state. Share it through `Arc`.
#[derive(Debug)]
pub struct BalanceTracker {
    state: Mutex<TrackerState>,
    model: FraudScoreModel,
    capacity: Option<usize>,
}

impl Default for BalanceTracker {
    fn default() -> Self {
        Self::new(FraudScoreModel::default())
    }
}

impl BalanceTracker {
    /// Unbounded tracker.
    pub fn new(model: FraudScoreModel) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            model,
            capacity: None,
        }
    }

    /// Tracker holding at most `capacity` accounts. Inserting a new
    /// account at capacity evicts the least recently updated one.
    pub fn with_capacity(model: FraudScoreModel, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new(model)
        }
    }

    /// Record `new_balance` and return its fraud score in [0, 1].
    ///
    /// The frequency counter increments only when a prior snapshot exists
    /// and its credit or debit differs from `new_balance`. The first
    /// observation of an account never increments.
    pub fn apply(&self, new_balance: &Balance, amount: i64) -> f64 {
        let features = {
            let mut state = self.state.lock();
            state.observe(new_balance, amount, self.capacity)
        };
        self.model.score(&features)
    }

    pub fn frequency(&self, balance_id: &str) -> u64 {
        self.state
            .lock()
            .frequencies
            .get(balance_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn snapshot(&self, balance_id: &str) -> Option<Balance> {
        self.state.lock().balances.get(balance_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn model(&self) -> &FraudScoreModel {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str) -> Balance {
        let mut b = Balance::new("ldg_1", "USD");
        b.balance_id = id.to_string();
        b
    }

    #[test]
    fn recency_follows_updates() {
        let tracker = BalanceTracker::with_capacity(FraudScoreModel::default(), 2);
        tracker.apply(&account("a"), 0);
        tracker.apply(&account("b"), 0);
        // touching "a" makes "b" the oldest
        tracker.apply(&account("a").with_amounts(1, 1, 0), 1);
        tracker.apply(&account("c"), 0);

        assert!(tracker.snapshot("a").is_some());
        assert!(tracker.snapshot("b").is_none());
        assert!(tracker.snapshot("c").is_some());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn snapshot_drops_attached_monitors() {
        use crate::monitor::{AlertCondition, BalanceField, BalanceMonitor, Operator};

        let mut b = account("a");
        b.monitors.push(BalanceMonitor::new(
            "a",
            AlertCondition {
                field: BalanceField::Balance,
                operator: Operator::GreaterThan,
                value: 0,
            },
        ));
        let tracker = BalanceTracker::default();
        tracker.apply(&b, 0);
        assert!(tracker.snapshot("a").expect("tracked").monitors.is_empty());
    }
}
