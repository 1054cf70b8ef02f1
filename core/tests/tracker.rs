//! Balance tracker: change frequency, atomicity under concurrency, eviction.

use ledger_risk_core::{
    balance::Balance,
    fraud_score::{compute_fraud_score, FraudScoreModel},
    tracker::BalanceTracker,
};
use std::{sync::Arc, thread};

fn account(id: &str, balance: i64, credit: i64, debit: i64) -> Balance {
    let mut b = Balance::new("ldg_test", "USD").with_amounts(balance, credit, debit);
    b.balance_id = id.to_string();
    b
}

/// First sighting never increments; credit/debit changes do; net-only changes don't.
#[test]
fn frequency_counts_only_credit_or_debit_changes() {
    let tracker = BalanceTracker::default();

    tracker.apply(&account("bln_a", 100, 100, 0), 100);
    assert_eq!(tracker.frequency("bln_a"), 0, "first observation must not count");

    tracker.apply(&account("bln_a", 150, 150, 0), 50);
    assert_eq!(tracker.frequency("bln_a"), 1);

    tracker.apply(&account("bln_a", 175, 150, 0), 0);
    assert_eq!(tracker.frequency("bln_a"), 1, "net-only change must not count");

    tracker.apply(&account("bln_a", 120, 150, 30), 30);
    assert_eq!(tracker.frequency("bln_a"), 2);
}

/// The stored snapshot is always the latest one, changed or not.
#[test]
fn snapshot_is_replaced_unconditionally() {
    let tracker = BalanceTracker::default();
    tracker.apply(&account("bln_a", 1, 1, 0), 1);
    tracker.apply(&account("bln_a", 9, 1, 0), 0);

    let snap = tracker.snapshot("bln_a").expect("tracked");
    assert_eq!(snap.balance, 9);
    assert!(tracker.snapshot("bln_unknown").is_none());
    assert_eq!(tracker.frequency("bln_unknown"), 0);
}

/// The returned score is the model applied to the frequency after this update.
#[test]
fn score_uses_post_update_frequency() {
    let tracker = BalanceTracker::default();
    tracker.apply(&account("bln_a", 0, 0, 0), 0);
    let score = tracker.apply(&account("bln_a", 40_000, 50_000, 10_000), 50_000);

    let expected = compute_fraud_score(1.0, 50_000.0, 40_000.0, 50_000.0, 10_000.0);
    assert!(
        (score - expected).abs() < 1e-12,
        "Expected {expected}, got {score}"
    );
}

/// Accounts are tracked independently.
#[test]
fn accounts_do_not_share_counters() {
    let tracker = BalanceTracker::default();
    tracker.apply(&account("bln_a", 0, 0, 0), 0);
    tracker.apply(&account("bln_b", 0, 0, 0), 0);
    tracker.apply(&account("bln_a", 5, 5, 0), 5);

    assert_eq!(tracker.frequency("bln_a"), 1);
    assert_eq!(tracker.frequency("bln_b"), 0);
    assert_eq!(tracker.len(), 2);
}

/// Many threads posting distinct credits to one account lose no increments.
#[test]
fn concurrent_updates_on_one_account_are_not_lost() {
    const THREADS: i64 = 8;
    const PER_THREAD: i64 = 250;

    let tracker = Arc::new(BalanceTracker::default());
    tracker.apply(&account("bln_hot", 0, 0, 0), 0);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    // Unique credit per call, so every call differs from
                    // whatever snapshot precedes it in commit order.
                    let credit = 1 + t * PER_THREAD + i;
                    let score = tracker.apply(&account("bln_hot", credit, credit, 0), 1);
                    assert!((0.0..=1.0).contains(&score), "score {score} out of bounds");
                }
            })
        })
        .collect();

    for h in handles {
        h.join().expect("worker thread");
    }

    let expected = (THREADS * PER_THREAD) as u64;
    assert_eq!(
        tracker.frequency("bln_hot"),
        expected,
        "every credit-changing update must be counted exactly once"
    );
}

/// Concurrent updates across many accounts keep per-account counts exact.
#[test]
fn concurrent_updates_across_accounts() {
    const ACCOUNTS: usize = 16;
    const UPDATES: i64 = 100;

    let tracker = Arc::new(BalanceTracker::default());
    let handles: Vec<_> = (0..ACCOUNTS)
        .map(|a| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                let id = format!("bln_{a}");
                for i in 0..UPDATES {
                    tracker.apply(&account(&id, 0, 0, i), i);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("worker thread");
    }

    for a in 0..ACCOUNTS {
        let id = format!("bln_{a}");
        assert_eq!(
            tracker.frequency(&id),
            (UPDATES - 1) as u64,
            "{id}: first update is a sighting, the rest are changes"
        );
    }
}

/// A bounded tracker evicts the least recently updated account, which
/// then starts over as a first sighting.
#[test]
fn bounded_tracker_evicts_and_forgets() {
    let tracker = BalanceTracker::with_capacity(FraudScoreModel::default(), 2);
    tracker.apply(&account("bln_a", 0, 0, 0), 0);
    tracker.apply(&account("bln_a", 1, 1, 0), 1);
    tracker.apply(&account("bln_b", 0, 0, 0), 0);
    tracker.apply(&account("bln_c", 0, 0, 0), 0);

    assert_eq!(tracker.len(), 2);
    assert!(tracker.snapshot("bln_a").is_none(), "oldest account should be evicted");
    assert_eq!(tracker.frequency("bln_a"), 0, "counter goes with the snapshot");

    tracker.apply(&account("bln_a", 2, 2, 0), 1);
    assert_eq!(tracker.frequency("bln_a"), 0, "returning account is a first sighting");
}
