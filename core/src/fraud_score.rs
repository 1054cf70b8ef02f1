//! Fraud score engine.
//!
//! Five raw features are linearly normalized against fixed caps and
//! combined with fixed weights. Only the composite is clamped to [0, 1];
//! a single feature above its cap can dominate before the final clamp.
//!
//! PRECONDITION: every cap must be > 0. A zero cap yields NaN or infinity.

use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

pub const MAX_CHANGE_FREQUENCY: f64 = 10.0;
pub const MAX_TRANSACTION_AMOUNT: f64 = 100_000.0;
pub const MAX_BALANCE: f64 = 500_000.0;
pub const MAX_CREDIT_BALANCE: f64 = 1_000_000.0;
pub const MAX_DEBIT_BALANCE: f64 = 700_000.0;

// Weights sum to 1.
pub const WEIGHT_CHANGE_FREQUENCY: f64 = 0.3;
pub const WEIGHT_TRANSACTION_AMOUNT: f64 = 0.3;
pub const WEIGHT_BALANCE: f64 = 0.1;
pub const WEIGHT_CREDIT_BALANCE: f64 = 0.1;
pub const WEIGHT_DEBIT_BALANCE: f64 = 0.2;

// ── Data Structures ──────────────────────────────────────────────────────────

/// The five raw inputs to the model, captured from one tracker snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FraudFeatures {
    pub change_frequency: f64,
    pub transaction_amount: f64,
    pub current_balance: f64,
    pub credit_balance: f64,
    pub debit_balance: f64,
}

/// One value per feature. Used for both caps and weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub change_frequency: f64,
    pub transaction_amount: f64,
    pub current_balance: f64,
    pub credit_balance: f64,
    pub debit_balance: f64,
}

impl FeatureVector {
    pub fn values(&self) -> [f64; 5] {
        [
            self.change_frequency,
            self.transaction_amount,
            self.current_balance,
            self.credit_balance,
            self.debit_balance,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FraudScoreModel {
    pub caps: FeatureVector,
    pub weights: FeatureVector,
}

impl Default for FraudScoreModel {
    fn default() -> Self {
        Self {
            caps: FeatureVector {
                change_frequency: MAX_CHANGE_FREQUENCY,
                transaction_amount: MAX_TRANSACTION_AMOUNT,
                current_balance: MAX_BALANCE,
                credit_balance: MAX_CREDIT_BALANCE,
                debit_balance: MAX_DEBIT_BALANCE,
            },
            weights: FeatureVector {
                change_frequency: WEIGHT_CHANGE_FREQUENCY,
                transaction_amount: WEIGHT_TRANSACTION_AMOUNT,
                current_balance: WEIGHT_BALANCE,
                credit_balance: WEIGHT_CREDIT_BALANCE,
                debit_balance: WEIGHT_DEBIT_BALANCE,
            },
        }
    }
}

impl FraudScoreModel {
    /// Weighted sum of normalized features, clamped to [0, 1].
    pub fn score(&self, features: &FraudFeatures) -> f64 {
        let caps = &self.caps;
        let weights = &self.weights;

        let raw = normalize(features.change_frequency, 0.0, caps.change_frequency)
            * weights.change_frequency
            + normalize(features.transaction_amount, 0.0, caps.transaction_amount)
                * weights.transaction_amount
            + normalize(features.current_balance, 0.0, caps.current_balance)
                * weights.current_balance
            + normalize(features.credit_balance, 0.0, caps.credit_balance)
                * weights.credit_balance
            + normalize(features.debit_balance, 0.0, caps.debit_balance)
                * weights.debit_balance;

        // NaN passes through clamp unchanged.
        raw.clamp(0.0, 1.0)
    }
}

/// Scale `value` linearly so that `min` maps to 0 and `max` maps to 1.
/// Not clamped.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    (value - min) / (max - min)
}

/// Score with the default caps and weights.
pub fn compute_fraud_score(
    change_frequency: f64,
    transaction_amount: f64,
    current_balance: f64,
    credit_balance: f64,
    debit_balance: f64,
) -> f64 {
    FraudScoreModel::default().score(&FraudFeatures {
        change_frequency,
        transaction_amount,
        current_balance,
        credit_balance,
        debit_balance,
    })
}
