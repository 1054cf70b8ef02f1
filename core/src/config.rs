use crate::{
    error::{RiskError, RiskResult},
    fraud_score::FraudScoreModel,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NOTIFICATION_QUEUE: usize = 1024;
pub const DEFAULT_MONITOR_EVENT: &str = "balance.monitor";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default)]
    pub score_model: FraudScoreModel,
    /// Max accounts held by the tracker. `None` keeps every account
    /// for the life of the process.
    #[serde(default)]
    pub tracker_capacity: Option<usize>,
    #[serde(default = "default_notification_queue")]
    pub notification_queue: usize,
    #[serde(default = "default_monitor_event")]
    pub monitor_event: String,
}

fn default_notification_queue() -> usize {
    DEFAULT_NOTIFICATION_QUEUE
}

fn default_monitor_event() -> String {
    DEFAULT_MONITOR_EVENT.to_string()
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self::default_test()
    }
}

impl RiskConfig {
    /// Load from a JSON file. Missing keys fall back to the built-in values.
    /// In tests, use RiskConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: RiskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            score_model: FraudScoreModel::default(),
            tracker_capacity: None,
            notification_queue: DEFAULT_NOTIFICATION_QUEUE,
            monitor_event: DEFAULT_MONITOR_EVENT.to_string(),
        }
    }

    /// Reject configurations the scoring model cannot use.
    /// The model itself never checks its caps.
    pub fn validate(&self) -> RiskResult<()> {
        let caps = self.score_model.caps.values();
        if let Some(cap) = caps.iter().find(|c| !(**c > 0.0) || !c.is_finite()) {
            return Err(RiskError::InvalidConfig {
                reason: format!("score caps must be positive and finite, got {cap}"),
            });
        }

        let weights = self.score_model.weights.values();
        if let Some(w) = weights.iter().find(|w| **w < 0.0 || !w.is_finite()) {
            return Err(RiskError::InvalidConfig {
                reason: format!("score weights must be non-negative, got {w}"),
            });
        }

        if self.notification_queue == 0 {
            return Err(RiskError::InvalidConfig {
                reason: "notification_queue must be at least 1".to_string(),
            });
        }

        if self.tracker_capacity == Some(0) {
            return Err(RiskError::InvalidConfig {
                reason: "tracker_capacity must be at least 1 when set".to_string(),
            });
        }

        if self.monitor_event.is_empty() {
            return Err(RiskError::InvalidConfig {
                reason: "monitor_event must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
