use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RiskError {
    pub fn balance_not_found(id: &str) -> Self {
        Self::NotFound { kind: "balance", id: id.to_string() }
    }

    pub fn monitor_not_found(id: &str) -> Self {
        Self::NotFound { kind: "monitor", id: id.to_string() }
    }
}

pub type RiskResult<T> = Result<T, RiskError>;
