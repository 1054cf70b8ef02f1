//! Real-time balance risk scoring and monitor alerting for a ledger.
//!
//! Module map:
//!   types        shared id aliases
//!   error        RiskError / RiskResult
//!   config       RiskConfig (JSON file + test defaults)
//!   balance      Balance snapshot
//!   monitor      BalanceMonitor and alert conditions
//!   fraud_score  pure weighted-feature score model
//!   tracker      per-account snapshot + change frequency, one lock
//!   datasource   storage capability consumed by the engine
//!   store        SQLite implementation of the datasource
//!   notification webhook payloads, notifier channel, delivery worker
//!   dispatcher   monitor evaluation and alert submission
//!   engine       RiskEngine facade used by the posting pipeline

pub mod balance;
pub mod config;
pub mod datasource;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod fraud_score;
pub mod monitor;
pub mod notification;
pub mod store;
pub mod tracker;
pub mod types;
