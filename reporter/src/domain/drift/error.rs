//! Drift engine error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriftError {
    #[error("Invalid period key: {0}")]
    InvalidPeriodKey(String),

    #[error("Malformed {component} in period key: {key}")]
    MalformedGrainComponent { key: String, component: &'static str },

    #[error("No commits after the end of period {period} for KPI {kpi}")]
    EmptyHistory { kpi: String, period: String },

    #[error("KPI change at commit {sha} is outside the decimal range")]
    DiffOverflow { sha: String },

    #[error("Commit {sha} has an out of range timestamp: {timestamp}")]
    InvalidTimestamp { sha: String, timestamp: i64 },
}
