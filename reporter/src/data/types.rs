//! Shared metric history types
//!
//! Field names follow the persisted JSON format (PascalCase keys) so
//! histories written by earlier aggregation runs load unchanged.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Commit content hash
pub type CommitSha = String;
/// Reporting bucket identifier, e.g. `2024-Q1`
pub type PeriodKey = String;
/// Key of one period/dimension slice inside [`Metrics`]
pub type PeriodAndDimensionKey = String;
/// Categorical slice name, e.g. `region`
pub type Dimension = String;
/// Categorical slice value, e.g. `EU`
pub type DimensionValue = String;

/// Calendar granularity of a period key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGrain {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGrain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for TimeGrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeGrain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(format!(
                "Invalid time grain '{}'. Valid options: day, week, month, quarter, year",
                s
            )),
        }
    }
}

/// A comment left on a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommitComment {
    pub comment_author: String,
    pub comment_body: String,
}

/// KPI observation recorded at one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommitRecord {
    /// Line count of the dataset file at this commit
    #[serde(default)]
    pub lines: i64,
    #[serde(rename = "KPI")]
    pub kpi: Decimal,
    /// Seconds since Unix epoch
    pub commit_timestamp: i64,
    pub commit_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub commit_comments: Vec<CommitComment>,
}

/// Commit identifier to observation. Iteration order carries no meaning.
pub type MetricHistory = HashMap<CommitSha, CommitRecord>;

/// History of one period/dimension slice of a KPI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metric {
    pub time_grain: TimeGrain,
    pub period: PeriodKey,
    #[serde(default)]
    pub dimension: Dimension,
    #[serde(default)]
    pub dimension_value: DimensionValue,
    pub history: MetricHistory,
}

/// All slices of one KPI, as persisted per installation and metric name
pub type Metrics = HashMap<PeriodAndDimensionKey, Metric>;

/// Histories written by older aggregation runs store `null` for commits
/// without comments.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<CommitComment>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<CommitComment>>::deserialize(deserializer)?.unwrap_or_default())
}
