//! Drift event derivation
//!
//! Walks the in-window commits once, oldest first. The first commit creates
//! the KPI's baseline; every later commit is an update carrying the exact
//! decimal change from the commit before it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DriftError;
use super::window::WindowedCommit;
use crate::data::types::{CommitComment, CommitSha};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Create,
    Update,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

/// One changelog entry of a KPI report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftEvent {
    pub commit_sha: CommitSha,
    /// Seconds since Unix epoch
    pub commit_timestamp: i64,
    pub commit_url: String,
    /// KPI value after this commit
    pub value: Decimal,
    /// Change from the previous in-window commit, zero for the create event
    pub diff: Decimal,
    pub event_type: EventType,
    pub commit_comments: Vec<CommitComment>,
}

/// Derive one event per commit from an ordered window.
///
/// Fails if a change between two commits does not fit in a decimal.
pub fn derive_events(ordered: &[WindowedCommit]) -> Result<Vec<DriftEvent>, DriftError> {
    let mut events = Vec::with_capacity(ordered.len());
    let mut previous: Option<Decimal> = None;

    for commit in ordered {
        let value = commit.record.kpi;
        let (event_type, diff) = match previous {
            None => (EventType::Create, Decimal::ZERO),
            Some(prev) => {
                let diff = value
                    .checked_sub(prev)
                    .ok_or_else(|| DriftError::DiffOverflow {
                        sha: commit.sha.clone(),
                    })?;
                (EventType::Update, diff)
            }
        };

        events.push(DriftEvent {
            commit_sha: commit.sha.clone(),
            commit_timestamp: commit.record.commit_timestamp,
            commit_url: commit.record.commit_url.clone(),
            value,
            diff,
            event_type,
            commit_comments: commit.record.commit_comments.clone(),
        });

        previous = Some(value);
    }

    Ok(events)
}
