//! Selection of the commits recorded after a period's cutoff

use chrono::{DateTime, Utc};

use crate::data::types::{CommitRecord, CommitSha, MetricHistory};

/// A commit observation inside the report window, with its identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowedCommit {
    pub sha: CommitSha,
    pub record: CommitRecord,
}

/// Keep records committed strictly after `cutoff`, oldest first.
///
/// Equal timestamps are ordered by commit identifier so the result never
/// depends on the history map's iteration order.
pub fn filter_after(history: &MetricHistory, cutoff: DateTime<Utc>) -> Vec<WindowedCommit> {
    let cutoff_secs = cutoff.timestamp();

    let mut window: Vec<WindowedCommit> = history
        .iter()
        .filter(|(_, record)| record.commit_timestamp > cutoff_secs)
        .map(|(sha, record)| WindowedCommit {
            sha: sha.clone(),
            record: record.clone(),
        })
        .collect();

    window.sort_by(|a, b| {
        a.record
            .commit_timestamp
            .cmp(&b.record.commit_timestamp)
            .then_with(|| a.sha.cmp(&b.sha))
    });

    tracing::trace!(
        total = history.len(),
        kept = window.len(),
        cutoff = %cutoff,
        "Filtered metric history"
    );

    window
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn record(value: i64, ts: i64) -> CommitRecord {
        CommitRecord {
            lines: 0,
            kpi: Decimal::from(value),
            commit_timestamp: ts,
            commit_url: format!("https://example.com/commit/{ts}"),
            commit_comments: vec![],
        }
    }

    fn cutoff_at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_cutoff_is_exclusive() {
        let history: MetricHistory = [
            ("a".to_string(), record(1, 100)),
            ("b".to_string(), record(2, 200)),
            ("c".to_string(), record(3, 300)),
        ]
        .into_iter()
        .collect();

        let window = filter_after(&history, cutoff_at(200));

        assert_eq!(window.len(), 1);
        assert_eq!(window[0].sha, "c");
        assert_eq!(window[0].record.commit_timestamp, 300);
    }

    #[test]
    fn test_sorted_ascending_by_timestamp() {
        let history: MetricHistory = [
            ("z".to_string(), record(3, 3000)),
            ("x".to_string(), record(1, 1000)),
            ("y".to_string(), record(2, 2000)),
        ]
        .into_iter()
        .collect();

        let window = filter_after(&history, cutoff_at(0));
        let shas: Vec<&str> = window.iter().map(|c| c.sha.as_str()).collect();

        assert_eq!(shas, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_equal_timestamps_ordered_by_sha() {
        let history: MetricHistory = [
            ("bbb".to_string(), record(2, 500)),
            ("aaa".to_string(), record(1, 500)),
            ("ccc".to_string(), record(3, 500)),
        ]
        .into_iter()
        .collect();

        for _ in 0..10 {
            let window = filter_after(&history, cutoff_at(0));
            let shas: Vec<&str> = window.iter().map(|c| c.sha.as_str()).collect();
            assert_eq!(shas, vec!["aaa", "bbb", "ccc"]);
        }
    }

    #[test]
    fn test_empty_window_is_valid() {
        let history: MetricHistory = [("a".to_string(), record(1, 100))].into_iter().collect();
        assert!(filter_after(&history, cutoff_at(100)).is_empty());
        assert!(filter_after(&MetricHistory::new(), cutoff_at(0)).is_empty());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let history: MetricHistory = [
            ("a".to_string(), record(1, 100)),
            ("b".to_string(), record(2, 200)),
        ]
        .into_iter()
        .collect();
        let before = history.clone();

        let _ = filter_after(&history, cutoff_at(150));

        assert_eq!(history, before);
    }
}
