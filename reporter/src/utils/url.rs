//! Report application URLs
//!
//! Chart and commit-diff links embedded into rendered reports.

use std::fmt::Write;

use crate::core::constants::REPORT_APP_BASE_URL;
use crate::data::types::TimeGrain;

/// Chart of a metric's cohorts at one grain
pub fn metric_cohort_url(installation_id: &str, metric_name: &str, grain: TimeGrain) -> String {
    format!(
        "{}/report/{}/metrics/{}/cohorts/{}",
        REPORT_APP_BASE_URL,
        installation_id,
        path_escape(metric_name),
        grain
    )
}

/// Prefix shared by every commit diff URL of a repository
pub fn report_diff_base_url(installation_id: &str, repo_owner: &str, repo_name: &str) -> String {
    format!(
        "{}/report/{}/{}/{}/commit/",
        REPORT_APP_BASE_URL, installation_id, repo_owner, repo_name
    )
}

/// Diff URL of one commit under a base built by [`report_diff_base_url`]
pub fn report_diff_url(base_url: &str, commit_sha: &str) -> String {
    format!("{base_url}{commit_sha}/")
}

/// Escape a string for use as a single URL path segment.
///
/// Keeps unreserved characters and `$&+:=@`; everything else, including
/// `/`, `;`, `,` and `?`, is percent-encoded byte by byte. Store keys written
/// by earlier runs depend on this exact encoding.
pub fn path_escape(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if is_segment_safe(byte) {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

fn is_segment_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'-' | b'_' | b'.' | b'~' | b'$' | b'&' | b'+' | b':' | b'=' | b'@')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_cohort_url() {
        assert_eq!(
            metric_cohort_url("42", "revenue", TimeGrain::Month),
            "https://app.data-drift.io/report/42/metrics/revenue/cohorts/month"
        );
    }

    #[test]
    fn test_metric_cohort_url_escapes_metric_name() {
        assert_eq!(
            metric_cohort_url("42", "net revenue/EU", TimeGrain::Quarter),
            "https://app.data-drift.io/report/42/metrics/net%20revenue%2FEU/cohorts/quarter"
        );
    }

    #[test]
    fn test_report_diff_urls() {
        let base = report_diff_base_url("42", "acme", "data");
        assert_eq!(base, "https://app.data-drift.io/report/42/acme/data/commit/");
        assert_eq!(
            report_diff_url(&base, "abc123"),
            "https://app.data-drift.io/report/42/acme/data/commit/abc123/"
        );
    }

    #[test]
    fn test_path_escape_keeps_safe_characters() {
        assert_eq!(path_escape("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(path_escape("a$b&c+d:e=f@g"), "a$b&c+d:e=f@g");
    }

    #[test]
    fn test_path_escape_reserved_and_unicode() {
        assert_eq!(path_escape("a/b;c,d?e"), "a%2Fb%3Bc%2Cd%3Fe");
        assert_eq!(path_escape("50%"), "50%25");
        assert_eq!(path_escape("é"), "%C3%A9");
        assert_eq!(path_escape(""), "");
    }
}
