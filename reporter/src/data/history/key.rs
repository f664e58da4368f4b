//! Metric history store keys

use std::fmt;

use crate::core::constants::{METRIC_STORE_DIR, METRIC_STORE_SUFFIX};
use crate::utils::url::path_escape;

/// Location of one metric's aggregated history
///
/// The same key is used as a relative path by the file store and as the
/// key name by the Redis store, so histories can move between backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricStoreKey(String);

impl MetricStoreKey {
    pub fn new(installation_id: &str, metric_name: &str) -> Self {
        Self(format!(
            "{}/{}_{}_{}",
            METRIC_STORE_DIR,
            installation_id,
            path_escape(metric_name),
            METRIC_STORE_SUFFIX
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricStoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
