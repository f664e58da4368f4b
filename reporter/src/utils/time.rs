//! Time utility functions

use chrono::{DateTime, Utc};

/// Convert seconds since Unix epoch to DateTime<Utc>, `None` outside chrono's range
pub fn unix_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
