//! Period key classification and end-of-period resolution
//!
//! A period key names a reporting bucket by its textual shape alone:
//! `2024-03-15` (day), `2024-W11` (ISO week), `2024-03` (month),
//! `2024-Q1` (quarter) or `2024` (year). Shapes are tried in that order.

use std::sync::OnceLock;

use chrono::{DateTime, Days, Months, NaiveDate, Utc, Weekday};
use regex::Regex;

use super::error::DriftError;
use crate::data::types::TimeGrain;

/// A period key with its grain and cutoff instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub key: String,
    pub grain: TimeGrain,
    /// Last instant belonging to the period (the drift day)
    pub cutoff: DateTime<Utc>,
}

struct Shapes {
    day: Regex,
    week: Regex,
    month: Regex,
    quarter: Regex,
    year: Regex,
}

fn shapes() -> &'static Shapes {
    static SHAPES: OnceLock<Shapes> = OnceLock::new();
    SHAPES.get_or_init(|| Shapes {
        // `\d` would also match non-ASCII digits
        day: Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("Invalid regex"),
        week: Regex::new(r"^([0-9]{4})-W(.{2})$").expect("Invalid regex"),
        month: Regex::new(r"^[0-9]{4}-[0-9]{2}$").expect("Invalid regex"),
        quarter: Regex::new(r"^([0-9]{4})-Q(.)$").expect("Invalid regex"),
        year: Regex::new(r"^[0-9]{4}$").expect("Invalid regex"),
    })
}

/// Infer the time grain of a period key from its shape.
///
/// Day and month keys must name a real calendar date; `2024-13` is not a
/// month and matches no other shape, so it is rejected. Week and quarter keys
/// are classified by shape and their numbers are checked by
/// [`last_instant_of`].
pub fn classify(key: &str) -> Result<TimeGrain, DriftError> {
    let shapes = shapes();

    if shapes.day.is_match(key) && parse_day(key).is_some() {
        return Ok(TimeGrain::Day);
    }
    if shapes.week.is_match(key) {
        return Ok(TimeGrain::Week);
    }
    if shapes.month.is_match(key) && parse_month_start(key).is_some() {
        return Ok(TimeGrain::Month);
    }
    if shapes.quarter.is_match(key) {
        return Ok(TimeGrain::Quarter);
    }
    if shapes.year.is_match(key) {
        return Ok(TimeGrain::Year);
    }

    Err(DriftError::InvalidPeriodKey(key.to_string()))
}

/// Last instant contained in the period named by `key`, in UTC.
///
/// Day, week, month and year periods end at 23:59:59. Quarter periods end at
/// 00:00:00 on the quarter's last day; stored quarter reports were computed
/// against that boundary.
pub fn last_instant_of(key: &str) -> Result<DateTime<Utc>, DriftError> {
    resolve_period(key).map(|period| period.cutoff)
}

/// Classify `key` and resolve its cutoff in one step
pub fn resolve_period(key: &str) -> Result<ResolvedPeriod, DriftError> {
    let grain = classify(key)?;

    let cutoff = match grain {
        TimeGrain::Day => {
            let date = parse_day(key).ok_or_else(|| malformed(key, "date"))?;
            end_of_day(key, date)?
        }
        TimeGrain::Week => {
            let monday = parse_iso_week_monday(key)?;
            let sunday = monday
                .checked_add_days(Days::new(6))
                .ok_or_else(|| malformed(key, "week"))?;
            end_of_day(key, sunday)?
        }
        TimeGrain::Month => {
            let last_day = parse_month_start(key)
                .and_then(|first| first.checked_add_months(Months::new(1)))
                .and_then(|next| next.checked_sub_days(Days::new(1)))
                .ok_or_else(|| malformed(key, "month"))?;
            end_of_day(key, last_day)?
        }
        TimeGrain::Quarter => {
            let last_day = parse_quarter_end(key)?;
            last_day
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc())
                .ok_or_else(|| malformed(key, "quarter"))?
        }
        TimeGrain::Year => {
            let year: i32 = key.parse().map_err(|_| malformed(key, "year"))?;
            let dec_31 = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| malformed(key, "year"))?;
            end_of_day(key, dec_31)?
        }
    };

    tracing::trace!(key, grain = %grain, cutoff = %cutoff, "Resolved period");

    Ok(ResolvedPeriod {
        key: key.to_string(),
        grain,
        cutoff,
    })
}

fn malformed(key: &str, component: &'static str) -> DriftError {
    DriftError::MalformedGrainComponent {
        key: key.to_string(),
        component,
    }
}

fn end_of_day(key: &str, date: NaiveDate) -> Result<DateTime<Utc>, DriftError> {
    date.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| malformed(key, "date"))
}

fn parse_day(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

fn parse_month_start(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d").ok()
}

fn parse_iso_week_monday(key: &str) -> Result<NaiveDate, DriftError> {
    let caps = shapes()
        .week
        .captures(key)
        .ok_or_else(|| DriftError::InvalidPeriodKey(key.to_string()))?;

    let year: i32 = caps[1].parse().map_err(|_| malformed(key, "year"))?;
    let week = &caps[2];
    if !week.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed(key, "week"));
    }
    let week: u32 = week.parse().map_err(|_| malformed(key, "week"))?;

    // Rejects week 00 and week 53 in 52-week ISO years
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(|| malformed(key, "week"))
}

fn parse_quarter_end(key: &str) -> Result<NaiveDate, DriftError> {
    let caps = shapes()
        .quarter
        .captures(key)
        .ok_or_else(|| DriftError::InvalidPeriodKey(key.to_string()))?;

    let year: i32 = caps[1].parse().map_err(|_| malformed(key, "year"))?;
    let (month, day) = match &caps[2] {
        "1" => (3, 31),
        "2" => (6, 30),
        "3" => (9, 30),
        "4" => (12, 31),
        _ => return Err(malformed(key, "quarter")),
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| malformed(key, "quarter"))
}
