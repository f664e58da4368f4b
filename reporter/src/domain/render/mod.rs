//! Report document rendering
//!
//! Translates a [`KpiReport`] into the block schema of the documentation
//! workspace. This is the only place that knows about blocks; the drift
//! engine never sees them.

mod blocks;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use blocks::{Annotations, Block, Color, RichText};

use crate::data::types::TimeGrain;
use crate::domain::drift::{DriftError, DriftEvent, EventType, KpiReport, classify};
use crate::utils::time::unix_to_datetime;

/// Identifies the page a report is written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLookup {
    pub kpi_name: String,
    pub period_id: String,
    pub time_grain: TimeGrain,
}

impl PageLookup {
    pub fn title(&self) -> String {
        format!("{} {} ({})", self.kpi_name, self.period_id, self.time_grain)
    }
}

/// A rendered report page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub lookup: PageLookup,
    pub blocks: Vec<Block>,
}

const MISSING_VALUE: &str = "n/a";

/// Render a report into its page blocks.
///
/// Fails if the report's period id is not a valid period key, if its total
/// drift does not fit in a decimal, or if an event's timestamp is out of range.
pub fn render_report(report: &KpiReport) -> Result<ReportDocument, DriftError> {
    let time_grain = classify(&report.period_id)?;

    let initial = display_value(report.initial_value);
    let latest = display_value(report.latest_value);
    let total_drift = report.total_drift()?;

    let mut blocks = vec![
        Block::heading("Overview"),
        Block::Paragraph {
            rich_text: vec![
                RichText::code(&report.kpi_name),
                RichText::plain(" initial value was: "),
                RichText::bold(initial, Color::Default),
            ],
        },
        Block::Paragraph {
            rich_text: vec![
                RichText::code(&report.kpi_name),
                RichText::plain(" current value is: "),
                RichText::bold(latest, Color::Default),
            ],
        },
        Block::Paragraph {
            rich_text: vec![
                RichText::plain("Total drift since initial value: "),
                match total_drift {
                    Some(diff) => RichText::bold(display_diff(diff), diff_color(diff)),
                    None => RichText::bold(MISSING_VALUE, Color::Default),
                },
            ],
        },
        Block::heading("Timeline"),
        Block::Embed {
            url: report.chart_url.clone(),
        },
        Block::heading("Changelog"),
    ];

    for event in &report.events {
        blocks.extend(event_blocks(event)?);
    }

    Ok(ReportDocument {
        lookup: PageLookup {
            kpi_name: report.kpi_name.clone(),
            period_id: report.period_id.clone(),
            time_grain,
        },
        blocks,
    })
}

fn event_blocks(event: &DriftEvent) -> Result<Vec<Block>, DriftError> {
    let start = unix_to_datetime(event.commit_timestamp).ok_or_else(|| {
        DriftError::InvalidTimestamp {
            sha: event.commit_sha.clone(),
            timestamp: event.commit_timestamp,
        }
    })?;
    let date = Block::Paragraph {
        rich_text: vec![RichText::plain("🗓 Event "), RichText::DateMention { start }],
    };

    let blocks = match event.event_type {
        EventType::Create => vec![
            date,
            Block::BulletedListItem {
                rich_text: vec![
                    RichText::plain("Initial value: "),
                    RichText::bold(event.value.to_string(), Color::Gray),
                ],
            },
        ],
        EventType::Update => vec![
            date,
            Block::BulletedListItem {
                rich_text: vec![
                    RichText::plain("Impact: "),
                    RichText::bold(display_diff(event.diff), diff_color(event.diff)),
                ],
            },
            Block::BulletedListItem {
                rich_text: vec![RichText::link("commit", &event.commit_url)],
            },
        ],
    };
    Ok(blocks)
}

fn display_value(value: Option<Decimal>) -> String {
    value.map_or_else(|| MISSING_VALUE.to_string(), |v| v.to_string())
}

/// Signed diff text, positive values prefixed with `+`
pub fn display_diff(diff: Decimal) -> String {
    if diff.is_sign_positive() && !diff.is_zero() {
        format!("+{diff}")
    } else {
        diff.to_string()
    }
}

/// Orange for losses, blue otherwise
pub fn diff_color(diff: Decimal) -> Color {
    if diff.is_sign_negative() && !diff.is_zero() {
        Color::Orange
    } else {
        Color::Blue
    }
}
