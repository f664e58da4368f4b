//! KPI report assembly

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DriftError;
use super::events::{DriftEvent, derive_events};
use super::period::resolve_period;
use super::window::{WindowedCommit, filter_after};
use crate::data::types::{Dimension, DimensionValue, Metric, Metrics, PeriodKey};

/// Change report for one KPI slice over one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiReport {
    pub kpi_name: String,
    pub period_id: PeriodKey,
    pub dimension: Dimension,
    pub dimension_value: DimensionValue,
    /// Chart of the metric's cohorts, carried through unchanged
    #[serde(rename = "graphqlUrl")]
    pub chart_url: String,
    /// Value of the first in-window commit, absent for an empty window
    #[serde(rename = "firstRoundedKPI")]
    pub initial_value: Option<Decimal>,
    /// Value of the last in-window commit, absent for an empty window
    #[serde(rename = "lastRoundedKPI")]
    pub latest_value: Option<Decimal>,
    pub events: Vec<DriftEvent>,
}

impl KpiReport {
    /// Latest minus initial value, absent for an empty window
    pub fn total_drift(&self) -> Result<Option<Decimal>, DriftError> {
        let (Some(initial), Some(latest)) = (self.initial_value, self.latest_value) else {
            return Ok(None);
        };
        latest
            .checked_sub(initial)
            .map(Some)
            .ok_or_else(|| DriftError::DiffOverflow {
                sha: self
                    .events
                    .last()
                    .map(|e| e.commit_sha.clone())
                    .unwrap_or_default(),
            })
    }
}

/// Whether a report with no commits after the cutoff is acceptable output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyReportPolicy {
    #[default]
    Allow,
    Reject,
}

/// Package an ordered window and its events into a report.
pub fn assemble(
    kpi_name: &str,
    period_key: &str,
    dimension: &str,
    dimension_value: &str,
    chart_url: &str,
    ordered: &[WindowedCommit],
    events: Vec<DriftEvent>,
) -> KpiReport {
    KpiReport {
        kpi_name: kpi_name.to_string(),
        period_id: period_key.to_string(),
        dimension: dimension.to_string(),
        dimension_value: dimension_value.to_string(),
        chart_url: chart_url.to_string(),
        initial_value: ordered.first().map(|c| c.record.kpi),
        latest_value: ordered.last().map(|c| c.record.kpi),
        events,
    }
}

/// Run the full pipeline for one metric slice: resolve the period's cutoff,
/// select the commits after it, derive events and assemble the report.
pub fn build_report(
    kpi_name: &str,
    chart_url: &str,
    metric: &Metric,
    policy: EmptyReportPolicy,
) -> Result<KpiReport, DriftError> {
    let period = resolve_period(&metric.period)?;

    if period.grain != metric.time_grain {
        tracing::warn!(
            kpi = kpi_name,
            period = %metric.period,
            stored_grain = %metric.time_grain,
            key_grain = %period.grain,
            "Stored time grain disagrees with period key, using period key"
        );
    }

    let ordered = filter_after(&metric.history, period.cutoff);
    if ordered.is_empty() && policy == EmptyReportPolicy::Reject {
        return Err(DriftError::EmptyHistory {
            kpi: kpi_name.to_string(),
            period: metric.period.clone(),
        });
    }

    let events = derive_events(&ordered)?;

    tracing::debug!(
        kpi = kpi_name,
        period = %metric.period,
        grain = %period.grain,
        dimension_value = %metric.dimension_value,
        events = events.len(),
        "Built KPI report"
    );

    let report = assemble(
        kpi_name,
        &metric.period,
        &metric.dimension,
        &metric.dimension_value,
        chart_url,
        &ordered,
        events,
    );
    // A report whose total drift cannot be rendered is not returned at all
    report.total_drift()?;

    Ok(report)
}

/// Build reports for every slice of a KPI, ordered by period then dimension.
///
/// Fails on the first slice that cannot be built; no partial result is returned.
pub fn build_reports<F>(
    kpi_name: &str,
    metrics: &Metrics,
    policy: EmptyReportPolicy,
    chart_url: F,
) -> Result<Vec<KpiReport>, DriftError>
where
    F: Fn(&Metric) -> String,
{
    let mut slices: Vec<&Metric> = metrics.values().collect();
    slices.sort_by(|a, b| {
        a.period
            .cmp(&b.period)
            .then_with(|| a.dimension.cmp(&b.dimension))
            .then_with(|| a.dimension_value.cmp(&b.dimension_value))
    });

    slices
        .into_iter()
        .map(|metric| build_report(kpi_name, &chart_url(metric), metric, policy))
        .collect()
}
