//! The single entry point used by the presentation layer.
//!
//! Pipeline: normalize -> bucket the full history -> summary over all buckets
//! -> window + cap a copy for the chart. Nothing is cached between calls.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::bucket::{DailyAggregate, bucket_by_day};
use crate::config::AggregateConfig;
use crate::normalize::{NormalizeOutcome, NormalizedRecord, normalize};
use crate::summary::{BalanceInterpretation, StatusCounts, SummaryMetrics, compute_summary};
use crate::window::{ChartPoint, cap_for_chart, select_records_in_window, select_window};
use crate::{MetricsError, MetricsResult, TreatmentRecord, observability};

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Every day of the complete history, ascending.
    pub buckets: Vec<DailyAggregate>,
    pub summary: SummaryMetrics,
    pub interpretation: BalanceInterpretation,
    /// Display text of `interpretation`.
    pub interpretation_label: &'static str,
    pub status_counts: StatusCounts,
    /// Windowed and capped trend series, ascending.
    pub chart_series: Vec<ChartPoint>,
    pub dropped_record_count: usize,
    pub clamped_volume_count: usize,
}

impl AggregateResult {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Aggregate a typed record list. Malformed records are dropped and counted,
/// never reported as errors.
pub fn aggregate(records: &[TreatmentRecord], config: &AggregateConfig) -> AggregateResult {
    let NormalizeOutcome {
        records: normalized,
        dropped,
        clamped_volumes,
    } = normalize(records);

    let buckets = bucket_by_day(&normalized);
    let summary = compute_summary(&buckets, config.reference_date);

    let windowed = select_window(&buckets, config.range, config.reference_date);
    let chart_series: Vec<ChartPoint> = cap_for_chart(&windowed, config.max_chart_points)
        .iter()
        .map(ChartPoint::from)
        .collect();

    observability::record_aggregation(config.range);
    debug!(
        records = records.len(),
        dropped,
        days = buckets.len(),
        range = %config.range,
        chart_points = chart_series.len(),
        "aggregated treatment records"
    );

    AggregateResult {
        interpretation: summary.interpretation(),
        interpretation_label: summary.interpretation().label(),
        status_counts: StatusCounts::from_records(&normalized),
        buckets,
        summary,
        chart_series,
        dropped_record_count: dropped,
        clamped_volume_count: clamped_volumes,
    }
}

/// Aggregate a JSON payload as received from the data layer.
///
/// Fails with [`MetricsError::InvalidInput`] only when the payload is not an
/// array of objects; individual bad records are dropped and counted.
pub fn aggregate_json(records: &Value, config: &AggregateConfig) -> MetricsResult<AggregateResult> {
    let items = records.as_array().ok_or_else(|| {
        MetricsError::InvalidInput(format!(
            "expected an array of treatment records, got {}",
            json_kind(records)
        ))
    })?;

    let mut parsed = Vec::with_capacity(items.len());
    let mut undecodable = 0;
    for (index, item) in items.iter().enumerate() {
        if !item.is_object() {
            return Err(MetricsError::InvalidInput(format!(
                "treatment record at index {index} is {}, expected an object",
                json_kind(item)
            )));
        }
        match TreatmentRecord::deserialize(item) {
            Ok(record) => parsed.push(record),
            Err(e) => {
                debug!(index, error = %e, "dropping undecodable treatment record");
                undecodable += 1;
            }
        }
    }

    let mut result = aggregate(&parsed, config);
    result.dropped_record_count += undecodable;
    Ok(result)
}

/// Aggregate a JSON document. Text that is not JSON is a serialization error.
pub fn aggregate_str(json: &str, config: &AggregateConfig) -> MetricsResult<AggregateResult> {
    let value: Value = serde_json::from_str(json)?;
    aggregate_json(&value, config)
}

/// Normalized records inside the configured window, oldest first, for export
/// flows that report the record subset rather than daily totals.
pub fn export_records(
    records: &[TreatmentRecord],
    config: &AggregateConfig,
) -> Vec<NormalizedRecord> {
    let outcome = normalize(records);
    select_records_in_window(&outcome.records, config.range, config.reference_date)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
