//! Counters emitted by the engine through the `metrics` facade.
//!
//! Nothing is recorded unless the host process installs a recorder.

use metrics::counter;

use crate::window::LookbackRange;

pub const AGGREGATIONS_TOTAL: &str = "dialysis_metrics_aggregations_total";
pub const RECORDS_DROPPED_TOTAL: &str = "dialysis_metrics_records_dropped_total";
pub const VOLUMES_CLAMPED_TOTAL: &str = "dialysis_metrics_volumes_clamped_total";

pub(crate) fn record_normalization(dropped: usize, clamped_volumes: usize) {
    if dropped > 0 {
        counter!(RECORDS_DROPPED_TOTAL).increment(dropped as u64);
    }
    if clamped_volumes > 0 {
        counter!(VOLUMES_CLAMPED_TOTAL).increment(clamped_volumes as u64);
    }
}

pub(crate) fn record_aggregation(range: LookbackRange) {
    counter!(AGGREGATIONS_TOTAL, "range" => range.as_str()).increment(1);
}
