//! Daily bucketing of normalized treatment records.

use std::collections::HashMap;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Serialize;

use crate::normalize::NormalizedRecord;
use crate::volume::{microliters_to_ml, ml_to_microliters};

/// Fluid totals for one calendar day.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub volume_in_sum: f64,
    pub volume_out_sum: f64,
    /// `volume_out_sum - volume_in_sum`; negative means fluid was retained.
    pub net_balance: f64,
    pub treatment_count: usize,
    pub dry_night_count: usize,
}

impl DailyAggregate {
    pub fn is_retention(&self) -> bool {
        self.net_balance < 0.0
    }

    /// Exact `out - in` of this day in microliters.
    pub fn net_microliters(&self) -> i64 {
        ml_to_microliters(self.volume_out_sum) - ml_to_microliters(self.volume_in_sum)
    }
}

#[derive(Default)]
struct DayAccumulator {
    volume_in_microliters: i64,
    volume_out_microliters: i64,
    treatment_count: usize,
    dry_night_count: usize,
}

impl DayAccumulator {
    fn add(&mut self, record: &NormalizedRecord) {
        self.volume_in_microliters += ml_to_microliters(record.volume_in);
        self.volume_out_microliters += ml_to_microliters(record.volume_out);
        self.treatment_count += 1;
        if record.dry_night {
            self.dry_night_count += 1;
        }
    }

    // Net balance is derived once from the final sums, never accumulated.
    fn finish(self, date: NaiveDate) -> DailyAggregate {
        let volume_in_sum = microliters_to_ml(self.volume_in_microliters);
        let volume_out_sum = microliters_to_ml(self.volume_out_microliters);
        DailyAggregate {
            date,
            volume_in_sum,
            volume_out_sum,
            net_balance: volume_out_sum - volume_in_sum,
            treatment_count: self.treatment_count,
            dry_night_count: self.dry_night_count,
        }
    }
}

/// Group records by the calendar date of their timestamp.
///
/// Returns one aggregate per distinct date, ascending by date. Empty input
/// yields an empty list.
pub fn bucket_by_day(records: &[NormalizedRecord]) -> Vec<DailyAggregate> {
    let mut days: HashMap<NaiveDate, DayAccumulator> = HashMap::new();
    for record in records {
        days.entry(record.date()).or_default().add(record);
    }

    let mut buckets: Vec<DailyAggregate> = days
        .into_iter()
        .map(|(date, acc)| acc.finish(date))
        .collect();
    buckets.sort_unstable_by_key(|b| b.date);
    buckets
}

/// Newest-first copy of `buckets`, for table views.
pub fn descending(buckets: &[DailyAggregate]) -> Vec<DailyAggregate> {
    buckets.iter().rev().copied().collect()
}
