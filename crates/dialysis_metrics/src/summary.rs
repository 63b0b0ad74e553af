//! Patient-level summary statistics over daily aggregates.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Serialize;

use crate::TreatmentStatus;
use crate::bucket::DailyAggregate;
use crate::normalize::NormalizedRecord;
use crate::volume::{ml_to_microliters, rounded_mean_ml};

/// Minimum exchanges on a day for it to count as compliant.
pub const COMPLIANT_DAY_MIN_TREATMENTS: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub total_treatments: usize,
    /// Distinct calendar days with at least one treatment.
    pub total_days: usize,
    /// Days strictly before the reference date; the compliance denominator.
    pub past_day_count: usize,
    pub compliant_day_count: usize,
    /// Percentage 0..=100 of past days that were compliant.
    pub compliance_rate: u32,
    /// Mean per-treatment UF in whole mL.
    #[serde(rename = "averageUF")]
    pub average_uf: f64,
    pub total_balance: f64,
    pub retention_day_count: usize,
    pub dry_night_count: usize,
    pub first_treatment_date: Option<NaiveDate>,
    pub last_treatment_date: Option<NaiveDate>,
}

impl SummaryMetrics {
    pub fn interpretation(&self) -> BalanceInterpretation {
        BalanceInterpretation::from_balance(self.total_balance)
    }
}

/// Display reading of an overall fluid balance (`out - in`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum BalanceInterpretation {
    /// Balance >= 0: at least as much fluid removed as instilled.
    AdequateRemoval,
    /// Balance < 0: fluid retained.
    RetentionWarning,
}

impl BalanceInterpretation {
    pub fn from_balance(net_balance: f64) -> Self {
        if net_balance >= 0.0 {
            BalanceInterpretation::AdequateRemoval
        } else {
            BalanceInterpretation::RetentionWarning
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BalanceInterpretation::AdequateRemoval => "adequate/excess removal",
            BalanceInterpretation::RetentionWarning => "retention warning",
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, BalanceInterpretation::AdequateRemoval)
    }
}

/// Number of records per [`TreatmentStatus`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub finished: usize,
    pub ongoing: usize,
    pub scheduled: usize,
    pub cancelled: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            *counts.slot(record.status) += 1;
        }
        counts
    }

    pub fn get(&self, status: TreatmentStatus) -> usize {
        match status {
            TreatmentStatus::Finished => self.finished,
            TreatmentStatus::Ongoing => self.ongoing,
            TreatmentStatus::Scheduled => self.scheduled,
            TreatmentStatus::Cancelled => self.cancelled,
            TreatmentStatus::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        TreatmentStatus::ALL.iter().map(|s| self.get(*s)).sum()
    }

    fn slot(&mut self, status: TreatmentStatus) -> &mut usize {
        match status {
            TreatmentStatus::Finished => &mut self.finished,
            TreatmentStatus::Ongoing => &mut self.ongoing,
            TreatmentStatus::Scheduled => &mut self.scheduled,
            TreatmentStatus::Cancelled => &mut self.cancelled,
            TreatmentStatus::Unknown => &mut self.unknown,
        }
    }
}

/// Compute summary statistics from the complete bucket set.
///
/// `reference_date` is "today": buckets on or after it are left out of the
/// compliance ratio because the day may still be in progress.
pub fn compute_summary(buckets: &[DailyAggregate], reference_date: NaiveDate) -> SummaryMetrics {
    let total_treatments: usize = buckets.iter().map(|b| b.treatment_count).sum();
    let total_balance: f64 = buckets.iter().map(|b| b.net_balance).sum();

    let (past_day_count, compliant_day_count) = buckets
        .iter()
        .filter(|b| b.date < reference_date)
        .fold((0usize, 0usize), |(past, compliant), b| {
            let ok = b.treatment_count >= COMPLIANT_DAY_MIN_TREATMENTS;
            (past + 1, compliant + usize::from(ok))
        });

    let net_microliters: i64 = buckets.iter().map(DailyAggregate::net_microliters).sum();
    let average_uf = rounded_mean_ml(net_microliters, total_treatments);

    SummaryMetrics {
        total_treatments,
        total_days: buckets.len(),
        past_day_count,
        compliant_day_count,
        compliance_rate: rounded_percent(compliant_day_count, past_day_count),
        average_uf,
        total_balance,
        retention_day_count: buckets.iter().filter(|b| b.is_retention()).count(),
        dry_night_count: buckets.iter().map(|b| b.dry_night_count).sum(),
        first_treatment_date: buckets.iter().map(|b| b.date).min(),
        last_treatment_date: buckets.iter().map(|b| b.date).max(),
    }
}

/// Mean per-record UF computed directly from records, in whole mL.
///
/// Agrees with [`SummaryMetrics::average_uf`] for the buckets built from the
/// same records.
pub fn average_uf_from_records(records: &[NormalizedRecord]) -> f64 {
    let net_microliters: i64 = records
        .iter()
        .map(|r| ml_to_microliters(r.volume_out) - ml_to_microliters(r.volume_in))
        .sum();
    rounded_mean_ml(net_microliters, records.len())
}

// Round half up, in integers, so 0..=100 is exact.
fn rounded_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(d: u32, count: usize, vin: f64, vout: f64) -> DailyAggregate {
        DailyAggregate {
            date: NaiveDate::from_ymd_opt(2025, 1, d).unwrap(),
            volume_in_sum: vin,
            volume_out_sum: vout,
            net_balance: vout - vin,
            treatment_count: count,
            dry_night_count: 0,
        }
    }

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn empty_buckets_give_neutral_summary() {
        let s = compute_summary(&[], jan(1));
        assert_eq!(s.total_treatments, 0);
        assert_eq!(s.total_days, 0);
        assert_eq!(s.compliance_rate, 0);
        assert_eq!(s.average_uf, 0.0);
        assert_eq!(s.total_balance, 0.0);
        assert_eq!(s.first_treatment_date, None);
        assert_eq!(s.interpretation(), BalanceInterpretation::AdequateRemoval);
    }

    #[test]
    fn today_and_future_days_do_not_count_for_compliance() {
        let buckets = [bucket(1, 3, 0.0, 0.0), bucket(2, 1, 0.0, 0.0), bucket(3, 1, 0.0, 0.0)];
        let s = compute_summary(&buckets, jan(2));
        assert_eq!(s.past_day_count, 1);
        assert_eq!(s.compliant_day_count, 1);
        assert_eq!(s.compliance_rate, 100);
    }

    #[test]
    fn compliance_rate_is_zero_without_past_days() {
        let s = compute_summary(&[bucket(5, 4, 0.0, 0.0)], jan(5));
        assert_eq!(s.past_day_count, 0);
        assert_eq!(s.compliance_rate, 0);
    }

    #[test]
    fn compliance_rate_rounds_to_nearest_percent() {
        let buckets = [bucket(1, 3, 0.0, 0.0), bucket(2, 3, 0.0, 0.0), bucket(3, 2, 0.0, 0.0)];
        assert_eq!(compute_summary(&buckets, jan(10)).compliance_rate, 67);

        let mut eight: Vec<DailyAggregate> = (1..=8).map(|d| bucket(d, 1, 0.0, 0.0)).collect();
        eight[0].treatment_count = 3;
        // 12.5% rounds up
        assert_eq!(compute_summary(&eight, jan(20)).compliance_rate, 13);
    }

    #[test]
    fn average_uf_is_per_treatment_not_per_day() {
        // Two days, three treatments, +200 total -> 66.67 -> 67
        let buckets = [bucket(1, 2, 1500.0, 1600.0), bucket(2, 1, 800.0, 900.0)];
        let s = compute_summary(&buckets, jan(3));
        assert_eq!(s.total_balance, 200.0);
        assert_eq!(s.average_uf, 67.0);
    }

    #[test]
    fn average_uf_agrees_with_record_mean_near_half_millilitre() {
        use crate::TreatmentRecord;
        use crate::bucket::bucket_by_day;
        use crate::normalize::normalize;

        let raw = vec![
            TreatmentRecord::new("2025-01-01T06:00:00", 2970.0, 2949.2),
            TreatmentRecord::new("2025-01-02T06:00:00", 484.9, 2478.3),
            TreatmentRecord::new("2025-01-03T06:00:00", 1433.9, 998.2),
            TreatmentRecord::new("2025-01-01T18:00:00", 1982.6, 1123.7),
        ];
        let records = normalize(&raw).records;
        let s = compute_summary(&bucket_by_day(&records), jan(4));
        // net = +678.0 mL over 4 exchanges = 169.5 -> 170
        assert_eq!(average_uf_from_records(&records), 170.0);
        assert_eq!(s.average_uf, 170.0);
    }

    #[test]
    fn negative_total_reads_as_retention_warning() {
        let s = compute_summary(&[bucket(1, 1, 1000.0, 600.0)], jan(2));
        assert_eq!(s.retention_day_count, 1);
        let i = s.interpretation();
        assert_eq!(i, BalanceInterpretation::RetentionWarning);
        assert_eq!(i.label(), "retention warning");
        assert!(!i.is_good());
    }

    #[test]
    fn zero_balance_is_adequate() {
        assert_eq!(
            BalanceInterpretation::from_balance(0.0),
            BalanceInterpretation::AdequateRemoval
        );
        assert_eq!(
            BalanceInterpretation::AdequateRemoval.label(),
            "adequate/excess removal"
        );
    }

    #[test]
    fn small_negative_average_does_not_print_negative_zero() {
        let buckets = [bucket(1, 4, 1.0, 0.0)];
        let s = compute_summary(&buckets, jan(2));
        assert_eq!(s.average_uf, 0.0);
        assert!(s.average_uf.is_sign_positive());
    }

    #[test]
    fn status_counts_tally_every_record() {
        use crate::TreatmentRecord;
        use crate::normalize::normalize;

        let raw = vec![
            TreatmentRecord::new("2025-01-01", 0.0, 0.0).with_status(TreatmentStatus::Finished),
            TreatmentRecord::new("2025-01-01", 0.0, 0.0).with_status(TreatmentStatus::Finished),
            TreatmentRecord::new("2025-01-02", 0.0, 0.0).with_status(TreatmentStatus::Cancelled),
            TreatmentRecord::new("2025-01-02", 0.0, 0.0),
        ];
        let counts = StatusCounts::from_records(&normalize(&raw).records);
        assert_eq!(counts.finished, 2);
        assert_eq!(counts.get(TreatmentStatus::Cancelled), 1);
        assert_eq!(counts.unknown, 1);
        assert_eq!(counts.total(), 4);
    }
}
