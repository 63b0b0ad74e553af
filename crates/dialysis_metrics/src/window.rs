//! Look-back windows and chart capping over daily aggregates.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::MetricsError;
use crate::bucket::DailyAggregate;
use crate::normalize::NormalizedRecord;

/// Caller-selected history range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum LookbackRange {
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "90d")]
    Days90,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl LookbackRange {
    /// Length of the window in days; `None` means unbounded.
    pub fn days(&self) -> Option<u64> {
        match self {
            LookbackRange::Days7 => Some(7),
            LookbackRange::Days30 => Some(30),
            LookbackRange::Days90 => Some(90),
            LookbackRange::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LookbackRange::Days7 => "7d",
            LookbackRange::Days30 => "30d",
            LookbackRange::Days90 => "90d",
            LookbackRange::All => "all",
        }
    }

    /// Inclusive `[start, end]` bounds relative to `reference`, or `None` for `all`.
    pub fn bounds(&self, reference: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let days = self.days()?;
        let start = reference
            .checked_sub_days(Days::new(days))
            .unwrap_or(NaiveDate::MIN);
        Some((start, reference))
    }

    pub fn contains(&self, date: NaiveDate, reference: NaiveDate) -> bool {
        match self.bounds(reference) {
            Some((start, end)) => date >= start && date <= end,
            None => true,
        }
    }
}

impl fmt::Display for LookbackRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookbackRange {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" => Ok(LookbackRange::Days7),
            "30d" => Ok(LookbackRange::Days30),
            "90d" => Ok(LookbackRange::Days90),
            "all" => Ok(LookbackRange::All),
            other => Err(MetricsError::Config(format!(
                "unknown range '{other}' (expected 7d, 30d, 90d or all)"
            ))),
        }
    }
}

/// One point of the trend chart, in the field names charting widgets expect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, JsonSchema)]
pub struct ChartPoint {
    pub date: NaiveDate,
    #[serde(rename = "volumeIn")]
    pub volume_in: f64,
    #[serde(rename = "volumeOut")]
    pub volume_out: f64,
    #[serde(rename = "netUF")]
    pub net_uf: f64,
    #[serde(rename = "treatmentCount")]
    pub treatment_count: usize,
}

impl From<&DailyAggregate> for ChartPoint {
    fn from(b: &DailyAggregate) -> Self {
        Self {
            date: b.date,
            volume_in: b.volume_in_sum,
            volume_out: b.volume_out_sum,
            net_uf: b.net_balance,
            treatment_count: b.treatment_count,
        }
    }
}

/// Buckets whose date lies in `[reference - range, reference]`; `all` keeps everything.
pub fn select_window(
    buckets: &[DailyAggregate],
    range: LookbackRange,
    reference: NaiveDate,
) -> Vec<DailyAggregate> {
    buckets
        .iter()
        .filter(|b| range.contains(b.date, reference))
        .copied()
        .collect()
}

/// The last `max_points` entries of an ascending bucket list.
pub fn cap_for_chart(buckets: &[DailyAggregate], max_points: usize) -> &[DailyAggregate] {
    &buckets[buckets.len().saturating_sub(max_points)..]
}

/// Records that fall inside the window, oldest first. Used by export flows.
pub fn select_records_in_window(
    records: &[NormalizedRecord],
    range: LookbackRange,
    reference: NaiveDate,
) -> Vec<NormalizedRecord> {
    let mut selected: Vec<NormalizedRecord> = records
        .iter()
        .filter(|r| range.contains(r.date(), reference))
        .cloned()
        .collect();
    selected.sort_by_key(|r| r.treated_at);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn bucket(date: NaiveDate) -> DailyAggregate {
        DailyAggregate {
            date,
            volume_in_sum: 100.0,
            volume_out_sum: 150.0,
            net_balance: 50.0,
            treatment_count: 1,
            dry_night_count: 0,
        }
    }

    fn month() -> Vec<DailyAggregate> {
        (1..=31).map(|d| bucket(jan(d))).collect()
    }

    #[test]
    fn range_tokens_round_trip_through_display() {
        for r in [
            LookbackRange::Days7,
            LookbackRange::Days30,
            LookbackRange::Days90,
            LookbackRange::All,
        ] {
            assert_eq!(r.to_string().parse::<LookbackRange>().unwrap(), r);
        }
        assert!("14d".parse::<LookbackRange>().is_err());
        assert_eq!(" ALL ".parse::<LookbackRange>().unwrap(), LookbackRange::All);
    }

    #[test]
    fn range_serializes_as_token() {
        assert_eq!(serde_json::to_string(&LookbackRange::Days90).unwrap(), "\"90d\"");
        let r: LookbackRange = serde_json::from_str("\"7d\"").unwrap();
        assert_eq!(r, LookbackRange::Days7);
    }

    #[test]
    fn seven_day_window_is_inclusive_on_both_ends() {
        let selected = select_window(&month(), LookbackRange::Days7, jan(20));
        assert_eq!(selected.first().map(|b| b.date), Some(jan(13)));
        assert_eq!(selected.last().map(|b| b.date), Some(jan(20)));
        assert_eq!(selected.len(), 8);
    }

    #[test]
    fn future_buckets_fall_outside_bounded_windows() {
        let selected = select_window(&month(), LookbackRange::Days30, jan(10));
        assert!(selected.iter().all(|b| b.date <= jan(10)));
        assert_eq!(selected.len(), 10);
    }

    #[test]
    fn all_range_keeps_everything() {
        let buckets = month();
        assert_eq!(select_window(&buckets, LookbackRange::All, jan(1)), buckets);
    }

    #[test]
    fn cap_keeps_most_recent_in_ascending_order() {
        let buckets = month();
        let capped = cap_for_chart(&buckets, 14);
        assert_eq!(capped.len(), 14);
        assert_eq!(capped[0].date, jan(18));
        assert_eq!(capped[13].date, jan(31));
    }

    #[test]
    fn cap_larger_than_input_returns_input() {
        let buckets = month();
        assert_eq!(cap_for_chart(&buckets, 100), &buckets[..]);
        assert!(cap_for_chart(&buckets, 0).is_empty());
        assert!(cap_for_chart(&[], 14).is_empty());
    }

    #[test]
    fn chart_point_uses_widget_field_names() {
        let point = ChartPoint::from(&bucket(jan(2)));
        let v = serde_json::to_value(point).unwrap();
        assert_eq!(v["date"], "2025-01-02");
        assert_eq!(v["volumeIn"], 100.0);
        assert_eq!(v["volumeOut"], 150.0);
        assert_eq!(v["netUF"], 50.0);
        assert_eq!(v["treatmentCount"], 1);
    }

    #[test]
    fn bounds_saturate_at_min_date() {
        let (start, end) = LookbackRange::Days90.bounds(NaiveDate::MIN).unwrap();
        assert_eq!(start, NaiveDate::MIN);
        assert_eq!(end, NaiveDate::MIN);
    }
}
