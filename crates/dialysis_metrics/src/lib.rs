//! Treatment aggregation and clinical-metrics engine for peritoneal-dialysis
//! records.
//!
//! Raw treatment records flow one way through the engine:
//! normalize -> bucket by calendar day -> (summary metrics | windowed chart series).
//! Every call is pure; the caller passes the full record list and an
//! [`AggregateConfig`] each time and owns the returned [`AggregateResult`].

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod aggregate;
pub mod bucket;
pub mod config;
pub mod normalize;
pub mod observability;
pub mod summary;
pub mod utils;
pub mod volume;
pub mod window;

pub use aggregate::{AggregateResult, aggregate, aggregate_json, aggregate_str, export_records};
pub use bucket::{DailyAggregate, bucket_by_day, descending};
pub use config::{AggregateConfig, DEFAULT_MAX_CHART_POINTS};
pub use normalize::{DropReason, NormalizeOutcome, NormalizedRecord, normalize};
pub use summary::{
    BalanceInterpretation, COMPLIANT_DAY_MIN_TREATMENTS, StatusCounts, SummaryMetrics,
    average_uf_from_records, compute_summary,
};
pub use window::{ChartPoint, LookbackRange, cap_for_chart, select_records_in_window, select_window};

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

/// Lifecycle state of a single exchange as reported by the scheduling system.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentStatus {
    Finished,
    Ongoing,
    Scheduled,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TreatmentStatus {
    pub const ALL: [TreatmentStatus; 5] = [
        TreatmentStatus::Finished,
        TreatmentStatus::Ongoing,
        TreatmentStatus::Scheduled,
        TreatmentStatus::Cancelled,
        TreatmentStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentStatus::Finished => "finished",
            TreatmentStatus::Ongoing => "ongoing",
            TreatmentStatus::Scheduled => "scheduled",
            TreatmentStatus::Cancelled => "cancelled",
            TreatmentStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TreatmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreatmentStatus {
    type Err = MetricsError;

    /// Case-insensitive match on the known tokens. Callers that want the
    /// lenient behaviour use `.unwrap_or_default()`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "finished" => Ok(TreatmentStatus::Finished),
            "ongoing" => Ok(TreatmentStatus::Ongoing),
            "scheduled" => Ok(TreatmentStatus::Scheduled),
            "cancelled" | "canceled" => Ok(TreatmentStatus::Cancelled),
            "unknown" => Ok(TreatmentStatus::Unknown),
            other => Err(MetricsError::InvalidInput(format!(
                "unrecognized treatment status '{other}'"
            ))),
        }
    }
}

/// A treatment record as supplied by the data-retrieval layer.
///
/// Every field is optional on the wire and deserializes leniently: a
/// wrongly-typed field reads as missing instead of failing the record.
/// Unknown fields are ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TreatmentRecord {
    #[serde(
        deserialize_with = "deserialize_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Timestamp of the exchange; its calendar date (as authored) is the bucket key.
    #[serde(
        alias = "treatment_date",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub treatment_date: Option<String>,
    /// Volume instilled, in mL.
    #[serde(
        alias = "volume_in",
        deserialize_with = "deserialize_opt_volume",
        skip_serializing_if = "Option::is_none"
    )]
    pub volume_in: Option<f64>,
    /// Volume drained, in mL.
    #[serde(
        alias = "volume_out",
        deserialize_with = "deserialize_opt_volume",
        skip_serializing_if = "Option::is_none"
    )]
    pub volume_out: Option<f64>,
    #[serde(deserialize_with = "deserialize_status")]
    pub status: TreatmentStatus,
    #[serde(
        alias = "dry_night",
        deserialize_with = "deserialize_opt_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub dry_night: Option<bool>,
    #[serde(
        alias = "color_observation",
        deserialize_with = "deserialize_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub color_observation: Option<String>,
}

impl TreatmentRecord {
    /// Convenience constructor used by callers that already hold typed values.
    pub fn new(treatment_date: impl Into<String>, volume_in: f64, volume_out: f64) -> Self {
        Self {
            treatment_date: Some(treatment_date.into()),
            volume_in: Some(volume_in),
            volume_out: Some(volume_out),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: TreatmentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_dry_night(mut self, dry_night: bool) -> Self {
        self.dry_night = Some(dry_night);
        self
    }
}

fn deserialize_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn deserialize_opt_volume<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

fn deserialize_opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<TreatmentStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s.parse().unwrap_or_default(),
        _ => TreatmentStatus::Unknown,
    })
}
