use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::MetricsError;
use crate::window::LookbackRange;

pub const DEFAULT_MAX_CHART_POINTS: usize = 14;

pub const RANGE_ENV: &str = "DIALYSIS_METRICS_RANGE";
pub const MAX_CHART_POINTS_ENV: &str = "DIALYSIS_METRICS_MAX_CHART_POINTS";

/// Per-call configuration of the aggregation facade.
///
/// `reference_date` is "today" for compliance and window calculations. It is
/// always supplied by the caller; the engine never reads the clock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregateConfig {
    #[serde(default)]
    pub range: LookbackRange,
    #[serde(default = "default_max_chart_points")]
    pub max_chart_points: usize,
    pub reference_date: NaiveDate,
}

fn default_max_chart_points() -> usize {
    DEFAULT_MAX_CHART_POINTS
}

impl AggregateConfig {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            range: LookbackRange::default(),
            max_chart_points: DEFAULT_MAX_CHART_POINTS,
            reference_date,
        }
    }

    pub fn with_range(mut self, range: LookbackRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_max_chart_points(mut self, max_chart_points: usize) -> Self {
        self.max_chart_points = max_chart_points;
        self
    }

    pub fn from_env(reference_date: NaiveDate) -> Result<Self, MetricsError> {
        Self::from_env_with(reference_date, |k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(reference_date: NaiveDate, mut get: F) -> Result<Self, MetricsError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::new(reference_date);
        if let Some(raw) = get(RANGE_ENV) {
            config.range = raw.parse()?;
        }
        if let Some(raw) = get(MAX_CHART_POINTS_ENV) {
            config.max_chart_points = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(MetricsError::Config(format!(
                        "{MAX_CHART_POINTS_ENV} must be a positive integer, got '{raw}'"
                    )));
                }
            };
        }
        Ok(config)
    }
}
