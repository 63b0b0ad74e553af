//! Offline runner around the `dialysis_metrics` engine: reads a JSON array of
//! treatment records, aggregates it and prints the result as JSON.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::NaiveDate;
use dialysis_metrics::{AggregateConfig, AggregateResult, TreatmentRecord, aggregate_str};

pub const LOG_LEVEL_ENV: &str = "DIALYSIS_METRICS_LOG_LEVEL";
pub const REFERENCE_DATE_ENV: &str = "DIALYSIS_METRICS_REFERENCE_DATE";

pub const USAGE: &str = "\
usage: dialysis-metrics [FILE|-]   aggregate treatment records (stdin when omitted)
       dialysis-metrics --schema   print the JSON schema of a treatment record
       dialysis-metrics --help

environment:
  DIALYSIS_METRICS_REFERENCE_DATE   YYYY-MM-DD used as today (default: local date)
  DIALYSIS_METRICS_RANGE            7d | 30d | 90d | all (default: all)
  DIALYSIS_METRICS_MAX_CHART_POINTS positive integer (default: 14)
  DIALYSIS_METRICS_LOG_LEVEL        tracing filter, falls back to RUST_LOG";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Aggregate { input: Option<PathBuf> },
    Schema,
    Help,
}

pub fn parse_args<I>(args: I) -> anyhow::Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    match args.as_slice() {
        [] => Ok(Command::Aggregate { input: None }),
        [flag] if flag == "--schema" => Ok(Command::Schema),
        [flag] if flag == "-h" || flag == "--help" => Ok(Command::Help),
        [path] if path == "-" => Ok(Command::Aggregate { input: None }),
        [path] if !path.starts_with("--") => Ok(Command::Aggregate {
            input: Some(PathBuf::from(path)),
        }),
        _ => bail!("unexpected arguments: {}\n\n{USAGE}", args.join(" ")),
    }
}

/// Log filter from `DIALYSIS_METRICS_LOG_LEVEL`, then `RUST_LOG`, then `info`.
pub fn log_filter_with<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    get(LOG_LEVEL_ENV)
        .or_else(|| get("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string())
}

/// The caller-side "today". The engine never reads the clock itself, so the
/// runner resolves it here.
pub fn reference_date_with<F>(mut get: F, today: NaiveDate) -> anyhow::Result<NaiveDate>
where
    F: FnMut(&str) -> Option<String>,
{
    match get(REFERENCE_DATE_ENV) {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("{REFERENCE_DATE_ENV} must be YYYY-MM-DD, got '{raw}'")),
        None => Ok(today),
    }
}

pub fn resolve_config<F>(mut get: F, today: NaiveDate) -> anyhow::Result<AggregateConfig>
where
    F: FnMut(&str) -> Option<String>,
{
    let reference_date = reference_date_with(&mut get, today)?;
    Ok(AggregateConfig::from_env_with(reference_date, get)?)
}

pub fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading records from {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading records from stdin")?;
            Ok(buf)
        }
    }
}

pub fn run_aggregate(input: &str, config: &AggregateConfig) -> anyhow::Result<AggregateResult> {
    let result = aggregate_str(input, config).context("aggregating treatment records")?;
    if result.dropped_record_count > 0 {
        tracing::warn!(
            dropped = result.dropped_record_count,
            "some treatment records had no usable date and were skipped"
        );
    }
    tracing::info!(
        days = result.summary.total_days,
        treatments = result.summary.total_treatments,
        compliance = result.summary.compliance_rate,
        interpretation = result.interpretation.label(),
        "aggregation complete"
    );
    Ok(result)
}

pub fn render(result: &AggregateResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

pub fn record_schema() -> anyhow::Result<String> {
    let schema = schemars::schema_for!(TreatmentRecord);
    Ok(serde_json::to_string_pretty(&schema)?)
}
