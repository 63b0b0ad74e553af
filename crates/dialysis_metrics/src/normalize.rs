//! Record normalization: turns loosely-shaped [`TreatmentRecord`]s into
//! fully-defaulted [`NormalizedRecord`]s so downstream stages never deal with
//! missing fields.

use chrono::{NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::debug;

use crate::utils::parse_treatment_timestamp;
use crate::{TreatmentRecord, TreatmentStatus, observability};

/// A treatment record with a parsed timestamp and defaulted volumes.
#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub id: Option<String>,
    pub treated_at: NaiveDateTime,
    pub volume_in: f64,
    pub volume_out: f64,
    pub status: TreatmentStatus,
    pub dry_night: bool,
    pub color_observation: Option<String>,
}

impl NormalizedRecord {
    pub fn date(&self) -> NaiveDate {
        self.treated_at.date()
    }

    /// Ultrafiltration of this single exchange (`volume_out - volume_in`).
    pub fn net_balance(&self) -> f64 {
        self.volume_out - self.volume_in
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    MissingDate,
    UnparseableDate,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizeOutcome {
    pub records: Vec<NormalizedRecord>,
    /// Records excluded because they could not be assigned a calendar day.
    pub dropped: usize,
    /// Negative volume fields that were clamped to zero.
    pub clamped_volumes: usize,
}

/// Normalize a single record, or report why it cannot be bucketed.
///
/// The second tuple element counts volume fields clamped from a negative value.
pub fn normalize_record(
    record: &TreatmentRecord,
) -> Result<(NormalizedRecord, usize), DropReason> {
    let raw_date = record
        .treatment_date
        .as_deref()
        .ok_or(DropReason::MissingDate)?;
    let treated_at = parse_treatment_timestamp(raw_date).ok_or(DropReason::UnparseableDate)?;

    let mut clamped = 0;
    let mut volume = |v: Option<f64>| match v {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        Some(v) if v < 0.0 => {
            clamped += 1;
            0.0
        }
        _ => 0.0,
    };
    let volume_in = volume(record.volume_in);
    let volume_out = volume(record.volume_out);

    Ok((
        NormalizedRecord {
            id: record.id.clone(),
            treated_at,
            volume_in,
            volume_out,
            status: record.status,
            dry_night: record.dry_night.unwrap_or(false),
            color_observation: record.color_observation.clone(),
        },
        clamped,
    ))
}

/// Normalize a record set. Never fails; unusable records are counted in
/// [`NormalizeOutcome::dropped`].
pub fn normalize(records: &[TreatmentRecord]) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome {
        records: Vec::with_capacity(records.len()),
        ..NormalizeOutcome::default()
    };

    for record in records {
        match normalize_record(record) {
            Ok((normalized, clamped)) => {
                if clamped > 0 {
                    debug!(
                        id = record.id.as_deref().unwrap_or("-"),
                        clamped, "clamped negative treatment volume to zero"
                    );
                    outcome.clamped_volumes += clamped;
                }
                outcome.records.push(normalized);
            }
            Err(reason) => {
                debug!(
                    id = record.id.as_deref().unwrap_or("-"),
                    ?reason,
                    "dropping treatment record without a usable date"
                );
                outcome.dropped += 1;
            }
        }
    }

    observability::record_normalization(outcome.dropped, outcome.clamped_volumes);
    outcome
}
