use chrono::NaiveDate;
use dialysis_metrics::{
    AggregateConfig, LookbackRange, MetricsError, TreatmentStatus, aggregate_json, aggregate_str,
};
use serde_json::json;

fn cfg() -> AggregateConfig {
    AggregateConfig::new(NaiveDate::from_ymd_opt(2025, 4, 10).unwrap())
}

#[test]
fn rejects_non_array_payloads() {
    for payload in [json!(null), json!(3), json!("records"), json!({"id": "x"})] {
        let err = aggregate_json(&payload, &cfg()).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidInput(_)), "{payload}");
    }
}

#[test]
fn rejects_arrays_holding_non_objects() {
    let err = aggregate_json(&json!([[1, 2]]), &cfg()).unwrap_err();
    assert!(matches!(err, MetricsError::InvalidInput(_)));
}

#[test]
fn tolerates_extra_fields_and_partial_records() {
    let payload = json!([
        {
            "id": "a",
            "treatmentDate": "2025-04-09T07:00:00",
            "volumeIn": 2000,
            "status": "Finished",
            "patientName": "ignored",
            "bagLot": {"number": 7}
        },
        {
            "id": "b",
            "treatmentDate": "2025-04-09T13:00:00",
            "volumeOut": "1900",
            "status": "paused"
        },
        {"id": "c", "treatmentDate": null, "volumeIn": 100, "volumeOut": 100},
        {"id": "d", "treatmentDate": "09/04/2025", "volumeIn": 100, "volumeOut": 100},
        {}
    ]);
    let result = aggregate_json(&payload, &cfg()).expect("ok");
    assert_eq!(result.dropped_record_count, 3);
    assert_eq!(result.buckets.len(), 1);

    let day = result.buckets[0];
    assert_eq!(day.volume_in_sum, 2000.0);
    assert_eq!(day.volume_out_sum, 1900.0);
    assert_eq!(day.net_balance, -100.0);
    assert_eq!(result.status_counts.get(TreatmentStatus::Finished), 1);
    assert_eq!(result.status_counts.get(TreatmentStatus::Unknown), 1);
}

#[test]
fn negative_volumes_are_clamped_not_dropped() {
    let payload = json!([
        {"treatmentDate": "2025-04-08", "volumeIn": -500, "volumeOut": 300}
    ]);
    let result = aggregate_json(&payload, &cfg()).expect("ok");
    assert_eq!(result.dropped_record_count, 0);
    assert_eq!(result.clamped_volume_count, 1);
    assert_eq!(result.buckets[0].volume_in_sum, 0.0);
    assert_eq!(result.buckets[0].net_balance, 300.0);
}

#[test]
fn string_entry_point_parses_and_windows() {
    let text = r#"[
        {"treatmentDate": "2025-01-01T08:00:00", "volumeIn": 2000, "volumeOut": 2200},
        {"treatmentDate": "2025-04-05T08:00:00", "volumeIn": 2000, "volumeOut": 2100},
        {"treatmentDate": "2025-04-09T08:00:00", "volumeIn": 2000, "volumeOut": 2300}
    ]"#;
    let config = cfg().with_range(LookbackRange::Days7);
    let result = aggregate_str(text, &config).expect("ok");
    assert_eq!(result.summary.total_days, 3);
    assert_eq!(result.chart_series.len(), 2);
    assert_eq!(result.summary.total_balance, 600.0);
}

#[test]
fn dry_night_flags_roll_up_into_summary() {
    let payload = json!([
        {"treatmentDate": "2025-04-01T22:00:00", "dryNight": true},
        {"treatmentDate": "2025-04-02T22:00:00", "dry_night": 1},
        {"treatmentDate": "2025-04-03T22:00:00", "dryNight": false, "volumeIn": 2000, "volumeOut": 2000}
    ]);
    let result = aggregate_json(&payload, &cfg()).expect("ok");
    assert_eq!(result.summary.dry_night_count, 2);
    assert_eq!(result.summary.total_treatments, 3);
}
