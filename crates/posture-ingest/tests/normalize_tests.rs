//! Normalizer behaviour over realistic batches and on-disk sources

use posture_ingest::{
    IngestError, JsonRowsReader, Normalizer, RawRecord, RawRecordReader, SourceBatches,
};
use posture_model::{DiagnosticKind, EntityKind, EventKind, SourceKind};
use posture_test_utils::{edr_row, period, sample_batches};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::fs;

#[test]
fn sample_month_normalizes_with_one_skipped_row() {
    let out = Normalizer::new().normalize_all(&sample_batches(), period("2025-11"));

    let users = out.entities.iter().filter(|e| e.kind == EntityKind::User).count();
    let devices = out.entities.iter().filter(|e| e.kind == EntityKind::Device).count();
    assert_eq!((users, devices), (3, 2));

    let incidents = out
        .events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::EdrIncident { .. }))
        .count();
    assert_eq!(incidents, 2);
    assert_eq!(out.skipped_rows(), 1);
    assert_eq!(out.diagnostics[0].source, SourceKind::Edr);
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::MissingSubjectAndSeverity);
}

#[test]
fn json_reader_reads_present_sources_and_skips_absent_ones() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("users.json"),
        r#"[{"Email": "ann@corp.io", "Display Name": "Ann"}, {"Email": null}]"#,
    )
    .unwrap();

    let reader = JsonRowsReader::new(dir.path());
    let users = reader.read(SourceKind::Users).unwrap();
    assert_eq!(users.len(), 2);
    assert!(reader.read(SourceKind::Backup).unwrap().is_empty());

    let batches = SourceBatches::read_all(&reader).unwrap();
    let out = Normalizer::new().normalize_all(&batches, period("2025-11"));
    assert_eq!(out.entities.len(), 1);
    assert_eq!(out.skipped_rows(), 1);
}

#[test]
fn json_reader_rejects_non_array_source() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("edr.json"), r#"{"not": "rows"}"#).unwrap();

    let err = JsonRowsReader::new(dir.path())
        .read(SourceKind::Edr)
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidRows { .. }));
}

fn arb_cell() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(serde_json::Value::Null),
        "[a-zA-Z0-9 @._-]{0,12}".prop_map(serde_json::Value::from),
        any::<i32>().prop_map(serde_json::Value::from),
        any::<bool>().prop_map(serde_json::Value::from),
    ]
}

fn arb_row() -> impl Strategy<Value = RawRecord> {
    prop::collection::btree_map(
        prop_oneof![
            Just("Serial".to_string()),
            Just("Device Name".to_string()),
            Just("Email".to_string()),
            Just("Severity".to_string()),
            Just("Clicked".to_string()),
            Just("Status".to_string()),
            "[a-z ]{1,8}",
        ],
        arb_cell(),
        0..6,
    )
    .prop_map(|cells| cells.into_iter().collect())
}

proptest! {
    #[test]
    fn every_edr_row_is_either_an_event_or_a_skip(rows in prop::collection::vec(arb_row(), 0..40)) {
        let out = Normalizer::new().normalize(&rows, SourceKind::Edr, period("2025-11"));
        prop_assert_eq!(out.events.len() + out.skipped_rows(), rows.len());
    }

    #[test]
    fn device_rows_are_never_dropped(rows in prop::collection::vec(arb_row(), 0..40)) {
        let out = Normalizer::new().normalize(&rows, SourceKind::Devices, period("2025-11"));
        let duplicates = out
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::DuplicateIdentifier)
            .count();
        prop_assert_eq!(out.skipped_rows(), 0);
        prop_assert_eq!(out.entities.len() + duplicates, rows.len());
    }
}

#[test]
fn edr_fixture_uses_serial_subject() {
    let rows = [edr_row("s-1", "crit")];
    let out = Normalizer::new().normalize(&rows, SourceKind::Edr, period("2025-11"));
    assert_eq!(out.events[0].subject.as_ref().unwrap().as_str(), "S-1");
}
