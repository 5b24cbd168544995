//! End-to-end tests from raw rows to report model

use posture_ingest::{Normalizer, RawRecord, SourceBatches};
use posture_model::{DiagnosticKind, SourceKind};
use posture_report::{
    report_for, run_period, Measure, PeriodRun, PositiveObservation, RecommendationKind,
    ReportModel, ReportPolicy, SectionId,
};
use posture_test_utils::{
    backup_row, device_row, incident, period, sample_batches, serial, snapshot,
    snapshot_with_events,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn run_november(batches: &SourceBatches) -> PeriodRun {
    run_period(
        batches,
        period("2025-11"),
        None,
        &ReportPolicy::default(),
        &Normalizer::new(),
    )
    .unwrap()
}

#[test]
fn sample_month_report() {
    let run = run_period(
        &sample_batches(),
        period("2025-11"),
        None,
        &ReportPolicy::default(),
        &Normalizer::new(),
    )
    .unwrap();
    let report = &run.report;

    assert!(report.summary.baseline);
    assert_eq!(report.summary.user_count, 3);
    assert_eq!(report.summary.device_count, 2);
    assert_eq!(report.threat.incident_count_by_severity.high, 1);
    assert_eq!(report.threat.incident_count_by_severity.low, 1);
    assert_eq!(report.user_risk.phishing_failure_count, 1);
    assert_eq!(report.endpoint.backup_coverage_ratio, 1.0);
    assert_eq!(report.endpoint.backup_failure_count, 1);
    assert_eq!(report.data_quality.skipped_rows, 1);

    let kinds: Vec<RecommendationKind> = report.recommendations.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RecommendationKind::InvestigateHighIncidents,
            RecommendationKind::PhishingAwarenessTraining,
            RecommendationKind::ResolveBackupFailures,
            RecommendationKind::ResetExposedCredentials,
        ]
    );
    assert_eq!(report.recommendations[1].observed, Measure::Count(1));
    assert_eq!(report.recommendations[1].threshold, Measure::Count(0));
}

#[test]
fn backup_dated_last_month_still_covers_the_device() {
    let batches = SourceBatches::new()
        .with(SourceKind::Devices, vec![device_row("S1", Some("ann@corp.io"))])
        .with(
            SourceKind::Backup,
            vec![RawRecord::new()
                .with("Serial", "S1")
                .with("Status", "Success")
                .with("Last Successful Backup", "2025-10-31")],
        );

    let report = run_november(&batches).report;

    assert_eq!(report.endpoint.backup_coverage.covered, 1);
    assert_eq!(report.endpoint.backup_coverage_ratio, 1.0);
    assert_eq!(report.threat.events_outside_period, 0);
    assert!(report
        .recommendations
        .iter()
        .all(|r| r.kind != RecommendationKind::ExtendBackupCoverage));
    assert!(report
        .positive_observations
        .observations
        .contains(&PositiveObservation::FullBackupCoverage));
    assert_eq!(
        report.data_quality.diagnostics_by_kind[&DiagnosticKind::OutOfPeriodTimestamp],
        1
    );
    assert_eq!(report.data_quality.skipped_rows, 0);
}

#[test]
fn incidents_dated_in_other_months_are_counted() {
    let batches = SourceBatches::new().with(
        SourceKind::Edr,
        vec![
            RawRecord::new()
                .with("Serial", "S1")
                .with("Severity", "Critical")
                .with("Date", "2025-10-31"),
            RawRecord::new()
                .with("Serial", "S2")
                .with("Severity", "High")
                .with("Date", "2025-11-02"),
        ],
    );

    let run = run_november(&batches);
    let report = &run.report;

    assert_eq!(report.threat.incident_count_by_severity.critical, 1);
    assert_eq!(report.threat.incident_count_by_severity.high, 1);
    assert_eq!(report.summary.total_incidents, 2);
    assert!(!report.positive_observations.clean);
    assert_eq!(report.recommendations[0].kind, RecommendationKind::ContainCriticalIncidents);
    assert_eq!(report.threat.subjects_at_risk(), vec![&serial("S1"), &serial("S2")]);
    assert!(run.snapshot.events().iter().all(|e| e.period == period("2025-11")));
    assert!(run.snapshot.events().iter().all(|e| e.timestamp.is_some()));
}

#[test]
fn unidentified_devices_each_count_in_the_inventory() {
    let batches = SourceBatches::new()
        .with(
            SourceKind::Devices,
            vec![
                device_row("S1", Some("ann@corp.io")),
                RawRecord::new().with("Notes", "unlabelled"),
                RawRecord::new().with("Notes", "unlabelled"),
            ],
        )
        .with(SourceKind::Backup, vec![backup_row("S1", "Completed")]);

    let report = run_november(&batches).report;

    assert_eq!(report.summary.device_count, 3);
    assert_eq!(report.endpoint.backup_coverage.total, 3);
    assert_eq!(report.endpoint.backup_coverage.covered, 1);
    assert_eq!(report.endpoint.devices_without_backup.len(), 2);
    assert_eq!(report.endpoint.devices_without_owner.len(), 2);
    assert!(!report
        .data_quality
        .diagnostics_by_kind
        .contains_key(&DiagnosticKind::DuplicateIdentifier));
    assert_eq!(
        report.data_quality.diagnostics_by_kind[&DiagnosticKind::UnresolvedDevice],
        2
    );
}

#[test]
fn unidentified_devices_are_not_carried_between_months() {
    let unlabelled = || {
        SourceBatches::new().with(
            SourceKind::Devices,
            vec![device_row("S1", None), RawRecord::new().with("Notes", "spare")],
        )
    };
    let policy = ReportPolicy::default();
    let normalizer = Normalizer::new();
    let october = run_period(&unlabelled(), period("2025-10"), None, &policy, &normalizer).unwrap();
    let november = run_period(
        &unlabelled(),
        period("2025-11"),
        Some(&october.snapshot),
        &policy,
        &normalizer,
    )
    .unwrap();

    let report = &november.report;
    assert_eq!(report.summary.device_count, 2);
    assert_eq!(report.summary.devices_added, 0);
    assert_eq!(report.summary.devices_retired, 0);
}

#[test]
fn report_keys_are_stable() {
    let report =
        report_for(&snapshot("2025-11", &[], &[]), None, &ReportPolicy::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();

    let mut expected = vec!["period", "data_quality"];
    expected.extend(SectionId::ALL.iter().map(|id| id.as_str()));
    expected.sort_unstable();
    let mut actual = keys;
    actual.sort_unstable();
    assert_eq!(actual, expected);

    let back: ReportModel = serde_json::from_value(json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn threat_trend_uses_previous_period() {
    let previous = snapshot_with_events(
        "2025-10",
        &[],
        &[],
        vec![incident("2025-10", "critical"), incident("2025-10", "high")],
    );
    let current = snapshot_with_events("2025-11", &[], &[], vec![incident("2025-11", "high")]);

    let report = report_for(&current, Some(&previous), &ReportPolicy::default()).unwrap();

    assert!(!report.summary.baseline);
    assert_eq!(
        report
            .threat
            .previous_incident_count_by_severity
            .map(|c| c.critical),
        Some(1)
    );
    assert_eq!(report.threat.incident_count_by_severity.critical, 0);
}

#[test]
fn schema_names_every_section() {
    let schema = serde_json::to_value(ReportModel::json_schema()).unwrap();
    let properties = schema["properties"].as_object().unwrap();
    for id in SectionId::ALL {
        assert!(properties.contains_key(id.as_str()), "schema lacks {id}");
    }
}

/// One EDR export row: optional serial, severity and date cells
fn edr_row() -> impl Strategy<Value = RawRecord> {
    let serial = proptest::option::of("S[1-4]");
    let severity = proptest::option::of(prop_oneof![
        Just("Low"),
        Just("medium"),
        Just("HIGH"),
        Just("critical"),
        Just("sev9"),
    ]);
    let date = proptest::option::of(prop_oneof![
        Just("2025-10-31"),
        Just("2025-11-02"),
        Just("2025-12-01T08:00:00Z"),
        Just("last tuesday"),
    ]);
    (serial, severity, date).prop_map(|(serial, severity, date)| {
        let row = RawRecord::new().with("Description", "alert");
        let row = match serial {
            Some(serial) => row.with("Serial", serial),
            None => row,
        };
        let row = match severity {
            Some(severity) => row.with("Severity", severity),
            None => row,
        };
        match date {
            Some(date) => row.with("Date", date),
            None => row,
        }
    })
}

proptest! {
    #[test]
    fn every_retained_incident_row_lands_in_a_bucket(
        rows in proptest::collection::vec(edr_row(), 0..30),
    ) {
        let batches = SourceBatches::new().with(SourceKind::Edr, rows.clone());
        let run = run_november(&batches);
        let report = &run.report;

        let skipped = run
            .snapshot
            .diagnostics()
            .iter()
            .filter(|d| d.source == SourceKind::Edr && d.is_skip())
            .count() as u64;
        let retained = rows.len() as u64 - skipped;

        prop_assert_eq!(report.threat.incident_count_by_severity.total(), retained);
        prop_assert_eq!(report.summary.total_incidents, retained);
        prop_assert_eq!(report.threat.events_outside_period, 0);
        prop_assert_eq!(report.data_quality.skipped_rows, skipped);
    }

    #[test]
    fn identical_inputs_give_identical_reports(
        users in proptest::collection::vec("[a-e]{1,4}", 0..6),
    ) {
        let addresses: Vec<String> = users.iter().map(|u| format!("{u}@corp.io")).collect();
        let refs: Vec<&str> = addresses.iter().map(String::as_str).collect();
        let previous = snapshot("2025-10", &refs[..refs.len() / 2], &[]);
        let current = snapshot("2025-11", &refs, &[]);

        let a = report_for(&current, Some(&previous), &ReportPolicy::default()).unwrap();
        let b = report_for(&current, Some(&previous), &ReportPolicy::default()).unwrap();

        prop_assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        prop_assert_eq!(a.summary.user_count, current.users().len() as u64);
        prop_assert_eq!(a.summary.users_departed, 0);
        prop_assert_eq!(
            a.summary.users_joined,
            (current.users().len() - previous.users().len()) as u64
        );
    }
}
