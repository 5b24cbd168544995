//! Report Model Assembler
//!
//! Maps a [`PeriodDelta`] onto the fixed section schema. Each section is
//! built from its own slice of the delta; positive observations and
//! recommendations are derived from the sections afterwards.

use crate::policy::ReportPolicy;
use crate::report::ReportModel;
use crate::sections::{
    DataQualitySection, EndpointInputs, EndpointSection, IamSection, Measure,
    PositiveObservationsSection, Recommendation, RecommendationKind, SummarySection,
    ThreatSection, UserRiskSection,
};
use posture_delta::PeriodDelta;

/// Assemble with the default policy
#[must_use]
pub fn assemble(delta: &PeriodDelta<'_>) -> ReportModel {
    assemble_with_policy(delta, &ReportPolicy::default())
}

/// Assemble with an explicit recommendation policy
#[must_use]
pub fn assemble_with_policy(delta: &PeriodDelta<'_>, policy: &ReportPolicy) -> ReportModel {
    let metrics = delta.metrics();
    let previous = delta.previous_metrics();

    let summary = SummarySection::build(
        delta.is_baseline(),
        delta.users(),
        delta.devices(),
        metrics.total_incidents,
    );
    let iam = IamSection::build(delta.users_joined(), delta.users_departed());
    let endpoint = EndpointSection::build(EndpointInputs {
        devices_added: delta.devices_added(),
        devices_retired: delta.devices_retired(),
        backup_coverage: metrics.backup_coverage,
        devices_without_backup: &metrics.devices_without_backup,
        backup_failure_count: metrics.backup_failure_count,
        ownership_changes: delta.ownership_changes(),
        devices_held_by_departed_users: delta.devices_held_by_departed_users(),
        devices_without_owner: delta.devices_without_owner(),
    });
    let threat = ThreatSection::build(
        metrics.incident_count_by_severity,
        previous.map(|m| m.incident_count_by_severity),
        &metrics.incidents_by_subject,
        metrics.events_outside_period,
    );
    let user_risk = UserRiskSection::build(
        metrics.phishing_failure_count,
        previous.map(|m| m.phishing_failure_count),
        &metrics.phishing_failed_users,
        metrics.credential_exposure_count,
    );
    let positive_observations = PositiveObservationsSection::build(&threat, &user_risk, &endpoint);
    let data_quality = DataQualitySection::build(delta.current().diagnostics(), delta.warnings());

    let recommendations = recommend(policy, &summary, &endpoint, &threat, &user_risk);

    tracing::debug!(
        period = %delta.period(),
        recommendations = recommendations.len(),
        clean = positive_observations.clean,
        "report model assembled"
    );

    ReportModel {
        period: delta.period(),
        summary,
        iam,
        endpoint,
        threat,
        user_risk,
        positive_observations,
        recommendations,
        data_quality,
    }
}

/// Evaluate policy thresholds against assembled sections, in policy order
#[must_use]
pub fn recommend(
    policy: &ReportPolicy,
    summary: &SummarySection,
    endpoint: &EndpointSection,
    threat: &ThreatSection,
    user_risk: &UserRiskSection,
) -> Vec<Recommendation> {
    let counts = &threat.incident_count_by_severity;
    let coverage = (endpoint.backup_coverage.total > 0
        && endpoint.backup_coverage_ratio < policy.min_backup_coverage)
        .then(|| Recommendation {
            kind: RecommendationKind::ExtendBackupCoverage,
            observed: Measure::Ratio(endpoint.backup_coverage_ratio),
            threshold: Measure::Ratio(policy.min_backup_coverage),
        });

    [
        exceeds(
            RecommendationKind::ContainCriticalIncidents,
            counts.critical,
            policy.max_critical_incidents,
        ),
        exceeds(
            RecommendationKind::InvestigateHighIncidents,
            counts.high,
            policy.max_high_incidents,
        ),
        exceeds(
            RecommendationKind::ClassifyIncidents,
            counts.unclassified,
            policy.max_unclassified_incidents,
        ),
        exceeds(
            RecommendationKind::PhishingAwarenessTraining,
            user_risk.phishing_failure_count,
            policy.max_phishing_failures,
        ),
        coverage,
        exceeds(
            RecommendationKind::ResolveBackupFailures,
            endpoint.backup_failure_count,
            policy.max_backup_failures,
        ),
        exceeds(
            RecommendationKind::ResetExposedCredentials,
            user_risk.credential_exposure_count,
            policy.max_credential_exposures,
        ),
        policy.max_departed_users.and_then(|max| {
            exceeds(RecommendationKind::ReviewDepartures, summary.users_departed, max)
        }),
        exceeds(
            RecommendationKind::ReclaimDevicesFromDepartedUsers,
            endpoint.devices_held_by_departed_users.len() as u64,
            policy.max_devices_held_by_departed_users,
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn exceeds(kind: RecommendationKind, observed: u64, max: u64) -> Option<Recommendation> {
    (observed > max).then_some(Recommendation {
        kind,
        observed: Measure::Count(observed),
        threshold: Measure::Count(max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use posture_delta::{compare, compare_first_period};
    use posture_model::{
        BackupState, Entity, Event, EventKind, Identifier, Period, Severity, SnapshotBuilder,
    };
    use pretty_assertions::assert_eq;

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn sn(s: &str) -> Identifier {
        Identifier::serial(s).unwrap()
    }

    #[test]
    fn empty_period_is_clean_and_quiet() {
        let snapshot = SnapshotBuilder::new(p("2025-11")).build();
        let report = assemble(&compare_first_period(&snapshot));

        assert!(report.summary.baseline);
        assert!(report.positive_observations.clean);
        assert_eq!(report.endpoint.backup_coverage_ratio, 0.0);
        assert!(report.recommendations.is_empty());
        assert!(report.data_quality.is_clean());
    }

    #[test]
    fn thresholds_trigger_in_policy_order() {
        let now = p("2025-11");
        let ann = Identifier::email("ann@x.io").unwrap();
        let snapshot = SnapshotBuilder::new(now)
            .entity(Entity::device(sn("A"), now))
            .entity(Entity::device(sn("B"), now))
            .event(Event::new(
                now,
                None,
                EventKind::EdrIncident { severity: Severity::Critical },
            ))
            .event(Event::new(now, Some(ann), EventKind::PhishingFailure { clicks: 1 }))
            .event(Event::new(
                now,
                Some(sn("A")),
                EventKind::BackupStatus { state: BackupState::Failed },
            ))
            .build();

        let report = assemble(&compare_first_period(&snapshot));
        let kinds: Vec<RecommendationKind> =
            report.recommendations.iter().map(|r| r.kind).collect();

        assert_eq!(
            kinds,
            vec![
                RecommendationKind::ContainCriticalIncidents,
                RecommendationKind::PhishingAwarenessTraining,
                RecommendationKind::ExtendBackupCoverage,
                RecommendationKind::ResolveBackupFailures,
            ]
        );
        assert_eq!(report.recommendations[2].observed, Measure::Ratio(0.5));
        assert!(!report.positive_observations.clean);
        assert_eq!(report.endpoint.devices_without_owner, vec![sn("A"), sn("B")]);
    }

    #[test]
    fn threat_section_attributes_incidents_to_devices() {
        let now = p("2025-11");
        let incident = |device: &str, severity: Severity| {
            Event::new(now, Some(sn(device)), EventKind::EdrIncident { severity })
        };
        let snapshot = SnapshotBuilder::new(now)
            .entity(Entity::device(sn("A"), now))
            .event(incident("A", Severity::Critical))
            .event(incident("A", Severity::Low))
            .event(incident("B", Severity::High))
            .build();

        let report = assemble(&compare_first_period(&snapshot));

        assert_eq!(report.threat.incidents_by_subject.len(), 2);
        assert_eq!(report.threat.incidents_by_subject[&sn("A")].total(), 2);
        assert_eq!(report.threat.subjects_at_risk(), vec![&sn("A"), &sn("B")]);
        assert_eq!(report.threat.total_incidents, 3);
    }

    #[test]
    fn relaxed_policy_suppresses_recommendations() {
        let now = p("2025-11");
        let snapshot = SnapshotBuilder::new(now)
            .event(Event::new(
                now,
                Identifier::email("a@x.io"),
                EventKind::PhishingFailure { clicks: 1 },
            ))
            .build();
        let policy = ReportPolicy::new().with_max_phishing_failures(5);
        let report = assemble_with_policy(&compare_first_period(&snapshot), &policy);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn departure_review_only_when_enabled() {
        let (oct, nov) = (p("2025-10"), p("2025-11"));
        let previous = SnapshotBuilder::new(oct)
            .entity(Entity::user(Identifier::email("a@x.io").unwrap(), oct))
            .build();
        let current = SnapshotBuilder::new(nov).build();
        let delta = compare(&previous, &current).unwrap();

        assert!(assemble(&delta).recommendations.is_empty());

        let policy = ReportPolicy::new().with_max_departed_users(Some(0));
        let report = assemble_with_policy(&delta, &policy);
        assert_eq!(report.recommendations[0].kind, RecommendationKind::ReviewDepartures);
        assert_eq!(report.iam.users_departed.len(), 1);
        assert!(!report.summary.baseline);
    }
}
