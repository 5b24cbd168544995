//! Report sections
//!
//! Each section holds structured facts only, never prose. Constructors take
//! exactly the inputs a section is allowed to read, so a section cannot
//! depend on anything outside its declared set.

use posture_delta::{
    BackupCoverage, DataQualityWarning, DeviceAssignment, KindReconciliation, OwnershipChange,
};
use posture_model::{DiagnosticKind, Identifier, RowDiagnostic, SeverityCounts};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Direction of a metric compared to the previous period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Trend from `previous` to `current`
    #[must_use]
    pub fn between(previous: u64, current: u64) -> Self {
        match current.cmp(&previous) {
            Ordering::Greater => Trend::Up,
            Ordering::Less => Trend::Down,
            Ordering::Equal => Trend::Flat,
        }
    }
}

/// Headline numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummarySection {
    /// First reporting period (no previous snapshot)
    pub baseline: bool,
    pub users_joined: u64,
    pub users_departed: u64,
    pub devices_added: u64,
    pub devices_retired: u64,
    /// EDR incidents in the period
    pub total_incidents: u64,
    /// Users active in the period
    pub user_count: u64,
    /// Devices in the inventory
    pub device_count: u64,
}

impl SummarySection {
    /// Build from reconciliation counts and the top-line incident count
    #[must_use]
    pub fn build(
        baseline: bool,
        users: &KindReconciliation,
        devices: &KindReconciliation,
        total_incidents: u64,
    ) -> Self {
        Self {
            baseline,
            users_joined: users.joined.len() as u64,
            users_departed: users.departed.len() as u64,
            devices_added: devices.joined.len() as u64,
            devices_retired: devices.departed.len() as u64,
            total_incidents,
            user_count: users.current_count() as u64,
            device_count: devices.current_count() as u64,
        }
    }
}

/// Identity and access management: joiners and leavers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IamSection {
    pub users_joined: Vec<Identifier>,
    pub users_departed: Vec<Identifier>,
}

impl IamSection {
    /// Build from the full joiner and leaver lists
    #[must_use]
    pub fn build(users_joined: &[Identifier], users_departed: &[Identifier]) -> Self {
        Self {
            users_joined: users_joined.to_vec(),
            users_departed: users_departed.to_vec(),
        }
    }
}

/// Endpoint inventory and backup posture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EndpointSection {
    pub devices_added: Vec<Identifier>,
    pub devices_retired: Vec<Identifier>,
    pub backup_coverage_ratio: f64,
    /// Covered and total device counts behind the ratio
    pub backup_coverage: BackupCoverage,
    pub devices_without_backup: Vec<Identifier>,
    pub backup_failure_count: u64,
    pub ownership_changes: Vec<OwnershipChange>,
    pub devices_held_by_departed_users: Vec<DeviceAssignment>,
    /// Devices in service with no assigned user
    pub devices_without_owner: Vec<Identifier>,
}

/// Inputs of [`EndpointSection`]
#[derive(Debug, Clone, Copy)]
pub struct EndpointInputs<'a> {
    pub devices_added: &'a [Identifier],
    pub devices_retired: &'a [Identifier],
    pub backup_coverage: BackupCoverage,
    pub devices_without_backup: &'a [Identifier],
    pub backup_failure_count: u64,
    pub ownership_changes: &'a [OwnershipChange],
    pub devices_held_by_departed_users: &'a [DeviceAssignment],
    pub devices_without_owner: &'a [Identifier],
}

impl EndpointSection {
    /// Build from device changes and backup metrics
    #[must_use]
    pub fn build(inputs: EndpointInputs<'_>) -> Self {
        Self {
            devices_added: inputs.devices_added.to_vec(),
            devices_retired: inputs.devices_retired.to_vec(),
            backup_coverage_ratio: inputs.backup_coverage.ratio,
            backup_coverage: inputs.backup_coverage,
            devices_without_backup: inputs.devices_without_backup.to_vec(),
            backup_failure_count: inputs.backup_failure_count,
            ownership_changes: inputs.ownership_changes.to_vec(),
            devices_held_by_departed_users: inputs.devices_held_by_departed_users.to_vec(),
            devices_without_owner: inputs.devices_without_owner.to_vec(),
        }
    }
}

/// EDR incident picture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ThreatSection {
    pub incident_count_by_severity: SeverityCounts,
    pub total_incidents: u64,
    /// Previous period's buckets; absent for a baseline period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_incident_count_by_severity: Option<SeverityCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    /// Incidents per device or user; incidents without a subject are only
    /// in the buckets
    pub incidents_by_subject: BTreeMap<Identifier, SeverityCounts>,
    /// Events recorded under another period and left out of every count
    pub events_outside_period: u64,
}

impl ThreatSection {
    /// Build from current and previous severity buckets
    #[must_use]
    pub fn build(
        current: SeverityCounts,
        previous: Option<SeverityCounts>,
        incidents_by_subject: &BTreeMap<Identifier, SeverityCounts>,
        events_outside_period: u64,
    ) -> Self {
        Self {
            incident_count_by_severity: current,
            total_incidents: current.total(),
            trend: previous.map(|p| Trend::between(p.total(), current.total())),
            previous_incident_count_by_severity: previous,
            incidents_by_subject: incidents_by_subject.clone(),
            events_outside_period,
        }
    }

    /// Subjects with at least one critical or high incident, worst first
    #[must_use]
    pub fn subjects_at_risk(&self) -> Vec<&Identifier> {
        let mut at_risk: Vec<(&Identifier, &SeverityCounts)> = self
            .incidents_by_subject
            .iter()
            .filter(|(_, counts)| counts.critical + counts.high > 0)
            .collect();
        at_risk.sort_by(|(a, x), (b, y)| {
            (y.critical, y.high).cmp(&(x.critical, x.high)).then_with(|| a.cmp(b))
        });
        at_risk.into_iter().map(|(id, _)| id).collect()
    }
}

/// Human-factor risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserRiskSection {
    pub phishing_failure_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_phishing_failure_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    pub phishing_failed_users: Vec<Identifier>,
    pub credential_exposure_count: u64,
}

impl UserRiskSection {
    /// Build from phishing and exposure metrics
    #[must_use]
    pub fn build(
        phishing_failure_count: u64,
        previous_phishing_failure_count: Option<u64>,
        phishing_failed_users: &[Identifier],
        credential_exposure_count: u64,
    ) -> Self {
        Self {
            phishing_failure_count,
            previous_phishing_failure_count,
            trend: previous_phishing_failure_count
                .map(|p| Trend::between(p, phishing_failure_count)),
            phishing_failed_users: phishing_failed_users.to_vec(),
            credential_exposure_count,
        }
    }
}

/// Something that went well this period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PositiveObservation {
    NoCriticalIncidents,
    NoPhishingFailures,
    FullBackupCoverage,
    NoCredentialExposures,
}

/// Positive findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PositiveObservationsSection {
    /// No critical incidents and no phishing failures
    pub clean: bool,
    pub observations: Vec<PositiveObservation>,
}

impl PositiveObservationsSection {
    /// Derive from the threat, user risk and endpoint sections
    #[must_use]
    pub fn build(
        threat: &ThreatSection,
        user_risk: &UserRiskSection,
        endpoint: &EndpointSection,
    ) -> Self {
        let no_critical = threat.incident_count_by_severity.critical == 0;
        let no_phishing = user_risk.phishing_failure_count == 0;

        let observations = [
            (no_critical, PositiveObservation::NoCriticalIncidents),
            (no_phishing, PositiveObservation::NoPhishingFailures),
            (endpoint.backup_coverage.is_full(), PositiveObservation::FullBackupCoverage),
            (
                user_risk.credential_exposure_count == 0,
                PositiveObservation::NoCredentialExposures,
            ),
        ]
        .into_iter()
        .filter_map(|(holds, observation)| holds.then_some(observation))
        .collect();

        Self {
            clean: no_critical && no_phishing,
            observations,
        }
    }
}

/// Recommendation categories, in policy order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ContainCriticalIncidents,
    InvestigateHighIncidents,
    ClassifyIncidents,
    PhishingAwarenessTraining,
    ExtendBackupCoverage,
    ResolveBackupFailures,
    ResetExposedCredentials,
    ReviewDepartures,
    ReclaimDevicesFromDepartedUsers,
}

/// A counted or proportional measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Measure {
    Count(u64),
    Ratio(f64),
}

/// One triggered policy threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    /// Value seen this period
    pub observed: Measure,
    /// Policy threshold it crossed
    pub threshold: Measure,
}

/// Ingestion and reconciliation health of the period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DataQualitySection {
    /// Raw rows dropped during normalization
    pub skipped_rows: u64,
    /// Diagnostic counts by kind (dropped and kept rows)
    pub diagnostics_by_kind: BTreeMap<DiagnosticKind, u64>,
    pub warnings: Vec<DataQualityWarning>,
}

impl DataQualitySection {
    /// Build from the current period's diagnostics and reconciliation warnings
    #[must_use]
    pub fn build(diagnostics: &[RowDiagnostic], warnings: &[DataQualityWarning]) -> Self {
        let mut diagnostics_by_kind = BTreeMap::new();
        for diagnostic in diagnostics {
            *diagnostics_by_kind.entry(diagnostic.kind).or_insert(0) += 1;
        }
        Self {
            skipped_rows: diagnostics.iter().filter(|d| d.is_skip()).count() as u64,
            diagnostics_by_kind,
            warnings: warnings.to_vec(),
        }
    }

    /// Whether nothing was dropped or flagged
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics_by_kind.is_empty() && self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_direction() {
        assert_eq!(Trend::between(3, 5), Trend::Up);
        assert_eq!(Trend::between(5, 3), Trend::Down);
        assert_eq!(Trend::between(0, 0), Trend::Flat);
    }

    #[test]
    fn threat_trend_only_with_previous() {
        let mut now = SeverityCounts::default();
        now.high = 2;
        let baseline = ThreatSection::build(now, None, &BTreeMap::new(), 0);
        assert_eq!(baseline.trend, None);
        assert_eq!(baseline.total_incidents, 2);

        let json = serde_json::to_value(&baseline).unwrap();
        assert!(json.get("previous_incident_count_by_severity").is_none());

        let later = ThreatSection::build(now, Some(SeverityCounts::default()), &BTreeMap::new(), 0);
        assert_eq!(later.trend, Some(Trend::Up));
    }

    #[test]
    fn subjects_at_risk_are_ordered_worst_first() {
        let counts = |critical, high, low| SeverityCounts {
            critical,
            high,
            low,
            ..SeverityCounts::default()
        };
        let id = |s: &str| Identifier::serial(s).unwrap();
        let by_subject = BTreeMap::from([
            (id("A"), counts(0, 1, 0)),
            (id("B"), counts(1, 0, 0)),
            (id("C"), counts(0, 0, 3)),
            (id("D"), counts(0, 1, 5)),
        ]);
        let threat = ThreatSection::build(SeverityCounts::default(), None, &by_subject, 0);

        let ids: Vec<&str> = threat
            .subjects_at_risk()
            .into_iter()
            .map(Identifier::as_str)
            .collect();
        assert_eq!(ids, vec!["B", "A", "D"]);
    }

    #[test]
    fn measure_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Measure::Count(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Measure::Ratio(0.5)).unwrap(), "0.5");
    }

    #[test]
    fn diagnostics_counted_by_kind() {
        use posture_model::SourceKind;
        let diagnostics = [
            RowDiagnostic::new(SourceKind::Edr, 0, DiagnosticKind::MissingSubjectAndSeverity, "x"),
            RowDiagnostic::new(SourceKind::Devices, 3, DiagnosticKind::UnresolvedDevice, "y"),
            RowDiagnostic::new(SourceKind::Devices, 4, DiagnosticKind::UnresolvedDevice, "z"),
        ];
        let section = DataQualitySection::build(&diagnostics, &[]);
        assert_eq!(section.skipped_rows, 1);
        assert_eq!(section.diagnostics_by_kind[&DiagnosticKind::UnresolvedDevice], 2);
        assert!(!section.is_clean());
    }
}
