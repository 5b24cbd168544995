//! Metric Aggregator
//!
//! Per-period counts and rates computed from normalized events. Only events
//! whose period equals the requested period are counted; the rest are
//! tallied in `events_outside_period` and otherwise ignored.

use posture_model::{
    BackupState, Event, EventKind, Identifier, Period, PeriodSnapshot, SeverityCounts,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Backup coverage over the device inventory
///
/// # Invariants
/// - `covered <= total`
/// - `ratio == covered / total`, or `0.0` when `total == 0`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BackupCoverage {
    /// Inventory devices with a configured backup job
    pub covered: u64,
    /// Inventory size
    pub total: u64,
    /// `covered / total`, in `[0, 1]`
    pub ratio: f64,
}

impl BackupCoverage {
    /// Compute coverage; never divides by zero
    #[must_use]
    pub fn new(covered: u64, total: u64) -> Self {
        let covered = covered.min(total);
        #[allow(clippy::cast_precision_loss)]
        let ratio = if total == 0 {
            0.0
        } else {
            covered as f64 / total as f64
        };
        Self {
            covered,
            total,
            ratio,
        }
    }

    /// Whether every inventory device is covered (false for an empty inventory)
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.total > 0 && self.covered == self.total
    }
}

/// Metrics of one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MetricSummary {
    /// Period the metrics describe
    pub period: Period,
    /// EDR incidents per severity bucket
    pub incident_count_by_severity: SeverityCounts,
    /// EDR incidents in the period; equals the bucket sum
    pub total_incidents: u64,
    /// EDR incidents per device or user they were raised against
    pub incidents_by_subject: BTreeMap<Identifier, SeverityCounts>,
    /// Phishing simulation failures
    pub phishing_failure_count: u64,
    /// Distinct users who failed a simulation, sorted
    pub phishing_failed_users: Vec<Identifier>,
    /// Backup coverage over the device inventory
    pub backup_coverage: BackupCoverage,
    /// Distinct devices with a failed backup job
    pub backup_failure_count: u64,
    /// Inventory devices with no configured backup, sorted
    pub devices_without_backup: Vec<Identifier>,
    /// Dark-web credential exposures
    pub credential_exposure_count: u64,
    /// Events ignored because they belong to another period
    pub events_outside_period: u64,
}

impl MetricSummary {
    /// Coverage ratio shortcut
    #[inline]
    #[must_use]
    pub fn backup_coverage_ratio(&self) -> f64 {
        self.backup_coverage.ratio
    }
}

/// Aggregate events of `period`
///
/// `inventory` is the period's device inventory and the backup coverage
/// denominator: a device is covered when at least one in-period backup event
/// for it reports a configured job.
pub fn aggregate<'a, I>(events: &[Event], period: Period, inventory: I) -> MetricSummary
where
    I: IntoIterator<Item = &'a Identifier>,
{
    let mut incidents = SeverityCounts::default();
    let mut incidents_by_subject: BTreeMap<Identifier, SeverityCounts> = BTreeMap::new();
    let mut phishing_failure_count = 0;
    let mut phishing_failed_users = BTreeSet::new();
    let mut backed_up = BTreeSet::new();
    let mut failed_backups = BTreeSet::new();
    let mut credential_exposure_count = 0;
    let mut events_outside_period = 0;

    for event in events {
        if event.period != period {
            events_outside_period += 1;
            continue;
        }
        match &event.kind {
            EventKind::EdrIncident { severity } => {
                incidents.increment(*severity);
                if let Some(subject) = &event.subject {
                    incidents_by_subject
                        .entry(subject.clone())
                        .or_default()
                        .increment(*severity);
                }
            }
            EventKind::PhishingFailure { .. } => {
                phishing_failure_count += 1;
                if let Some(user) = &event.subject {
                    phishing_failed_users.insert(user);
                }
            }
            EventKind::BackupStatus { state } => {
                if let Some(device) = &event.subject {
                    if state.is_configured() {
                        backed_up.insert(device);
                    }
                    if *state == BackupState::Failed {
                        failed_backups.insert(device);
                    }
                }
            }
            EventKind::CredentialExposure { .. } => credential_exposure_count += 1,
        }
    }

    let inventory: BTreeSet<&Identifier> = inventory.into_iter().collect();
    let devices_without_backup: Vec<Identifier> = inventory
        .iter()
        .filter(|id| !backed_up.contains(*id))
        .map(|id| (*id).clone())
        .collect();
    let total = inventory.len() as u64;
    let covered = total - devices_without_backup.len() as u64;

    if events_outside_period > 0 {
        tracing::debug!(%period, events_outside_period, "events outside period ignored");
    }

    MetricSummary {
        period,
        total_incidents: incidents.total(),
        incident_count_by_severity: incidents,
        incidents_by_subject,
        phishing_failure_count,
        phishing_failed_users: phishing_failed_users.into_iter().cloned().collect(),
        backup_coverage: BackupCoverage::new(covered, total),
        backup_failure_count: failed_backups.len() as u64,
        devices_without_backup,
        credential_exposure_count,
        events_outside_period,
    }
}

/// Aggregate a snapshot's own events against its device inventory
#[must_use]
pub fn aggregate_snapshot(snapshot: &PeriodSnapshot) -> MetricSummary {
    aggregate(snapshot.events(), snapshot.period(), snapshot.devices().keys())
}
