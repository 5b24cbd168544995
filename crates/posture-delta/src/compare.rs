//! Period Comparator
//!
//! Combines reconciliation and aggregation into a [`PeriodDelta`], the
//! single structure reporting reads from. Everything in a delta is derived
//! from the two borrowed snapshots, so comparing the same snapshots twice
//! yields identical deltas.

use crate::aggregate::{aggregate_snapshot, MetricSummary};
use crate::error::{CompareError, CompareResult};
use crate::reconcile::{reconcile, reconcile_first_period, KindReconciliation, Reconciliation};
use crate::warning::DataQualityWarning;
use posture_model::{
    Fingerprint, FingerprintError, Identifier, Period, PeriodSnapshot, SeverityCounts,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Device that kept its identity but changed assigned user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OwnershipChange {
    /// Device identifier
    pub device: Identifier,
    /// Owner in the previous period
    pub from: Option<Identifier>,
    /// Owner in the current period
    pub to: Option<Identifier>,
}

/// Device still assigned to a user who departed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DeviceAssignment {
    /// Device identifier
    pub device: Identifier,
    /// Departed user it is assigned to
    pub user: Identifier,
}

/// Difference between two consecutive snapshots
///
/// Borrows both snapshots read-only and owns everything derived from them.
/// For a first period `previous` is `None`, every entity is joined and
/// nothing is departed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodDelta<'a> {
    #[serde(skip)]
    previous: Option<&'a PeriodSnapshot>,
    #[serde(skip)]
    current: &'a PeriodSnapshot,
    period: Period,
    previous_period: Option<Period>,
    users: KindReconciliation,
    devices: KindReconciliation,
    metrics: MetricSummary,
    previous_metrics: Option<MetricSummary>,
    ownership_changes: Vec<OwnershipChange>,
    devices_held_by_departed_users: Vec<DeviceAssignment>,
    devices_without_owner: Vec<Identifier>,
    warnings: Vec<DataQualityWarning>,
}

impl<'a> PeriodDelta<'a> {
    /// Current snapshot
    #[inline]
    #[must_use]
    pub fn current(&self) -> &'a PeriodSnapshot {
        self.current
    }

    /// Previous snapshot; `None` for a first period
    #[inline]
    #[must_use]
    pub fn previous(&self) -> Option<&'a PeriodSnapshot> {
        self.previous
    }

    /// Current period
    #[inline]
    #[must_use]
    pub fn period(&self) -> Period {
        self.period
    }

    /// Previous period; `None` for a first period
    #[inline]
    #[must_use]
    pub fn previous_period(&self) -> Option<Period> {
        self.previous_period
    }

    /// Whether this is a first reporting period
    #[inline]
    #[must_use]
    pub fn is_baseline(&self) -> bool {
        self.previous.is_none()
    }

    /// User classification
    #[inline]
    #[must_use]
    pub fn users(&self) -> &KindReconciliation {
        &self.users
    }

    /// Device classification
    #[inline]
    #[must_use]
    pub fn devices(&self) -> &KindReconciliation {
        &self.devices
    }

    /// Users present now and not before
    #[inline]
    #[must_use]
    pub fn users_joined(&self) -> &[Identifier] {
        &self.users.joined
    }

    /// Users present before and not now
    #[inline]
    #[must_use]
    pub fn users_departed(&self) -> &[Identifier] {
        &self.users.departed
    }

    /// Devices present now and not before
    #[inline]
    #[must_use]
    pub fn devices_added(&self) -> &[Identifier] {
        &self.devices.joined
    }

    /// Devices present before and not now
    #[inline]
    #[must_use]
    pub fn devices_retired(&self) -> &[Identifier] {
        &self.devices.departed
    }

    /// Metrics of the current period
    #[inline]
    #[must_use]
    pub fn metrics(&self) -> &MetricSummary {
        &self.metrics
    }

    /// Metrics of the previous period, recomputed from its snapshot
    #[inline]
    #[must_use]
    pub fn previous_metrics(&self) -> Option<&MetricSummary> {
        self.previous_metrics.as_ref()
    }

    /// Current incident counts per severity
    #[inline]
    #[must_use]
    pub fn incident_counts(&self) -> &SeverityCounts {
        &self.metrics.incident_count_by_severity
    }

    /// Current phishing failure count
    #[inline]
    #[must_use]
    pub fn phishing_failure_count(&self) -> u64 {
        self.metrics.phishing_failure_count
    }

    /// Current backup coverage ratio
    #[inline]
    #[must_use]
    pub fn backup_coverage_ratio(&self) -> f64 {
        self.metrics.backup_coverage.ratio
    }

    /// Unchanged devices whose assigned user changed
    #[inline]
    #[must_use]
    pub fn ownership_changes(&self) -> &[OwnershipChange] {
        &self.ownership_changes
    }

    /// Current devices still assigned to departed users
    #[inline]
    #[must_use]
    pub fn devices_held_by_departed_users(&self) -> &[DeviceAssignment] {
        &self.devices_held_by_departed_users
    }

    /// Current devices in use with no assigned user, sorted
    #[inline]
    #[must_use]
    pub fn devices_without_owner(&self) -> &[Identifier] {
        &self.devices_without_owner
    }

    /// Reconciliation warnings
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[DataQualityWarning] {
        &self.warnings
    }

    /// Fingerprint of the derived content
    ///
    /// # Errors
    /// Returns error if the delta cannot be serialized
    pub fn fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
        Fingerprint::of(self)
    }
}

/// Compare two snapshots
///
/// # Errors
/// Returns [`CompareError::PeriodOrder`] unless `previous` is strictly
/// earlier than `current`
pub fn compare<'a>(
    previous: &'a PeriodSnapshot,
    current: &'a PeriodSnapshot,
) -> CompareResult<PeriodDelta<'a>> {
    if previous.period() >= current.period() {
        return Err(CompareError::PeriodOrder {
            previous: previous.period(),
            current: current.period(),
        });
    }

    let Reconciliation {
        users,
        devices,
        warnings,
    } = reconcile(previous.entities(), current.entities());

    let ownership_changes = devices
        .unchanged
        .iter()
        .filter_map(|id| {
            let from = previous.devices().get(id)?.owner.clone();
            let to = current.devices().get(id)?.owner.clone();
            (from != to).then(|| OwnershipChange {
                device: id.clone(),
                from,
                to,
            })
        })
        .collect();

    let departed: BTreeSet<&Identifier> = users.departed.iter().collect();
    let devices_held_by_departed_users: Vec<DeviceAssignment> = current
        .devices()
        .values()
        .filter_map(|device| {
            let owner = device.owner.as_ref()?;
            departed.contains(owner).then(|| DeviceAssignment {
                device: device.id.clone(),
                user: owner.clone(),
            })
        })
        .collect();

    for held in &devices_held_by_departed_users {
        tracing::warn!(
            device = %held.device,
            user = %held.user,
            "departed user still holds device"
        );
    }

    let delta = PeriodDelta {
        previous: Some(previous),
        current,
        period: current.period(),
        previous_period: Some(previous.period()),
        users,
        devices,
        metrics: aggregate_snapshot(current),
        previous_metrics: Some(aggregate_snapshot(previous)),
        ownership_changes,
        devices_held_by_departed_users,
        devices_without_owner: devices_without_owner(current),
        warnings,
    };
    tracing::debug!(
        previous = %previous.period(),
        current = %current.period(),
        warnings = delta.warnings.len(),
        "periods compared"
    );
    Ok(delta)
}

/// Delta for a first reporting period (no previous snapshot exists)
#[must_use]
pub fn compare_first_period(current: &PeriodSnapshot) -> PeriodDelta<'_> {
    let Reconciliation {
        users,
        devices,
        warnings,
    } = reconcile_first_period(current.entities());

    tracing::debug!(current = %current.period(), "first period; baseline delta");
    PeriodDelta {
        previous: None,
        current,
        period: current.period(),
        previous_period: None,
        users,
        devices,
        metrics: aggregate_snapshot(current),
        previous_metrics: None,
        ownership_changes: Vec::new(),
        devices_held_by_departed_users: Vec::new(),
        devices_without_owner: devices_without_owner(current),
        warnings,
    }
}

/// Devices not marked inactive that have no assigned user
fn devices_without_owner(snapshot: &PeriodSnapshot) -> Vec<Identifier> {
    let orphaned: Vec<Identifier> = snapshot
        .devices()
        .values()
        .filter(|device| device.active != Some(false) && device.owner.is_none())
        .map(|device| device.id.clone())
        .collect();
    if !orphaned.is_empty() {
        tracing::debug!(devices = orphaned.len(), "devices without an assigned user");
    }
    orphaned
}
