//! Single-period pipeline
//!
//! normalize → snapshot → compare → assemble, for one period. Runs share
//! no mutable state, so independent periods can be processed in parallel.

use crate::assemble::assemble_with_policy;
use crate::error::ReportResult;
use crate::policy::ReportPolicy;
use crate::report::ReportModel;
use posture_delta::{compare, compare_first_period};
use posture_ingest::{Normalizer, SourceBatches};
use posture_model::{Period, PeriodSnapshot, SnapshotBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Ulid);

impl RunId {
    /// Create new run identifier
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Output of one run: the snapshot it owns and the report built from it
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRun {
    pub run_id: RunId,
    pub snapshot: PeriodSnapshot,
    pub report: ReportModel,
}

/// Build the snapshot of a period from its raw batches
///
/// Entities seen in `previous` keep their original `first_seen`.
#[must_use]
pub fn build_snapshot(
    batches: &SourceBatches,
    period: Period,
    previous: Option<&PeriodSnapshot>,
    normalizer: &Normalizer,
) -> PeriodSnapshot {
    let normalized = normalizer.normalize_all(batches, period);
    let skipped = normalized.skipped_rows();

    let mut builder = SnapshotBuilder::new(period);
    builder.extend_entities(normalized.entities);
    builder.extend_events(normalized.events);
    builder.extend_diagnostics(normalized.diagnostics);
    if let Some(previous) = previous {
        builder.inherit_first_seen(previous);
    }

    let snapshot = builder.build();
    tracing::debug!(
        users = snapshot.users().len(),
        devices = snapshot.devices().len(),
        events = snapshot.events().len(),
        skipped,
        "snapshot built"
    );
    snapshot
}

/// Run the pipeline for one period
///
/// # Errors
/// Returns error if `previous` is not earlier than `period`
pub fn run_period(
    batches: &SourceBatches,
    period: Period,
    previous: Option<&PeriodSnapshot>,
    policy: &ReportPolicy,
    normalizer: &Normalizer,
) -> ReportResult<PeriodRun> {
    let run_id = RunId::new();
    let span = tracing::info_span!("period", %period, %run_id);
    let _guard = span.enter();

    let snapshot = build_snapshot(batches, period, previous, normalizer);
    let report = report_for(&snapshot, previous, policy)?;

    tracing::info!(
        rows = batches.row_count(),
        skipped = report.data_quality.skipped_rows,
        recommendations = report.recommendations.len(),
        "period processed"
    );
    Ok(PeriodRun {
        run_id,
        snapshot,
        report,
    })
}

/// Report for an already-built snapshot
///
/// # Errors
/// Returns error if `previous` is not earlier than `current`
pub fn report_for(
    current: &PeriodSnapshot,
    previous: Option<&PeriodSnapshot>,
    policy: &ReportPolicy,
) -> ReportResult<ReportModel> {
    let delta = match previous {
        Some(previous) => compare(previous, current)?,
        None => compare_first_period(current),
    };
    Ok(assemble_with_policy(&delta, policy))
}
