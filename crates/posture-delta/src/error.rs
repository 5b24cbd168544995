//! Error types for reconciliation and comparison

use posture_model::{EntityKind, Identifier, Period};
use serde::{Deserialize, Serialize};

/// Same identifier observed with different entity kinds across periods
///
/// Never returned as `Err`: carried as a data-quality warning while the
/// identifier is classified as unchanged under its current kind.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema, thiserror::Error,
)]
#[error("{id} was a {previous_kind} in the previous period but is a {current_kind} now")]
pub struct IdentifierConflictError {
    /// Conflicting identifier
    pub id: Identifier,
    /// Kind in the previous snapshot
    pub previous_kind: EntityKind,
    /// Kind in the current snapshot (the one counted)
    pub current_kind: EntityKind,
}

/// Errors comparing two snapshots
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// Previous snapshot is not strictly earlier than current
    #[error("previous period {previous} is not before current period {current}")]
    PeriodOrder { previous: Period, current: Period },
}

/// Result type alias for comparison
pub type CompareResult<T> = Result<T, CompareError>;
