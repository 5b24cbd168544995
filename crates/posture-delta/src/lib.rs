//! Posture Delta
//!
//! Period-over-period analysis of normalized snapshots.
//!
//! # Core Concepts
//!
//! - [`reconcile`]: Joined / departed / unchanged identifiers per entity kind
//! - [`aggregate`]: Incident, phishing, backup and exposure metrics of a period
//! - [`compare`]: Both of the above for two snapshots, as a [`PeriodDelta`]
//! - [`DataQualityWarning`]: Kind conflicts and near-duplicate identifiers
//!
//! # Example
//!
//! ```rust,ignore
//! use posture_delta::{compare, compare_first_period};
//!
//! let delta = match previous.as_ref() {
//!     Some(previous) => compare(previous, &current)?,
//!     None => compare_first_period(&current),
//! };
//! println!("{} joiners, {} leavers", delta.users_joined().len(), delta.users_departed().len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod aggregate;
mod compare;
mod error;
mod reconcile;
mod similarity;
mod warning;

// Re-exports
pub use aggregate::{aggregate, aggregate_snapshot, BackupCoverage, MetricSummary};
pub use compare::{compare, compare_first_period, DeviceAssignment, OwnershipChange, PeriodDelta};
pub use error::{CompareError, CompareResult, IdentifierConflictError};
pub use reconcile::{
    reconcile, reconcile_first_period, KindReconciliation, Reconciliation,
    NEAR_DUPLICATE_MAX_DISTANCE,
};
pub use warning::DataQualityWarning;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
