//! Posture Model
//!
//! Canonical, source-independent data model for monthly security posture
//! reporting.
//!
//! # Core Concepts
//!
//! - [`Period`]: One calendar month (`YYYY-MM`), the cross-period join key
//! - [`Identifier`]: Normalized email or device serial; sole identity key
//! - [`Entity`]: A user or device observed in a period
//! - [`Event`]: An incident, phishing failure, backup observation or exposure
//! - [`PeriodSnapshot`]: Immutable normalized state of one period
//! - [`Fingerprint`]: blake3 digest of a value's canonical encoding
//!
//! # Example
//!
//! ```rust,ignore
//! use posture_model::{Entity, Identifier, Period, SnapshotBuilder};
//!
//! let period: Period = "2025-11".parse()?;
//! let snapshot = SnapshotBuilder::new(period)
//!     .entity(Entity::user(Identifier::email("a@corp.io").unwrap(), period))
//!     .build();
//!
//! println!("{} users, fingerprint {}", snapshot.users().len(), snapshot.fingerprint()?.short());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod diagnostic;
mod entity;
mod error;
mod event;
mod fingerprint;
mod identifier;
mod period;
mod snapshot;

// Re-exports
pub use diagnostic::{DiagnosticKind, RowDiagnostic, SourceKind};
pub use entity::Entity;
pub use error::{FingerprintError, PeriodError};
pub use event::{BackupState, Event, EventKind, Severity, SeverityCounts};
pub use fingerprint::Fingerprint;
pub use identifier::{EntityKind, Identifier, DEVICE_NAME_PREFIX, UNKNOWN_DEVICE};
pub use period::Period;
pub use snapshot::{PeriodSnapshot, SnapshotBuilder, SCHEMA_VERSION};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
