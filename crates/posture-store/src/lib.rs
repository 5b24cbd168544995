//! Posture Store
//!
//! Append-only persistence of period snapshots.
//!
//! # Core Concepts
//!
//! - [`SnapshotStore`]: One fingerprinted JSON document per period
//! - [`SchemaVersionMismatchError`]: Stored layout differs from this build
//!
//! A snapshot is never rewritten once a later period has been stored, so a
//! delta computed against it stays reproducible.
//!
//! # Example
//!
//! ```rust,ignore
//! use posture_store::SnapshotStore;
//!
//! let store = SnapshotStore::new("data/snapshots");
//! let previous = store.previous_of(period)?;
//! store.put(&snapshot)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod error;
mod store;

// Re-exports
pub use error::{SchemaVersionMismatchError, StoreError, StoreResult};
pub use store::SnapshotStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
