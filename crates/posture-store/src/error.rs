//! Error types for snapshot persistence

use posture_model::{Fingerprint, FingerprintError, Period};
use std::path::PathBuf;

/// Stored snapshot was written with another schema version
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("snapshot {period} has schema version {found}, expected {expected}")]
pub struct SchemaVersionMismatchError {
    pub period: Period,
    pub found: u32,
    pub expected: u32,
}

/// Errors reading or writing snapshots
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid snapshot document
    #[error("invalid snapshot document {path}: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Period already stored; snapshots are append-only
    #[error("snapshot for {0} already exists")]
    AlreadyExists(Period),

    /// Write refused because a later period was compared against the
    /// stored ones
    #[error("cannot store {period}: later period {later} is already stored")]
    LaterPeriodExists { period: Period, later: Period },

    /// Incompatible schema version
    #[error(transparent)]
    SchemaVersion(#[from] SchemaVersionMismatchError),

    /// Content does not match its recorded fingerprint
    #[error("snapshot {period} is corrupt: recorded {recorded}, computed {computed}")]
    Corrupt {
        period: Period,
        recorded: Fingerprint,
        computed: Fingerprint,
    },

    /// Snapshot could not be fingerprinted
    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] FingerprintError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn encoding(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Encoding {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_mismatch_display() {
        let err = SchemaVersionMismatchError {
            period: "2025-11".parse().unwrap(),
            found: 0,
            expected: 1,
        };
        assert_eq!(
            StoreError::from(err).to_string(),
            "snapshot 2025-11 has schema version 0, expected 1"
        );
    }
}
