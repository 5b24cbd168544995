//! Error types for ingestion
//!
//! Two families:
//! - [`MalformedSourceError`]: one raw row could not be normalized. Always
//!   recoverable; converted into a [`RowDiagnostic`] and the batch continues.
//! - [`IngestError`]: a whole source could not be read (I/O, bad JSON).

use posture_model::{DiagnosticKind, RowDiagnostic, SourceKind};
use std::path::PathBuf;

/// Why a row was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    /// Identifying field required by this source is absent
    #[error("missing required field '{field}'")]
    MissingIdentifier { field: &'static str },

    /// EDR row carries neither an entity reference nor a severity
    #[error("incident has neither an entity reference nor a severity")]
    MissingSubjectAndSeverity,

    /// Field present but not interpretable
    #[error("invalid value {value:?} for field '{field}'")]
    InvalidValue { field: &'static str, value: String },
}

impl MalformedReason {
    /// Diagnostic classification for this reason
    #[must_use]
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            Self::MissingIdentifier { .. } => DiagnosticKind::MissingIdentifier,
            Self::MissingSubjectAndSeverity => DiagnosticKind::MissingSubjectAndSeverity,
            Self::InvalidValue { .. } => DiagnosticKind::InvalidValue,
        }
    }
}

/// A raw row that could not be mapped onto the canonical schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {source_kind} row {row}: {reason}")]
pub struct MalformedSourceError {
    /// Batch the row came from
    pub source_kind: SourceKind,
    /// Zero-based row index
    pub row: usize,
    /// What was wrong
    pub reason: MalformedReason,
}

impl MalformedSourceError {
    /// Create error
    #[inline]
    #[must_use]
    pub fn new(source_kind: SourceKind, row: usize, reason: MalformedReason) -> Self {
        Self {
            source_kind,
            row,
            reason,
        }
    }
}

impl From<&MalformedSourceError> for RowDiagnostic {
    fn from(err: &MalformedSourceError) -> Self {
        RowDiagnostic::new(
            err.source_kind,
            err.row,
            err.reason.diagnostic_kind(),
            err.reason.to_string(),
        )
    }
}

/// Errors reading a whole raw source
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// IO error reading source file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file is not a JSON array of objects
    #[error("invalid rows in {path}: {source}")]
    InvalidRows {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl IngestError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for ingestion
pub type IngestResult<T> = Result<T, IngestError>;
