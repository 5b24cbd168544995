//! Posture Ingest
//!
//! Schema normalizer: maps heterogeneous raw rows (users, devices, EDR,
//! phishing, backup and dark-web exports) onto the canonical entities and
//! events of `posture-model`.
//!
//! # Core Concepts
//!
//! - [`RawRecord`]: Untyped column → value row as extracted from a file
//! - [`SynonymTable`]: Known header aliases per [`CanonicalField`]
//! - [`SourceNormalizer`]: Row mapping for one [`SourceKind`](posture_model::SourceKind)
//! - [`Normalizer`]: Best-effort batch driver producing [`Normalized`]
//! - [`RawRecordReader`]: Seam for file-format readers
//!
//! Normalization never fails as a whole: rows that cannot be mapped are
//! dropped and reported as diagnostics next to the partial result.
//!
//! # Example
//!
//! ```rust,ignore
//! use posture_ingest::{normalize, RawRecord};
//! use posture_model::SourceKind;
//!
//! let rows = vec![RawRecord::new().with("Serial Number", "pf3a9k")];
//! let out = normalize(&rows, SourceKind::Devices, "2025-11".parse()?);
//! assert_eq!(out.entities[0].id.as_str(), "PF3A9K");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod error;
mod headers;
mod normalizers;
mod reader;
mod record;

// Re-exports
pub use error::{IngestError, IngestResult, MalformedReason, MalformedSourceError};
pub use headers::{normalize_header, CanonicalField, SynonymTable};
pub use normalizers::{
    default_normalizers, normalize, parse_timestamp, period_of, BackupNormalizer,
    DarkWebNormalizer, DeviceNormalizer, EdrNormalizer, Normalized, Normalizer,
    NormalizerRegistry, PhishingNormalizer, RowContext, RowOutput, SourceNormalizer,
    UserNormalizer,
};
pub use reader::{JsonRowsReader, RawRecordReader, SourceBatches};
pub use record::{cell_text, RawRecord, RowView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
