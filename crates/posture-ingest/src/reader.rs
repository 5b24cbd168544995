//! Raw row sources
//!
//! File-format parsing lives behind [`RawRecordReader`]. The bundled
//! [`JsonRowsReader`] reads one JSON array of objects per source kind, which
//! is what spreadsheet/CSV/PDF extractors are expected to emit.

use crate::error::{IngestError, IngestResult};
use crate::record::RawRecord;
use posture_model::SourceKind;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Produces untyped rows for a source kind
pub trait RawRecordReader {
    /// Rows for one source kind; an absent source yields no rows
    ///
    /// # Errors
    /// Returns error if the source exists but cannot be read or decoded
    fn read(&self, source: SourceKind) -> IngestResult<Vec<RawRecord>>;
}

/// Reads `<dir>/<source>.json` files
#[derive(Debug, Clone)]
pub struct JsonRowsReader {
    dir: PathBuf,
}

impl JsonRowsReader {
    /// Reader over a directory of per-source JSON files
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory read from
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding a source's rows
    #[must_use]
    pub fn path_for(&self, source: SourceKind) -> PathBuf {
        self.dir.join(format!("{}.json", source.as_str()))
    }
}

impl RawRecordReader for JsonRowsReader {
    fn read(&self, source: SourceKind) -> IngestResult<Vec<RawRecord>> {
        let path = self.path_for(source);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "source file absent; no rows");
                return Ok(Vec::new());
            }
            Err(err) => return Err(IngestError::io_error(path, err)),
        };

        serde_json::from_str(&content).map_err(|source| IngestError::InvalidRows { path, source })
    }
}

/// Raw rows grouped by source kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBatches {
    batches: BTreeMap<SourceKind, Vec<RawRecord>>,
}

impl SourceBatches {
    /// Create empty set of batches
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a batch (builder form)
    #[must_use]
    pub fn with(mut self, source: SourceKind, records: Vec<RawRecord>) -> Self {
        self.insert(source, records);
        self
    }

    /// Set the rows of a source, replacing any earlier batch
    pub fn insert(&mut self, source: SourceKind, records: Vec<RawRecord>) {
        self.batches.insert(source, records);
    }

    /// Rows of a source
    #[must_use]
    pub fn get(&self, source: SourceKind) -> Option<&[RawRecord]> {
        self.batches.get(&source).map(Vec::as_slice)
    }

    /// Total rows across sources
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.batches.values().map(Vec::len).sum()
    }

    /// Read every source kind through a reader
    ///
    /// # Errors
    /// Returns the first source that fails to read
    pub fn read_all<R: RawRecordReader + ?Sized>(reader: &R) -> IngestResult<Self> {
        let mut batches = Self::new();
        for source in SourceKind::ALL {
            let rows = reader.read(source)?;
            tracing::debug!(%source, rows = rows.len(), "source read");
            batches.insert(source, rows);
        }
        Ok(batches)
    }
}
