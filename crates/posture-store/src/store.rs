//! Snapshot store
//!
//! One JSON document per period at `<root>/<YYYY-MM>.json`:
//!
//! ```json
//! { "schema_version": 1, "fingerprint": "<blake3 hex>", "snapshot": { ... } }
//! ```
//!
//! Documents are written to a temporary file in the same directory and then
//! renamed into place, so readers never observe a partial snapshot.

use crate::error::{SchemaVersionMismatchError, StoreError, StoreResult};
use posture_model::{Fingerprint, Period, PeriodSnapshot, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const EXTENSION: &str = "json";

#[derive(Serialize)]
struct DocumentRef<'a> {
    schema_version: u32,
    fingerprint: Fingerprint,
    snapshot: &'a PeriodSnapshot,
}

#[derive(Deserialize)]
struct Document {
    schema_version: u32,
    fingerprint: Fingerprint,
    snapshot: serde_json::Value,
}

/// Directory of per-period snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at a directory (created on first write)
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document path of a period
    #[must_use]
    pub fn path_for(&self, period: Period) -> PathBuf {
        self.root.join(format!("{period}.{EXTENSION}"))
    }

    /// Store a new period after every stored one
    ///
    /// # Errors
    /// Returns [`StoreError::AlreadyExists`] if the period is stored already,
    /// or [`StoreError::LaterPeriodExists`] if a later period is stored
    pub fn put(&self, snapshot: &PeriodSnapshot) -> StoreResult<Fingerprint> {
        self.ensure_latest(snapshot.period())?;
        self.write(snapshot, false)
    }

    /// Store a period, replacing an existing document
    ///
    /// # Errors
    /// Returns [`StoreError::LaterPeriodExists`] if any later period is stored
    pub fn put_replacing(&self, snapshot: &PeriodSnapshot) -> StoreResult<Fingerprint> {
        self.ensure_latest(snapshot.period())?;
        self.write(snapshot, true)
    }

    /// Load a period
    ///
    /// # Errors
    /// Returns error if the document is unreadable, was written with another
    /// schema version, or does not match its fingerprint
    pub fn get(&self, period: Period) -> StoreResult<Option<PeriodSnapshot>> {
        let path = self.path_for(period);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let document: Document =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::encoding(&path, e))?;
        if document.schema_version != SCHEMA_VERSION {
            return Err(SchemaVersionMismatchError {
                period,
                found: document.schema_version,
                expected: SCHEMA_VERSION,
            }
            .into());
        }

        let snapshot: PeriodSnapshot = serde_json::from_value(document.snapshot)
            .map_err(|e| StoreError::encoding(&path, e))?;
        let computed = snapshot.fingerprint()?;
        if computed != document.fingerprint || snapshot.period() != period {
            return Err(StoreError::Corrupt {
                period,
                recorded: document.fingerprint,
                computed,
            });
        }

        tracing::debug!(%period, fingerprint = %computed.short(), "snapshot loaded");
        Ok(Some(snapshot))
    }

    /// Stored periods, ascending
    ///
    /// Files that are not named after a period are ignored.
    ///
    /// # Errors
    /// Returns error if the root directory cannot be listed
    pub fn periods(&self) -> StoreResult<Vec<Period>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };

        let mut periods = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.root, e))?.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION) {
                match path.file_stem().and_then(|s| s.to_str()).map(str::parse::<Period>) {
                    Some(Ok(period)) => periods.push(period),
                    _ => tracing::debug!(path = %path.display(), "ignoring non-snapshot file"),
                }
            }
        }
        periods.sort_unstable();
        Ok(periods)
    }

    /// Latest stored period strictly before `period`
    ///
    /// # Errors
    /// Returns error if the root directory cannot be listed
    pub fn latest_before(&self, period: Period) -> StoreResult<Option<Period>> {
        Ok(self.periods()?.into_iter().rev().find(|p| *p < period))
    }

    /// Snapshot of the latest stored period strictly before `period`
    ///
    /// # Errors
    /// Returns error if listing or loading fails
    pub fn previous_of(&self, period: Period) -> StoreResult<Option<PeriodSnapshot>> {
        match self.latest_before(period)? {
            Some(previous) => self.get(previous),
            None => Ok(None),
        }
    }

    /// Refuse writes before the latest stored period
    fn ensure_latest(&self, period: Period) -> StoreResult<()> {
        match self.periods()?.into_iter().find(|p| *p > period) {
            Some(later) => Err(StoreError::LaterPeriodExists { period, later }),
            None => Ok(()),
        }
    }

    fn write(&self, snapshot: &PeriodSnapshot, replace: bool) -> StoreResult<Fingerprint> {
        let period = snapshot.period();
        let path = self.path_for(period);
        let fingerprint = snapshot.fingerprint()?;

        std::fs::create_dir_all(&self.root).map_err(|e| StoreError::io(&self.root, e))?;

        let document = DocumentRef {
            schema_version: snapshot.schema_version(),
            fingerprint,
            snapshot,
        };
        let bytes =
            serde_json::to_vec_pretty(&document).map_err(|e| StoreError::encoding(&path, e))?;

        let mut tmp =
            NamedTempFile::new_in(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;

        let persisted = if replace {
            tmp.persist(&path)
        } else {
            tmp.persist_noclobber(&path)
        };
        match persisted {
            Ok(_) => {}
            Err(e) if !replace && e.error.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(period));
            }
            Err(e) => return Err(StoreError::io(&path, e.error)),
        }

        tracing::info!(
            %period,
            fingerprint = %fingerprint.short(),
            replaced = replace,
            "snapshot stored"
        );
        Ok(fingerprint)
    }
}
