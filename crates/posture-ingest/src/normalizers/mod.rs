//! Per-source normalizers
//!
//! Each source kind has a [`SourceNormalizer`] turning one [`RowView`] into
//! at most one entity and one event. [`Normalizer`] drives a whole batch:
//! malformed rows become diagnostics, duplicate identifiers are collapsed,
//! and the batch never aborts.

use crate::error::{MalformedReason, MalformedSourceError};
use crate::headers::{CanonicalField, SynonymTable};
use crate::reader::SourceBatches;
use crate::record::{RawRecord, RowView};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use posture_model::{
    DiagnosticKind, Entity, Event, EventKind, Identifier, Period, RowDiagnostic, SourceKind,
};
use std::collections::{BTreeMap, HashMap};

mod backup;
mod dark_web;
mod devices;
mod edr;
mod phishing;
mod users;

pub use backup::BackupNormalizer;
pub use dark_web::DarkWebNormalizer;
pub use devices::DeviceNormalizer;
pub use edr::EdrNormalizer;
pub use phishing::PhishingNormalizer;
pub use users::UserNormalizer;

/// Naive formats accepted for timestamps, tried in order after RFC 3339
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y", "%b %d, %Y"];

/// One row being normalized
#[derive(Debug)]
pub struct RowContext<'a> {
    /// Zero-based index within the batch
    pub index: usize,
    /// Batch source
    pub source: SourceKind,
    /// Batch period
    pub period: Period,
    /// Header-resolved cells
    pub view: RowView<'a>,
}

impl RowContext<'_> {
    /// Cell text for a canonical field
    #[inline]
    #[must_use]
    pub fn text(&self, field: CanonicalField) -> Option<String> {
        self.view.text(field)
    }

    /// Email identifier from the email column
    #[must_use]
    pub fn email(&self) -> Option<Identifier> {
        self.text(CanonicalField::Email)
            .and_then(|raw| Identifier::email(&raw))
    }

    /// Parsed timestamp, if a timestamp column is present and readable
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.text(CanonicalField::Timestamp)?;
        let parsed = parse_timestamp(&raw);
        if parsed.is_none() {
            tracing::debug!(row = self.index, value = %raw, "unreadable timestamp ignored");
        }
        parsed
    }

    /// Build an event for the batch period, keeping any readable timestamp
    ///
    /// The row belongs to the period it was ingested for whatever its date
    /// says; [`Normalizer::normalize`] notes timestamps from other months.
    #[must_use]
    pub fn event(&self, subject: Option<Identifier>, kind: EventKind) -> Event {
        let event = Event::new(self.period, subject, kind);
        match self.timestamp() {
            Some(ts) => event.at(ts),
            None => event,
        }
    }
}

/// Result of normalizing one row
#[derive(Debug, Default)]
pub struct RowOutput {
    /// Entity contributed by the row
    pub entity: Option<Entity>,
    /// Event contributed by the row
    pub event: Option<Event>,
    /// Non-fatal notes (row kept)
    pub notes: Vec<(DiagnosticKind, String)>,
}

impl RowOutput {
    /// Row contributes nothing (not an error)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Row contributes an entity
    #[inline]
    #[must_use]
    pub fn entity(entity: Entity) -> Self {
        Self {
            entity: Some(entity),
            ..Self::default()
        }
    }

    /// Row contributes an event
    #[inline]
    #[must_use]
    pub fn event(event: Event) -> Self {
        Self {
            event: Some(event),
            ..Self::default()
        }
    }

    /// With a non-fatal note
    #[must_use]
    pub fn with_note(mut self, kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        self.notes.push((kind, detail.into()));
        self
    }
}

/// Maps rows of one source kind onto the canonical schema
///
/// Implement this trait to support a new source export.
pub trait SourceNormalizer: Send + Sync + 'static {
    /// Source kind handled
    fn source_kind(&self) -> SourceKind;

    /// Normalize a single row
    ///
    /// # Errors
    /// Returns the reason the row cannot be used; the caller records it and
    /// moves on to the next row.
    fn normalize_row(&self, row: &RowContext<'_>) -> Result<RowOutput, MalformedReason>;
}

/// Normalizers by source kind
pub struct NormalizerRegistry {
    normalizers: BTreeMap<SourceKind, Box<dyn SourceNormalizer>>,
}

impl std::fmt::Debug for NormalizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizerRegistry")
            .field("sources", &self.sources())
            .finish()
    }
}

impl Default for NormalizerRegistry {
    fn default() -> Self {
        default_normalizers()
    }
}

impl NormalizerRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            normalizers: BTreeMap::new(),
        }
    }

    /// Register a normalizer, replacing any previous one for the same source
    pub fn register<N: SourceNormalizer>(&mut self, normalizer: N) {
        self.normalizers
            .insert(normalizer.source_kind(), Box::new(normalizer));
    }

    /// Normalizer for a source kind
    #[must_use]
    pub fn get(&self, source: SourceKind) -> Option<&dyn SourceNormalizer> {
        self.normalizers.get(&source).map(|n| &**n)
    }

    /// Registered source kinds
    #[must_use]
    pub fn sources(&self) -> Vec<SourceKind> {
        self.normalizers.keys().copied().collect()
    }
}

/// Registry with every built-in source normalizer
#[must_use]
pub fn default_normalizers() -> NormalizerRegistry {
    let mut registry = NormalizerRegistry::new();
    registry.register(UserNormalizer);
    registry.register(DeviceNormalizer);
    registry.register(EdrNormalizer);
    registry.register(PhishingNormalizer);
    registry.register(BackupNormalizer);
    registry.register(DarkWebNormalizer);
    registry
}

/// Partial result of normalizing one or more batches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Entities, one per identifier and kind within each batch
    pub entities: Vec<Entity>,
    /// Events in row order
    pub events: Vec<Event>,
    /// Skipped-row and data-quality diagnostics
    pub diagnostics: Vec<RowDiagnostic>,
}

impl Normalized {
    /// Append another result
    pub fn merge(&mut self, other: Normalized) {
        self.entities.extend(other.entities);
        self.events.extend(other.events);
        self.diagnostics.extend(other.diagnostics);
    }

    /// Number of rows dropped
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_skip()).count()
    }
}

/// Batch driver over a [`NormalizerRegistry`] and a [`SynonymTable`]
#[derive(Debug, Default)]
pub struct Normalizer {
    registry: NormalizerRegistry,
    synonyms: SynonymTable,
}

impl Normalizer {
    /// Normalizer with built-in sources and aliases
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a custom synonym table
    #[must_use]
    pub fn with_synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// With a custom registry
    #[must_use]
    pub fn with_registry(mut self, registry: NormalizerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Synonym table in use
    #[inline]
    #[must_use]
    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// Normalize one batch of raw rows
    ///
    /// Best effort: a bad row is dropped with a diagnostic and the rest of the
    /// batch continues. When an identifier repeats within the batch the later
    /// row replaces the earlier one and a duplicate diagnostic is recorded.
    /// Every event belongs to `period`; a timestamp from another month is
    /// kept and noted with [`DiagnosticKind::OutOfPeriodTimestamp`].
    pub fn normalize(
        &self,
        records: &[RawRecord],
        source: SourceKind,
        period: Period,
    ) -> Normalized {
        let mut out = Normalized::default();
        let Some(normalizer) = self.registry.get(source) else {
            tracing::warn!(%source, "no normalizer registered; batch ignored");
            return out;
        };

        let mut positions: HashMap<Identifier, usize> = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            let row = RowContext {
                index,
                source,
                period,
                view: RowView::new(record, &self.synonyms),
            };

            let output = match normalizer.normalize_row(&row) {
                Ok(output) => output,
                Err(reason) => {
                    let err = MalformedSourceError::new(source, index, reason);
                    tracing::warn!(%err, "row skipped");
                    out.diagnostics.push(RowDiagnostic::from(&err));
                    continue;
                }
            };

            for (kind, detail) in output.notes {
                out.diagnostics.push(RowDiagnostic::new(source, index, kind, detail));
            }

            if let Some(entity) = output.entity {
                match positions.get(&entity.id) {
                    Some(&at) => {
                        tracing::warn!(
                            %source,
                            row = index,
                            id = %entity.id,
                            "duplicate identifier; later row kept"
                        );
                        out.diagnostics.push(RowDiagnostic::new(
                            source,
                            index,
                            DiagnosticKind::DuplicateIdentifier,
                            format!("{} repeated; replaces earlier row", entity.id),
                        ));
                        out.entities[at] = entity;
                    }
                    None => {
                        positions.insert(entity.id.clone(), out.entities.len());
                        out.entities.push(entity);
                    }
                }
            }

            if let Some(event) = output.event {
                if let Some(dated) = event.timestamp.and_then(period_of).filter(|&p| p != period) {
                    tracing::debug!(%source, row = index, %dated, "timestamp outside batch period");
                    out.diagnostics.push(RowDiagnostic::new(
                        source,
                        index,
                        DiagnosticKind::OutOfPeriodTimestamp,
                        format!("dated {dated}; counted in {period}"),
                    ));
                }
                out.events.push(event);
            }
        }

        tracing::debug!(
            %source,
            rows = records.len(),
            entities = out.entities.len(),
            events = out.events.len(),
            skipped = out.skipped_rows(),
            "batch normalized"
        );
        out
    }

    /// Normalize every batch present, in source-kind order
    pub fn normalize_all(&self, batches: &SourceBatches, period: Period) -> Normalized {
        let mut out = Normalized::default();
        for source in SourceKind::ALL {
            if let Some(records) = batches.get(source) {
                out.merge(self.normalize(records, source, period));
            }
        }
        out
    }
}

/// Normalize one batch with the built-in normalizers and aliases
pub fn normalize(records: &[RawRecord], source: SourceKind, period: Period) -> Normalized {
    Normalizer::new().normalize(records, source, period)
}

/// Parse a timestamp cell in any of the accepted layouts
///
/// Naive values are taken as UTC; bare dates as midnight UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Some(naive) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Calendar month containing a timestamp
#[must_use]
pub fn period_of(ts: DateTime<Utc>) -> Option<Period> {
    let year = u16::try_from(ts.year()).ok()?;
    let month = u8::try_from(ts.month()).ok()?;
    Period::new(year, month).ok()
}

/// Resolve a device identity: serial, else name (noted), else a row-scoped
/// sentinel (noted)
pub(crate) fn resolve_device(row: &RowContext<'_>) -> (Identifier, Option<String>) {
    if let Some(id) = row
        .text(CanonicalField::Serial)
        .and_then(|raw| Identifier::serial(&raw))
    {
        return (id, None);
    }
    let serial = if row.view.has_column(CanonicalField::Serial) {
        "blank serial number"
    } else {
        "no serial number column"
    };
    if let Some(id) = row
        .text(CanonicalField::DeviceName)
        .and_then(|raw| Identifier::device_name(&raw))
    {
        let note = format!("{serial}; identified by device name as {id}");
        return (id, Some(note));
    }
    (
        Identifier::unknown_device(row.source, row.index),
        Some(format!("{serial} and no device name")),
    )
}

/// Interpret yes/no style cells
pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "allowed" | "enabled" | "active" => Some(true),
        "false" | "no" | "n" | "0" | "blocked" | "disabled" | "inactive" | "suspended" => {
            Some(false)
        }
        _ => None,
    }
}
