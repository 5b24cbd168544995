//! Backup job status rows

use super::{resolve_device, RowContext, RowOutput, SourceNormalizer};
use crate::error::MalformedReason;
use crate::headers::CanonicalField;
use posture_model::{BackupState, DiagnosticKind, EventKind, SourceKind};

/// Backup status report (one row per protected device)
#[derive(Debug, Clone, Copy, Default)]
pub struct BackupNormalizer;

impl SourceNormalizer for BackupNormalizer {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Backup
    }

    fn normalize_row(&self, row: &RowContext<'_>) -> Result<RowOutput, MalformedReason> {
        let (id, note) = resolve_device(row);
        let state = row
            .text(CanonicalField::Status)
            .map_or(BackupState::Unknown, |raw| BackupState::classify(&raw));

        let output = RowOutput::event(row.event(Some(id), EventKind::BackupStatus { state }));
        Ok(match note {
            Some(detail) => output.with_note(DiagnosticKind::UnresolvedDevice, detail),
            None => output,
        })
    }
}
