//! EDR incident rows

use super::{RowContext, RowOutput, SourceNormalizer};
use crate::error::MalformedReason;
use crate::headers::CanonicalField;
use posture_model::{EventKind, Identifier, Severity, SourceKind};

/// EDR incident report (one row per incident)
///
/// The subject is the first of serial, device name or email that resolves.
/// A row needs a subject or a severity; a missing severity counts as
/// unclassified and a missing subject makes the incident organization-level.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdrNormalizer;

impl SourceNormalizer for EdrNormalizer {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Edr
    }

    fn normalize_row(&self, row: &RowContext<'_>) -> Result<RowOutput, MalformedReason> {
        let subject = row
            .text(CanonicalField::Serial)
            .and_then(|raw| Identifier::serial(&raw))
            .or_else(|| {
                row.text(CanonicalField::DeviceName)
                    .and_then(|raw| Identifier::device_name(&raw))
            })
            .or_else(|| row.email());
        let severity = row.text(CanonicalField::Severity);

        if subject.is_none() && severity.is_none() {
            return Err(MalformedReason::MissingSubjectAndSeverity);
        }

        let severity = severity.map_or(Severity::Unclassified, |raw| Severity::parse(&raw));
        Ok(RowOutput::event(
            row.event(subject, EventKind::EdrIncident { severity }),
        ))
    }
}
