//! Dark-web credential monitoring rows

use super::{RowContext, RowOutput, SourceNormalizer};
use crate::error::MalformedReason;
use crate::headers::CanonicalField;
use posture_model::{EventKind, Severity, SourceKind};

/// Credential exposure feed (one row per exposed account)
#[derive(Debug, Clone, Copy, Default)]
pub struct DarkWebNormalizer;

impl SourceNormalizer for DarkWebNormalizer {
    fn source_kind(&self) -> SourceKind {
        SourceKind::DarkWeb
    }

    fn normalize_row(&self, row: &RowContext<'_>) -> Result<RowOutput, MalformedReason> {
        let id = row
            .email()
            .ok_or(MalformedReason::MissingIdentifier { field: "email" })?;
        let severity = row
            .text(CanonicalField::Severity)
            .map_or(Severity::Unclassified, |raw| Severity::parse(&raw));

        Ok(RowOutput::event(
            row.event(Some(id), EventKind::CredentialExposure { severity }),
        ))
    }
}
