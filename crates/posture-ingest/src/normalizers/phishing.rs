//! Phishing simulation rows

use super::{RowContext, RowOutput, SourceNormalizer};
use crate::error::MalformedReason;
use crate::headers::CanonicalField;
use posture_model::{EventKind, SourceKind};

/// Phishing simulation results (one row per recipient)
///
/// Only recipients who clicked produce an event.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhishingNormalizer;

impl SourceNormalizer for PhishingNormalizer {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Phishing
    }

    fn normalize_row(&self, row: &RowContext<'_>) -> Result<RowOutput, MalformedReason> {
        let id = row
            .email()
            .ok_or(MalformedReason::MissingIdentifier { field: "email" })?;

        let clicks = match row.text(CanonicalField::Clicks) {
            Some(raw) => parse_clicks(&raw).ok_or(MalformedReason::InvalidValue {
                field: "clicks",
                value: raw,
            })?,
            None => 0,
        };

        if clicks == 0 {
            return Ok(RowOutput::empty());
        }
        Ok(RowOutput::event(
            row.event(Some(id), EventKind::PhishingFailure { clicks }),
        ))
    }
}

fn parse_clicks(raw: &str) -> Option<u32> {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "yes" | "y" | "true" | "clicked" => Some(1),
        "no" | "n" | "false" | "not clicked" => Some(0),
        other => other.parse().ok(),
    }
}
