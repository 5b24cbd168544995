//! Source kinds and per-row ingestion diagnostics
//!
//! Diagnostics travel with the snapshot they were produced for so a period
//! with skipped rows can never be mistaken for a clean, quiet period.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Origin of a batch of raw rows
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Identity directory export
    Users,
    /// Endpoint inventory
    Devices,
    /// EDR incident report
    Edr,
    /// Phishing simulation results
    Phishing,
    /// Backup job status report
    Backup,
    /// Dark-web credential monitoring
    DarkWeb,
}

impl SourceKind {
    /// All source kinds, in ingestion order
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Users,
        SourceKind::Devices,
        SourceKind::Edr,
        SourceKind::Phishing,
        SourceKind::Backup,
        SourceKind::DarkWeb,
    ];

    /// Stable lowercase name (also the raw input file stem)
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Users => "users",
            SourceKind::Devices => "devices",
            SourceKind::Edr => "edr",
            SourceKind::Phishing => "phishing",
            SourceKind::Backup => "backup",
            SourceKind::DarkWeb => "dark_web",
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| format!("unknown source kind: {s}"))
    }
}

/// What went wrong with a row
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Required identifying field absent; row dropped
    MissingIdentifier,
    /// EDR row with neither subject nor severity; row dropped
    MissingSubjectAndSeverity,
    /// Field present but unparseable; row dropped
    InvalidValue,
    /// Identifier repeated within one batch; later row kept
    DuplicateIdentifier,
    /// Device identity fell back to name or sentinel; row kept
    UnresolvedDevice,
    /// Identifier offered as both user and device in one period; first kept
    KindConflict,
    /// Event timestamp falls in another month; row counted in its batch period
    OutOfPeriodTimestamp,
}

impl DiagnosticKind {
    /// Whether the row was removed from the result
    #[inline]
    #[must_use]
    pub const fn drops_row(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::MissingIdentifier
                | DiagnosticKind::MissingSubjectAndSeverity
                | DiagnosticKind::InvalidValue
        )
    }
}

/// One diagnostic for one raw row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDiagnostic {
    /// Batch the row came from
    pub source: SourceKind,
    /// Zero-based row index within the batch; `None` once rows are merged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Classification
    pub kind: DiagnosticKind,
    /// Human-readable detail
    pub detail: String,
}

impl RowDiagnostic {
    /// Create diagnostic for a specific row
    #[must_use]
    pub fn new(
        source: SourceKind,
        row: usize,
        kind: DiagnosticKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            source,
            row: Some(row),
            kind,
            detail: detail.into(),
        }
    }

    /// Create diagnostic not tied to a single row
    #[must_use]
    pub fn batch(source: SourceKind, kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Self {
            source,
            row: None,
            kind,
            detail: detail.into(),
        }
    }

    /// Whether the row was removed from the result
    #[inline]
    #[must_use]
    pub fn is_skip(&self) -> bool {
        self.kind.drops_row()
    }
}

impl Display for RowDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "{} row {}: {}", self.source, row, self.detail),
            None => write!(f, "{}: {}", self.source, self.detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_round_trips_through_str() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
        }
        assert!("spreadsheet".parse::<SourceKind>().is_err());
    }

    #[test]
    fn only_malformed_kinds_drop_rows() {
        assert!(DiagnosticKind::MissingIdentifier.drops_row());
        assert!(DiagnosticKind::InvalidValue.drops_row());
        assert!(!DiagnosticKind::DuplicateIdentifier.drops_row());
        assert!(!DiagnosticKind::UnresolvedDevice.drops_row());
        assert!(!DiagnosticKind::OutOfPeriodTimestamp.drops_row());
    }

    #[test]
    fn diagnostic_display() {
        let d = RowDiagnostic::new(SourceKind::Edr, 4, DiagnosticKind::InvalidValue, "bad date");
        assert_eq!(d.to_string(), "edr row 4: bad date");

        let merged = RowDiagnostic::batch(SourceKind::Users, DiagnosticKind::KindConflict, "clash");
        assert_eq!(merged.to_string(), "users: clash");
    }
}
