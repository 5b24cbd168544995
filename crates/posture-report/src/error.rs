//! Error types for report assembly and narration

use crate::narrative::SectionId;
use posture_delta::CompareError;

/// Narrative Generator failures
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    /// Generator did not produce text for a section
    #[error("no narrative produced for section {0}")]
    MissingSection(SectionId),

    /// Generator backend failed
    #[error("narrative generation failed: {0}")]
    Generator(String),
}

/// Errors producing a report for one period
///
/// Always scoped to a single period; other periods of a batch are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Snapshots could not be compared
    #[error("compare error: {0}")]
    Compare(#[from] CompareError),

    /// Narrative step failed
    #[error("narrative error: {0}")]
    Narrative(#[from] NarrativeError),
}

/// Result type alias for reporting
pub type ReportResult<T> = Result<T, ReportError>;
