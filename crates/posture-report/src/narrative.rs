//! Narrative Generator seam
//!
//! Prose is produced outside the deterministic pipeline. A generator
//! receives the finished [`ReportModel`] and returns one block of text per
//! narrated section; nothing it does can feed back into the model.

use crate::error::{NarrativeError, ReportResult};
use crate::report::ReportModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Narrated report sections, in report order
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
pub enum SectionId {
    Summary,
    Iam,
    Endpoint,
    Threat,
    UserRisk,
    PositiveObservations,
    Recommendations,
}

impl SectionId {
    /// Every section, in report order
    pub const ALL: [SectionId; 7] = [
        SectionId::Summary,
        SectionId::Iam,
        SectionId::Endpoint,
        SectionId::Threat,
        SectionId::UserRisk,
        SectionId::PositiveObservations,
        SectionId::Recommendations,
    ];

    /// Key used for the section in the report model
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SectionId::Summary => "summary",
            SectionId::Iam => "iam",
            SectionId::Endpoint => "endpoint",
            SectionId::Threat => "threat",
            SectionId::UserRisk => "user_risk",
            SectionId::PositiveObservations => "positive_observations",
            SectionId::Recommendations => "recommendations",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prose per section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub sections: BTreeMap<SectionId, String>,
}

impl Narrative {
    /// Create empty narrative
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With text for a section (replaces earlier text)
    #[must_use]
    pub fn with_section(mut self, id: SectionId, text: impl Into<String>) -> Self {
        self.sections.insert(id, text.into());
        self
    }

    /// Text of a section
    #[must_use]
    pub fn section(&self, id: SectionId) -> Option<&str> {
        self.sections.get(&id).map(String::as_str)
    }

    /// Whether every section has text
    #[must_use]
    pub fn is_complete(&self) -> bool {
        SectionId::ALL.iter().all(|id| self.sections.contains_key(id))
    }

    /// First section without text
    ///
    /// # Errors
    /// Returns [`NarrativeError::MissingSection`] naming the first gap
    pub fn ensure_complete(&self) -> Result<(), NarrativeError> {
        match SectionId::ALL.into_iter().find(|id| !self.sections.contains_key(id)) {
            Some(missing) => Err(NarrativeError::MissingSection(missing)),
            None => Ok(()),
        }
    }
}

/// Turns a report model into prose
///
/// Implementations may be templated or generative. They read the model only.
pub trait NarrativeGenerator: Send + Sync {
    /// Narrate a report
    ///
    /// # Errors
    /// Returns [`NarrativeError`] if the generator cannot produce text
    fn narrate(&self, report: &ReportModel) -> Result<Narrative, NarrativeError>;
}

/// Narrate a report and require every section to be present
///
/// # Errors
/// Returns [`ReportError::Narrative`](crate::ReportError::Narrative) with the
/// generator's error or the first missing section
pub fn narrate_complete<G: NarrativeGenerator + ?Sized>(
    generator: &G,
    report: &ReportModel,
) -> ReportResult<Narrative> {
    let narrative = generator.narrate(report)?;
    narrative.ensure_complete()?;
    tracing::debug!(
        period = %report.period,
        sections = narrative.sections.len(),
        "report narrated"
    );
    Ok(narrative)
}
