//! The report model handed to narrative generation

use crate::sections::{
    DataQualitySection, EndpointSection, IamSection, PositiveObservationsSection, Recommendation,
    SummarySection, ThreatSection, UserRiskSection,
};
use posture_model::{Fingerprint, FingerprintError, Period};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured facts for one period's report
///
/// Key names are stable: `period`, `summary`, `iam`, `endpoint`, `threat`,
/// `user_risk`, `positive_observations`, `recommendations`, `data_quality`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportModel {
    pub period: Period,
    pub summary: SummarySection,
    pub iam: IamSection,
    pub endpoint: EndpointSection,
    pub threat: ThreatSection,
    pub user_risk: UserRiskSection,
    pub positive_observations: PositiveObservationsSection,
    pub recommendations: Vec<Recommendation>,
    pub data_quality: DataQualitySection,
}

impl ReportModel {
    /// Fingerprint of the canonical encoding
    ///
    /// # Errors
    /// Returns error if the model cannot be serialized
    pub fn fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
        Fingerprint::of(self)
    }

    /// JSON schema of the model
    #[must_use]
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportModel)
    }
}
