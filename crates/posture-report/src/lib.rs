//! Posture Report
//!
//! Report Model Assembler and single-period pipeline.
//!
//! # Core Concepts
//!
//! - [`ReportModel`]: Period plus fixed sections of structured facts
//! - [`ReportPolicy`]: Thresholds that turn metrics into recommendations
//! - [`assemble`]: [`PeriodDelta`](posture_delta::PeriodDelta) → [`ReportModel`]
//! - [`NarrativeGenerator`]: Seam for prose generation, outside the pipeline
//! - [`run_period`]: normalize → snapshot → compare → assemble
//!
//! # Example
//!
//! ```rust,ignore
//! use posture_ingest::{JsonRowsReader, Normalizer, SourceBatches};
//! use posture_report::{run_period, ReportPolicy};
//!
//! let batches = SourceBatches::read_all(&JsonRowsReader::new("raw/2025-11"))?;
//! let policy = ReportPolicy::default();
//! let run = run_period(&batches, period, previous.as_ref(), &policy, &Normalizer::new())?;
//! println!("{}", serde_json::to_string_pretty(&run.report)?);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod assemble;
mod error;
mod narrative;
mod pipeline;
mod policy;
mod report;
mod sections;

// Re-exports
pub use assemble::{assemble, assemble_with_policy, recommend};
pub use error::{NarrativeError, ReportError, ReportResult};
pub use narrative::{narrate_complete, Narrative, NarrativeGenerator, SectionId};
pub use pipeline::{build_snapshot, report_for, run_period, PeriodRun, RunId};
pub use policy::ReportPolicy;
pub use report::ReportModel;
pub use sections::{
    DataQualitySection, EndpointInputs, EndpointSection, IamSection, Measure,
    PositiveObservation, PositiveObservationsSection, Recommendation, RecommendationKind,
    SummarySection, ThreatSection, Trend, UserRiskSection,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use posture_ingest::{Normalizer, RawRecord, SourceBatches};
    use posture_model::SourceKind;

    #[test]
    fn raw_rows_to_report() {
        let batches = SourceBatches::new()
            .with(
                SourceKind::Devices,
                vec![RawRecord::new().with("Serial Number", "S1")],
            )
            .with(
                SourceKind::Backup,
                vec![RawRecord::new().with("Serial", "S1").with("Status", "Success")],
            );

        let run = run_period(
            &batches,
            "2025-11".parse().unwrap(),
            None,
            &ReportPolicy::default(),
            &Normalizer::new(),
        )
        .unwrap();

        assert_eq!(run.report.endpoint.backup_coverage_ratio, 1.0);
        assert!(run.report.recommendations.is_empty());
        assert!(run.report.positive_observations.clean);
    }
}
