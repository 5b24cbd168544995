//! Subcommand implementations

use crate::config::PostureConfig;
use anyhow::{anyhow, Context, Result};
use posture_ingest::{JsonRowsReader, SourceBatches};
use posture_model::Period;
use posture_report::{report_for, run_period, ReportModel, ReportPolicy};
use posture_store::SnapshotStore;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Normalize a period's raw exports, store its snapshot and return its report
///
/// The period must not precede any stored period, with or without `replace`.
pub(crate) fn ingest(
    config: &PostureConfig,
    period: Period,
    input: &Path,
    replace: bool,
) -> Result<ReportModel> {
    let store = config.store();
    let batches = SourceBatches::read_all(&JsonRowsReader::new(input))
        .with_context(|| format!("failed to read raw exports from {}", input.display()))?;
    let previous = store
        .previous_of(period)
        .with_context(|| format!("failed to load the period before {period}"))?;

    let run = run_period(
        &batches,
        period,
        previous.as_ref(),
        &config.policy,
        &config.normalizer(),
    )?;

    if replace {
        store.put_replacing(&run.snapshot)?;
    } else {
        store.put(&run.snapshot)?;
    }
    Ok(run.report)
}

/// Recompute one period's report from stored snapshots
pub(crate) fn report(
    store: &SnapshotStore,
    policy: &ReportPolicy,
    period: Period,
) -> Result<ReportModel> {
    let current = store
        .get(period)?
        .ok_or_else(|| anyhow!("no snapshot stored for {period}"))?;
    let previous = store.previous_of(period)?;
    Ok(report_for(&current, previous.as_ref(), policy)?)
}

/// Outcome of regenerating every stored period
#[derive(Debug, Default)]
pub(crate) struct Regenerated {
    pub(crate) reports: BTreeMap<String, ReportModel>,
    pub(crate) failures: BTreeMap<String, String>,
}

/// Recompute every stored period in parallel
///
/// A failing period does not stop the others.
pub(crate) fn regenerate(store: &SnapshotStore, policy: &ReportPolicy) -> Result<Regenerated> {
    let periods = store.periods()?;
    tracing::info!(periods = periods.len(), "regenerating reports");

    let outcomes: Vec<(Period, Result<ReportModel>)> = periods
        .par_iter()
        .map(|&period| (period, report(store, policy, period)))
        .collect();

    let mut regenerated = Regenerated::default();
    for (period, outcome) in outcomes {
        match outcome {
            Ok(model) => {
                regenerated.reports.insert(period.to_string(), model);
            }
            Err(err) => {
                tracing::error!(%period, error = %format!("{err:#}"), "regeneration failed");
                regenerated.failures.insert(period.to_string(), format!("{err:#}"));
            }
        }
    }
    Ok(regenerated)
}

/// JSON schema of the report model
pub(crate) fn schema() -> Result<String> {
    Ok(serde_json::to_string_pretty(&ReportModel::json_schema())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use posture_store::StoreError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn config(dir: &TempDir) -> PostureConfig {
        PostureConfig {
            store: StoreConfig {
                root: dir.path().join("snapshots"),
            },
            ..PostureConfig::default()
        }
    }

    fn write_rows(dir: &Path, file: &str, rows: serde_json::Value) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(file), serde_json::to_vec(&rows).unwrap()).unwrap();
    }

    fn month(dir: &TempDir, name: &str, users: &[&str]) -> std::path::PathBuf {
        let input = dir.path().join(name);
        let rows: Vec<serde_json::Value> = users
            .iter()
            .map(|u| serde_json::json!({ "Email": u }))
            .collect();
        write_rows(&input, "users.json", serde_json::Value::Array(rows));
        input
    }

    #[test]
    fn ingest_then_report_matches() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let october = month(&dir, "oct", &["a@x.io", "b@x.io"]);
        let november = month(&dir, "nov", &["a@x.io"]);
        ingest(&config, p("2025-10"), &october, false).unwrap();
        let ingested = ingest(&config, p("2025-11"), &november, false).unwrap();

        assert_eq!(ingested.iam.users_departed.len(), 1);
        let recomputed = report(&config.store(), &config.policy, p("2025-11")).unwrap();
        assert_eq!(recomputed, ingested);
    }

    #[test]
    fn second_ingest_needs_replace() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let input = month(&dir, "nov", &["a@x.io"]);

        ingest(&config, p("2025-11"), &input, false).unwrap();
        assert!(ingest(&config, p("2025-11"), &input, false).is_err());
        assert!(ingest(&config, p("2025-11"), &input, true).is_ok());
    }

    #[test]
    fn backfilled_period_is_refused() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        ingest(&config, p("2025-09"), &month(&dir, "sep", &["a@x.io"]), false).unwrap();
        let november = ingest(&config, p("2025-11"), &month(&dir, "nov", &["a@x.io"]), false)
            .unwrap();

        let october = month(&dir, "oct", &["a@x.io", "b@x.io"]);
        for replace in [false, true] {
            let err = ingest(&config, p("2025-10"), &october, replace).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<StoreError>(),
                Some(StoreError::LaterPeriodExists { .. })
            ));
        }

        assert_eq!(config.store().periods().unwrap(), vec![p("2025-09"), p("2025-11")]);
        let recomputed = report(&config.store(), &config.policy, p("2025-11")).unwrap();
        assert_eq!(recomputed, november);
    }

    #[test]
    fn report_for_missing_period_fails() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let err = report(&config.store(), &config.policy, p("2025-11")).unwrap_err();
        assert!(err.to_string().contains("2025-11"));
    }

    #[test]
    fn regenerate_isolates_failures() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        for (name, at) in [("sep", "2025-09"), ("oct", "2025-10"), ("nov", "2025-11")] {
            let input = month(&dir, name, &["a@x.io"]);
            ingest(&config, p(at), &input, false).unwrap();
        }
        std::fs::write(config.store().path_for(p("2025-11")), b"{}").unwrap();

        let regenerated = regenerate(&config.store(), &config.policy).unwrap();

        assert_eq!(
            regenerated.reports.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["2025-09", "2025-10"]
        );
        assert_eq!(
            regenerated.failures.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["2025-11"]
        );
    }

    #[test]
    fn schema_is_json() {
        let schema: serde_json::Value = serde_json::from_str(&schema().unwrap()).unwrap();
        assert!(schema["properties"]["recommendations"].is_object());
    }
}
