//! TOML configuration
//!
//! Every section is optional; a missing file means all defaults.
//!
//! ```toml
//! [store]
//! root = "data/snapshots"
//!
//! [policy]
//! min_backup_coverage = 0.9
//! max_departed_users = 5
//!
//! [ingest.synonyms]
//! serial = ["asset tag"]
//!
//! [logging]
//! level = "debug"
//! json = true
//! ```

use anyhow::{Context, Result};
use posture_ingest::{CanonicalField, Normalizer, SynonymTable};
use posture_report::ReportPolicy;
use posture_store::SnapshotStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PostureConfig {
    pub(crate) store: StoreConfig,
    pub(crate) policy: ReportPolicy,
    pub(crate) ingest: IngestConfig,
    pub(crate) logging: LoggingConfig,
}

/// Snapshot store location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct StoreConfig {
    pub(crate) root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/snapshots"),
        }
    }
}

/// Extra header aliases, tried before the built-in ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct IngestConfig {
    pub(crate) synonyms: BTreeMap<CanonicalField, Vec<String>>,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LoggingConfig {
    /// Level for the posture crates when `RUST_LOG` is unset
    pub(crate) level: String,
    /// JSON lines instead of human-readable output
    pub(crate) json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PostureConfig {
    /// Load from a TOML file, or defaults when no path is given
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub(crate) fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if !(0.0..=1.0).contains(&config.policy.min_backup_coverage) {
            anyhow::bail!(
                "policy.min_backup_coverage must be within [0, 1], got {}",
                config.policy.min_backup_coverage
            );
        }
        Ok(config)
    }

    pub(crate) fn store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.store.root)
    }

    pub(crate) fn normalizer(&self) -> Normalizer {
        let synonyms = SynonymTable::default().with_overrides(&self.ingest.synonyms);
        Normalizer::new().with_synonyms(synonyms)
    }
}
