//! Recommendation thresholds
//!
//! A [`ReportPolicy`] says how much of each risk signal is tolerated before
//! a recommendation is emitted. Thresholds are inclusive upper bounds for
//! counts and an inclusive lower bound for backup coverage.

use serde::{Deserialize, Serialize};

/// Thresholds parameterizing the Recommendations section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportPolicy {
    /// Critical EDR incidents tolerated
    pub max_critical_incidents: u64,
    /// High EDR incidents tolerated
    pub max_high_incidents: u64,
    /// Incidents without a recognizable severity tolerated
    pub max_unclassified_incidents: u64,
    /// Phishing simulation failures tolerated
    pub max_phishing_failures: u64,
    /// Lowest acceptable backup coverage ratio
    pub min_backup_coverage: f64,
    /// Devices with failed backups tolerated
    pub max_backup_failures: u64,
    /// Dark-web credential exposures tolerated
    pub max_credential_exposures: u64,
    /// Departures tolerated before access review is suggested; `None` disables
    pub max_departed_users: Option<u64>,
    /// Devices still assigned to departed users tolerated
    pub max_devices_held_by_departed_users: u64,
}

impl ReportPolicy {
    /// Create default policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With minimum backup coverage (clamped to `[0, 1]`)
    #[inline]
    #[must_use]
    pub fn with_min_backup_coverage(mut self, ratio: f64) -> Self {
        self.min_backup_coverage = ratio.clamp(0.0, 1.0);
        self
    }

    /// With maximum tolerated phishing failures
    #[inline]
    #[must_use]
    pub fn with_max_phishing_failures(mut self, max: u64) -> Self {
        self.max_phishing_failures = max;
        self
    }

    /// With departure review threshold
    #[inline]
    #[must_use]
    pub fn with_max_departed_users(mut self, max: Option<u64>) -> Self {
        self.max_departed_users = max;
        self
    }
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self {
            max_critical_incidents: 0,
            max_high_incidents: 0,
            max_unclassified_incidents: 0,
            max_phishing_failures: 0,
            min_backup_coverage: 0.95,
            max_backup_failures: 0,
            max_credential_exposures: 0,
            max_departed_users: None,
            max_devices_held_by_departed_users: 0,
        }
    }
}
