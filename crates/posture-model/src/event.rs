//! Period-scoped security events
//!
//! Events are the countable facts of a period: EDR incidents, phishing
//! simulation failures, backup status observations and credential exposures.

use crate::identifier::Identifier;
use crate::period::Period;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Incident severity
///
/// Ordered `low < medium < high < critical`. `Unclassified` collects every
/// label that does not map onto the fixed scale so totals always reconcile.
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
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Unclassified,
}

impl Severity {
    /// All buckets, in reporting order
    pub const ALL: [Severity; 5] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
        Severity::Unclassified,
    ];

    /// Map a free-text severity label onto the fixed scale
    ///
    /// Case-insensitive. Never fails: unknown labels become `Unclassified`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" | "info" | "informational" | "sev4" | "p4" => Severity::Low,
            "medium" | "med" | "moderate" | "sev3" | "p3" => Severity::Medium,
            "high" | "sev2" | "p2" => Severity::High,
            "critical" | "crit" | "severe" | "sev1" | "p1" => Severity::Critical,
            _ => Severity::Unclassified,
        }
    }

    /// Lowercase label used in serialized output
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unclassified => "unclassified",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident counts with every severity bucket always present
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema,
)]
pub struct SeverityCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
    pub unclassified: u64,
}

impl SeverityCounts {
    /// Count for one bucket
    #[inline]
    #[must_use]
    pub const fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
            Severity::Unclassified => self.unclassified,
        }
    }

    /// Add one incident to a bucket
    pub fn increment(&mut self, severity: Severity) {
        let slot = match severity {
            Severity::Low => &mut self.low,
            Severity::Medium => &mut self.medium,
            Severity::High => &mut self.high,
            Severity::Critical => &mut self.critical,
            Severity::Unclassified => &mut self.unclassified,
        };
        *slot += 1;
    }

    /// Sum across all buckets
    #[inline]
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.low + self.medium + self.high + self.critical + self.unclassified
    }

    /// `(severity, count)` pairs in reporting order
    pub fn iter(&self) -> impl Iterator<Item = (Severity, u64)> + '_ {
        Severity::ALL.into_iter().map(|s| (s, self.get(s)))
    }
}

/// Backup job state for one device
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
pub enum BackupState {
    Healthy,
    Failed,
    InProgress,
    NotConfigured,
    Unknown,
}

impl BackupState {
    /// Classify a free-text backup status
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let status = raw.trim().to_lowercase();
        let any = |needles: &[&str]| needles.iter().any(|n| status.contains(n));
        if any(&["not configured", "disabled"]) || status == "none" {
            BackupState::NotConfigured
        } else if any(&["fail", "error", "unsuccessful"]) {
            BackupState::Failed
        } else if any(&["success", "completed", "healthy"]) {
            BackupState::Healthy
        } else if any(&["progress", "running"]) {
            BackupState::InProgress
        } else {
            BackupState::Unknown
        }
    }

    /// Whether a backup job exists for the device at all
    ///
    /// Any reported state other than `NotConfigured` counts: a failing job is
    /// still a configured job.
    #[inline]
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !matches!(self, BackupState::NotConfigured)
    }
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// EDR incident raised against a device or user
    EdrIncident { severity: Severity },
    /// User clicked a simulated phishing lure
    PhishingFailure { clicks: u32 },
    /// Backup job state observed for a device
    BackupStatus { state: BackupState },
    /// Credentials found in a dark-web breach corpus
    CredentialExposure { severity: Severity },
}

/// One normalized event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Period the event belongs to
    pub period: Period,
    /// Entity the event refers to; `None` for organization-level events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Identifier>,
    /// When the source says it happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Event payload
    pub kind: EventKind,
}

impl Event {
    /// Create event
    #[inline]
    #[must_use]
    pub fn new(period: Period, subject: Option<Identifier>, kind: EventKind) -> Self {
        Self {
            period,
            subject,
            timestamp: None,
            kind,
        }
    }

    /// With timestamp
    #[inline]
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Severity, for incident-like events
    #[must_use]
    pub fn severity(&self) -> Option<Severity> {
        match self.kind {
            EventKind::EdrIncident { severity } | EventKind::CredentialExposure { severity } => {
                Some(severity)
            }
            EventKind::PhishingFailure { .. } | EventKind::BackupStatus { .. } => None,
        }
    }
}
