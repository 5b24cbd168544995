//! Normalized entity identifiers
//!
//! An [`Identifier`] is the only key used to decide whether two records refer
//! to the same real-world entity. Normalization happens once, at
//! construction, so equality is plain string equality afterwards.

use crate::diagnostic::SourceKind;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Prefix of the sentinel identifiers given to devices with neither serial
/// nor name
pub const UNKNOWN_DEVICE: &str = "UNKNOWN-DEVICE";

/// Prefix for device identities derived from a device name
pub const DEVICE_NAME_PREFIX: &str = "DN:";

/// Kind of tracked entity
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
pub enum EntityKind {
    /// A person, keyed by email
    User,
    /// An endpoint, keyed by serial number
    Device,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => f.write_str("user"),
            EntityKind::Device => f.write_str("device"),
        }
    }
}

/// Normalized, case-folded entity identifier
///
/// Never empty. Users are lower-cased emails; devices are upper-cased
/// serials, `DN:`-prefixed device names, or row-scoped [`UNKNOWN_DEVICE`]
/// sentinels.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Normalize an email address: trim and lower-case
    ///
    /// Returns `None` when nothing is left after trimming.
    #[must_use]
    pub fn email(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        (!normalized.is_empty()).then_some(Self(normalized))
    }

    /// Normalize a serial number: strip all whitespace and upper-case
    #[must_use]
    pub fn serial(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_uppercase)
            .collect();
        (!normalized.is_empty()).then_some(Self(normalized))
    }

    /// Fallback device identity from a device name
    #[must_use]
    pub fn device_name(raw: &str) -> Option<Self> {
        let name = raw.trim().to_uppercase();
        (!name.is_empty()).then(|| Self(format!("{DEVICE_NAME_PREFIX}{name}")))
    }

    /// Sentinel for an unresolvable device, scoped to the row it came from
    ///
    /// Two unresolvable rows never share an identity, so each still counts
    /// once in the inventory.
    #[must_use]
    pub fn unknown_device(source: SourceKind, row: usize) -> Self {
        Self(format!("{UNKNOWN_DEVICE}#{source}-{row}"))
    }

    /// Whether this is an unknown-device sentinel
    #[inline]
    #[must_use]
    pub fn is_unknown_device(&self) -> bool {
        self.0
            .strip_prefix(UNKNOWN_DEVICE)
            .is_some_and(|rest| rest.starts_with('#'))
    }

    /// Whether this identity came from a device name rather than a serial
    #[inline]
    #[must_use]
    pub fn is_name_derived(&self) -> bool {
        self.0.starts_with(DEVICE_NAME_PREFIX)
    }

    /// Local part and domain of an email identifier
    #[must_use]
    pub fn email_parts(&self) -> Option<(&str, &str)> {
        self.0.rsplit_once('@')
    }

    /// Underlying normalized string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
