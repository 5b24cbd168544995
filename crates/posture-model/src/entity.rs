//! Tracked entities (users and devices)

use crate::identifier::{EntityKind, Identifier};
use crate::period::Period;
use serde::{Deserialize, Serialize};

/// A user or device present in a reporting period
///
/// Only `id` takes part in cross-period matching; every other field is
/// descriptive and may change between periods without affecting
/// joiner/leaver classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Normalized identifier
    pub id: Identifier,
    /// User or device
    pub kind: EntityKind,
    /// Display name as reported by the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Assigned user, for devices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Identifier>,
    /// Sign-in allowed for users, in service for devices; `None` when the
    /// source does not say
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// First period this identifier was observed
    pub first_seen: Period,
    /// Last period this identifier was observed
    pub last_seen: Period,
}

impl Entity {
    /// Create a user first seen in `period`
    #[must_use]
    pub fn user(id: Identifier, period: Period) -> Self {
        Self::new(id, EntityKind::User, period)
    }

    /// Create a device first seen in `period`
    #[must_use]
    pub fn device(id: Identifier, period: Period) -> Self {
        Self::new(id, EntityKind::Device, period)
    }

    fn new(id: Identifier, kind: EntityKind, period: Period) -> Self {
        Self {
            id,
            kind,
            display_name: None,
            owner: None,
            active: None,
            first_seen: period,
            last_seen: period,
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// With assigned user
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: Identifier) -> Self {
        self.owner = Some(owner);
        self
    }

    /// With sign-in state
    #[inline]
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Carry `first_seen` forward from an earlier observation of the same entity
    ///
    /// Keeps the earlier of the two periods.
    pub fn inherit_first_seen(&mut self, earlier: &Entity) {
        if earlier.first_seen < self.first_seen {
            self.first_seen = earlier.first_seen;
        }
    }
}
