//! Immutable per-period snapshots
//!
//! A [`PeriodSnapshot`] is the normalized state of all entities and events
//! for one period. It is assembled through [`SnapshotBuilder`] and exposes
//! only read accessors afterwards.

use crate::diagnostic::{DiagnosticKind, RowDiagnostic, SourceKind};
use crate::entity::Entity;
use crate::error::FingerprintError;
use crate::event::Event;
use crate::fingerprint::Fingerprint;
use crate::identifier::{EntityKind, Identifier};
use crate::period::Period;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current snapshot layout version
///
/// Bump on any change to the serialized shape of [`PeriodSnapshot`] or the
/// types it contains. Stored snapshots with another version are rejected.
pub const SCHEMA_VERSION: u32 = 1;

/// Normalized state of one reporting period
///
/// # Invariants
/// - Every entity has `last_seen == period` and `first_seen <= period`
/// - An identifier appears in at most one of `users` / `devices`
/// - Immutable after [`SnapshotBuilder::build`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    schema_version: u32,
    period: Period,
    users: BTreeMap<Identifier, Entity>,
    devices: BTreeMap<Identifier, Entity>,
    events: Vec<Event>,
    diagnostics: Vec<RowDiagnostic>,
}

impl PeriodSnapshot {
    /// Layout version this snapshot was built with
    #[inline]
    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Reporting period
    #[inline]
    #[must_use]
    pub fn period(&self) -> Period {
        self.period
    }

    /// Active users keyed by identifier
    #[inline]
    #[must_use]
    pub fn users(&self) -> &BTreeMap<Identifier, Entity> {
        &self.users
    }

    /// Active devices keyed by identifier
    #[inline]
    #[must_use]
    pub fn devices(&self) -> &BTreeMap<Identifier, Entity> {
        &self.devices
    }

    /// All entities, users first, each group in identifier order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.users.values().chain(self.devices.values())
    }

    /// Look up an entity of either kind
    #[must_use]
    pub fn entity(&self, id: &Identifier) -> Option<&Entity> {
        self.users.get(id).or_else(|| self.devices.get(id))
    }

    /// Events recorded for the period
    #[inline]
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Diagnostics raised while normalizing this period's rows
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[RowDiagnostic] {
        &self.diagnostics
    }

    /// Number of raw rows dropped during normalization
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_skip()).count()
    }

    /// Fingerprint of the canonical encoding
    ///
    /// # Errors
    /// Returns error if the snapshot cannot be serialized
    pub fn fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
        Fingerprint::of(self)
    }
}

/// Builder for [`PeriodSnapshot`]
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    period: Period,
    users: BTreeMap<Identifier, Entity>,
    devices: BTreeMap<Identifier, Entity>,
    events: Vec<Event>,
    diagnostics: Vec<RowDiagnostic>,
}

impl SnapshotBuilder {
    /// Create empty builder for a period
    #[inline]
    #[must_use]
    pub fn new(period: Period) -> Self {
        Self {
            period,
            users: BTreeMap::new(),
            devices: BTreeMap::new(),
            events: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Add entity (consuming form)
    #[must_use]
    pub fn entity(mut self, entity: Entity) -> Self {
        self.add_entity(entity);
        self
    }

    /// Add event (consuming form)
    #[must_use]
    pub fn event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    /// Add entity
    ///
    /// Re-adding an identifier of the same kind replaces the earlier entity.
    /// An identifier already registered under the other kind is rejected and
    /// a [`DiagnosticKind::KindConflict`] diagnostic is recorded.
    ///
    /// Returns whether the entity was stored.
    pub fn add_entity(&mut self, mut entity: Entity) -> bool {
        let (own, other, source) = match entity.kind {
            EntityKind::User => (&mut self.users, &self.devices, SourceKind::Users),
            EntityKind::Device => (&mut self.devices, &self.users, SourceKind::Devices),
        };

        if other.contains_key(&entity.id) {
            self.diagnostics.push(RowDiagnostic::batch(
                source,
                DiagnosticKind::KindConflict,
                format!("{} already recorded as another entity kind", entity.id),
            ));
            return false;
        }

        entity.last_seen = self.period;
        if entity.first_seen > self.period {
            entity.first_seen = self.period;
        }
        own.insert(entity.id.clone(), entity);
        true
    }

    /// Add many entities
    pub fn extend_entities(&mut self, entities: impl IntoIterator<Item = Entity>) {
        for entity in entities {
            self.add_entity(entity);
        }
    }

    /// Add many events
    pub fn extend_events(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    /// Record normalization diagnostics
    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = RowDiagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Carry `first_seen` forward from the previous period's snapshot
    pub fn inherit_first_seen(&mut self, previous: &PeriodSnapshot) {
        for (id, entity) in self.users.iter_mut().chain(self.devices.iter_mut()) {
            if let Some(earlier) = previous.entity(id) {
                entity.inherit_first_seen(earlier);
            }
        }
    }

    /// Freeze into an immutable snapshot
    #[must_use]
    pub fn build(self) -> PeriodSnapshot {
        PeriodSnapshot {
            schema_version: SCHEMA_VERSION,
            period: self.period,
            users: self.users,
            devices: self.devices,
            events: self.events,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, Severity};
    use pretty_assertions::assert_eq;

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn email(s: &str) -> Identifier {
        Identifier::email(s).unwrap()
    }

    #[test]
    fn builder_stamps_last_seen() {
        let p = period("2025-06");
        let snapshot = SnapshotBuilder::new(p)
            .entity(Entity::user(email("a@x.com"), period("2025-01")))
            .build();
        let user = &snapshot.users()[&email("a@x.com")];
        assert_eq!(user.last_seen, p);
        assert_eq!(user.first_seen, period("2025-01"));
        assert_eq!(snapshot.schema_version(), SCHEMA_VERSION);
    }

    #[test]
    fn builder_clamps_future_first_seen() {
        let snapshot = SnapshotBuilder::new(period("2025-06"))
            .entity(Entity::user(email("a@x.com"), period("2025-09")))
            .build();
        assert_eq!(snapshot.users()[&email("a@x.com")].first_seen, period("2025-06"));
    }

    #[test]
    fn builder_rejects_cross_kind_identifier() {
        let p = period("2025-06");
        let shared = Identifier::serial("ABC123").unwrap();
        let mut builder = SnapshotBuilder::new(p);
        assert!(builder.add_entity(Entity::device(shared.clone(), p)));
        assert!(!builder.add_entity(Entity::user(shared.clone(), p)));
        let snapshot = builder.build();

        assert_eq!(snapshot.devices().len(), 1);
        assert!(snapshot.users().is_empty());
        assert_eq!(snapshot.diagnostics().len(), 1);
        assert_eq!(snapshot.diagnostics()[0].kind, DiagnosticKind::KindConflict);
        assert_eq!(snapshot.skipped_rows(), 0);
    }

    #[test]
    fn inherit_first_seen_from_previous() {
        let prev = SnapshotBuilder::new(period("2025-05"))
            .entity(Entity::user(email("a@x.com"), period("2025-02")))
            .build();

        let mut builder = SnapshotBuilder::new(period("2025-06"))
            .entity(Entity::user(email("a@x.com"), period("2025-06")))
            .entity(Entity::user(email("b@x.com"), period("2025-06")));
        builder.inherit_first_seen(&prev);
        let snapshot = builder.build();

        assert_eq!(snapshot.users()[&email("a@x.com")].first_seen, period("2025-02"));
        assert_eq!(snapshot.users()[&email("b@x.com")].first_seen, period("2025-06"));
    }

    #[test]
    fn fingerprint_independent_of_insertion_order() {
        let p = period("2025-06");
        let a = SnapshotBuilder::new(p)
            .entity(Entity::user(email("a@x.com"), p))
            .entity(Entity::user(email("b@x.com"), p))
            .build();
        let b = SnapshotBuilder::new(p)
            .entity(Entity::user(email("b@x.com"), p))
            .entity(Entity::user(email("a@x.com"), p))
            .build();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn snapshot_serde_round_trip() {
        let p = period("2025-06");
        let snapshot = SnapshotBuilder::new(p)
            .entity(Entity::device(Identifier::serial("S-1").unwrap(), p))
            .event(Event::new(p, None, EventKind::EdrIncident { severity: Severity::Low }))
            .build();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: PeriodSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
