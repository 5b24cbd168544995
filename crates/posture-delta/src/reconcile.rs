//! Entity Reconciler
//!
//! Classifies identifiers present in two periods as joined, departed or
//! unchanged, per entity kind. Identifier equality is the only comparison;
//! names, owners and flags never influence membership. Unknown-device
//! sentinels carry no identity to compare and are listed as unresolved.

use crate::error::IdentifierConflictError;
use crate::similarity::levenshtein_distance;
use crate::warning::DataQualityWarning;
use posture_model::{Entity, EntityKind, Identifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest edit distance at which a joiner/leaver pair is flagged
pub const NEAR_DUPLICATE_MAX_DISTANCE: usize = 2;

/// Membership classification for one entity kind
///
/// All lists are sorted and pairwise disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct KindReconciliation {
    /// Present now, absent before
    pub joined: Vec<Identifier>,
    /// Present before, absent now
    pub departed: Vec<Identifier>,
    /// Present in both periods
    pub unchanged: Vec<Identifier>,
    /// Present now without a comparable identity
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<Identifier>,
}

impl KindReconciliation {
    /// Number of identifiers present in the current period
    #[inline]
    #[must_use]
    pub fn current_count(&self) -> usize {
        self.joined.len() + self.unchanged.len() + self.unresolved.len()
    }

    /// Number of identifiers present in the previous period
    ///
    /// Counts conflict tie-breaks under the current kind and leaves out the
    /// previous period's unresolved devices, so it can differ from the
    /// previous snapshot's own count.
    #[inline]
    #[must_use]
    pub fn previous_count(&self) -> usize {
        self.departed.len() + self.unchanged.len()
    }
}

/// Reconciliation of both entity kinds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Users (joiners and leavers)
    pub users: KindReconciliation,
    /// Devices (added and retired)
    pub devices: KindReconciliation,
    /// Conflicts and near-duplicates, in identifier order
    pub warnings: Vec<DataQualityWarning>,
}

impl Reconciliation {
    /// Classification for one kind
    #[must_use]
    pub fn kind(&self, kind: EntityKind) -> &KindReconciliation {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Device => &self.devices,
        }
    }

    fn kind_mut(&mut self, kind: EntityKind) -> &mut KindReconciliation {
        match kind {
            EntityKind::User => &mut self.users,
            EntityKind::Device => &mut self.devices,
        }
    }
}

/// Reconcile entities of two periods
///
/// Input order does not matter. An identifier carried by two entities of the
/// same input set keeps the kind of the last one. An identifier whose kind
/// differs between the two sets is counted once, as unchanged under its
/// current kind, and reported as an [`IdentifierConflictError`] warning.
pub fn reconcile<'a, P, C>(previous: P, current: C) -> Reconciliation
where
    P: IntoIterator<Item = &'a Entity>,
    C: IntoIterator<Item = &'a Entity>,
{
    let previous = kinds_by_id(previous);
    let (current, mut out) = split_unresolved(current);

    for (id, &current_kind) in &current {
        let slot = out.kind_mut(current_kind);
        match previous.get(id) {
            None => slot.joined.push((*id).clone()),
            Some(&previous_kind) => {
                slot.unchanged.push((*id).clone());
                if previous_kind != current_kind {
                    out.warnings
                        .push(DataQualityWarning::IdentifierConflict(IdentifierConflictError {
                            id: (*id).clone(),
                            previous_kind,
                            current_kind,
                        }));
                }
            }
        }
    }

    for (id, &previous_kind) in &previous {
        if !current.contains_key(id) {
            out.kind_mut(previous_kind).departed.push((*id).clone());
        }
    }

    out.warnings
        .extend(near_duplicates(&out.users.joined, &out.users.departed));

    for warning in &out.warnings {
        tracing::warn!(%warning, "reconciliation data-quality warning");
    }
    tracing::debug!(
        users_joined = out.users.joined.len(),
        users_departed = out.users.departed.len(),
        devices_added = out.devices.joined.len(),
        devices_retired = out.devices.departed.len(),
        "entities reconciled"
    );
    out
}

/// Classify a first reporting period: everything joined, nothing departed
pub fn reconcile_first_period<'a, C>(current: C) -> Reconciliation
where
    C: IntoIterator<Item = &'a Entity>,
{
    let (current, mut out) = split_unresolved(current);
    for (id, kind) in current {
        out.kind_mut(kind).joined.push(id.clone());
    }
    out
}

fn kinds_by_id<'a, I>(entities: I) -> BTreeMap<&'a Identifier, EntityKind>
where
    I: IntoIterator<Item = &'a Entity>,
{
    entities
        .into_iter()
        .filter(|e| !e.id.is_unknown_device())
        .map(|e| (&e.id, e.kind))
        .collect()
}

/// Comparable identifiers of the current period, plus a reconciliation
/// already holding the unresolved ones
fn split_unresolved<'a, I>(entities: I) -> (BTreeMap<&'a Identifier, EntityKind>, Reconciliation)
where
    I: IntoIterator<Item = &'a Entity>,
{
    let mut comparable = BTreeMap::new();
    let mut unresolved = BTreeMap::new();
    for entity in entities {
        let bucket = if entity.id.is_unknown_device() {
            &mut unresolved
        } else {
            &mut comparable
        };
        bucket.insert(&entity.id, entity.kind);
    }

    let mut out = Reconciliation::default();
    for (id, kind) in unresolved {
        out.kind_mut(kind).unresolved.push(id.clone());
    }
    (comparable, out)
}

/// Joiner/leaver pairs that look like the same mailbox
///
/// A pair is flagged when the local parts match and the domains are within
/// [`NEAR_DUPLICATE_MAX_DISTANCE`] edits, or when the whole identifiers are.
fn near_duplicates(joined: &[Identifier], departed: &[Identifier]) -> Vec<DataQualityWarning> {
    let mut out = Vec::new();
    for j in joined {
        for d in departed {
            let distance = match (j.email_parts(), d.email_parts()) {
                (Some((jl, jd)), Some((dl, dd))) if jl == dl => levenshtein_distance(jd, dd),
                _ => levenshtein_distance(j.as_str(), d.as_str()),
            };
            if distance <= NEAR_DUPLICATE_MAX_DISTANCE {
                out.push(DataQualityWarning::NearDuplicateIdentifier {
                    joined: j.clone(),
                    departed: d.clone(),
                    distance,
                });
            }
        }
    }
    out
}
