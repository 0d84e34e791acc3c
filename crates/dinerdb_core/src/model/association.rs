//! Association set reconciliation.
//!
//! # Responsibility
//! - Compute which association rows to add and remove to move a stored set
//!   to a desired set.
//! - Turn caller-supplied added/removed lists into a diff checked against
//!   the stored set.
//!
//! # Invariants
//! - `to_add` and `to_remove` are disjoint.
//! - `diff.apply(current) == desired` for the `desired` the diff was built from.
//! - Pure: no I/O.

use crate::model::customer::IdSet;
use serde::{Deserialize, Serialize};

/// Caller-known changes to one association set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDelta {
    pub added: IdSet,
    pub removed: IdSet,
}

/// Rows to insert and delete for one association set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDiff {
    pub to_add: IdSet,
    pub to_remove: IdSet,
}

impl AssociationDelta {
    /// Desired set after applying this delta to `current`.
    ///
    /// An id listed in both `added` and `removed` ends up removed.
    pub fn desired_from(&self, current: &IdSet) -> IdSet {
        current
            .union(&self.added)
            .filter(|id| !self.removed.contains(id))
            .copied()
            .collect()
    }
}

impl AssociationDiff {
    /// Diff that moves `current` to `desired`.
    pub fn between(current: &IdSet, desired: &IdSet) -> Self {
        Self {
            to_add: desired.difference(current).copied().collect(),
            to_remove: current.difference(desired).copied().collect(),
        }
    }

    /// Diff for a caller delta, checked against `current`.
    ///
    /// Adds that already exist and removals of absent ids drop out.
    pub fn from_delta(current: &IdSet, delta: &AssociationDelta) -> Self {
        Self::between(current, &delta.desired_from(current))
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Set produced by applying this diff to `current`.
    pub fn apply(&self, current: &IdSet) -> IdSet {
        current
            .difference(&self.to_remove)
            .chain(self.to_add.iter())
            .copied()
            .collect()
    }
}
