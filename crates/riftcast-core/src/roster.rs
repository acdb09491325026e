//! Roster of all units in one simulation.
//!
//! The roster stores units in a `BTreeMap` keyed by [`EntityId`], so
//! iteration order is the spawn order on every platform. IDs increase
//! monotonically and are never reused.
//!
//! # Example
//!
//! ```
//! use riftcast_core::entity::UnitSpec;
//! use riftcast_core::roster::Roster;
//! use glam::Vec2;
//!
//! let mut roster = Roster::new();
//! let mage = roster.spawn(UnitSpec::new("mage"));
//! let dummy = roster.spawn(UnitSpec::new("dummy").at(Vec2::new(30.0, 0.0)));
//!
//! let ids: Vec<_> = roster.ids().collect();
//! assert_eq!(ids, vec![mage, dummy]);
//! assert_eq!(roster.distance(mage, dummy), Some(30.0));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Unit, UnitSpec};

/// Container for the units of a simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    /// Monotonically increasing ID counter.
    next_id: u64,
    /// Unit storage with deterministic iteration order.
    units: BTreeMap<EntityId, Unit>,
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            units: BTreeMap::new(),
        }
    }

    /// Spawns a unit from `spec` and returns its new ID.
    pub fn spawn(&mut self, spec: UnitSpec) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.units.insert(id, Unit::from_spec(id, spec));
        id
    }

    /// Removes a unit. Deliveries still queued against it are dropped when
    /// they fire.
    pub fn despawn(&mut self, id: EntityId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Returns a unit by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Returns a mutable unit by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Returns true if a unit with `id` exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.units.contains_key(&id)
    }

    /// Distance between two units, if both exist.
    #[must_use]
    pub fn distance(&self, a: EntityId, b: EntityId) -> Option<f32> {
        let a = self.units.get(&a)?;
        let b = self.units.get(&b)?;
        Some(a.position.distance(b.position))
    }

    /// Unit IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.units.keys().copied()
    }

    /// Units in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if the roster holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
