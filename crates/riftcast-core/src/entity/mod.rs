//! Units that act in, and are targeted by, ability resolution.
//!
//! This module provides:
//! - [`EntityId`]: Unique identifier for units
//! - [`UnitSpec`]: Serializable description used to spawn a unit
//! - [`Unit`]: The live unit state read by effects and written by hooks
//!
//! # Ownership of mutable state
//!
//! Resolution code reads a unit's auras and stats to choose branches and to
//! compute probabilities. It never writes stacking resources directly: those
//! change only through the proc and sink contexts in [`crate::hooks`].
//!
//! # Example
//!
//! ```
//! use riftcast_core::entity::UnitSpec;
//! use riftcast_core::roster::Roster;
//!
//! let mut roster = Roster::new();
//! let id = roster.spawn(UnitSpec::new("dummy").with_aura("icy_veins"));
//!
//! let unit = roster.get(id).unwrap();
//! assert_eq!(unit.name(), "dummy");
//! assert!(unit.has_aura(&"icy_veins".into()));
//! ```

pub mod components;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ability::AbilityId;
use crate::queue::SimTime;

pub use components::{
    AuraId, OverflowPolicy, ResourceKind, ResourcePool, ResourceStack, StackGain, StackId,
    UnitStats,
};

/// Unique identifier for a unit.
///
/// `EntityId` is a newtype wrapper around `u64`. IDs are assigned
/// monotonically by the roster and never reused, so their ordering is also the
/// spawn order.
///
/// # Example
///
/// ```
/// use riftcast_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

// =============================================================================
// UnitSpec
// =============================================================================

/// Serializable description of a unit before it is spawned.
///
/// Stacking resources are declared here with their capacity and overflow
/// policy. They start empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Display name.
    pub name: String,
    /// Position used for distance-derived travel times.
    pub position: Vec2,
    /// Mana pool.
    pub mana: ResourcePool,
    /// Combat statistics.
    pub stats: UnitStats,
    /// Auras active at spawn.
    pub auras: BTreeSet<AuraId>,
    /// Declared stacking resources: `(capacity, overflow policy)`.
    pub stacks: BTreeMap<StackId, (u32, OverflowPolicy)>,
}

impl UnitSpec {
    /// Creates a spec at the origin with default stats and no mana.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            position: Vec2::ZERO,
            mana: ResourcePool::empty(),
            stats: UnitStats::default(),
            auras: BTreeSet::new(),
            stacks: BTreeMap::new(),
        }
    }

    /// Sets the spawn position.
    #[must_use]
    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Sets the mana pool.
    #[must_use]
    pub fn with_mana(mut self, mana: ResourcePool) -> Self {
        self.mana = mana;
        self
    }

    /// Sets the combat statistics.
    #[must_use]
    pub fn with_stats(mut self, stats: UnitStats) -> Self {
        self.stats = stats;
        self
    }

    /// Adds an aura active at spawn.
    #[must_use]
    pub fn with_aura(mut self, aura: impl Into<AuraId>) -> Self {
        self.auras.insert(aura.into());
        self
    }

    /// Declares a stacking resource.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<StackId>, max: u32, policy: OverflowPolicy) -> Self {
        self.stacks.insert(stack.into(), (max, policy));
        self
    }
}

// =============================================================================
// Unit
// =============================================================================

/// Live state of one unit in a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    id: EntityId,
    name: String,
    /// Position used for distance-derived travel times.
    pub position: Vec2,
    /// Mana pool.
    pub mana: ResourcePool,
    /// Combat statistics.
    pub stats: UnitStats,
    auras: BTreeSet<AuraId>,
    stacks: BTreeMap<StackId, ResourceStack>,
    damage_taken: f64,
    cooldowns: BTreeMap<AbilityId, SimTime>,
}

impl Unit {
    pub(crate) fn from_spec(id: EntityId, spec: UnitSpec) -> Self {
        let stacks = spec
            .stacks
            .into_iter()
            .map(|(stack, (max, policy))| (stack, ResourceStack::new(max, policy)))
            .collect();
        Self {
            id,
            name: spec.name,
            position: spec.position,
            mana: spec.mana,
            stats: spec.stats,
            auras: spec.auras,
            stacks,
            damage_taken: 0.0,
            cooldowns: BTreeMap::new(),
        }
    }

    /// Returns the unit's ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the unit's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if `aura` is active.
    #[must_use]
    pub fn has_aura(&self, aura: &AuraId) -> bool {
        self.auras.contains(aura)
    }

    /// Activates `aura`. Returns false if it was already active.
    pub fn apply_aura(&mut self, aura: impl Into<AuraId>) -> bool {
        self.auras.insert(aura.into())
    }

    /// Deactivates `aura`. Returns false if it was not active.
    pub fn remove_aura(&mut self, aura: &AuraId) -> bool {
        self.auras.remove(aura)
    }

    /// Iterates active auras in name order.
    pub fn auras(&self) -> impl Iterator<Item = &AuraId> {
        self.auras.iter()
    }

    /// Read-only view of a stacking resource.
    #[must_use]
    pub fn stack(&self, stack: &StackId) -> Option<&ResourceStack> {
        self.stacks.get(stack)
    }

    /// Charges held on `stack`, or 0 if the unit has no such stack.
    #[must_use]
    pub fn stack_count(&self, stack: &StackId) -> u32 {
        self.stacks.get(stack).map_or(0, ResourceStack::count)
    }

    pub(crate) fn stack_mut(&mut self, stack: &StackId) -> Option<&mut ResourceStack> {
        self.stacks.get_mut(stack)
    }

    /// Total damage delivered to this unit.
    #[must_use]
    pub fn damage_taken(&self) -> f64 {
        self.damage_taken
    }

    pub(crate) fn take_damage(&mut self, amount: f64) {
        self.damage_taken += amount;
    }

    /// Time at which `ability` comes off cooldown, if it is cooling down.
    #[must_use]
    pub fn cooldown_ready_at(&self, ability: AbilityId) -> Option<SimTime> {
        self.cooldowns.get(&ability).copied()
    }

    pub(crate) fn start_cooldown(&mut self, ability: AbilityId, ready_at: SimTime) {
        self.cooldowns.insert(ability, ready_at);
    }
}
