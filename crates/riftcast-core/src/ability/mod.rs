//! Static ability data and the effect interface.
//!
//! An [`AbilityDefinition`] describes everything about an ability that does
//! not change between activations: identity, cost, cast timing, damage
//! scaling, travel model and flags. It is registered once together with an
//! [`Effect`] and then shared read-only by every activation.
//!
//! # Example
//!
//! ```
//! use riftcast_core::ability::{
//!     AbilityDefinition, AbilityFlags, AbilityKey, CostFormula, SpellSchool, TravelTime,
//! };
//!
//! let bolt = AbilityDefinition::new(AbilityKey::new(116), "Frostbolt", SpellSchool::Frost)
//!     .with_cost(CostFormula::BaseManaPercent(4.0))
//!     .with_damage(1.5, 0.24)
//!     .with_travel(TravelTime::Missile { speed: 28.0 })
//!     .with_flags(AbilityFlags::ROTATION);
//!
//! assert_eq!(bolt.key.to_string(), "116");
//! assert!(bolt.is_selectable());
//! ```

pub mod registry;

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::entity::{ResourcePool, Unit};
use crate::outcome::OutcomeKind;
use crate::resolution::{EffectContext, EffectProfile};

pub use registry::{AbilityRegistry, RegisteredAbility};

// =============================================================================
// Identity
// =============================================================================

/// Handle returned by ability registration.
///
/// Handles are dense indices into the registry, assigned in registration
/// order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbilityId(u32);

impl AbilityId {
    /// Creates a handle from its raw index.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AbilityId({})", self.0)
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Data identity of an ability: a spell id plus a variant tag.
///
/// Variants of one spell (for example the secondary bolts of a split cast)
/// share the spell id and differ in tag. Tag 0 is the primary form and is
/// omitted when displayed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbilityKey {
    /// Spell identifier.
    pub spell_id: u32,
    /// Variant tag.
    pub tag: u32,
}

impl AbilityKey {
    /// Primary form of `spell_id`.
    #[must_use]
    pub const fn new(spell_id: u32) -> Self {
        Self { spell_id, tag: 0 }
    }

    /// Variant `tag` of `spell_id`.
    #[must_use]
    pub const fn tagged(spell_id: u32, tag: u32) -> Self {
        Self { spell_id, tag }
    }
}

impl fmt::Display for AbilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tag == 0 {
            write!(f, "{}", self.spell_id)
        } else {
            write!(f, "{}#{}", self.spell_id, self.tag)
        }
    }
}

/// Damage school of an ability.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum SpellSchool {
    #[default]
    Physical,
    Arcane,
    Fire,
    Frost,
    Holy,
    Nature,
    Shadow,
}

bitflags! {
    /// Behavioural flags on an ability definition.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct AbilityFlags: u32 {
        /// A driver may pick this ability from a rotation.
        const ROTATION = 1 << 0;
        /// Only reachable as a chain from another ability.
        const PASSIVE  = 1 << 1;
        /// May be used in response to another event.
        const REACTION = 1 << 2;
    }
}

// =============================================================================
// Cost, timing, travel
// =============================================================================

/// How much an activation costs.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CostFormula {
    /// No cost.
    #[default]
    Free,
    /// A fixed amount of mana.
    Flat(f64),
    /// A percentage (0 to 100) of the actor's base mana.
    BaseManaPercent(f64),
}

impl CostFormula {
    /// Mana required from `pool`.
    #[must_use]
    pub fn amount(&self, pool: &ResourcePool) -> f64 {
        match *self {
            Self::Free => 0.0,
            Self::Flat(amount) => amount.max(0.0),
            Self::BaseManaPercent(percent) => (pool.base * percent / 100.0).max(0.0),
        }
    }
}

/// Cast timing used by drivers and cooldown tracking.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastConfig {
    /// Seconds from starting the cast to activation.
    pub cast_time: f64,
    /// Global cooldown triggered by the cast.
    pub gcd: f64,
    /// Ability-specific cooldown started on activation.
    pub cooldown: f64,
}

impl CastConfig {
    /// Default global cooldown in seconds.
    pub const DEFAULT_GCD: f64 = 1.5;

    /// Instant cast on the default global cooldown.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            cast_time: 0.0,
            gcd: Self::DEFAULT_GCD,
            cooldown: 0.0,
        }
    }

    /// Seconds the actor is busy: the longer of cast time and GCD.
    #[must_use]
    pub fn busy_time(&self) -> f64 {
        self.cast_time.max(self.gcd)
    }
}

impl Default for CastConfig {
    fn default() -> Self {
        Self::instant()
    }
}

/// Delay between resolving an outcome and delivering its damage.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum TravelTime {
    /// Delivered at the resolution time.
    #[default]
    Instant,
    /// Delivered after a fixed number of seconds.
    Fixed(f64),
    /// Delivered after `distance / speed` seconds.
    Missile {
        /// Yards per second. Non-positive speeds are treated as instant.
        speed: f64,
    },
}

impl TravelTime {
    /// Delay in seconds for a target `distance` yards away.
    #[must_use]
    pub fn delay(&self, distance: f32) -> f64 {
        match *self {
            Self::Instant => 0.0,
            Self::Fixed(delay) => delay,
            Self::Missile { speed } if speed > 0.0 => f64::from(distance) / speed,
            Self::Missile { .. } => 0.0,
        }
    }
}

// =============================================================================
// Definition
// =============================================================================

/// Immutable descriptor of one ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Data identity.
    pub key: AbilityKey,
    /// Display name.
    pub name: String,
    /// Damage school.
    pub school: SpellSchool,
    /// Activation cost.
    pub cost: CostFormula,
    /// Cast timing and cooldown.
    pub cast: CastConfig,
    /// Which outcomes a roll of this ability can produce.
    pub outcome_kind: OutcomeKind,
    /// Scale applied to the actor's spell scaling to get the roll midpoint.
    pub damage_scale: f64,
    /// Width of the damage range as a fraction of the midpoint.
    pub damage_variance: f64,
    /// Multiplier applied to every outcome of this ability.
    pub damage_multiplier: f64,
    /// Share of spell power added to each roll.
    pub bonus_coefficient: f64,
    /// Crit multiplier replacing the statistics provider's value.
    pub crit_multiplier: Option<f64>,
    /// Delivery delay model.
    pub travel: TravelTime,
    /// Behavioural flags.
    pub flags: AbilityFlags,
}

impl AbilityDefinition {
    /// Creates a free, instant, zero-damage definition.
    #[must_use]
    pub fn new(key: AbilityKey, name: &str, school: SpellSchool) -> Self {
        Self {
            key,
            name: name.to_string(),
            school,
            cost: CostFormula::Free,
            cast: CastConfig::instant(),
            outcome_kind: OutcomeKind::MagicHitAndCrit,
            damage_scale: 0.0,
            damage_variance: 0.0,
            damage_multiplier: 1.0,
            bonus_coefficient: 0.0,
            crit_multiplier: None,
            travel: TravelTime::Instant,
            flags: AbilityFlags::empty(),
        }
    }

    /// Sets the cost formula.
    #[must_use]
    pub fn with_cost(mut self, cost: CostFormula) -> Self {
        self.cost = cost;
        self
    }

    /// Sets cast timing.
    #[must_use]
    pub fn with_cast(mut self, cast: CastConfig) -> Self {
        self.cast = cast;
        self
    }

    /// Sets the outcome kind.
    #[must_use]
    pub fn with_outcome_kind(mut self, kind: OutcomeKind) -> Self {
        self.outcome_kind = kind;
        self
    }

    /// Sets the damage roll's scale and variance.
    #[must_use]
    pub fn with_damage(mut self, scale: f64, variance: f64) -> Self {
        self.damage_scale = scale;
        self.damage_variance = variance;
        self
    }

    /// Sets the flat damage multiplier.
    #[must_use]
    pub fn with_damage_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    /// Sets the spell power coefficient.
    #[must_use]
    pub fn with_bonus_coefficient(mut self, coefficient: f64) -> Self {
        self.bonus_coefficient = coefficient;
        self
    }

    /// Overrides the crit multiplier.
    #[must_use]
    pub fn with_crit_multiplier(mut self, multiplier: f64) -> Self {
        self.crit_multiplier = Some(multiplier);
        self
    }

    /// Sets the travel model.
    #[must_use]
    pub fn with_travel(mut self, travel: TravelTime) -> Self {
        self.travel = travel;
        self
    }

    /// Sets the flags.
    #[must_use]
    pub fn with_flags(mut self, flags: AbilityFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns true if a driver may choose this ability directly.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        self.flags.contains(AbilityFlags::ROTATION) && !self.flags.contains(AbilityFlags::PASSIVE)
    }
}

// =============================================================================
// Effect
// =============================================================================

/// Behaviour run once an activation's cost is paid.
///
/// An effect never fails: conditional branches are business logic, and every
/// side effect goes through the [`EffectContext`] as a roll or a directive.
pub trait Effect: Send + Sync {
    /// Picks the profile for this activation from the actor's state.
    ///
    /// Called exactly once, before any draw is made.
    fn select_profile(&self, _actor: &Unit) -> EffectProfile {
        EffectProfile::Standard
    }

    /// Runs the effect under the selected profile.
    fn apply(&self, profile: EffectProfile, ctx: &mut EffectContext<'_>);
}

/// Effect that resolves one outcome and delivers it with the ability's
/// travel model.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDamage;

impl Effect for DirectDamage {
    fn apply(&self, profile: EffectProfile, ctx: &mut EffectContext<'_>) {
        let roll = ctx.damage_roll();
        let outcome = ctx.resolve_outcome(roll, profile.multiplier());
        ctx.deliver(outcome);
    }
}
