//! State components carried by units.
//!
//! Resource pools pay ability costs. Stats feed outcome probabilities.
//! Stacking resources are counters that only hooks may change.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Resources
// =============================================================================

/// Resource an ability cost is paid in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Caster mana.
    Mana,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mana => write!(f, "mana"),
        }
    }
}

/// A spendable resource with a current value, a cap, and a base value.
///
/// `base` is the reference for percentage-of-base costs and is independent of
/// the cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Amount currently available.
    pub current: f64,
    /// Upper bound for `current`.
    pub max: f64,
    /// Reference value for percentage costs.
    pub base: f64,
}

impl ResourcePool {
    /// Creates a full pool whose base equals its cap.
    #[must_use]
    pub fn full(max: f64) -> Self {
        Self {
            current: max,
            max,
            base: max,
        }
    }

    /// Creates an empty pool. Useful for units that never pay costs.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            current: 0.0,
            max: 0.0,
            base: 0.0,
        }
    }

    /// Returns true if `amount` can be paid from the current value.
    #[must_use]
    pub fn can_pay(&self, amount: f64) -> bool {
        self.current >= amount
    }

    /// Deducts `amount` if affordable.
    ///
    /// Returns the amount that was available when the pool could not pay, and
    /// leaves the pool untouched in that case.
    pub fn spend(&mut self, amount: f64) -> Result<(), f64> {
        if !self.can_pay(amount) {
            return Err(self.current);
        }
        self.current -= amount;
        Ok(())
    }

    /// Adds `amount`, capped at `max`.
    pub fn restore(&mut self, amount: f64) {
        self.current = (self.current + amount).min(self.max);
    }
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Combat statistics read by the default outcome model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Class damage scaling value used as the mean of damage rolls.
    pub spell_scaling: f64,
    /// Spell power, multiplied by an ability's bonus coefficient.
    pub spell_power: f64,
    /// Chance in `[0, 1]` that offsets the defender's miss chance.
    pub hit_chance: f64,
    /// Chance in `[0, 1]` to land a critical strike.
    pub crit_chance: f64,
    /// Damage multiplier applied on a critical strike.
    pub crit_multiplier: f64,
    /// Chance that attacks against this unit miss before hit is applied.
    pub base_miss_chance: f64,
}

impl Default for UnitStats {
    fn default() -> Self {
        Self {
            spell_scaling: 1000.0,
            spell_power: 0.0,
            hit_chance: 0.0,
            crit_chance: 0.0,
            crit_multiplier: 2.0,
            base_miss_chance: 0.0,
        }
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Name of an aura (a timed or toggled state) a unit can carry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuraId(String);

impl AuraId {
    /// Creates an aura id from its name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Returns the aura name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AuraId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Name of a stacking resource a unit can accumulate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StackId(String);

impl StackId {
    /// Creates a stack id from its name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Returns the stack name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StackId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// =============================================================================
// Stacking resources
// =============================================================================

/// What happens when a full stack gains another charge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// The new charge is lost.
    Discard,
    /// The oldest charge is released to make room for the new one.
    ReleaseOldest,
}

/// Result of offering one charge to a [`ResourceStack`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackGain {
    /// Whether the new charge was stored.
    pub gained: bool,
    /// Value of the charge pushed out by [`OverflowPolicy::ReleaseOldest`].
    pub released: Option<f64>,
}

/// A capped FIFO of charges, each carrying a value.
///
/// Counter-style resources push charges of value `0.0`. Value-carrying
/// resources (for example, a stored fraction of the damage that generated
/// them) push the value they need released later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStack {
    charges: VecDeque<f64>,
    max: u32,
    policy: OverflowPolicy,
    gained_total: u64,
    released_total: f64,
}

impl ResourceStack {
    /// Creates an empty stack holding at most `max` charges.
    #[must_use]
    pub fn new(max: u32, policy: OverflowPolicy) -> Self {
        Self {
            charges: VecDeque::with_capacity(max as usize),
            max,
            policy,
            gained_total: 0,
            released_total: 0.0,
        }
    }

    /// Number of charges currently held.
    #[must_use]
    pub fn count(&self) -> u32 {
        // max is a u32, so the length always fits
        u32::try_from(self.charges.len()).unwrap_or(u32::MAX)
    }

    /// Capacity of the stack.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Returns true when no further charge fits without overflow.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count() >= self.max
    }

    /// Values of the held charges, oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.charges.iter().copied()
    }

    /// Charges gained over the stack's lifetime.
    #[must_use]
    pub fn gained_total(&self) -> u64 {
        self.gained_total
    }

    /// Sum of values released by overflow over the stack's lifetime.
    #[must_use]
    pub fn released_total(&self) -> f64 {
        self.released_total
    }

    pub(crate) fn gain(&mut self, value: f64) -> StackGain {
        if self.max == 0 {
            return StackGain {
                gained: false,
                released: None,
            };
        }
        let mut released = None;
        if self.is_full() {
            match self.policy {
                OverflowPolicy::Discard => {
                    return StackGain {
                        gained: false,
                        released: None,
                    };
                }
                OverflowPolicy::ReleaseOldest => {
                    released = self.charges.pop_front();
                    if let Some(value) = released {
                        self.released_total += value;
                    }
                }
            }
        }
        self.charges.push_back(value);
        self.gained_total += 1;
        StackGain {
            gained: true,
            released,
        }
    }

    pub(crate) fn consume(&mut self, count: u32) -> u32 {
        let taken = count.min(self.count());
        for _ in 0..taken {
            self.charges.pop_front();
        }
        taken
    }
}
