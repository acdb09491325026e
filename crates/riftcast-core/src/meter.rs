//! Damage accounting per ability.
//!
//! The meter counts activations when they succeed and outcomes when their
//! damage is delivered. Damage still in flight is not counted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ability::AbilityId;
use crate::outcome::{Outcome, OutcomeTag};

/// Totals for a single ability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityDamage {
    /// Successful activations.
    pub activations: u64,
    /// Delivered hits.
    pub hits: u64,
    /// Delivered crits.
    pub crits: u64,
    /// Delivered misses.
    pub misses: u64,
    /// Damage delivered.
    pub damage: f64,
}

impl AbilityDamage {
    /// Delivered outcomes of any tag.
    #[must_use]
    pub fn outcomes(&self) -> u64 {
        self.hits + self.crits + self.misses
    }

    /// Fraction of landed outcomes that were crits.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn crit_rate(&self) -> f64 {
        let landed = self.hits + self.crits;
        if landed == 0 {
            0.0
        } else {
            self.crits as f64 / landed as f64
        }
    }
}

/// Per-ability damage meter for one simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageMeter {
    by_ability: BTreeMap<AbilityId, AbilityDamage>,
}

impl DamageMeter {
    /// Creates an empty meter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one successful activation.
    pub fn record_activation(&mut self, ability: AbilityId) {
        self.by_ability.entry(ability).or_default().activations += 1;
    }

    /// Counts one delivered outcome.
    pub fn record_delivery(&mut self, ability: AbilityId, outcome: &Outcome) {
        let entry = self.by_ability.entry(ability).or_default();
        match outcome.tag() {
            OutcomeTag::Miss => entry.misses += 1,
            OutcomeTag::Hit => entry.hits += 1,
            OutcomeTag::Crit => entry.crits += 1,
        }
        entry.damage += outcome.damage();
    }

    /// Totals for `ability`, if it was ever recorded.
    #[must_use]
    pub fn get(&self, ability: AbilityId) -> Option<&AbilityDamage> {
        self.by_ability.get(&ability)
    }

    /// Totals in ability order.
    pub fn iter(&self) -> impl Iterator<Item = (AbilityId, &AbilityDamage)> {
        self.by_ability.iter().map(|(id, totals)| (*id, totals))
    }

    /// Damage delivered by every ability.
    #[must_use]
    pub fn total_damage(&self) -> f64 {
        self.by_ability.values().map(|t| t.damage).sum()
    }

    /// Successful activations of every ability.
    #[must_use]
    pub fn total_activations(&self) -> u64 {
        self.by_ability.values().map(|t| t.activations).sum()
    }

    /// Forgets everything recorded.
    pub fn reset(&mut self) {
        self.by_ability.clear();
    }
}
