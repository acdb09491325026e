//! Frostbolt and its split-bolt variant.
//!
//! A Frostbolt resolves one outcome and delivers it as a missile. While Icy
//! Veins is active and the glyph is equipped, the bolt is cast under the
//! split profile: its own outcome is scaled down and it chains the split
//! variant, which resolves two more independent outcomes.

use std::sync::Arc;

use crate::ability::{
    AbilityDefinition, AbilityFlags, AbilityId, AbilityKey, CastConfig, CostFormula, Effect,
    SpellSchool, TravelTime,
};
use crate::entity::{AuraId, Unit};
use crate::resolution::{EffectContext, EffectProfile};
use crate::simulation::Simulation;

use super::{FROSTBOLT_SPELL_ID, ICY_VEINS};

const VARIANCE: f64 = 0.24;
const SCALE: f64 = 1.5;
const BONUS_COEFFICIENT: f64 = 1.5;
const MISSILE_SPEED: f64 = 28.0;
const SPLIT_MULTIPLIER: f64 = 0.4;

/// Handles returned by [`register_frostbolt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrostboltHandles {
    /// The castable Frostbolt.
    pub frostbolt: AbilityId,
    /// The passive split variant.
    pub split: AbilityId,
}

/// Definition of the castable Frostbolt.
#[must_use]
pub fn frostbolt_definition() -> AbilityDefinition {
    AbilityDefinition::new(AbilityKey::new(FROSTBOLT_SPELL_ID), "Frostbolt", SpellSchool::Frost)
        .with_cost(CostFormula::BaseManaPercent(4.0))
        .with_cast(CastConfig {
            cast_time: 2.0,
            gcd: CastConfig::DEFAULT_GCD,
            cooldown: 0.0,
        })
        .with_damage(SCALE, VARIANCE)
        .with_bonus_coefficient(BONUS_COEFFICIENT)
        .with_travel(TravelTime::Missile {
            speed: MISSILE_SPEED,
        })
        .with_flags(AbilityFlags::ROTATION)
}

/// Definition of the split variant: free, passive, at reduced strength.
#[must_use]
pub fn split_bolt_definition() -> AbilityDefinition {
    AbilityDefinition::new(
        AbilityKey::tagged(FROSTBOLT_SPELL_ID, 1),
        "Frostbolt (Icy Veins)",
        SpellSchool::Frost,
    )
    .with_cast(CastConfig {
        cast_time: 0.0,
        gcd: 0.0,
        cooldown: 0.0,
    })
    .with_damage(SCALE, VARIANCE)
    .with_damage_multiplier(SPLIT_MULTIPLIER)
    .with_bonus_coefficient(BONUS_COEFFICIENT)
    .with_travel(TravelTime::Missile {
        speed: MISSILE_SPEED,
    })
    .with_flags(AbilityFlags::PASSIVE)
}

/// Effect of the castable Frostbolt.
#[derive(Debug, Clone)]
pub struct FrostboltEffect {
    glyph: bool,
    split: AbilityId,
    icy_veins: AuraId,
}

impl FrostboltEffect {
    /// Creates the effect. `split` is chained when the split profile applies.
    #[must_use]
    pub fn new(glyph: bool, split: AbilityId) -> Self {
        Self {
            glyph,
            split,
            icy_veins: AuraId::new(ICY_VEINS),
        }
    }
}

impl Effect for FrostboltEffect {
    fn select_profile(&self, actor: &Unit) -> EffectProfile {
        if self.glyph && actor.has_aura(&self.icy_veins) {
            EffectProfile::Split {
                multiplier: SPLIT_MULTIPLIER,
            }
        } else {
            EffectProfile::Standard
        }
    }

    fn apply(&self, profile: EffectProfile, ctx: &mut EffectContext<'_>) {
        let roll = ctx.damage_roll();
        let outcome = ctx.resolve_outcome(roll, profile.multiplier());
        if profile.is_split() {
            ctx.chain(self.split);
        }
        ctx.deliver(outcome);
    }
}

/// Effect of the split variant: two independent outcomes, then two
/// deliveries in the same order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitBoltEffect;

impl SplitBoltEffect {
    /// Outcomes resolved per activation.
    pub const BOLTS: usize = 2;
}

impl Effect for SplitBoltEffect {
    fn apply(&self, profile: EffectProfile, ctx: &mut EffectContext<'_>) {
        let roll = ctx.damage_roll();
        let outcomes: Vec<_> = (0..Self::BOLTS)
            .map(|_| ctx.resolve_outcome(roll, profile.multiplier()))
            .collect();
        for outcome in outcomes {
            ctx.deliver(outcome);
        }
    }
}

/// Registers both frostbolts. The split variant is registered first so the
/// castable bolt can chain into it.
pub fn register_frostbolt(sim: &mut Simulation, glyph: bool) -> FrostboltHandles {
    let split = sim.register_ability(split_bolt_definition(), Arc::new(SplitBoltEffect));
    let frostbolt = sim.register_ability(
        frostbolt_definition(),
        Arc::new(FrostboltEffect::new(glyph, split)),
    );
    FrostboltHandles { frostbolt, split }
}
