//! End-to-end tests of activation, resolution and delivery.
//!
//! These tests exercise the full pipeline: cost, profile selection, outcome
//! draws, procs, travel, delivery, sinks and chains.

use std::sync::Arc;

use crate::abilities::{FINGERS_OF_FROST, ICICLES, ICY_VEINS};
use crate::ability::{AbilityId, CastConfig, CostFormula, DirectDamage, Effect, TravelTime};
use crate::entity::{ResourceKind, ResourcePool, StackId, UnitSpec};
use crate::error::{ActivationError, ScheduleError};
use crate::outcome::{OutcomeTable, OutcomeTag};
use crate::queue::SimTime;
use crate::resolution::{ActivationPhase, EffectContext, EffectProfile};
use crate::simulation::Simulation;

use super::helpers::{glyph, midpoint_sim, one_second_bolt, scripted_sim, setup_duel, stacks};

// =============================================================================
// Test Effects
// =============================================================================

/// Delivers, asks for a delivery in the past, optionally chains, then
/// delivers again.
struct BackwardsDelivery(Option<AbilityId>);

impl Effect for BackwardsDelivery {
    fn apply(&self, profile: EffectProfile, ctx: &mut EffectContext<'_>) {
        let roll = ctx.damage_roll();
        let outcome = ctx.resolve_outcome(roll, profile.multiplier());
        ctx.deliver(outcome);
        ctx.deliver_after(outcome, -1.0);
        if let Some(next) = self.0 {
            ctx.chain(next);
        }
        ctx.deliver(outcome);
    }
}

/// Chains `0`, then resolves and delivers its own outcome.
struct ChainsTo(AbilityId);

impl Effect for ChainsTo {
    fn apply(&self, profile: EffectProfile, ctx: &mut EffectContext<'_>) {
        ctx.chain(self.0);
        let roll = ctx.damage_roll();
        let outcome = ctx.resolve_outcome(roll, profile.multiplier());
        ctx.deliver(outcome);
    }
}

// =============================================================================
// Worked Example
// =============================================================================

/// Midpoint roll, guaranteed hit, one second of travel: 1500 lands at t=1.
#[test]
fn midpoint_hit_is_delivered_after_travel() {
    let mut sim = midpoint_sim();
    let mage = sim.spawn(UnitSpec::new("mage"));
    let dummy = sim.spawn(UnitSpec::new("dummy"));
    let bolt = sim.register_ability(one_second_bolt(1), Arc::new(DirectDamage));

    let report = sim.activate(bolt, mage, dummy).unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].tag(), OutcomeTag::Hit);
    assert_eq!(report.outcomes[0].damage(), 1500.0);
    assert_eq!(report.deliveries[0].fire_at, SimTime::from_secs(1.0));

    // Nothing at the resolution instant.
    assert_eq!(sim.advance_to(SimTime::ZERO), 0);
    assert_eq!(sim.unit(dummy).unwrap().damage_taken(), 0.0);

    assert_eq!(sim.advance_to(SimTime::from_secs(0.999)), 0);
    assert_eq!(sim.advance_to(SimTime::from_secs(1.0)), 1);
    assert_eq!(sim.unit(dummy).unwrap().damage_taken(), 1500.0);
    assert_eq!(sim.phase_of(report.activation), Some(ActivationPhase::Complete));
}

/// Instant travel still goes through the queue.
#[test]
fn instant_travel_lands_on_next_drain() {
    let mut sim = midpoint_sim();
    let mage = sim.spawn(UnitSpec::new("mage"));
    let dummy = sim.spawn(UnitSpec::new("dummy"));
    let bolt = sim.register_ability(
        one_second_bolt(1).with_travel(TravelTime::Instant),
        Arc::new(DirectDamage),
    );

    sim.activate(bolt, mage, dummy).unwrap();
    assert_eq!(sim.pending_deliveries(), 1);
    assert_eq!(sim.advance_to(SimTime::ZERO), 1);
    assert_eq!(sim.unit(dummy).unwrap().damage_taken(), 1500.0);
}

/// Missile travel is distance over speed.
#[test]
fn missile_travel_scales_with_distance() {
    let mut sim = midpoint_sim();
    let duel = setup_duel(&mut sim, &glyph(false), false);
    sim.roster_mut().get_mut(duel.dummy).unwrap().position = glam::Vec2::new(56.0, 0.0);

    let report = sim
        .activate(duel.handles.frostbolt, duel.mage, duel.dummy)
        .unwrap();
    assert!((report.deliveries[0].fire_at.as_secs() - 2.0).abs() < 1e-6);
}

// =============================================================================
// Failed Activations
// =============================================================================

/// Insufficient mana fails before any draw or event.
#[test]
fn insufficient_resource_has_no_side_effects() {
    let mut sim = midpoint_sim();
    let mage = sim.spawn(UnitSpec::new("mage").with_mana(ResourcePool::full(100.0)));
    let dummy = sim.spawn(UnitSpec::new("dummy"));
    let bolt = sim.register_ability(
        one_second_bolt(1).with_cost(CostFormula::Flat(500.0)),
        Arc::new(DirectDamage),
    );

    assert_eq!(
        sim.activate(bolt, mage, dummy),
        Err(ActivationError::InsufficientResource {
            resource: ResourceKind::Mana,
            required: 500.0,
            available: 100.0,
        })
    );
    assert_eq!(sim.combat_draws(), 0);
    assert_eq!(sim.proc_draws(), 0);
    assert_eq!(sim.pending_deliveries(), 0);
    assert_eq!(sim.unit(mage).unwrap().mana.current, 100.0);
    assert_eq!(sim.meter().total_activations(), 0);
}

/// A cooling-down ability fails before any draw or event.
#[test]
fn cooldown_has_no_side_effects() {
    let mut sim = midpoint_sim();
    let mage = sim.spawn(UnitSpec::new("mage").with_mana(ResourcePool::full(100.0)));
    let dummy = sim.spawn(UnitSpec::new("dummy"));
    let bolt = sim.register_ability(
        one_second_bolt(1)
            .with_cost(CostFormula::Flat(10.0))
            .with_cast(CastConfig {
                cast_time: 0.0,
                gcd: 0.0,
                cooldown: 8.0,
            }),
        Arc::new(DirectDamage),
    );

    sim.activate(bolt, mage, dummy).unwrap();
    sim.advance_to(SimTime::from_secs(4.0));
    let draws = sim.combat_draws();

    let err = sim.activate(bolt, mage, dummy).unwrap_err();
    assert!(matches!(err, ActivationError::OnCooldown { .. }));
    assert_eq!(sim.combat_draws(), draws);
    assert_eq!(sim.pending_deliveries(), 0);
    assert_eq!(sim.unit(mage).unwrap().mana.current, 90.0);
}

/// A rejected delivery voids every directive of the activation, including
/// chains issued after it.
#[test]
fn rejected_delivery_applies_no_directives() {
    let mut sim = midpoint_sim();
    let mage = sim.spawn(UnitSpec::new("mage").with_mana(ResourcePool::full(100.0)));
    let dummy = sim.spawn(UnitSpec::new("dummy"));
    let plain = sim.register_ability(
        one_second_bolt(1).with_cost(CostFormula::Flat(10.0)),
        Arc::new(DirectDamage),
    );
    let broken = sim.register_ability(
        one_second_bolt(2).with_cost(CostFormula::Flat(25.0)),
        Arc::new(BackwardsDelivery(Some(plain))),
    );

    assert_eq!(
        sim.activate(broken, mage, dummy),
        Err(ActivationError::InvalidSchedule(ScheduleError::NegativeDelay(-1.0)))
    );
    assert_eq!(sim.unit(mage).unwrap().mana.current, 75.0);
    assert_eq!(sim.combat_draws(), 2);
    assert_eq!(sim.pending_deliveries(), 0);
    assert!(sim.meter().get(plain).is_none());

    assert_eq!(sim.run_until_idle(), 0);
    assert_eq!(sim.unit(dummy).unwrap().damage_taken(), 0.0);
}

/// A chain whose delivery is rejected fails as a whole and deals no damage.
#[test]
fn chain_with_rejected_delivery_deals_no_damage() {
    let mut sim = midpoint_sim();
    let mage = sim.spawn(UnitSpec::new("mage").with_mana(ResourcePool::full(100.0)));
    let dummy = sim.spawn(UnitSpec::new("dummy"));
    let plain = sim.register_ability(one_second_bolt(1), Arc::new(DirectDamage));
    let broken = sim.register_ability(
        one_second_bolt(2).with_cost(CostFormula::Flat(25.0)),
        Arc::new(BackwardsDelivery(Some(plain))),
    );
    let parent = sim.register_ability(one_second_bolt(3), Arc::new(ChainsTo(broken)));

    let report = sim.activate(parent, mage, dummy).unwrap();
    assert!(report.chained.is_empty());
    assert_eq!(
        report.failed_chains,
        vec![(
            broken,
            ActivationError::InvalidSchedule(ScheduleError::NegativeDelay(-1.0))
        )]
    );
    assert_eq!(report.deliveries.len(), 1);
    assert_eq!(sim.pending_deliveries(), 1);
    assert_eq!(sim.unit(mage).unwrap().mana.current, 75.0);

    assert_eq!(sim.run_until_idle(), 1);
    assert_eq!(sim.unit(dummy).unwrap().damage_taken(), 1500.0);
    assert!(sim.meter().get(broken).is_some_and(|d| d.damage == 0.0));
    assert!(sim.meter().get(plain).is_none());
    assert_eq!(sim.phase_of(report.activation), Some(ActivationPhase::Complete));
}

/// A failing chain is recorded without failing its parent.
#[test]
fn failed_chain_does_not_fail_parent() {
    let mut sim = midpoint_sim();
    let mage = sim.spawn(UnitSpec::new("mage"));
    let dummy = sim.spawn(UnitSpec::new("dummy"));
    let bolt = sim.register_ability(one_second_bolt(1), Arc::new(ChainsTo(AbilityId::new(99))));

    let report = sim.activate(bolt, mage, dummy).unwrap();
    assert!(report.chained.is_empty());
    assert_eq!(
        report.failed_chains,
        vec![(
            AbilityId::new(99),
            ActivationError::UnknownAbility(AbilityId::new(99))
        )]
    );
    assert_eq!(report.deliveries.len(), 1);
}

// =============================================================================
// Branching and Chains
// =============================================================================

/// The split only happens with both the glyph and the aura.
#[test]
fn split_requires_glyph_and_aura() {
    for (with_glyph, with_aura, expected) in [
        (false, false, 1),
        (true, false, 1),
        (false, true, 1),
        (true, true, 3),
    ] {
        let mut sim = midpoint_sim();
        let duel = setup_duel(&mut sim, &glyph(with_glyph), with_aura);
        let report = sim
            .activate(duel.handles.frostbolt, duel.mage, duel.dummy)
            .unwrap();
        assert_eq!(
            report.all_outcomes().len(),
            expected,
            "glyph={with_glyph} aura={with_aura}"
        );
        assert_eq!(sim.combat_draws(), 2 * expected as u64);
    }
}

/// The profile is picked before the effect runs and never re-read.
#[test]
fn aura_removed_between_casts_switches_profile() {
    let mut sim = midpoint_sim();
    let duel = setup_duel(&mut sim, &glyph(true), true);

    let split = sim
        .activate(duel.handles.frostbolt, duel.mage, duel.dummy)
        .unwrap();
    assert!(split.profile.is_split());

    sim.roster_mut()
        .get_mut(duel.mage)
        .unwrap()
        .remove_aura(&ICY_VEINS.into());
    let standard = sim
        .activate(duel.handles.frostbolt, duel.mage, duel.dummy)
        .unwrap();
    assert_eq!(standard.profile, EffectProfile::Standard);
    assert_eq!(standard.outcomes[0].damage(), 1500.0);
}

/// Two outcomes from one activation draw four numbers and land independently.
#[test]
fn dual_roll_outcomes_are_independent() {
    let table = OutcomeTable::new(0.5, 0.0);
    for (script, expected) in [
        ([0.1, 0.5, 0.9, 0.5], [false, true]),
        ([0.9, 0.5, 0.1, 0.5], [true, false]),
        ([0.9, 0.5, 0.9, 0.5], [true, true]),
    ] {
        let mut sim = scripted_sim(&script, &[0.99], table);
        let duel = setup_duel(&mut sim, &glyph(false), false);
        let report = sim
            .activate(duel.handles.split, duel.mage, duel.dummy)
            .unwrap();
        assert_eq!(report.combat_draws, 4);
        let landed: Vec<bool> = report.outcomes.iter().map(|o| o.landed()).collect();
        assert_eq!(landed, expected);
        for outcome in &report.outcomes {
            let want = if outcome.landed() { 600.0 } else { 0.0 };
            assert!((outcome.damage() - want).abs() < 1e-9);
        }
    }
}

/// Definitions are untouched by any activation, including failed ones.
#[test]
fn damage_multipliers_are_bit_identical_after_activation() {
    let mut sim = midpoint_sim();
    let duel = setup_duel(&mut sim, &glyph(true), true);
    let broken = sim.register_ability(one_second_bolt(2), Arc::new(BackwardsDelivery(None)));

    let bits = |sim: &Simulation| -> Vec<u64> {
        sim.abilities()
            .iter()
            .map(|(_, entry)| entry.definition.damage_multiplier.to_bits())
            .collect()
    };
    let before = bits(&sim);

    sim.activate(duel.handles.frostbolt, duel.mage, duel.dummy)
        .unwrap();
    assert!(sim.activate(broken, duel.mage, duel.dummy).is_err());
    sim.run_until_idle();

    assert_eq!(bits(&sim), before);
}

/// Chain depth applies to frostbolts as to anything else.
#[test]
fn split_is_dropped_when_chains_are_disabled() {
    let mut sim = Simulation::new(crate::config::SimulationConfig {
        seed: 3,
        max_chain_depth: 0,
    });
    let duel = setup_duel(&mut sim, &glyph(true), true);
    let report = sim
        .activate(duel.handles.frostbolt, duel.mage, duel.dummy)
        .unwrap();
    assert_eq!(report.all_outcomes().len(), 1);
    assert!(matches!(
        report.failed_chains.as_slice(),
        [(id, ActivationError::ChainDepthExceeded { .. })] if *id == duel.handles.split
    ));
}

// =============================================================================
// Procs and Sinks
// =============================================================================

/// Fingers of Frost is granted at resolution, before the bolt lands.
#[test]
fn fingers_of_frost_is_granted_before_delivery() {
    let mut sim = scripted_sim(&[0.5], &[0.01], OutcomeTable::guaranteed_hit());
    let duel = setup_duel(&mut sim, &glyph(false), false);

    sim.activate(duel.handles.frostbolt, duel.mage, duel.dummy)
        .unwrap();
    assert_eq!(stacks(&sim, duel.mage, FINGERS_OF_FROST), 1);
    assert_eq!(stacks(&sim, duel.mage, ICICLES), 0);
    assert_eq!(sim.unit(duel.dummy).unwrap().damage_taken(), 0.0);
}

/// Icicles are granted at delivery, once per landed bolt, and cap at five.
#[test]
fn icicles_follow_deliveries_and_cap() {
    let mut sim = midpoint_sim();
    let duel = setup_duel(&mut sim, &glyph(true), true);
    let icicles = StackId::new(ICICLES);

    // One split cast: three bolts in flight, none stored yet.
    sim.activate(duel.handles.frostbolt, duel.mage, duel.dummy)
        .unwrap();
    assert_eq!(stacks(&sim, duel.mage, ICICLES), 0);
    sim.run_until_idle();
    assert_eq!(stacks(&sim, duel.mage, ICICLES), 3);

    sim.activate(duel.handles.frostbolt, duel.mage, duel.dummy)
        .unwrap();
    sim.run_until_idle();

    let stack = sim.unit(duel.mage).unwrap().stack(&icicles).unwrap();
    assert_eq!(stack.count(), 5);
    assert_eq!(stack.gained_total(), 6);
    // Each split bolt stores 600 * 0.2.
    assert!((stack.released_total() - 120.0).abs() < 1e-9);
}

/// Misses reach the target as zero damage and grant nothing.
#[test]
fn misses_deliver_zero_and_skip_sinks() {
    let mut sim = scripted_sim(&[0.5], &[0.01], OutcomeTable::new(1.0, 0.0));
    let duel = setup_duel(&mut sim, &glyph(false), false);

    let report = sim
        .activate(duel.handles.frostbolt, duel.mage, duel.dummy)
        .unwrap();
    assert_eq!(report.outcomes[0].tag(), OutcomeTag::Miss);
    assert_eq!(report.combat_draws, 2);
    assert_eq!(sim.run_until_idle(), 1);
    assert_eq!(sim.unit(duel.dummy).unwrap().damage_taken(), 0.0);
    assert_eq!(stacks(&sim, duel.mage, ICICLES), 0);
    assert_eq!(stacks(&sim, duel.mage, FINGERS_OF_FROST), 0);
    assert_eq!(sim.meter().get(duel.handles.frostbolt).unwrap().misses, 1);
}

// =============================================================================
// Meter
// =============================================================================

/// The meter splits damage between the bolt and its split variant.
#[test]
fn meter_attributes_split_damage() {
    let mut sim = midpoint_sim();
    let duel = setup_duel(&mut sim, &glyph(true), true);
    sim.activate(duel.handles.frostbolt, duel.mage, duel.dummy)
        .unwrap();
    sim.run_until_idle();

    let main = sim.meter().get(duel.handles.frostbolt).unwrap();
    let split = sim.meter().get(duel.handles.split).unwrap();
    assert_eq!(main.activations, 1);
    assert_eq!(split.activations, 1);
    assert!((main.damage - 600.0).abs() < 1e-9);
    assert!((split.damage - 1200.0).abs() < 1e-9);
    assert!((sim.meter().total_damage() - 1800.0).abs() < 1e-9);
}
