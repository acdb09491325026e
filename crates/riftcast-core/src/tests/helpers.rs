//! Fixtures for building simulations and duels.

use std::sync::Arc;

use glam::Vec2;

use crate::abilities::{frost_mage, install_frost_kit, FrostOptions, FrostboltHandles, ICY_VEINS};
use crate::ability::{AbilityDefinition, AbilityId, AbilityKey, SpellSchool, TravelTime};
use crate::config::SimulationConfig;
use crate::entity::{EntityId, StackId, UnitSpec};
use crate::outcome::{FixedTable, OutcomeTable};
use crate::random::RandomStream;
use crate::simulation::Simulation;
use crate::trials::{Combatants, Encounter};

// =============================================================================
// Logging
// =============================================================================

/// Installs a test-writer subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Simulations
// =============================================================================

/// A simulation with scripted streams and a fixed outcome table.
pub fn scripted_sim(combat: &[f64], procs: &[f64], table: OutcomeTable) -> Simulation {
    init_tracing();
    Simulation::with_streams(
        SimulationConfig::default(),
        RandomStream::scripted(combat.to_vec()),
        RandomStream::scripted(procs.to_vec()),
    )
    .with_statistics(Arc::new(FixedTable {
        table,
        crit_multiplier: 2.0,
    }))
}

/// A simulation whose draws are all `0.5` and whose outcomes always hit.
pub fn midpoint_sim() -> Simulation {
    scripted_sim(&[0.5], &[0.5], OutcomeTable::guaranteed_hit())
}

/// A frost bolt-shaped ability with a fixed one second travel time.
pub fn one_second_bolt(spell_id: u32) -> AbilityDefinition {
    AbilityDefinition::new(AbilityKey::new(spell_id), "test bolt", SpellSchool::Frost)
        .with_damage(1.5, 0.24)
        .with_travel(TravelTime::Fixed(1.0))
}

// =============================================================================
// Duels
// =============================================================================

/// A frost mage facing a training dummy.
#[derive(Debug, Clone, Copy)]
pub struct Duel {
    /// Registered frostbolt handles.
    pub handles: FrostboltHandles,
    /// The caster.
    pub mage: EntityId,
    /// The target, 28 yards away (one second of missile travel).
    pub dummy: EntityId,
}

/// Installs the frost kit and spawns a mage and a dummy.
pub fn setup_duel(sim: &mut Simulation, options: &FrostOptions, icy_veins: bool) -> Duel {
    let handles = install_frost_kit(sim, options);
    let mut spec = frost_mage("mage");
    if icy_veins {
        spec = spec.with_aura(ICY_VEINS);
    }
    let mage = sim.spawn(spec);
    let dummy = sim.spawn(UnitSpec::new("dummy").at(Vec2::new(28.0, 0.0)));
    Duel {
        handles,
        mage,
        dummy,
    }
}

/// Frost options with the glyph toggled.
pub fn glyph(enabled: bool) -> FrostOptions {
    FrostOptions {
        glyph_of_icy_veins: enabled,
        ..FrostOptions::default()
    }
}

/// Number of charges `unit` holds on `stack`.
pub fn stacks(sim: &Simulation, unit: EntityId, stack: &str) -> u32 {
    sim.unit(unit)
        .map_or(0, |u| u.stack_count(&StackId::new(stack)))
}

// =============================================================================
// Encounters
// =============================================================================

/// Casts Frostbolt back to back, optionally under Icy Veins.
pub struct FrostboltRotation {
    /// Kit options.
    pub options: FrostOptions,
    /// Whether the mage starts with Icy Veins.
    pub icy_veins: bool,
}

impl Encounter for FrostboltRotation {
    type State = AbilityId;

    fn setup(&self, sim: &mut Simulation) -> (Combatants, AbilityId) {
        let duel = setup_duel(sim, &self.options, self.icy_veins);
        (
            Combatants {
                actor: duel.mage,
                target: duel.dummy,
            },
            duel.handles.frostbolt,
        )
    }

    fn next_action(
        &self,
        _sim: &Simulation,
        _combatants: &Combatants,
        frostbolt: &mut AbilityId,
    ) -> Option<AbilityId> {
        Some(*frostbolt)
    }
}
