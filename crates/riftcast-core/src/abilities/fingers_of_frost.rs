//! Fingers of Frost: a chance on each landed frostbolt to gain a charge.

use crate::ability::AbilityDefinition;
use crate::entity::StackId;
use crate::hooks::{ProcContext, ProcHook};

use super::{FINGERS_OF_FROST, FROSTBOLT_SPELL_ID};

/// Resolution-time proc granting Fingers of Frost charges.
///
/// Rolls once on the proc stream per landed outcome of any frostbolt
/// variant. Charges beyond the cap are discarded.
#[derive(Debug, Clone)]
pub struct FingersOfFrost {
    chance: f64,
    stack: StackId,
}

impl FingersOfFrost {
    /// Proc chance per landed frostbolt.
    pub const DEFAULT_CHANCE: f64 = 0.12;

    /// Charges a unit can hold.
    pub const MAX_CHARGES: u32 = 2;

    /// Creates the proc with `chance` per landed outcome.
    #[must_use]
    pub fn new(chance: f64) -> Self {
        Self {
            chance,
            stack: StackId::new(FINGERS_OF_FROST),
        }
    }

    /// The proc chance.
    #[must_use]
    pub fn chance(&self) -> f64 {
        self.chance
    }
}

impl Default for FingersOfFrost {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHANCE)
    }
}

impl ProcHook for FingersOfFrost {
    fn name(&self) -> &str {
        "fingers_of_frost"
    }

    fn applies_to(&self, definition: &AbilityDefinition) -> bool {
        definition.key.spell_id == FROSTBOLT_SPELL_ID
    }

    fn on_landed(&self, ctx: &mut ProcContext<'_>) {
        if ctx.roll_chance(self.chance) {
            let gain = ctx.add_stack(&self.stack, 0.0);
            tracing::trace!(
                actor = %ctx.actor().id(),
                gained = gain.is_some_and(|g| g.gained),
                "fingers of frost proc"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::abilities::{frost_mage, register_frostbolt};
    use crate::config::SimulationConfig;
    use crate::entity::UnitSpec;
    use crate::outcome::{FixedTable, OutcomeTable};
    use crate::random::RandomStream;
    use crate::simulation::Simulation;

    fn sim(table: OutcomeTable, proc_draw: f64) -> Simulation {
        Simulation::with_streams(
            SimulationConfig::default(),
            RandomStream::scripted([0.5]),
            RandomStream::scripted([proc_draw]),
        )
        .with_statistics(Arc::new(FixedTable {
            table,
            crit_multiplier: 2.0,
        }))
    }

    #[test]
    fn procs_below_chance_and_caps_at_two() {
        let mut sim = sim(OutcomeTable::guaranteed_hit(), 0.05);
        let handles = register_frostbolt(&mut sim, false);
        sim.register_proc(Arc::new(FingersOfFrost::default()));
        let mage = sim.spawn(frost_mage("mage"));
        let dummy = sim.spawn(UnitSpec::new("dummy"));
        let stack = StackId::new(FINGERS_OF_FROST);

        for _ in 0..3 {
            sim.activate(handles.frostbolt, mage, dummy).unwrap();
        }
        assert_eq!(sim.unit(mage).unwrap().stack_count(&stack), 2);
        assert_eq!(sim.proc_draws(), 3);
    }

    #[test]
    fn misses_never_roll() {
        let mut sim = sim(OutcomeTable::new(1.0, 0.0), 0.0);
        let handles = register_frostbolt(&mut sim, false);
        sim.register_proc(Arc::new(FingersOfFrost::default()));
        let mage = sim.spawn(frost_mage("mage"));
        let dummy = sim.spawn(UnitSpec::new("dummy"));

        let report = sim.activate(handles.frostbolt, mage, dummy).unwrap();
        assert!(!report.outcomes[0].landed());
        assert_eq!(sim.proc_draws(), 0);
        assert_eq!(sim.unit(mage).unwrap().stack_count(&FINGERS_OF_FROST.into()), 0);
    }

    #[test]
    fn roll_above_chance_grants_nothing() {
        let mut sim = sim(OutcomeTable::guaranteed_hit(), 0.5);
        let handles = register_frostbolt(&mut sim, false);
        sim.register_proc(Arc::new(FingersOfFrost::default()));
        let mage = sim.spawn(frost_mage("mage"));
        let dummy = sim.spawn(UnitSpec::new("dummy"));

        let report = sim.activate(handles.frostbolt, mage, dummy).unwrap();
        assert_eq!(report.proc_draws, 1);
        assert_eq!(sim.unit(mage).unwrap().stack_count(&FINGERS_OF_FROST.into()), 0);
    }
}
