//! Batches of independent trials.
//!
//! A trial builds a fresh [`Simulation`] from its own seed, lets an
//! [`Encounter`] pick abilities until the duration runs out, and reports a
//! [`TrialResult`]. Trials share nothing, so [`TrialRunner`] can run them on
//! the rayon pool. Results are always collected in seed order, which makes a
//! parallel batch identical to a sequential one.
//!
//! # Example
//!
//! ```
//! use riftcast_core::abilities::{frost_mage, install_frost_kit, FrostOptions};
//! use riftcast_core::ability::AbilityId;
//! use riftcast_core::config::TrialConfig;
//! use riftcast_core::entity::UnitSpec;
//! use riftcast_core::simulation::Simulation;
//! use riftcast_core::trials::{Combatants, Encounter, TrialRunner};
//!
//! struct FrostboltSpam;
//!
//! impl Encounter for FrostboltSpam {
//!     type State = AbilityId;
//!
//!     fn setup(&self, sim: &mut Simulation) -> (Combatants, AbilityId) {
//!         let handles = install_frost_kit(sim, &FrostOptions::default());
//!         let actor = sim.spawn(frost_mage("mage"));
//!         let target = sim.spawn(UnitSpec::new("dummy"));
//!         (Combatants { actor, target }, handles.frostbolt)
//!     }
//!
//!     fn next_action(&self, _: &Simulation, _: &Combatants, bolt: &mut AbilityId) -> Option<AbilityId> {
//!         Some(*bolt)
//!     }
//! }
//!
//! let config = TrialConfig { iterations: 8, duration: 20.0, ..TrialConfig::default() };
//! let summary = TrialRunner::new(config).unwrap().run(&FrostboltSpam);
//! assert_eq!(summary.results.len(), 8);
//! assert!(summary.dps.mean > 0.0);
//! ```

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ability::{AbilityId, CastConfig};
use crate::config::{SimulationConfig, TrialConfig};
use crate::entity::EntityId;
use crate::error::ConfigError;
use crate::queue::SimTime;
use crate::simulation::Simulation;
use crate::stats::ScalarStats;

/// Shortest time a driver step may take, so zero-length casts cannot stall
/// the clock.
const MIN_STEP: f64 = 0.001;

/// The two sides of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatants {
    /// Unit casting abilities.
    pub actor: EntityId,
    /// Unit receiving damage.
    pub target: EntityId,
}

/// A scenario that can be run as a trial.
///
/// Implementations must be deterministic given the simulation they are handed.
pub trait Encounter: Sync {
    /// Per-trial driver state, created by `setup`.
    type State;

    /// Spawns units and registers abilities on a fresh simulation.
    fn setup(&self, sim: &mut Simulation) -> (Combatants, Self::State);

    /// Picks the next ability for the actor, or `None` to end the trial.
    fn next_action(
        &self,
        sim: &Simulation,
        combatants: &Combatants,
        state: &mut Self::State,
    ) -> Option<AbilityId>;
}

/// Outcome of one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// Seed the trial ran with.
    pub seed: u64,
    /// Damage delivered before the trial ended.
    pub damage: f64,
    /// `damage / duration`.
    pub dps: f64,
    /// Successful activations, chains included.
    pub activations: u64,
    /// Activations the driver requested that failed.
    pub failed_activations: u64,
    /// Deliveries still in flight at the end, discarded.
    pub discarded_deliveries: usize,
    /// Combat-stream draws.
    pub combat_draws: u64,
    /// Damage per ability name.
    pub damage_by_ability: BTreeMap<String, f64>,
}

/// Aggregate of a batch of trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Config the batch ran with.
    pub config: TrialConfig,
    /// DPS across trials.
    pub dps: ScalarStats,
    /// Total damage across trials.
    pub damage: ScalarStats,
    /// Mean damage per ability name.
    pub mean_damage_by_ability: BTreeMap<String, f64>,
    /// Per-trial results in seed order.
    pub results: Vec<TrialResult>,
}

/// Runs batches of trials.
#[derive(Debug, Clone, Copy)]
pub struct TrialRunner {
    config: TrialConfig,
}

impl TrialRunner {
    /// Creates a runner after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config is invalid.
    pub fn new(config: TrialConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The runner's config.
    #[must_use]
    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    /// Runs every trial and folds the results.
    pub fn run<E: Encounter>(&self, encounter: &E) -> TrialSummary {
        let results: Vec<TrialResult> = if self.config.parallel {
            (0..self.config.iterations)
                .into_par_iter()
                .map(|i| self.run_trial(encounter, self.config.seed_for(i)))
                .collect()
        } else {
            (0..self.config.iterations)
                .map(|i| self.run_trial(encounter, self.config.seed_for(i)))
                .collect()
        };
        let summary = self.summarize(results);
        tracing::info!(
            iterations = self.config.iterations,
            parallel = self.config.parallel,
            dps_mean = summary.dps.mean,
            dps_std_dev = summary.dps.std_dev(),
            "trial batch complete"
        );
        summary
    }

    /// Runs one trial with `seed`.
    pub fn run_trial<E: Encounter>(&self, encounter: &E, seed: u64) -> TrialResult {
        let mut sim = Simulation::new(SimulationConfig {
            seed,
            ..self.config.simulation
        });
        let (combatants, mut state) = encounter.setup(&mut sim);
        let end = SimTime::from_secs(self.config.duration);
        let mut failed_activations = 0;

        while sim.now() < end {
            let Some(ability) = encounter.next_action(&sim, &combatants, &mut state) else {
                break;
            };
            let cast = sim
                .abilities()
                .definition(ability)
                .map_or_else(CastConfig::instant, |d| d.cast);
            let started = sim.now();

            sim.advance_by(cast.cast_time.max(0.0));
            if sim.now() >= end {
                break;
            }
            if let Err(err) = sim.activate(ability, combatants.actor, combatants.target) {
                tracing::debug!(%err, seed, "driver activation failed");
                failed_activations += 1;
            }

            let next = SimTime::from_secs(started.as_secs() + cast.busy_time().max(MIN_STEP));
            sim.advance_to(next.min(end));
        }
        sim.advance_to(end);

        let meter = sim.meter();
        let damage = meter.total_damage();
        let mut damage_by_ability = BTreeMap::new();
        for (id, totals) in meter.iter() {
            let name = sim
                .abilities()
                .definition(id)
                .map_or_else(|| id.to_string(), |d| d.name.clone());
            *damage_by_ability.entry(name).or_insert(0.0) += totals.damage;
        }

        TrialResult {
            seed,
            damage,
            dps: damage / self.config.duration,
            activations: meter.total_activations(),
            failed_activations,
            discarded_deliveries: sim.pending_deliveries(),
            combat_draws: sim.combat_draws(),
            damage_by_ability,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn summarize(&self, results: Vec<TrialResult>) -> TrialSummary {
        let mut dps = ScalarStats::empty();
        let mut damage = ScalarStats::empty();
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for result in &results {
            dps = dps.push(result.dps);
            damage = damage.push(result.damage);
            for (name, value) in &result.damage_by_ability {
                *totals.entry(name.clone()).or_insert(0.0) += value;
            }
        }
        let n = results.len().max(1) as f64;
        let mean_damage_by_ability = totals.into_iter().map(|(k, v)| (k, v / n)).collect();

        TrialSummary {
            config: self.config,
            dps,
            damage,
            mean_damage_by_ability,
            results,
        }
    }
}
