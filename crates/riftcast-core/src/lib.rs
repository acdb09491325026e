//! # Riftcast Core
//!
//! Deterministic combat resolution for Riftcast.
//!
//! This crate resolves ability activations into hit, crit and miss outcomes
//! with randomized damage, delivers that damage after a travel delay through
//! a time-ordered event queue, and runs procs, resource grants and chained
//! activations along the way. Every draw comes from a seeded stream, so a
//! run is reproducible from its seed.
//!
//! ## Architecture
//!
//! - **Entities**: units with mana, stats, auras and capped stacks
//! - **Abilities**: immutable definitions paired with an [`ability::Effect`]
//! - **Resolution**: cost, profile, outcomes, procs, then directives
//! - **Delivery**: queued records applied when the clock reaches them
//! - **Trials**: independent simulations run in parallel and aggregated
//!
//! ## Usage
//!
//! ```
//! use riftcast_core::abilities::{frost_mage, install_frost_kit, FrostOptions};
//! use riftcast_core::config::SimulationConfig;
//! use riftcast_core::entity::UnitSpec;
//! use riftcast_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimulationConfig::with_seed(42));
//! let kit = install_frost_kit(&mut sim, &FrostOptions::default());
//! let mage = sim.spawn(frost_mage("mage"));
//! let dummy = sim.spawn(UnitSpec::new("dummy"));
//!
//! sim.activate(kit.frostbolt, mage, dummy).unwrap();
//! sim.run_until_idle();
//! assert!(sim.meter().total_damage() > 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod abilities;
pub mod ability;
pub mod config;
pub mod damage;
pub mod entity;
pub mod error;
pub mod hooks;
pub mod meter;
pub mod outcome;
pub mod queue;
pub mod random;
pub mod resolution;
pub mod roster;
pub mod simulation;
pub mod stats;
pub mod trials;

#[cfg(test)]
mod tests;

pub use ability::{AbilityDefinition, AbilityId, Effect};
pub use config::{SimulationConfig, TrialConfig};
pub use entity::{EntityId, Unit, UnitSpec};
pub use error::{ActivationError, ConfigError, ScheduleError};
pub use outcome::{Outcome, OutcomeTag};
pub use queue::SimTime;
pub use resolution::{ActivationReport, EffectContext, EffectProfile};
pub use simulation::Simulation;
pub use trials::{Encounter, TrialRunner, TrialSummary};
