//! Frost mage abilities built on the core engine.
//!
//! - [`frostbolt`]: the Frostbolt and its split-bolt variant
//! - [`FingersOfFrost`]: resolution-time proc on landed frostbolts
//! - [`Icicles`]: delivery-time resource stored from frostbolt damage
//!
//! # Registration
//!
//! [`install_frost_kit`] registers all of the above on a simulation and
//! returns the ability handles. Actors need the stacks declared by
//! [`frost_mage`] for the proc and sink to have anywhere to write.
//!
//! ```
//! use riftcast_core::abilities::{frost_mage, install_frost_kit, FrostOptions};
//! use riftcast_core::config::SimulationConfig;
//! use riftcast_core::entity::UnitSpec;
//! use riftcast_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimulationConfig::with_seed(1));
//! let handles = install_frost_kit(&mut sim, &FrostOptions::default());
//! let mage = sim.spawn(frost_mage("mage"));
//! let dummy = sim.spawn(UnitSpec::new("dummy"));
//!
//! let report = sim.activate(handles.frostbolt, mage, dummy).unwrap();
//! assert_eq!(report.outcomes.len(), 1);
//! ```

pub mod fingers_of_frost;
pub mod frostbolt;
pub mod icicles;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::{OverflowPolicy, ResourcePool, UnitSpec};
use crate::simulation::Simulation;

pub use fingers_of_frost::FingersOfFrost;
pub use frostbolt::{register_frostbolt, FrostboltEffect, FrostboltHandles, SplitBoltEffect};
pub use icicles::Icicles;

/// Spell id shared by the Frostbolt and its split variant.
pub const FROSTBOLT_SPELL_ID: u32 = 116;

/// Aura that, together with the glyph, splits frostbolts.
pub const ICY_VEINS: &str = "icy_veins";

/// Stack holding Fingers of Frost charges.
pub const FINGERS_OF_FROST: &str = "fingers_of_frost";

/// Stack holding Icicles.
pub const ICICLES: &str = "icicles";

/// Tunables for the frost kit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrostOptions {
    /// Whether the Glyph of Icy Veins is equipped.
    pub glyph_of_icy_veins: bool,
    /// Chance per landed frostbolt to gain Fingers of Frost.
    pub fingers_of_frost_chance: f64,
    /// Share of delivered frostbolt damage stored in each Icicle.
    pub icicle_fraction: f64,
}

impl Default for FrostOptions {
    fn default() -> Self {
        Self {
            glyph_of_icy_veins: false,
            fingers_of_frost_chance: FingersOfFrost::DEFAULT_CHANCE,
            icicle_fraction: 0.2,
        }
    }
}

/// Registers the frostbolts, Fingers of Frost and Icicles on `sim`.
pub fn install_frost_kit(sim: &mut Simulation, options: &FrostOptions) -> FrostboltHandles {
    let handles = register_frostbolt(sim, options.glyph_of_icy_veins);
    sim.register_proc(Arc::new(FingersOfFrost::new(options.fingers_of_frost_chance)));
    sim.register_sink(Arc::new(Icicles::new(options.icicle_fraction)));
    handles
}

/// A caster with a large mana pool and the frost stacks declared.
#[must_use]
pub fn frost_mage(name: &str) -> UnitSpec {
    UnitSpec::new(name)
        .with_mana(ResourcePool::full(100_000.0))
        .with_stack(FINGERS_OF_FROST, FingersOfFrost::MAX_CHARGES, OverflowPolicy::Discard)
        .with_stack(ICICLES, Icicles::MAX_ICICLES, OverflowPolicy::ReleaseOldest)
}
