//! Simulation and trial configuration.
//!
//! Both structs are plain serde data with defaults, so a partial JSON
//! document fills the remaining fields from [`Default`].
//!
//! # Example
//!
//! ```
//! use riftcast_core::config::TrialConfig;
//!
//! let config = TrialConfig::from_json(r#"{ "iterations": 250, "duration": 60.0 }"#).unwrap();
//! assert_eq!(config.iterations, 250);
//! assert!(config.parallel);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for a single simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Master seed for the combat and proc streams.
    pub seed: u64,
    /// Maximum nesting of chained activations. 0 disables chains.
    pub max_chain_depth: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_chain_depth: 4,
        }
    }
}

impl SimulationConfig {
    /// Default config with `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed or a value is invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the chain depth is absurdly large.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chain_depth > 64 {
            return Err(ConfigError::Invalid(format!(
                "max_chain_depth {} exceeds 64",
                self.max_chain_depth
            )));
        }
        Ok(())
    }
}

/// Settings for a batch of independent trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    /// Number of trials.
    pub iterations: u32,
    /// Seed of the first trial. Trial `i` uses `base_seed + i`.
    pub base_seed: u64,
    /// Simulated seconds per trial.
    pub duration: f64,
    /// Run trials on the rayon thread pool.
    pub parallel: bool,
    /// Per-trial simulation settings. The seed field is overwritten per trial.
    pub simulation: SimulationConfig,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            base_seed: 0,
            duration: 180.0,
            parallel: true,
            simulation: SimulationConfig::default(),
        }
    }
}

impl TrialConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed or a value is invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero iterations or a duration
    /// that is not a positive finite number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::Invalid("iterations must be at least 1".into()));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "duration must be positive and finite, got {}",
                self.duration
            )));
        }
        self.simulation.validate()
    }

    /// Seed for trial `index`.
    #[must_use]
    pub fn seed_for(&self, index: u32) -> u64 {
        self.base_seed.wrapping_add(u64::from(index))
    }
}
