//! Cross-module tests for the resolution engine.
//!
//! - **Determinism tests**: same seed and inputs give identical results
//! - **Integration tests**: activation through delivery, end to end
//! - **Helper functions**: fixtures shared by both
//!
//! # Test Structure
//!
//! - `determinism.rs`: reproducibility across runs, streams and threads
//! - `integration.rs`: end-to-end scenarios
//! - `helpers.rs`: simulation and unit fixtures

mod helpers;
mod integration;

pub use helpers::*;
