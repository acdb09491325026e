//! Error types for ability resolution, scheduling, and configuration.
//!
//! Only genuine failures live here. A miss, a zero-damage roll, or a proc that
//! grants no stacks are ordinary outcomes and never surface as errors.

use thiserror::Error;

use crate::ability::AbilityId;
use crate::entity::components::ResourceKind;
use crate::entity::EntityId;
use crate::queue::SimTime;

/// Reasons an activation can be refused or cut short.
///
/// Every variant except [`ActivationError::InvalidSchedule`] is raised before
/// any side effect: no cost is paid, no draw is consumed, nothing is queued.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActivationError {
    /// The actor cannot pay the ability's cost.
    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientResource {
        /// Resource the cost is paid in.
        resource: ResourceKind,
        /// Amount the ability costs.
        required: f64,
        /// Amount the actor currently holds.
        available: f64,
    },

    /// The handle was never returned by `register_ability`.
    #[error("unknown ability {0}")]
    UnknownAbility(AbilityId),

    /// The actor or target is not in the roster.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// The ability is still cooling down for this actor.
    #[error("ability {ability} on cooldown until {ready_at}")]
    OnCooldown {
        /// The ability that was requested.
        ability: AbilityId,
        /// Earliest time the ability can be activated again.
        ready_at: SimTime,
    },

    /// A chain of triggered activations went deeper than the configured limit.
    #[error("chain into ability {ability} exceeds depth limit {depth}")]
    ChainDepthExceeded {
        /// The chained ability that was dropped.
        ability: AbilityId,
        /// The configured maximum depth.
        depth: u32,
    },

    /// An effect asked for a delivery the queue cannot accept.
    #[error(transparent)]
    InvalidSchedule(#[from] ScheduleError),
}

/// Rejected insertions into the event queue.
///
/// These indicate a defect in an effect or ability definition, not a runtime
/// condition a caller is expected to recover from.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ScheduleError {
    /// Events can only be scheduled at or after the current time.
    #[error("cannot schedule with negative delay {0}")]
    NegativeDelay(f64),

    /// NaN or infinite delays have no position on the timeline.
    #[error("cannot schedule with a non-finite delay")]
    NonFiniteDelay,
}

/// Failures while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for the expected shape.
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}
