//! Secondary effects triggered by landed outcomes.
//!
//! Two hook families fire at different points of an activation:
//!
//! - [`ProcHook`]: resolution time. Runs synchronously inside
//!   `EffectContext::resolve_outcome` for every landed outcome, before any
//!   delivery is scheduled. May roll chances on the proc stream.
//! - [`ResourceSink`]: delivery time. Runs when a landed outcome's damage
//!   reaches its target. Has no access to any random stream.
//!
//! Hooks are the only code allowed to change a unit's stacking resources.
//! Both contexts expose stack mutation; nothing else in the public API does.

use std::fmt;
use std::sync::Arc;

use crate::ability::AbilityDefinition;
use crate::entity::{EntityId, StackGain, StackId, Unit};
use crate::outcome::Outcome;
use crate::queue::SimTime;
use crate::random::RandomStream;

// =============================================================================
// Resolution-time procs
// =============================================================================

/// Hook run for each landed outcome while the effect is still executing.
pub trait ProcHook: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns true if this hook listens to activations of `definition`.
    fn applies_to(&self, definition: &AbilityDefinition) -> bool;

    /// Called once per landed outcome of a matching ability.
    fn on_landed(&self, ctx: &mut ProcContext<'_>);
}

/// What a proc hook can see and change.
pub struct ProcContext<'a> {
    pub(crate) definition: &'a AbilityDefinition,
    pub(crate) actor: &'a mut Unit,
    pub(crate) target: EntityId,
    pub(crate) outcome: Outcome,
    pub(crate) rng: &'a mut RandomStream,
    pub(crate) now: SimTime,
}

impl ProcContext<'_> {
    /// Ability whose outcome triggered the hook.
    #[must_use]
    pub fn definition(&self) -> &AbilityDefinition {
        self.definition
    }

    /// The acting unit.
    #[must_use]
    pub fn actor(&self) -> &Unit {
        self.actor
    }

    /// The target of the activation.
    #[must_use]
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// The landed outcome.
    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Resolution time.
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Rolls `probability` on the proc stream. Always consumes one draw.
    pub fn roll_chance(&mut self, probability: f64) -> bool {
        self.rng.chance(probability)
    }

    /// Adds one charge of `value` to the actor's `stack`.
    ///
    /// Returns `None` if the actor has no such stack.
    pub fn add_stack(&mut self, stack: &StackId, value: f64) -> Option<StackGain> {
        self.actor.stack_mut(stack).map(|s| s.gain(value))
    }

    /// Removes up to `count` charges, oldest first. Returns how many were
    /// removed.
    pub fn consume_stacks(&mut self, stack: &StackId, count: u32) -> u32 {
        self.actor.stack_mut(stack).map_or(0, |s| s.consume(count))
    }
}

// =============================================================================
// Delivery-time sinks
// =============================================================================

/// Hook run when a landed outcome's damage is delivered.
pub trait ResourceSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns true if this sink listens to deliveries of `definition`.
    fn applies_to(&self, definition: &AbilityDefinition) -> bool;

    /// Called once per delivered landed outcome of a matching ability.
    fn on_delivered(&self, ctx: &mut SinkContext<'_>);
}

/// What a resource sink can see and change. Draw-free.
pub struct SinkContext<'a> {
    pub(crate) definition: &'a AbilityDefinition,
    pub(crate) actor: &'a mut Unit,
    pub(crate) target: EntityId,
    pub(crate) outcome: Outcome,
    pub(crate) now: SimTime,
}

impl SinkContext<'_> {
    /// Ability whose damage was delivered.
    #[must_use]
    pub fn definition(&self) -> &AbilityDefinition {
        self.definition
    }

    /// The unit that produced the outcome.
    #[must_use]
    pub fn actor(&self) -> &Unit {
        self.actor
    }

    /// The unit that received the damage.
    #[must_use]
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// The delivered outcome.
    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Delivery time.
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Adds one charge of `value` to the actor's `stack`.
    pub fn gain(&mut self, stack: &StackId, value: f64) -> Option<StackGain> {
        self.actor.stack_mut(stack).map(|s| s.gain(value))
    }

    /// Removes up to `count` charges from the actor's `stack`.
    pub fn consume(&mut self, stack: &StackId, count: u32) -> u32 {
        self.actor.stack_mut(stack).map_or(0, |s| s.consume(count))
    }
}

// =============================================================================
// Registries
// =============================================================================

/// Ordered collection of proc hooks. Hooks fire in registration order.
#[derive(Clone, Default)]
pub struct ProcRegistry {
    hooks: Vec<Arc<dyn ProcHook>>,
}

impl fmt::Debug for ProcRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}

impl ProcRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook.
    pub fn register(&mut self, hook: Arc<dyn ProcHook>) {
        tracing::debug!(hook = hook.name(), "proc hook registered");
        self.hooks.push(hook);
    }

    /// Hooks listening to `definition`, in registration order.
    pub fn hooks_for<'a>(
        &'a self,
        definition: &'a AbilityDefinition,
    ) -> impl Iterator<Item = &'a Arc<dyn ProcHook>> + 'a {
        self.hooks.iter().filter(move |h| h.applies_to(definition))
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns true if no hook is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Ordered collection of resource sinks. Sinks run in registration order.
#[derive(Clone, Default)]
pub struct SinkRegistry {
    sinks: Vec<Arc<dyn ResourceSink>>,
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|s| s.name()))
            .finish()
    }
}

impl SinkRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sink.
    pub fn register(&mut self, sink: Arc<dyn ResourceSink>) {
        tracing::debug!(sink = sink.name(), "resource sink registered");
        self.sinks.push(sink);
    }

    /// Sinks listening to `definition`, in registration order.
    pub fn sinks_for<'a>(
        &'a self,
        definition: &'a AbilityDefinition,
    ) -> impl Iterator<Item = &'a Arc<dyn ResourceSink>> + 'a {
        self.sinks.iter().filter(move |s| s.applies_to(definition))
    }

    /// Number of registered sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if no sink is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
