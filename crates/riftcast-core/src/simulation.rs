//! The combat simulation: activation entry point and delivery loop.
//!
//! `Simulation` owns everything one trial needs: the roster, registered
//! abilities and hooks, the two random streams, the event queue and the
//! damage meter. Nothing is shared between simulations, so independent
//! trials can run on separate threads.
//!
//! # Activation
//!
//! [`Simulation::activate`] validates the request, pays the cost, selects the
//! effect profile and runs the effect. The effect's directives are then
//! flushed in issue order: deliveries go onto the queue and chains are
//! resolved recursively, up to the configured depth.
//!
//! # Delivery
//!
//! [`Simulation::advance_to`] drains the queue. Each delivery adds damage to
//! its target and the meter, and for landed outcomes runs the resource sinks
//! that listen to the ability.
//!
//! # Determinism
//!
//! Given the same config, registrations and call sequence, every outcome,
//! delivery time and stack count is identical between runs:
//! - draws come from seeded ChaCha streams, one for outcomes and one for procs
//! - units, hooks and deliveries are visited in a fixed order
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use riftcast_core::ability::{AbilityDefinition, AbilityKey, DirectDamage, SpellSchool, TravelTime};
//! use riftcast_core::config::SimulationConfig;
//! use riftcast_core::entity::UnitSpec;
//! use riftcast_core::queue::SimTime;
//! use riftcast_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimulationConfig::with_seed(42));
//! let mage = sim.spawn(UnitSpec::new("mage"));
//! let dummy = sim.spawn(UnitSpec::new("dummy"));
//!
//! let bolt = sim.register_ability(
//!     AbilityDefinition::new(AbilityKey::new(1), "bolt", SpellSchool::Frost)
//!         .with_damage(1.0, 0.2)
//!         .with_travel(TravelTime::Fixed(1.0)),
//!     Arc::new(DirectDamage),
//! );
//!
//! let report = sim.activate(bolt, mage, dummy).unwrap();
//! assert_eq!(report.deliveries.len(), 1);
//! assert_eq!(sim.advance_to(SimTime::from_secs(0.5)), 0);
//! assert_eq!(sim.advance_to(SimTime::from_secs(1.0)), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::ability::{AbilityDefinition, AbilityId, AbilityRegistry, Effect, RegisteredAbility};
use crate::config::SimulationConfig;
use crate::entity::{EntityId, ResourceKind, Unit, UnitSpec};
use crate::error::ActivationError;
use crate::hooks::{ProcHook, ProcRegistry, ResourceSink, SinkContext, SinkRegistry};
use crate::meter::DamageMeter;
use crate::outcome::{CombatStatistics, StatSheet};
use crate::queue::{EventQueue, SimTime};
use crate::random::{RandomStream, COMBAT_STREAM, PROC_STREAM};
use crate::resolution::{
    ActivationId, ActivationPhase, ActivationReport, Delivery, Directive, EffectContext,
    PendingActivation, ScheduledDelivery, TargetView,
};
use crate::roster::Roster;

#[derive(Debug, Clone, Copy)]
struct ActivationState {
    phase: ActivationPhase,
    pending: u32,
}

// =============================================================================
// Simulation
// =============================================================================

/// A single deterministic combat simulation.
pub struct Simulation {
    config: SimulationConfig,
    roster: Roster,
    abilities: AbilityRegistry,
    procs: ProcRegistry,
    sinks: SinkRegistry,
    statistics: Arc<dyn CombatStatistics>,
    combat: RandomStream,
    proc_rng: RandomStream,
    queue: EventQueue<Delivery>,
    meter: DamageMeter,
    activations: BTreeMap<ActivationId, ActivationState>,
    next_activation: u64,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("now", &self.queue.now())
            .field("units", &self.roster.len())
            .field("abilities", &self.abilities.len())
            .field("procs", &self.procs)
            .field("sinks", &self.sinks)
            .field("pending_deliveries", &self.queue.len())
            .field("combat_draws", &self.combat.draws())
            .field("proc_draws", &self.proc_rng.draws())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates an empty simulation whose streams derive from `config.seed`.
    ///
    /// The default statistics provider is [`StatSheet`].
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_streams(
            config,
            RandomStream::seeded_with_stream(config.seed, COMBAT_STREAM),
            RandomStream::seeded_with_stream(config.seed, PROC_STREAM),
        )
    }

    /// Creates a simulation with explicit streams, typically scripted ones in
    /// tests. `config.seed` is ignored.
    #[must_use]
    pub fn with_streams(config: SimulationConfig, combat: RandomStream, procs: RandomStream) -> Self {
        Self {
            config,
            roster: Roster::new(),
            abilities: AbilityRegistry::new(),
            procs: ProcRegistry::new(),
            sinks: SinkRegistry::new(),
            statistics: Arc::new(StatSheet),
            combat,
            proc_rng: procs,
            queue: EventQueue::new(),
            meter: DamageMeter::new(),
            activations: BTreeMap::new(),
            next_activation: 0,
        }
    }

    /// Replaces the statistics provider.
    #[must_use]
    pub fn with_statistics(mut self, statistics: Arc<dyn CombatStatistics>) -> Self {
        self.statistics = statistics;
        self
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Spawns a unit and returns its id.
    pub fn spawn(&mut self, spec: UnitSpec) -> EntityId {
        self.roster.spawn(spec)
    }

    /// Registers an ability with the effect that runs when it activates.
    pub fn register_ability(&mut self, definition: AbilityDefinition, effect: Arc<dyn Effect>) -> AbilityId {
        self.abilities.register(definition, effect)
    }

    /// Registers a resolution-time proc hook.
    pub fn register_proc(&mut self, hook: Arc<dyn ProcHook>) {
        self.procs.register(hook);
    }

    /// Registers a delivery-time resource sink.
    pub fn register_sink(&mut self, sink: Arc<dyn ResourceSink>) {
        self.sinks.register(sink);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The config this simulation was built with.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.queue.now()
    }

    /// All units.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Mutable access to units, for setup and external state changes.
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// One unit.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.roster.get(id)
    }

    /// Registered abilities.
    #[must_use]
    pub fn abilities(&self) -> &AbilityRegistry {
        &self.abilities
    }

    /// Damage delivered so far.
    #[must_use]
    pub fn meter(&self) -> &DamageMeter {
        &self.meter
    }

    /// Draws made on the combat stream.
    #[must_use]
    pub fn combat_draws(&self) -> u64 {
        self.combat.draws()
    }

    /// Draws made on the proc stream.
    #[must_use]
    pub fn proc_draws(&self) -> u64 {
        self.proc_rng.draws()
    }

    /// Deliveries still queued.
    #[must_use]
    pub fn pending_deliveries(&self) -> usize {
        self.queue.len()
    }

    /// Fire time of the next queued delivery.
    #[must_use]
    pub fn next_delivery_time(&self) -> Option<SimTime> {
        self.queue.peek_time()
    }

    /// Phase of an activation returned by [`Simulation::activate`].
    #[must_use]
    pub fn phase_of(&self, activation: ActivationId) -> Option<ActivationPhase> {
        self.activations.get(&activation).map(|state| state.phase)
    }

    // =========================================================================
    // Activation
    // =========================================================================

    /// Activates `ability` by `actor` against `target` at the current time.
    ///
    /// # Errors
    ///
    /// Lookup, cooldown and cost failures are returned before any side
    /// effect. [`ActivationError::InvalidSchedule`] is returned if the effect
    /// asked for a delivery the queue would reject. The cost stays paid, but
    /// none of the effect's deliveries or chains are applied.
    pub fn activate(
        &mut self,
        ability: AbilityId,
        actor: EntityId,
        target: EntityId,
    ) -> Result<ActivationReport, ActivationError> {
        self.resolve(
            PendingActivation {
                ability,
                actor,
                target,
            },
            0,
        )
    }

    fn resolve(
        &mut self,
        request: PendingActivation,
        depth: u32,
    ) -> Result<ActivationReport, ActivationError> {
        let RegisteredAbility { definition, effect } = self
            .abilities
            .get(request.ability)
            .cloned()
            .ok_or(ActivationError::UnknownAbility(request.ability))?;
        let target = self
            .roster
            .get(request.target)
            .map(TargetView::of)
            .ok_or(ActivationError::UnknownEntity(request.target))?;
        let now = self.queue.now();
        let actor = self
            .roster
            .get_mut(request.actor)
            .ok_or(ActivationError::UnknownEntity(request.actor))?;

        if let Some(ready_at) = actor.cooldown_ready_at(request.ability) {
            if ready_at > now {
                return Err(ActivationError::OnCooldown {
                    ability: request.ability,
                    ready_at,
                });
            }
        }
        let cooldown_until = if definition.cast.cooldown > 0.0 {
            Some(now.after(definition.cast.cooldown)?)
        } else {
            None
        };

        let cost = definition.cost.amount(&actor.mana);
        actor
            .mana
            .spend(cost)
            .map_err(|available| ActivationError::InsufficientResource {
                resource: ResourceKind::Mana,
                required: cost,
                available,
            })?;
        if let Some(ready_at) = cooldown_until {
            actor.start_cooldown(request.ability, ready_at);
        }

        let activation = ActivationId::new(self.next_activation);
        self.next_activation += 1;
        self.activations.insert(
            activation,
            ActivationState {
                phase: ActivationPhase::CostPaid,
                pending: 0,
            },
        );
        self.meter.record_activation(request.ability);

        tracing::debug!(
            %activation,
            ability = %definition.key,
            name = %definition.name,
            actor = %request.actor,
            target = %request.target,
            cost,
            depth,
            at = %now,
            "activation"
        );

        let profile = effect.select_profile(actor);
        if let Some(state) = self.activations.get_mut(&activation) {
            state.phase = ActivationPhase::EffectExecuting;
        }

        let combat_before = self.combat.draws();
        let proc_before = self.proc_rng.draws();
        let mut ctx = EffectContext {
            activation,
            ability: request.ability,
            definition: &definition,
            actor,
            target,
            combat: &mut self.combat,
            proc_rng: &mut self.proc_rng,
            statistics: self.statistics.as_ref(),
            procs: &self.procs,
            now,
            outcomes: Vec::new(),
            directives: Vec::new(),
        };
        effect.apply(profile, &mut ctx);
        let (outcomes, directives) = ctx.finish();

        let mut report = ActivationReport {
            activation,
            request,
            profile,
            cost_paid: cost,
            outcomes,
            deliveries: Vec::new(),
            combat_draws: self.combat.draws() - combat_before,
            proc_draws: self.proc_rng.draws() - proc_before,
            chained: Vec::new(),
            failed_chains: Vec::new(),
        };

        let flushed = self.flush(&mut report, directives, depth);
        self.settle(activation);
        flushed.map(|()| report)
    }

    fn flush(
        &mut self,
        report: &mut ActivationReport,
        directives: Vec<Directive>,
        depth: u32,
    ) -> Result<(), ActivationError> {
        let request = report.request;
        let now = self.queue.now();
        let rejected = directives.iter().find_map(|directive| match directive {
            Directive::Deliver { delay, .. } => now.after(*delay).err().map(|err| (err, *delay)),
            Directive::Chain(_) => None,
        });
        if let Some((err, delay)) = rejected {
            tracing::error!(
                %err,
                activation = %report.activation,
                delay,
                discarded = directives.len(),
                "delivery rejected, no directives applied"
            );
            return Err(err.into());
        }

        for directive in directives {
            match directive {
                Directive::Deliver { outcome, delay } => {
                    let fire_at = now.after(delay)?;
                    let delivery = Delivery {
                        activation: report.activation,
                        ability: request.ability,
                        source: request.actor,
                        target: request.target,
                        outcome,
                        resolved_at: now,
                    };
                    let seq = self.queue.schedule_at(fire_at, delivery)?;
                    if let Some(state) = self.activations.get_mut(&report.activation) {
                        state.pending += 1;
                    }
                    report.deliveries.push(ScheduledDelivery {
                        seq,
                        fire_at,
                        outcome,
                    });
                }
                Directive::Chain(ability) => {
                    let next_depth = depth + 1;
                    if next_depth > self.config.max_chain_depth {
                        let err = ActivationError::ChainDepthExceeded {
                            ability,
                            depth: self.config.max_chain_depth,
                        };
                        tracing::warn!(%err, parent = %report.activation, "chain dropped");
                        report.failed_chains.push((ability, err));
                        continue;
                    }
                    tracing::debug!(parent = %report.activation, %ability, depth = next_depth, "chain");
                    let chained = PendingActivation {
                        ability,
                        actor: request.actor,
                        target: request.target,
                    };
                    match self.resolve(chained, next_depth) {
                        Ok(chained) => report.chained.push(chained),
                        Err(err) => {
                            tracing::warn!(%err, parent = %report.activation, %ability, "chain failed");
                            report.failed_chains.push((ability, err));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn settle(&mut self, activation: ActivationId) {
        if let Some(state) = self.activations.get_mut(&activation) {
            state.phase = if state.pending == 0 {
                ActivationPhase::Complete
            } else {
                ActivationPhase::DamagePending
            };
        }
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Delivers everything due at or before `time` and moves the clock there.
    ///
    /// Returns the number of deliveries made. Times in the past are a no-op.
    pub fn advance_to(&mut self, time: SimTime) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.queue.pop_due(time) {
            self.deliver(event.payload);
            delivered += 1;
        }
        self.queue.advance_to(time);
        delivered
    }

    /// Advances the clock by `secs` seconds. Negative values are a no-op.
    pub fn advance_by(&mut self, secs: f64) -> usize {
        let target = SimTime::from_secs(self.now().as_secs() + secs.max(0.0));
        self.advance_to(target)
    }

    /// Delivers every queued event, moving the clock to the last fire time.
    pub fn run_until_idle(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(next) = self.queue.peek_time() {
            delivered += self.advance_to(next);
        }
        delivered
    }

    /// Discards every queued delivery. Returns how many were dropped.
    ///
    /// Activations with dropped deliveries never reach `Complete`.
    pub fn abort(&mut self) -> usize {
        let dropped = self.queue.clear();
        tracing::debug!(dropped, at = %self.queue.now(), "pending deliveries discarded");
        dropped
    }

    fn deliver(&mut self, delivery: Delivery) {
        let now = self.queue.now();
        let outcome = delivery.outcome;

        match self.roster.get_mut(delivery.target) {
            Some(target) => target.take_damage(outcome.damage()),
            None => tracing::debug!(target = %delivery.target, "delivery target is gone"),
        }
        self.meter.record_delivery(delivery.ability, &outcome);
        tracing::debug!(
            activation = %delivery.activation,
            ability = %delivery.ability,
            tag = %outcome.tag(),
            damage = outcome.damage(),
            at = %now,
            "damage delivered"
        );

        if outcome.landed() {
            let definition: Option<&AbilityDefinition> =
                self.abilities.definition(delivery.ability).map(Arc::as_ref);
            let actor = self.roster.get_mut(delivery.source);
            if let (Some(definition), Some(actor)) = (definition, actor) {
                for sink in self.sinks.sinks_for(definition) {
                    let mut ctx = SinkContext {
                        definition,
                        actor: &mut *actor,
                        target: delivery.target,
                        outcome,
                        now,
                    };
                    sink.on_delivered(&mut ctx);
                }
            }
        }

        if let Some(state) = self.activations.get_mut(&delivery.activation) {
            state.pending = state.pending.saturating_sub(1);
            state.phase = if state.pending == 0 {
                ActivationPhase::Complete
            } else {
                ActivationPhase::Delivered
            };
        }
    }
}
