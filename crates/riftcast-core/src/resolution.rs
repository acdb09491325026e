//! Per-activation resolution state.
//!
//! An activation walks through [`ActivationPhase`]s:
//!
//! ```text
//! Requested → CostPaid → EffectExecuting → DamagePending → Delivered → Complete
//! ```
//!
//! While the effect runs it only sees an [`EffectContext`]. The context owns
//! the random draws and the proc hooks, and it collects deliveries and chains
//! as directives. The simulation flushes those directives in issue order once
//! the effect returns. An effect therefore never schedules or re-enters
//! resolution by itself.
//!
//! # Draw contract
//!
//! Each [`EffectContext::resolve_outcome`] call consumes exactly two draws from
//! the combat stream. The first picks hit or crit and the second picks the
//! damage within the roll's range. A miss still takes both draws. Proc hooks
//! draw from a separate stream.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ability::{AbilityDefinition, AbilityId};
use crate::damage::DamageRoll;
use crate::entity::{EntityId, Unit, UnitStats};
use crate::error::ActivationError;
use crate::hooks::{ProcContext, ProcRegistry};
use crate::outcome::{CombatStatistics, Outcome, OutcomeResolver};
use crate::queue::{EventSeq, SimTime};
use crate::random::RandomStream;

// =============================================================================
// Identity and phases
// =============================================================================

/// Identifier of one successful activation.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivationId(u64);

impl ActivationId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ActivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActivationId({})", self.0)
    }
}

impl fmt::Display for ActivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle stage of an activation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationPhase {
    /// Validating the request. Failures here have no side effects.
    Requested,
    /// The cost has been deducted.
    CostPaid,
    /// The effect body is running.
    EffectExecuting,
    /// At least one delivery is queued and none has fired yet.
    DamagePending,
    /// Some deliveries fired and more are still queued.
    Delivered,
    /// Every delivery has fired.
    Complete,
}

// =============================================================================
// Requests and deliveries
// =============================================================================

/// Request to activate an ability.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingActivation {
    /// Ability to activate.
    pub ability: AbilityId,
    /// Acting unit, which pays the cost.
    pub actor: EntityId,
    /// Target unit.
    pub target: EntityId,
}

/// Damage travelling toward its target. Payload of the event queue.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    /// Activation that produced the outcome.
    pub activation: ActivationId,
    /// Ability that produced the outcome.
    pub ability: AbilityId,
    /// Unit that produced the outcome.
    pub source: EntityId,
    /// Unit receiving the damage.
    pub target: EntityId,
    /// The resolved outcome.
    pub outcome: Outcome,
    /// When the outcome was resolved.
    pub resolved_at: SimTime,
}

/// A delivery as scheduled by an activation.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledDelivery {
    /// Queue sequence number.
    pub seq: EventSeq,
    /// When the damage lands.
    pub fire_at: SimTime,
    /// The outcome being delivered.
    pub outcome: Outcome,
}

// =============================================================================
// Profiles and directives
// =============================================================================

/// Behaviour profile selected once per activation, before any draw.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum EffectProfile {
    /// Normal behaviour at full strength.
    #[default]
    Standard,
    /// Split behaviour: this outcome is scaled by `multiplier` and the effect
    /// emits extra activations.
    Split {
        /// Damage multiplier for outcomes resolved under this profile.
        multiplier: f64,
    },
}

impl EffectProfile {
    /// Damage multiplier to pass to [`EffectContext::resolve_outcome`].
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        match *self {
            Self::Standard => 1.0,
            Self::Split { multiplier } => multiplier,
        }
    }

    /// Returns true for [`EffectProfile::Split`].
    #[must_use]
    pub fn is_split(&self) -> bool {
        matches!(self, Self::Split { .. })
    }
}

/// Work an effect asks the simulation to do after it returns.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) enum Directive {
    Deliver { outcome: Outcome, delay: f64 },
    Chain(AbilityId),
}

/// Copy of the target's state taken before the effect runs.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetView {
    /// Target id.
    pub id: EntityId,
    /// Target position.
    pub position: Vec2,
    /// Target combat stats.
    pub stats: UnitStats,
}

impl TargetView {
    pub(crate) fn of(unit: &Unit) -> Self {
        Self {
            id: unit.id(),
            position: unit.position,
            stats: unit.stats,
        }
    }
}

// =============================================================================
// EffectContext
// =============================================================================

/// Everything an effect may use while it executes.
pub struct EffectContext<'a> {
    pub(crate) activation: ActivationId,
    pub(crate) ability: AbilityId,
    pub(crate) definition: &'a AbilityDefinition,
    pub(crate) actor: &'a mut Unit,
    pub(crate) target: TargetView,
    pub(crate) combat: &'a mut RandomStream,
    pub(crate) proc_rng: &'a mut RandomStream,
    pub(crate) statistics: &'a dyn CombatStatistics,
    pub(crate) procs: &'a ProcRegistry,
    pub(crate) now: SimTime,
    pub(crate) outcomes: Vec<Outcome>,
    pub(crate) directives: Vec<Directive>,
}

impl EffectContext<'_> {
    /// The activation being resolved.
    #[must_use]
    pub fn activation(&self) -> ActivationId {
        self.activation
    }

    /// Handle of the ability being resolved.
    #[must_use]
    pub fn ability(&self) -> AbilityId {
        self.ability
    }

    /// The ability's definition.
    #[must_use]
    pub fn definition(&self) -> &AbilityDefinition {
        self.definition
    }

    /// The acting unit.
    #[must_use]
    pub fn actor(&self) -> &Unit {
        self.actor
    }

    /// Snapshot of the target.
    #[must_use]
    pub fn target(&self) -> &TargetView {
        &self.target
    }

    /// Resolution time.
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Outcomes resolved so far, in resolution order.
    #[must_use]
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// The ability's damage roll around the actor's spell scaling.
    #[must_use]
    pub fn damage_roll(&self) -> DamageRoll {
        DamageRoll::new(
            self.actor.stats.spell_scaling,
            self.definition.damage_scale,
            self.definition.damage_variance,
        )
    }

    /// Travel delay to the target under the ability's travel model.
    #[must_use]
    pub fn travel_delay(&self) -> f64 {
        let distance = self.actor.position.distance(self.target.position);
        self.definition.travel.delay(distance)
    }

    /// Resolves one independent outcome.
    ///
    /// Consumes exactly two combat draws: hit/crit first, then variance.
    /// Final damage is
    /// `(roll + bonus_coefficient * spell_power) * damage_multiplier * multiplier`
    /// times the tag's multiplier. If the outcome landed, matching proc hooks
    /// run before this returns.
    pub fn resolve_outcome(&mut self, roll: DamageRoll, multiplier: f64) -> Outcome {
        let definition = self.definition;
        let resolver =
            OutcomeResolver::new(self.statistics).with_crit_multiplier(definition.crit_multiplier);

        let tag = resolver.determine(
            &self.actor.stats,
            &self.target.stats,
            definition.school,
            definition.outcome_kind,
            self.combat,
        );
        let variance_draw = self.combat.next_draw();
        let rolled = roll.roll(variance_draw);
        let base = (rolled + definition.bonus_coefficient * self.actor.stats.spell_power)
            * definition.damage_multiplier
            * multiplier;
        let crit_multiplier = resolver.crit_multiplier(&self.actor.stats, definition.school);
        let outcome = Outcome::from_tag(tag, base, crit_multiplier);

        tracing::trace!(
            activation = %self.activation,
            ability = %definition.key,
            tag = %outcome.tag(),
            rolled,
            multiplier,
            damage = outcome.damage(),
            "outcome resolved"
        );

        if outcome.landed() {
            let procs = self.procs;
            for hook in procs.hooks_for(definition) {
                let mut ctx = ProcContext {
                    definition,
                    actor: &mut *self.actor,
                    target: self.target.id,
                    outcome,
                    rng: &mut *self.proc_rng,
                    now: self.now,
                };
                hook.on_landed(&mut ctx);
            }
        }

        self.outcomes.push(outcome);
        outcome
    }

    /// Queues delivery of `outcome` after the ability's travel delay.
    pub fn deliver(&mut self, outcome: Outcome) {
        let delay = self.travel_delay();
        self.deliver_after(outcome, delay);
    }

    /// Queues delivery of `outcome` after an explicit delay in seconds.
    ///
    /// A negative delay is reported as [`ActivationError::InvalidSchedule`]
    /// when the directives are flushed, and none of them is applied.
    pub fn deliver_after(&mut self, outcome: Outcome, delay: f64) {
        self.directives.push(Directive::Deliver { outcome, delay });
    }

    /// Requests a full activation of `ability` by the same actor against the
    /// same target.
    ///
    /// The chain runs after this effect returns, in issue order relative to
    /// this effect's deliveries.
    pub fn chain(&mut self, ability: AbilityId) {
        self.directives.push(Directive::Chain(ability));
    }

    pub(crate) fn finish(self) -> (Vec<Outcome>, Vec<Directive>) {
        (self.outcomes, self.directives)
    }
}

// =============================================================================
// Report
// =============================================================================

/// Result of a successful activation, including everything it chained.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationReport {
    /// Id assigned once the cost was paid.
    pub activation: ActivationId,
    /// The request that was resolved.
    pub request: PendingActivation,
    /// Profile chosen before rolling.
    pub profile: EffectProfile,
    /// Mana deducted.
    pub cost_paid: f64,
    /// Outcomes resolved by this activation's own effect.
    pub outcomes: Vec<Outcome>,
    /// Deliveries queued by this activation, in issue order.
    pub deliveries: Vec<ScheduledDelivery>,
    /// Combat-stream draws made by this activation's own effect.
    pub combat_draws: u64,
    /// Proc-stream draws made by this activation's own effect.
    pub proc_draws: u64,
    /// Reports of chained activations that succeeded.
    pub chained: Vec<ActivationReport>,
    /// Chained activations that failed, with the reason.
    pub failed_chains: Vec<(AbilityId, ActivationError)>,
}

impl ActivationReport {
    /// Outcomes of this activation and every chain it triggered, depth first.
    #[must_use]
    pub fn all_outcomes(&self) -> Vec<Outcome> {
        let mut out = self.outcomes.clone();
        for chained in &self.chained {
            out.extend(chained.all_outcomes());
        }
        out
    }

    /// Combat draws including chained activations.
    #[must_use]
    pub fn total_combat_draws(&self) -> u64 {
        self.combat_draws
            + self
                .chained
                .iter()
                .map(ActivationReport::total_combat_draws)
                .sum::<u64>()
    }

    /// Deliveries including chained activations, depth first.
    #[must_use]
    pub fn total_deliveries(&self) -> usize {
        self.deliveries.len()
            + self
                .chained
                .iter()
                .map(ActivationReport::total_deliveries)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityKey, SpellSchool};
    use crate::entity::UnitSpec;
    use crate::outcome::{FixedTable, OutcomeTable, OutcomeTag};

    struct Fixture {
        definition: AbilityDefinition,
        actor: Unit,
        target: TargetView,
        combat: RandomStream,
        procs_rng: RandomStream,
        procs: ProcRegistry,
    }

    impl Fixture {
        fn new(combat: RandomStream) -> Self {
            let definition = AbilityDefinition::new(AbilityKey::new(116), "bolt", SpellSchool::Frost)
                .with_damage(1.5, 0.24)
                .with_bonus_coefficient(1.5);
            let actor = Unit::from_spec(EntityId::new(0), UnitSpec::new("mage"));
            let dummy = Unit::from_spec(
                EntityId::new(1),
                UnitSpec::new("dummy").at(Vec2::new(28.0, 0.0)),
            );
            Self {
                definition,
                actor,
                target: TargetView::of(&dummy),
                combat,
                procs_rng: RandomStream::seeded(0),
                procs: ProcRegistry::new(),
            }
        }

        fn context<'a>(&'a mut self, stats: &'a dyn CombatStatistics) -> EffectContext<'a> {
            EffectContext {
                activation: ActivationId::new(0),
                ability: AbilityId::new(0),
                definition: &self.definition,
                actor: &mut self.actor,
                target: self.target,
                combat: &mut self.combat,
                proc_rng: &mut self.procs_rng,
                statistics: stats,
                procs: &self.procs,
                now: SimTime::ZERO,
                outcomes: Vec::new(),
                directives: Vec::new(),
            }
        }
    }

    #[test]
    fn midpoint_hit_resolves_to_base() {
        let stats = FixedTable::always_hit();
        let mut fixture = Fixture::new(RandomStream::scripted([0.5]));
        let mut ctx = fixture.context(&stats);
        let roll = ctx.damage_roll();
        let outcome = ctx.resolve_outcome(roll, 1.0);
        assert_eq!(outcome.tag(), OutcomeTag::Hit);
        assert_eq!(outcome.damage(), 1500.0);
        drop(ctx);
        assert_eq!(fixture.combat.draws(), 2);
    }

    #[test]
    fn miss_still_consumes_two_draws() {
        let stats = FixedTable {
            table: OutcomeTable::new(1.0, 0.0),
            crit_multiplier: 2.0,
        };
        let mut fixture = Fixture::new(RandomStream::seeded(11));
        let mut ctx = fixture.context(&stats);
        let roll = ctx.damage_roll();
        let outcome = ctx.resolve_outcome(roll, 1.0);
        assert!(!outcome.landed());
        assert_eq!(outcome.damage(), 0.0);
        drop(ctx);
        assert_eq!(fixture.combat.draws(), 2);
    }

    #[test]
    fn multiplier_is_an_argument_not_state() {
        let stats = FixedTable::always_hit();
        let mut fixture = Fixture::new(RandomStream::scripted([0.5]));
        let before = fixture.definition.damage_multiplier.to_bits();
        let mut ctx = fixture.context(&stats);
        let roll = ctx.damage_roll();
        let scaled = ctx.resolve_outcome(roll, 0.4);
        let full = ctx.resolve_outcome(roll, 1.0);
        assert!((scaled.damage() - 600.0).abs() < 1e-9);
        assert_eq!(full.damage(), 1500.0);
        drop(ctx);
        assert_eq!(fixture.definition.damage_multiplier.to_bits(), before);
    }

    #[test]
    fn spell_power_adds_through_coefficient() {
        let stats = FixedTable::always_hit();
        let mut fixture = Fixture::new(RandomStream::scripted([0.5]));
        fixture.actor.stats.spell_power = 100.0;
        let mut ctx = fixture.context(&stats);
        let roll = ctx.damage_roll();
        assert_eq!(ctx.resolve_outcome(roll, 1.0).damage(), 1650.0);
    }

    #[test]
    fn directives_keep_issue_order() {
        let stats = FixedTable::always_hit();
        let mut fixture = Fixture::new(RandomStream::scripted([0.5]));
        let mut ctx = fixture.context(&stats);
        let first = Outcome::from_tag(OutcomeTag::Hit, 1.0, 2.0);
        ctx.deliver_after(first, 1.0);
        ctx.chain(AbilityId::new(4));
        ctx.deliver(first);
        let (_, directives) = ctx.finish();
        assert_eq!(directives.len(), 3);
        assert_eq!(directives[0], Directive::Deliver { outcome: first, delay: 1.0 });
        assert_eq!(directives[1], Directive::Chain(AbilityId::new(4)));
        // Instant travel by default.
        assert_eq!(directives[2], Directive::Deliver { outcome: first, delay: 0.0 });
    }

    #[test]
    fn profile_multipliers() {
        assert_eq!(EffectProfile::Standard.multiplier(), 1.0);
        assert_eq!(EffectProfile::Split { multiplier: 0.4 }.multiplier(), 0.4);
        assert!(EffectProfile::Split { multiplier: 0.4 }.is_split());
    }
}
