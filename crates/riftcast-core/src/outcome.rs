//! Hit, miss and critical-strike selection.
//!
//! An [`OutcomeResolver`] turns an attacker/defender pair into an
//! [`OutcomeTable`] through a [`CombatStatistics`] provider, then spends one
//! draw to pick an [`OutcomeTag`]. The tag's multiplier is applied to the
//! caller's base damage to produce an [`Outcome`].
//!
//! The draw is tested against the table in priority order:
//!
//! | Draw range | Tag |
//! |---|---|
//! | `[0, miss)` | `Miss` |
//! | `[miss, miss + crit)` | `Crit` |
//! | otherwise | `Hit` |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ability::SpellSchool;
use crate::entity::UnitStats;
use crate::random::RandomStream;

// =============================================================================
// Outcome
// =============================================================================

/// Category of a resolved attack.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeTag {
    /// The attack failed to connect. Deals no damage.
    Miss,
    /// Normal hit.
    Hit,
    /// Critical strike.
    Crit,
}

impl OutcomeTag {
    /// Returns true for [`OutcomeTag::Hit`] and [`OutcomeTag::Crit`].
    #[must_use]
    pub const fn landed(self) -> bool {
        matches!(self, Self::Hit | Self::Crit)
    }

    /// Damage multiplier for this tag given the crit multiplier in effect.
    #[must_use]
    pub fn multiplier(self, crit_multiplier: f64) -> f64 {
        match self {
            Self::Miss => 0.0,
            Self::Hit => 1.0,
            Self::Crit => crit_multiplier,
        }
    }
}

impl fmt::Display for OutcomeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Miss => "miss",
            Self::Hit => "hit",
            Self::Crit => "crit",
        };
        f.write_str(name)
    }
}

/// Resolved result of one attack: its tag and final damage.
///
/// Outcomes are immutable once built. Damage is never negative and is always
/// zero for a miss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    tag: OutcomeTag,
    damage: f64,
}

impl Outcome {
    /// Builds an outcome by applying `tag`'s multiplier to `base_damage`.
    #[must_use]
    pub fn from_tag(tag: OutcomeTag, base_damage: f64, crit_multiplier: f64) -> Self {
        let damage = (base_damage * tag.multiplier(crit_multiplier)).max(0.0);
        Self { tag, damage }
    }

    /// A zero-damage miss.
    #[must_use]
    pub const fn miss() -> Self {
        Self {
            tag: OutcomeTag::Miss,
            damage: 0.0,
        }
    }

    /// The outcome's tag.
    #[must_use]
    pub const fn tag(&self) -> OutcomeTag {
        self.tag
    }

    /// Final damage, already multiplied.
    #[must_use]
    pub const fn damage(&self) -> f64 {
        self.damage
    }

    /// Returns true iff the tag is Hit or Crit.
    #[must_use]
    pub const fn landed(&self) -> bool {
        self.tag.landed()
    }

    /// Returns true for critical strikes.
    #[must_use]
    pub fn is_crit(&self) -> bool {
        self.tag == OutcomeTag::Crit
    }
}

// =============================================================================
// Probability table
// =============================================================================

/// Which outcomes an attack type can produce.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutcomeKind {
    /// Spell that can miss or crit.
    #[default]
    MagicHitAndCrit,
    /// Spell that can miss but never crits.
    MagicHit,
    /// Spell that never misses but can crit.
    MagicCrit,
    /// Always a plain hit.
    AlwaysHit,
}

/// Miss and crit probabilities for one attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTable {
    /// Chance in `[0, 1]` to miss.
    pub miss: f64,
    /// Chance in `[0, 1 - miss]` to crit.
    pub crit: f64,
}

impl OutcomeTable {
    /// Creates a table, clamping both chances so they sum to at most 1.
    #[must_use]
    pub fn new(miss: f64, crit: f64) -> Self {
        let miss = sanitize(miss);
        let crit = sanitize(crit).min(1.0 - miss);
        Self { miss, crit }
    }

    /// A table that always hits and never crits.
    #[must_use]
    pub const fn guaranteed_hit() -> Self {
        Self {
            miss: 0.0,
            crit: 0.0,
        }
    }

    /// Zeroes the entries `kind` cannot produce.
    #[must_use]
    pub fn masked(self, kind: OutcomeKind) -> Self {
        match kind {
            OutcomeKind::MagicHitAndCrit => self,
            OutcomeKind::MagicHit => Self {
                miss: self.miss,
                crit: 0.0,
            },
            OutcomeKind::MagicCrit => Self::new(0.0, self.crit),
            OutcomeKind::AlwaysHit => Self::guaranteed_hit(),
        }
    }

    /// Chance of a Hit or Crit.
    #[must_use]
    pub fn land_chance(&self) -> f64 {
        1.0 - self.miss
    }

    /// Maps a draw in `[0, 1)` onto a tag.
    ///
    /// `[0, miss)` is a Miss and `[miss, miss + crit)` is a Crit, where the
    /// upper bound is the f64 sum `miss + crit`. Everything above is a Hit.
    #[must_use]
    pub fn select(&self, draw: f64) -> OutcomeTag {
        if draw < self.miss {
            OutcomeTag::Miss
        } else if draw < self.miss + self.crit {
            OutcomeTag::Crit
        } else {
            OutcomeTag::Hit
        }
    }
}

fn sanitize(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

// =============================================================================
// Statistics provider
// =============================================================================

/// Source of per-attack hit and crit probabilities.
///
/// The engine treats this as opaque. Implementations must be pure so that
/// resolution stays reproducible.
pub trait CombatStatistics: Send + Sync {
    /// Miss and crit chances for `attacker` striking `defender` with `school`.
    fn table(&self, attacker: &UnitStats, defender: &UnitStats, school: SpellSchool) -> OutcomeTable;

    /// Damage multiplier on a critical strike.
    fn crit_multiplier(&self, attacker: &UnitStats, school: SpellSchool) -> f64;
}

/// Default model reading chances straight from [`UnitStats`].
///
/// `miss = clamp(defender.base_miss_chance - attacker.hit_chance, 0, 1)` and
/// `crit = attacker.crit_chance`. School does not matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatSheet;

impl CombatStatistics for StatSheet {
    fn table(&self, attacker: &UnitStats, defender: &UnitStats, _school: SpellSchool) -> OutcomeTable {
        OutcomeTable::new(
            defender.base_miss_chance - attacker.hit_chance,
            attacker.crit_chance,
        )
    }

    fn crit_multiplier(&self, attacker: &UnitStats, _school: SpellSchool) -> f64 {
        attacker.crit_multiplier
    }
}

/// Provider that returns the same table for every attack.
///
/// Handy for pinning probabilities in tests and benchmarks.
#[derive(Debug, Clone, Copy)]
pub struct FixedTable {
    /// Table returned for every attack.
    pub table: OutcomeTable,
    /// Crit multiplier returned for every attack.
    pub crit_multiplier: f64,
}

impl FixedTable {
    /// Every attack is a plain hit.
    #[must_use]
    pub const fn always_hit() -> Self {
        Self {
            table: OutcomeTable::guaranteed_hit(),
            crit_multiplier: 2.0,
        }
    }
}

impl CombatStatistics for FixedTable {
    fn table(&self, _: &UnitStats, _: &UnitStats, _: SpellSchool) -> OutcomeTable {
        self.table
    }

    fn crit_multiplier(&self, _: &UnitStats, _: SpellSchool) -> f64 {
        self.crit_multiplier
    }
}

// =============================================================================
// OutcomeResolver
// =============================================================================

/// Draws outcome tags against a statistics provider.
///
/// # Example
///
/// ```
/// use riftcast_core::ability::SpellSchool;
/// use riftcast_core::entity::UnitStats;
/// use riftcast_core::outcome::{OutcomeKind, OutcomeResolver, OutcomeTag, StatSheet};
/// use riftcast_core::random::RandomStream;
///
/// let attacker = UnitStats { crit_chance: 0.25, ..UnitStats::default() };
/// let defender = UnitStats::default();
/// let resolver = OutcomeResolver::new(&StatSheet);
///
/// // 0.1 falls inside [0, 0.25): a crit at the attacker's 2.0 multiplier.
/// let mut stream = RandomStream::scripted([0.1]);
/// let outcome = resolver.resolve(
///     &attacker, &defender, SpellSchool::Frost, 100.0,
///     OutcomeKind::MagicHitAndCrit, &mut stream,
/// );
/// assert_eq!(outcome.tag(), OutcomeTag::Crit);
/// assert_eq!(outcome.damage(), 200.0);
/// assert_eq!(stream.draws(), 1);
/// ```
#[derive(Clone, Copy)]
pub struct OutcomeResolver<'a> {
    stats: &'a dyn CombatStatistics,
    crit_override: Option<f64>,
}

impl fmt::Debug for OutcomeResolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeResolver")
            .field("crit_override", &self.crit_override)
            .finish_non_exhaustive()
    }
}

impl<'a> OutcomeResolver<'a> {
    /// Creates a resolver backed by `stats`.
    #[must_use]
    pub fn new(stats: &'a dyn CombatStatistics) -> Self {
        Self {
            stats,
            crit_override: None,
        }
    }

    /// Uses `multiplier` for crits instead of the provider's value.
    #[must_use]
    pub fn with_crit_multiplier(mut self, multiplier: Option<f64>) -> Self {
        self.crit_override = multiplier;
        self
    }

    /// Effective crit multiplier for `attacker`.
    #[must_use]
    pub fn crit_multiplier(&self, attacker: &UnitStats, school: SpellSchool) -> f64 {
        self.crit_override
            .unwrap_or_else(|| self.stats.crit_multiplier(attacker, school))
    }

    /// Probability table for this attack after masking by `kind`.
    #[must_use]
    pub fn table(
        &self,
        attacker: &UnitStats,
        defender: &UnitStats,
        school: SpellSchool,
        kind: OutcomeKind,
    ) -> OutcomeTable {
        self.stats.table(attacker, defender, school).masked(kind)
    }

    /// Selects a tag. Consumes exactly one draw.
    pub fn determine(
        &self,
        attacker: &UnitStats,
        defender: &UnitStats,
        school: SpellSchool,
        kind: OutcomeKind,
        stream: &mut RandomStream,
    ) -> OutcomeTag {
        let table = self.table(attacker, defender, school, kind);
        let draw = stream.next_draw();
        let tag = table.select(draw);
        tracing::trace!(draw, miss = table.miss, crit = table.crit, %tag, "outcome determined");
        tag
    }

    /// Selects a tag and applies its multiplier to `base_damage`. Consumes
    /// exactly one draw.
    pub fn resolve(
        &self,
        attacker: &UnitStats,
        defender: &UnitStats,
        school: SpellSchool,
        base_damage: f64,
        kind: OutcomeKind,
        stream: &mut RandomStream,
    ) -> Outcome {
        let tag = self.determine(attacker, defender, school, kind, stream);
        Outcome::from_tag(tag, base_damage, self.crit_multiplier(attacker, school))
    }
}
