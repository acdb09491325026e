//! Icicles: a share of each delivered frostbolt's damage, stored as a charge.

use crate::ability::AbilityDefinition;
use crate::entity::StackId;
use crate::hooks::{ResourceSink, SinkContext};

use super::{FROSTBOLT_SPELL_ID, ICICLES};

/// Delivery-time sink storing Icicles.
///
/// Each landed frostbolt that reaches its target stores
/// `damage * fraction` as one Icicle. A sixth Icicle releases the oldest.
#[derive(Debug, Clone)]
pub struct Icicles {
    fraction: f64,
    stack: StackId,
}

impl Icicles {
    /// Icicles a unit can hold.
    pub const MAX_ICICLES: u32 = 5;

    /// Creates the sink storing `fraction` of delivered damage.
    #[must_use]
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction,
            stack: StackId::new(ICICLES),
        }
    }
}

impl ResourceSink for Icicles {
    fn name(&self) -> &str {
        "icicles"
    }

    fn applies_to(&self, definition: &AbilityDefinition) -> bool {
        definition.key.spell_id == FROSTBOLT_SPELL_ID
    }

    fn on_delivered(&self, ctx: &mut SinkContext<'_>) {
        let value = ctx.outcome().damage() * self.fraction;
        if let Some(gain) = ctx.gain(&self.stack, value) {
            if let Some(released) = gain.released {
                tracing::debug!(actor = %ctx.actor().id(), released, "icicle released");
            }
        }
    }
}
