//! Registered abilities, indexed by handle.

use std::fmt;
use std::sync::Arc;

use super::{AbilityDefinition, AbilityId, AbilityKey, Effect};

/// A definition paired with the effect that runs when it activates.
#[derive(Clone)]
pub struct RegisteredAbility {
    /// Immutable ability data.
    pub definition: Arc<AbilityDefinition>,
    /// Effect executed after the cost is paid.
    pub effect: Arc<dyn Effect>,
}

impl fmt::Debug for RegisteredAbility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredAbility")
            .field("key", &self.definition.key)
            .field("name", &self.definition.name)
            .finish_non_exhaustive()
    }
}

/// Dense table of registered abilities.
///
/// Handles are assigned sequentially and never reused. Two registrations of
/// the same [`AbilityKey`] get distinct handles; [`AbilityRegistry::find`]
/// returns the first.
#[derive(Debug, Clone, Default)]
pub struct AbilityRegistry {
    entries: Vec<RegisteredAbility>,
}

impl AbilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an ability and returns its handle.
    #[allow(clippy::cast_possible_truncation)]
    pub fn register(&mut self, definition: AbilityDefinition, effect: Arc<dyn Effect>) -> AbilityId {
        let id = AbilityId::new(self.entries.len() as u32);
        tracing::debug!(ability = %id, key = %definition.key, name = %definition.name, "ability registered");
        self.entries.push(RegisteredAbility {
            definition: Arc::new(definition),
            effect,
        });
        id
    }

    /// Looks up a handle.
    #[must_use]
    pub fn get(&self, id: AbilityId) -> Option<&RegisteredAbility> {
        self.entries.get(id.as_u32() as usize)
    }

    /// Definition behind a handle.
    #[must_use]
    pub fn definition(&self, id: AbilityId) -> Option<&Arc<AbilityDefinition>> {
        self.get(id).map(|entry| &entry.definition)
    }

    /// First handle registered under `key`.
    #[must_use]
    pub fn find(&self, key: AbilityKey) -> Option<AbilityId> {
        self.entries
            .iter()
            .position(|entry| entry.definition.key == key)
            .and_then(|index| u32::try_from(index).ok())
            .map(AbilityId::new)
    }

    /// Handles and entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (AbilityId, &RegisteredAbility)> {
        (0u32..).zip(self.entries.iter()).map(|(i, entry)| (AbilityId::new(i), entry))
    }

    /// Number of registered abilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
