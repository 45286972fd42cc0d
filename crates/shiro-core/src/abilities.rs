//! Ability registry with per-player exclusivity.
//!
//! An [`Ability`] is a named behavior bound to an item predicate with an
//! activate / deactivate / is-active lifecycle. The registry keeps the set of
//! definitions (in registration order, so first-match lookups are
//! deterministic) and which ability, if any, each player currently has active.
//!
//! # Invariants
//!
//! - A player has at most one active ability. Activating swaps the mapping
//!   atomically, then runs the previous ability's `on_deactivate` before the
//!   new ability's `on_activate`.
//! - Re-activating the ability that is already active still round-trips
//!   through `on_deactivate` → `on_activate`.
//! - Unregistering a definition clears every active entry pointing at it
//!   **without** calling `on_deactivate` (the definition is already gone).
//!
//! Hooks run without any registry lock held, so they may call back into the
//! registry.

use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use shiro_types::{ItemSnapshot, PlayerId};

use crate::error::AbilityError;

/// A pluggable behavior activated by the sneak gesture.
pub trait Ability: Send + Sync {
    /// Unique key. Registering another ability with the same id replaces this one.
    fn id(&self) -> &str;

    /// Whether this ability can be used with `item`.
    fn matches(&self, item: &ItemSnapshot) -> bool;

    fn on_activate(&self, player: PlayerId, item: &ItemSnapshot);

    fn on_deactivate(&self, player: PlayerId);

    /// The ability's own view of whether it is running for `player`.
    fn is_active(&self, player: PlayerId) -> bool;
}

#[derive(Default)]
pub struct AbilityRegistry {
    definitions: RwLock<IndexMap<String, Arc<dyn Ability>>>,
    active: DashMap<PlayerId, String>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert by id. Replacing keeps the first registration position.
    pub fn register(&self, ability: Arc<dyn Ability>) {
        let id = ability.id().to_string();
        let replaced = self.definitions.write().insert(id.clone(), ability).is_some();
        if replaced {
            tracing::info!(ability = %id, "replaced ability definition");
        } else {
            tracing::info!(ability = %id, "registered ability");
        }
    }

    /// Remove a definition and silently clear it from every player.
    pub fn unregister(&self, id: &str) -> Option<Arc<dyn Ability>> {
        let removed = self.definitions.write().shift_remove(id);

        let before = self.active.len();
        self.active.retain(|_, active_id| active_id.as_str() != id);
        let cleared = before.saturating_sub(self.active.len());

        if removed.is_some() {
            tracing::info!(ability = %id, cleared, "unregistered ability");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Ability>> {
        self.definitions.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.definitions.read().contains_key(id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.definitions.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }

    /// First ability, in registration order, whose predicate accepts `item`.
    pub fn find_match(&self, item: &ItemSnapshot) -> Option<Arc<dyn Ability>> {
        // Snapshot so predicates run without the lock held.
        let candidates: Vec<Arc<dyn Ability>> = self.definitions.read().values().cloned().collect();
        candidates.into_iter().find(|ability| ability.matches(item))
    }

    /// Make `id` the player's active ability, deactivating whatever was there.
    pub fn activate(
        &self,
        player: PlayerId,
        id: &str,
        item: &ItemSnapshot,
    ) -> Result<(), AbilityError> {
        let ability = self
            .get(id)
            .ok_or_else(|| AbilityError::UnknownAbility(id.to_string()))?;

        let previous = self.active.insert(player, id.to_string());
        if let Some(previous_id) = previous {
            match self.get(&previous_id) {
                Some(previous) => previous.on_deactivate(player),
                None => tracing::debug!(
                    player = %player,
                    ability = %previous_id,
                    "previous ability no longer registered, skipping deactivate hook"
                ),
            }
        }

        // Lost a race with unregister: don't leave a mapping to a dead id.
        if !self.contains(id) {
            self.active.remove_if(&player, |_, active_id| active_id.as_str() == id);
            return Err(AbilityError::UnknownAbility(id.to_string()));
        }

        tracing::debug!(player = %player, ability = %id, "activating ability");
        ability.on_activate(player, item);
        Ok(())
    }

    /// Deactivate `id` for `player` if, and only if, it is the active one.
    pub fn deactivate(&self, player: PlayerId, id: &str) -> bool {
        let Some((_, removed)) = self.active.remove_if(&player, |_, active_id| active_id.as_str() == id)
        else {
            return false;
        };
        if let Some(ability) = self.get(&removed) {
            ability.on_deactivate(player);
        }
        tracing::debug!(player = %player, ability = %removed, "deactivated ability");
        true
    }

    /// Deactivate whatever the player has active. Idempotent.
    ///
    /// Returns the id that was active, if any.
    pub fn deactivate_all(&self, player: PlayerId) -> Option<String> {
        let (_, removed) = self.active.remove(&player)?;
        if let Some(ability) = self.get(&removed) {
            ability.on_deactivate(player);
        }
        tracing::debug!(player = %player, ability = %removed, "deactivated ability");
        Some(removed)
    }

    pub fn has_active(&self, player: PlayerId) -> bool {
        self.active.contains_key(&player)
    }

    pub fn active_id(&self, player: PlayerId) -> Option<String> {
        self.active.get(&player).map(|entry| entry.value().clone())
    }

    pub fn get_active(&self, player: PlayerId) -> Option<Arc<dyn Ability>> {
        self.active_id(player).and_then(|id| self.get(&id))
    }

    /// Number of players with an active ability.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl std::fmt::Debug for AbilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityRegistry")
            .field("abilities", &self.ids())
            .field("active_players", &self.active.len())
            .finish()
    }
}
