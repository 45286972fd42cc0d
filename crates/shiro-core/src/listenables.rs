//! Direct item-kind → handler registrations.
//!
//! The simpler of the two ways to claim an item: bind a one-shot
//! [`ActivationHandler`] to an [`ItemKind`]. There's no active/inactive
//! lifecycle; the handler just runs once per completed gesture. Items claimed
//! here are "listenable" even when no ability matches them.

use std::sync::Arc;

use dashmap::DashMap;
use shiro_types::ItemKind;

use crate::notify::ActivationNotification;

/// One-shot callback run when the gesture completes on a registered kind.
pub trait ActivationHandler: Send + Sync {
    fn on_activate(&self, activation: &ActivationNotification);
}

impl<F> ActivationHandler for F
where
    F: Fn(&ActivationNotification) + Send + Sync,
{
    fn on_activate(&self, activation: &ActivationNotification) {
        self(activation)
    }
}

#[derive(Default)]
pub struct ListenableRegistry {
    handlers: DashMap<ItemKind, Arc<dyn ActivationHandler>>,
}

impl ListenableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `kind`, replacing any previous binding.
    pub fn register(&self, kind: ItemKind, handler: Arc<dyn ActivationHandler>) {
        tracing::info!(kind = %kind, "registered listenable item");
        self.handlers.insert(kind, handler);
    }

    /// Bind one handler to several kinds.
    pub fn register_all(
        &self,
        handler: Arc<dyn ActivationHandler>,
        kinds: impl IntoIterator<Item = ItemKind>,
    ) {
        for kind in kinds {
            self.register(kind, handler.clone());
        }
    }

    pub fn unregister(&self, kind: &ItemKind) -> Option<Arc<dyn ActivationHandler>> {
        let removed = self.handlers.remove(kind).map(|(_, handler)| handler);
        if removed.is_some() {
            tracing::info!(kind = %kind, "unregistered listenable item");
        }
        removed
    }

    pub fn is_listenable(&self, kind: &ItemKind) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn handler(&self, kind: &ItemKind) -> Option<Arc<dyn ActivationHandler>> {
        self.handlers.get(kind).map(|entry| entry.value().clone())
    }

    /// Snapshot of registered kinds, sorted.
    pub fn listenable_kinds(&self) -> Vec<ItemKind> {
        let mut kinds: Vec<ItemKind> = self.handlers.iter().map(|e| e.key().clone()).collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ListenableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenableRegistry")
            .field("kinds", &self.listenable_kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use shiro_types::{Hand, ItemSnapshot, PlayerId};

    fn kind(s: &str) -> ItemKind {
        ItemKind::parse(s).unwrap()
    }

    fn activation(k: &str) -> ActivationNotification {
        ActivationNotification::new(PlayerId::new(), 10, Hand::Main, ItemSnapshot::new(kind(k)))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ListenableRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        registry.register(
            kind("blaze_rod"),
            Arc::new(move |_: &ActivationNotification| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(registry.is_listenable(&kind("BLAZE_ROD")));
        assert!(!registry.is_listenable(&kind("stick")));

        registry
            .handler(&kind("blaze_rod"))
            .unwrap()
            .on_activate(&activation("blaze_rod"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_all_shares_handler() {
        let registry = ListenableRegistry::new();
        let handler: Arc<dyn ActivationHandler> = Arc::new(|_: &ActivationNotification| {});
        registry.register_all(handler.clone(), [kind("stick"), kind("bone"), kind("feather")]);

        assert_eq!(
            registry.listenable_kinds(),
            vec![kind("bone"), kind("feather"), kind("stick")]
        );
        assert!(Arc::ptr_eq(
            &registry.handler(&kind("bone")).unwrap(),
            &registry.handler(&kind("stick")).unwrap()
        ));
    }

    #[test]
    fn test_unregister() {
        let registry = ListenableRegistry::new();
        registry.register(kind("stick"), Arc::new(|_: &ActivationNotification| {}));

        assert!(registry.unregister(&kind("stick")).is_some());
        assert!(registry.unregister(&kind("stick")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reregister_replaces() {
        let registry = ListenableRegistry::new();
        let first: Arc<dyn ActivationHandler> = Arc::new(|_: &ActivationNotification| {});
        let second: Arc<dyn ActivationHandler> = Arc::new(|_: &ActivationNotification| {});
        registry.register(kind("stick"), first);
        registry.register(kind("stick"), second.clone());

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.handler(&kind("stick")).unwrap(), &second));
    }
}
