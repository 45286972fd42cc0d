//! Two-phase notification protocol for third-party observers.
//!
//! Before the dispatcher acts on a press it builds an immutable notification
//! and runs it through the [`ObserverChain`]. Each observer, in registration
//! order, returns a verdict:
//!
//! - continue unchanged,
//! - continue with an override (a replacement progress message, or a
//!   replacement item for the activating hand), or
//! - cancel.
//!
//! Overrides are folded into the notification before the next observer sees
//! it. The first cancellation stops the chain and the dispatcher skips the
//! rest of the current step.

use std::sync::Arc;

use parking_lot::RwLock;
use shiro_types::{Hand, ItemSnapshot, PlayerId};

use crate::abilities::AbilityRegistry;
use crate::render::DisplayPayload;

/// Published on every press that advances progress without completing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressNotification {
    pub player: PlayerId,
    pub current: u32,
    pub max: u32,
    pub hand: Hand,
    pub item: ItemSnapshot,
    /// Replaces the default rendered bar when set.
    pub message: Option<DisplayPayload>,
}

impl ProgressNotification {
    pub fn new(player: PlayerId, current: u32, max: u32, hand: Hand, item: ItemSnapshot) -> Self {
        Self {
            player,
            current,
            max,
            hand,
            item,
            message: None,
        }
    }

    /// Rounded integer percentage, 0 when `max` is 0.
    pub fn percentage(&self) -> u32 {
        self.raw_percentage().round() as u32
    }

    pub fn raw_percentage(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        self.current as f32 / self.max as f32 * 100.0
    }
}

/// Published when progress reaches the threshold, before any handler runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationNotification {
    pub player: PlayerId,
    /// Presses in the window when the threshold was crossed.
    pub count: u32,
    pub percentage: u32,
    /// Unix millis.
    pub timestamp: u64,
    pub hand: Hand,
    /// May be replaced by an observer; the replacement is written back to `hand`.
    pub item: ItemSnapshot,
}

impl ActivationNotification {
    pub fn new(player: PlayerId, count: u32, hand: Hand, item: ItemSnapshot) -> Self {
        Self {
            player,
            count,
            percentage: 100,
            timestamp: shiro_types::now_millis(),
            hand,
            item,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressVerdict {
    Continue,
    /// Show this instead of the rendered bar.
    Message(DisplayPayload),
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivationVerdict {
    Continue,
    /// Put this item in the activating hand before the handler runs.
    ReplaceItem(ItemSnapshot),
    Cancel,
}

/// Result of running a notification through the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery<N> {
    /// Every observer let it through; carries the final, possibly rewritten value.
    Proceed(N),
    Cancelled { by: String },
}

impl<N> Delivery<N> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Delivery::Cancelled { .. })
    }
}

pub trait GestureObserver: Send + Sync {
    /// Name used in logs and cancellation reports.
    fn name(&self) -> &str;

    fn on_progress(&self, notification: &ProgressNotification) -> ProgressVerdict {
        let _ = notification;
        ProgressVerdict::Continue
    }

    fn on_activation(&self, notification: &ActivationNotification) -> ActivationVerdict {
        let _ = notification;
        ActivationVerdict::Continue
    }
}

/// Ordered list of observers.
#[derive(Default)]
pub struct ObserverChain {
    observers: RwLock<Vec<Arc<dyn GestureObserver>>>,
}

impl ObserverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer; it runs after every observer added before it.
    pub fn add(&self, observer: Arc<dyn GestureObserver>) {
        tracing::debug!(observer = observer.name(), "added gesture observer");
        self.observers.write().push(observer);
    }

    /// Remove every observer with this name.
    pub fn remove(&self, name: &str) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|o| o.name() != name);
        observers.len() != before
    }

    pub fn names(&self) -> Vec<String> {
        self.observers.read().iter().map(|o| o.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn GestureObserver>> {
        self.observers.read().clone()
    }

    pub fn publish_progress(
        &self,
        mut notification: ProgressNotification,
    ) -> Delivery<ProgressNotification> {
        for observer in self.snapshot() {
            match observer.on_progress(&notification) {
                ProgressVerdict::Continue => {}
                ProgressVerdict::Message(message) => notification.message = Some(message),
                ProgressVerdict::Cancel => {
                    return Delivery::Cancelled {
                        by: observer.name().to_string(),
                    };
                }
            }
        }
        Delivery::Proceed(notification)
    }

    pub fn publish_activation(
        &self,
        mut notification: ActivationNotification,
    ) -> Delivery<ActivationNotification> {
        for observer in self.snapshot() {
            match observer.on_activation(&notification) {
                ActivationVerdict::Continue => {}
                ActivationVerdict::ReplaceItem(item) => notification.item = item,
                ActivationVerdict::Cancel => {
                    return Delivery::Cancelled {
                        by: observer.name().to_string(),
                    };
                }
            }
        }
        Delivery::Proceed(notification)
    }
}

impl std::fmt::Debug for ObserverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverChain")
            .field("observers", &self.names())
            .finish()
    }
}

/// Suppresses progress feedback while the player already has an ability running.
pub struct ActiveAbilityGate {
    abilities: Arc<AbilityRegistry>,
}

impl ActiveAbilityGate {
    pub const NAME: &'static str = "active-ability-gate";

    pub fn new(abilities: Arc<AbilityRegistry>) -> Self {
        Self { abilities }
    }
}

impl GestureObserver for ActiveAbilityGate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_progress(&self, notification: &ProgressNotification) -> ProgressVerdict {
        if self.abilities.has_active(notification.player) {
            ProgressVerdict::Cancel
        } else {
            ProgressVerdict::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shiro_types::ItemKind;

    use crate::render::{TextColor, alert};

    fn item(kind: &str) -> ItemSnapshot {
        ItemSnapshot::new(ItemKind::parse(kind).unwrap())
    }

    fn progress(current: u32, max: u32) -> ProgressNotification {
        ProgressNotification::new(PlayerId::new(), current, max, Hand::Main, item("stick"))
    }

    /// Records what it saw, then answers with fixed verdicts.
    struct Scripted {
        name: &'static str,
        progress: ProgressVerdict,
        activation: ActivationVerdict,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(name: &'static str, progress: ProgressVerdict, activation: ActivationVerdict) -> Arc<Self> {
            Arc::new(Self {
                name,
                progress,
                activation,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl GestureObserver for Scripted {
        fn name(&self) -> &str {
            self.name
        }
        fn on_progress(&self, n: &ProgressNotification) -> ProgressVerdict {
            let message = n.message.as_ref().map(|m| m.plain_text()).unwrap_or_default();
            self.seen.lock().push(message);
            self.progress.clone()
        }
        fn on_activation(&self, n: &ActivationNotification) -> ActivationVerdict {
            self.seen.lock().push(n.item.kind.to_string());
            self.activation.clone()
        }
    }

    #[test]
    fn test_percentage() {
        assert_eq!(progress(3, 10).percentage(), 30);
        assert_eq!(progress(1, 3).percentage(), 33);
        assert_eq!(progress(2, 3).percentage(), 67);
        assert_eq!(progress(5, 0).percentage(), 0);
        assert!((progress(1, 4).raw_percentage() - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_chain_proceeds_unchanged() {
        let chain = ObserverChain::new();
        let n = progress(1, 10);
        assert_eq!(chain.publish_progress(n.clone()), Delivery::Proceed(n));
    }

    #[test]
    fn test_message_override_visible_downstream() {
        let chain = ObserverChain::new();
        let first = Scripted::new(
            "first",
            ProgressVerdict::Message(alert("charging", TextColor::Yellow)),
            ActivationVerdict::Continue,
        );
        let second = Scripted::new("second", ProgressVerdict::Continue, ActivationVerdict::Continue);
        chain.add(first.clone());
        chain.add(second.clone());

        let Delivery::Proceed(n) = chain.publish_progress(progress(2, 10)) else {
            panic!("expected proceed");
        };
        assert_eq!(n.message.unwrap().plain_text(), "(i) charging");
        assert_eq!(*first.seen.lock(), vec![""]);
        assert_eq!(*second.seen.lock(), vec!["(i) charging"]);
    }

    #[test]
    fn test_first_cancel_stops_chain() {
        let chain = ObserverChain::new();
        let veto = Scripted::new("veto", ProgressVerdict::Cancel, ActivationVerdict::Cancel);
        let after = Scripted::new("after", ProgressVerdict::Continue, ActivationVerdict::Continue);
        chain.add(veto);
        chain.add(after.clone());

        let delivery = chain.publish_progress(progress(2, 10));
        assert_eq!(delivery, Delivery::Cancelled { by: "veto".into() });
        assert!(delivery.is_cancelled());

        let n = ActivationNotification::new(PlayerId::new(), 10, Hand::Off, item("stick"));
        assert!(chain.publish_activation(n).is_cancelled());
        assert!(after.seen.lock().is_empty());
    }

    #[test]
    fn test_item_replacement_folds_through() {
        let chain = ObserverChain::new();
        let swap = Scripted::new(
            "swap",
            ProgressVerdict::Continue,
            ActivationVerdict::ReplaceItem(item("charged_stick")),
        );
        let watcher = Scripted::new("watcher", ProgressVerdict::Continue, ActivationVerdict::Continue);
        chain.add(swap);
        chain.add(watcher.clone());

        let n = ActivationNotification::new(PlayerId::new(), 10, Hand::Main, item("stick"));
        let Delivery::Proceed(n) = chain.publish_activation(n) else {
            panic!("expected proceed");
        };
        assert_eq!(n.item, item("charged_stick"));
        assert_eq!(n.percentage, 100);
        assert_eq!(*watcher.seen.lock(), vec!["core:charged_stick"]);
    }

    #[test]
    fn test_remove_by_name() {
        let chain = ObserverChain::new();
        chain.add(Scripted::new("a", ProgressVerdict::Cancel, ActivationVerdict::Continue));
        chain.add(Scripted::new("b", ProgressVerdict::Continue, ActivationVerdict::Continue));

        assert!(chain.remove("a"));
        assert!(!chain.remove("a"));
        assert_eq!(chain.names(), vec!["b"]);
        assert!(!chain.publish_progress(progress(1, 10)).is_cancelled());
    }

    #[test]
    fn test_active_ability_gate() {
        struct Noop;
        impl crate::abilities::Ability for Noop {
            fn id(&self) -> &str {
                "noop"
            }
            fn matches(&self, _item: &ItemSnapshot) -> bool {
                true
            }
            fn on_activate(&self, _player: PlayerId, _item: &ItemSnapshot) {}
            fn on_deactivate(&self, _player: PlayerId) {}
            fn is_active(&self, _player: PlayerId) -> bool {
                false
            }
        }

        let abilities = Arc::new(AbilityRegistry::new());
        abilities.register(Arc::new(Noop));
        let chain = ObserverChain::new();
        chain.add(Arc::new(ActiveAbilityGate::new(abilities.clone())));

        let n = progress(3, 10);
        assert!(!chain.publish_progress(n.clone()).is_cancelled());

        abilities.activate(n.player, "noop", &n.item).unwrap();
        assert_eq!(
            chain.publish_progress(n),
            Delivery::Cancelled { by: ActiveAbilityGate::NAME.into() }
        );
    }
}
