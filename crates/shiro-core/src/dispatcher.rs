//! The gesture state machine.
//!
//! One call to [`GestureDispatcher::on_sneak_toggle`] per raw sneak input.
//! The per-player state is implicit in the [`PressTracker`] window:
//!
//! ```text
//!            press (claimed item)            count >= max, not cancelled
//!   Idle ──────────────────────────▶ Progressing ───────────────────────▶ Activated
//!    ▲                                   │  ▲                                 │
//!    │                                   └──┘ 0 < count < max                 │
//!    └──────────────────── tracker reset + cooldown ◀─────────────────────────┘
//! ```
//!
//! For each sneak-on input:
//!
//! 1. Pick the held item of interest: main hand if anything claims it, else
//!    off hand, else stop. Unclaimed items never touch the tracker.
//! 2. Record the press. A count of 0 means cooldown; stop.
//! 3. At or above the threshold, publish an [`ActivationNotification`]. If an
//!    observer cancels, stop **without** resetting the tracker, so the next
//!    press retries with the same window. Otherwise write back any replaced
//!    item, run the ability (or legacy handler) matching the item that was
//!    held, and reset.
//! 4. Below the threshold, publish a [`ProgressNotification`]; unless
//!    cancelled, render and deliver the progress bar (or the observer's
//!    replacement message).
//!
//! Abilities are tried before legacy handlers. An item counts as claimed if
//! either mechanism wants it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use shiro_types::{Hand, ItemKind, ItemSnapshot, PlayerId};

use crate::abilities::AbilityRegistry;
use crate::clock::{Clock, SystemClock};
use crate::config::GestureConfig;
use crate::error::GestureResult;
use crate::flows::GestureFlow;
#[cfg(feature = "flows")]
use crate::flows::{SharedFlowBus, shared_flow_bus};
use crate::host::{ItemResolver, NotificationSink};
use crate::listenables::ListenableRegistry;
use crate::notify::{ActivationNotification, Delivery, ObserverChain, ProgressNotification};
use crate::render::{LoadingBarRenderer, ProgressRenderer};
use crate::tracker::PressTracker;

/// What a completed activation ended up invoking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationTarget {
    /// The ability was activated (any previous one deactivated first).
    Ability(String),
    /// The matching ability reports itself already running; hooks were skipped.
    AbilityAlreadyActive(String),
    /// A legacy handler bound to this item kind ran.
    Handler(ItemKind),
    /// Nothing claimed the item by the time activation ran.
    Unclaimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotSneaking,
    NoListenableItem,
    Cooldown,
}

/// What one input did.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    Ignored(IgnoreReason),
    Progressed {
        count: u32,
        max: u32,
        hand: Hand,
    },
    ProgressCancelled {
        count: u32,
        by: String,
    },
    Activated {
        count: u32,
        hand: Hand,
        target: ActivationTarget,
    },
    /// The window is left intact; the next press retries.
    ActivationCancelled {
        count: u32,
        by: String,
    },
}

pub struct GestureDispatcher {
    tracker: PressTracker,
    abilities: Arc<AbilityRegistry>,
    listenables: Arc<ListenableRegistry>,
    observers: Arc<ObserverChain>,
    resolver: Arc<dyn ItemResolver>,
    renderer: Arc<dyn ProgressRenderer>,
    sink: Arc<dyn NotificationSink>,
    max_progress: AtomicU32,
    #[cfg(feature = "flows")]
    flows: Option<SharedFlowBus>,
}

impl GestureDispatcher {
    pub fn builder(
        resolver: Arc<dyn ItemResolver>,
        sink: Arc<dyn NotificationSink>,
    ) -> GestureDispatcherBuilder {
        GestureDispatcherBuilder::new(resolver, sink)
    }

    pub fn abilities(&self) -> &Arc<AbilityRegistry> {
        &self.abilities
    }

    pub fn listenables(&self) -> &Arc<ListenableRegistry> {
        &self.listenables
    }

    pub fn observers(&self) -> &Arc<ObserverChain> {
        &self.observers
    }

    pub fn tracker(&self) -> &PressTracker {
        &self.tracker
    }

    #[cfg(feature = "flows")]
    pub fn flows(&self) -> Option<&SharedFlowBus> {
        self.flows.as_ref()
    }

    /// Presses required for activation. Read on every press.
    pub fn max_progress(&self) -> u32 {
        self.max_progress.load(Ordering::Relaxed)
    }

    /// Change the threshold; applies from the next press. Values below 1 become 1.
    pub fn set_max_progress(&self, max: u32) {
        let max = if max == 0 {
            tracing::warn!("max_progress of 0 clamped to 1");
            1
        } else {
            max
        };
        self.max_progress.store(max, Ordering::Relaxed);
        tracing::info!(max_progress = max, "updated activation threshold");
    }

    /// Whether a legacy registration or any ability claims this item.
    pub fn is_listenable(&self, item: &ItemSnapshot) -> bool {
        self.listenables.is_listenable(&item.kind) || self.abilities.find_match(item).is_some()
    }

    /// The first hand, main before off, holding a claimed item.
    pub fn resolve_held_item(&self, player: PlayerId) -> Option<(Hand, ItemSnapshot)> {
        Hand::PRIORITY.into_iter().find_map(|hand| {
            self.resolver
                .hand_item(player, hand)
                .filter(|item| self.is_listenable(item))
                .map(|item| (hand, item))
        })
    }

    /// Handle one sneak toggle from `player`.
    ///
    /// Errors only when the ability registry rejects an activation it just
    /// matched, which means registration raced the dispatch.
    pub fn on_sneak_toggle(&self, player: PlayerId, sneaking: bool) -> GestureResult<GestureOutcome> {
        if !sneaking {
            return Ok(GestureOutcome::Ignored(IgnoreReason::NotSneaking));
        }

        let Some((hand, item)) = self.resolve_held_item(player) else {
            return Ok(GestureOutcome::Ignored(IgnoreReason::NoListenableItem));
        };

        let count = u32::try_from(self.tracker.record_press(player)).unwrap_or(u32::MAX);
        if count == 0 {
            tracing::trace!(player = %player, "press ignored during cooldown");
            return Ok(GestureOutcome::Ignored(IgnoreReason::Cooldown));
        }

        let max = self.max_progress();
        if count >= max {
            self.activate(player, count, hand, item)
        } else {
            Ok(self.progress(player, count, max, hand, item))
        }
    }

    /// Handle the player switching held slots: ends any active ability.
    pub fn on_item_swap(&self, player: PlayerId) -> bool {
        if !self.abilities.has_active(player) {
            return false;
        }
        let Some(ability) = self.abilities.deactivate_all(player) else {
            return false;
        };
        tracing::info!(player = %player, ability = %ability, "ability ended by item swap");
        self.emit(GestureFlow::AbilityDeactivated { player, ability });
        true
    }

    fn progress(
        &self,
        player: PlayerId,
        count: u32,
        max: u32,
        hand: Hand,
        item: ItemSnapshot,
    ) -> GestureOutcome {
        let notification = ProgressNotification::new(player, count, max, hand, item);
        let notification = match self.observers.publish_progress(notification) {
            Delivery::Proceed(n) => n,
            Delivery::Cancelled { by } => {
                tracing::debug!(player = %player, count, by = %by, "progress cancelled");
                self.emit(GestureFlow::ProgressCancelled {
                    player,
                    current: count,
                    by: by.clone(),
                });
                return GestureOutcome::ProgressCancelled { count, by };
            }
        };

        let payload = match &notification.message {
            Some(message) => message.clone(),
            None => self.renderer.render(notification.raw_percentage()),
        };
        self.sink.deliver(player, &payload);

        tracing::debug!(player = %player, count, max, hand = %hand, "gesture progress");
        self.emit(GestureFlow::Progress {
            player,
            current: count,
            max,
            hand,
            kind: notification.item.kind,
        });
        GestureOutcome::Progressed { count, max, hand }
    }

    fn activate(
        &self,
        player: PlayerId,
        count: u32,
        hand: Hand,
        item: ItemSnapshot,
    ) -> GestureResult<GestureOutcome> {
        let notification = ActivationNotification::new(player, count, hand, item.clone());
        let notification = match self.observers.publish_activation(notification) {
            Delivery::Proceed(n) => n,
            Delivery::Cancelled { by } => {
                tracing::debug!(player = %player, count, by = %by, "activation cancelled, window kept");
                self.emit(GestureFlow::ActivationCancelled {
                    player,
                    count,
                    by: by.clone(),
                });
                return Ok(GestureOutcome::ActivationCancelled { count, by });
            }
        };

        if notification.item != item {
            self.resolver.set_hand_item(player, hand, notification.item.clone());
        }

        let target = self.invoke(&item, &notification)?;
        self.tracker.reset(player);

        tracing::info!(player = %player, count, hand = %hand, target = ?target, "gesture activated");
        self.emit(GestureFlow::Activated {
            player,
            count,
            hand,
            kind: item.kind.clone(),
            target: target.clone(),
        });
        Ok(GestureOutcome::Activated { count, hand, target })
    }

    /// Ability first, legacy handler second, both looked up by the item that
    /// was held when the gesture completed. An observer's replacement has
    /// already been written back; it does not change the target.
    fn invoke(
        &self,
        held: &ItemSnapshot,
        notification: &ActivationNotification,
    ) -> GestureResult<ActivationTarget> {
        let player = notification.player;

        if let Some(ability) = self.abilities.find_match(held) {
            let id = ability.id().to_string();
            if ability.is_active(player) {
                tracing::debug!(player = %player, ability = %id, "ability already running");
                return Ok(ActivationTarget::AbilityAlreadyActive(id));
            }
            if let Err(err) = self.abilities.activate(player, &id, held) {
                tracing::error!(
                    player = %player,
                    ability = %id,
                    error = %err,
                    "matched ability could not be activated; registry changed mid-dispatch"
                );
                return Err(err.into());
            }
            return Ok(ActivationTarget::Ability(id));
        }

        if let Some(handler) = self.listenables.handler(&held.kind) {
            handler.on_activate(notification);
            return Ok(ActivationTarget::Handler(held.kind.clone()));
        }

        tracing::debug!(
            player = %player,
            kind = %held.kind,
            "nothing claims the item at activation"
        );
        Ok(ActivationTarget::Unclaimed)
    }

    #[cfg(feature = "flows")]
    fn emit(&self, flow: GestureFlow) {
        if let Some(bus) = &self.flows {
            bus.publish(flow);
        }
    }

    #[cfg(not(feature = "flows"))]
    fn emit(&self, _flow: GestureFlow) {}
}

impl std::fmt::Debug for GestureDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureDispatcher")
            .field("max_progress", &self.max_progress())
            .field("tracker", &self.tracker)
            .field("abilities", &self.abilities)
            .field("listenables", &self.listenables)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`GestureDispatcher`]; everything but the host seams is optional.
pub struct GestureDispatcherBuilder {
    resolver: Arc<dyn ItemResolver>,
    sink: Arc<dyn NotificationSink>,
    config: GestureConfig,
    clock: Option<Arc<dyn Clock>>,
    renderer: Option<Arc<dyn ProgressRenderer>>,
    abilities: Option<Arc<AbilityRegistry>>,
    listenables: Option<Arc<ListenableRegistry>>,
    observers: Option<Arc<ObserverChain>>,
    #[cfg(feature = "flows")]
    flows: Option<SharedFlowBus>,
    #[cfg(feature = "flows")]
    enable_flows: bool,
}

impl GestureDispatcherBuilder {
    pub fn new(resolver: Arc<dyn ItemResolver>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            resolver,
            sink,
            config: GestureConfig::default(),
            clock: None,
            renderer: None,
            abilities: None,
            listenables: None,
            observers: None,
            #[cfg(feature = "flows")]
            flows: None,
            #[cfg(feature = "flows")]
            enable_flows: false,
        }
    }

    pub fn config(mut self, config: GestureConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn ProgressRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Share an ability registry with other components.
    pub fn abilities(mut self, abilities: Arc<AbilityRegistry>) -> Self {
        self.abilities = Some(abilities);
        self
    }

    pub fn listenables(mut self, listenables: Arc<ListenableRegistry>) -> Self {
        self.listenables = Some(listenables);
        self
    }

    pub fn observers(mut self, observers: Arc<ObserverChain>) -> Self {
        self.observers = Some(observers);
        self
    }

    /// Publish flows on an existing bus.
    #[cfg(feature = "flows")]
    pub fn flows(mut self, bus: SharedFlowBus) -> Self {
        self.flows = Some(bus);
        self
    }

    /// Publish flows on a fresh bus sized by `config.flow_capacity`.
    #[cfg(feature = "flows")]
    pub fn enable_flows(mut self) -> Self {
        self.enable_flows = true;
        self
    }

    pub fn build(self) -> GestureResult<GestureDispatcher> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        #[cfg(feature = "flows")]
        let flows = match (self.flows, self.enable_flows) {
            (Some(bus), _) => Some(bus),
            (None, true) => Some(shared_flow_bus(self.config.flow_capacity)),
            (None, false) => None,
        };

        Ok(GestureDispatcher {
            tracker: PressTracker::with_timing(self.config.window(), self.config.cooldown(), clock),
            abilities: self.abilities.unwrap_or_default(),
            listenables: self.listenables.unwrap_or_default(),
            observers: self.observers.unwrap_or_default(),
            resolver: self.resolver,
            renderer: self
                .renderer
                .unwrap_or_else(|| Arc::new(LoadingBarRenderer::default())),
            sink: self.sink,
            max_progress: AtomicU32::new(self.config.max_progress),
            #[cfg(feature = "flows")]
            flows,
        })
    }
}
