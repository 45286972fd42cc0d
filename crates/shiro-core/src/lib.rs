//! # shiro-core
//!
//! Sneak-spam gesture detection for game servers.
//!
//! A player holding an item of interest taps sneak repeatedly. Each tap is
//! counted in a per-player sliding window; once enough land inside it the
//! gesture completes and an ability (or a plain handler) bound to the held
//! item fires. In between, the player sees a progress bar.
//!
//! - [`PressTracker`] owns the sliding window and post-activation cooldown
//! - [`AbilityRegistry`] keeps at most one active ability per player
//! - [`ListenableRegistry`] binds one-shot handlers to item kinds
//! - [`ObserverChain`] lets observers veto or rewrite progress and activation
//! - [`GestureDispatcher`] ties it together behind the host seams in [`host`]
//!
//! Nothing here touches a game engine. Hosts implement [`ItemResolver`] and
//! [`NotificationSink`] and feed raw sneak toggles in.

pub mod abilities;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod flows;
pub mod host;
pub mod listenables;
pub mod notify;
pub mod render;
pub mod tracker;

pub use abilities::{Ability, AbilityRegistry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GestureConfig;
pub use dispatcher::{
    ActivationTarget, GestureDispatcher, GestureDispatcherBuilder, GestureOutcome, IgnoreReason,
};
pub use error::{AbilityError, ConfigError, GestureError, GestureResult};
pub use flows::{GestureFlow, matches_pattern};
#[cfg(feature = "flows")]
pub use flows::{FlowBus, FlowMessage, SharedFlowBus, Subscription, shared_flow_bus};
pub use host::{ItemResolver, NotificationSink};
pub use listenables::{ActivationHandler, ListenableRegistry};
pub use notify::{
    ActivationNotification, ActivationVerdict, ActiveAbilityGate, Delivery, GestureObserver,
    ObserverChain, ProgressNotification, ProgressVerdict,
};
pub use render::{DisplayPayload, LoadingBarRenderer, ProgressRenderer, TextColor, TextSegment, alert};
pub use tracker::PressTracker;

pub use shiro_types::{Hand, ItemKind, ItemSnapshot, PlayerId};
