//! Post-dispatch gesture flows.
//!
//! Observers in [`notify`](crate::notify) run *before* the dispatcher acts and
//! can veto. Flows are the other half: after a press has been fully handled
//! the dispatcher publishes what happened on a broadcast [`FlowBus`], so
//! metrics, replay recorders, or async game logic can follow along without
//! sitting in the synchronous input path.
//!
//! # Subjects
//!
//! | Subject                         | Payload                                 |
//! |---------------------------------|-----------------------------------------|
//! | `gesture.progress`              | [`GestureFlow::Progress`]               |
//! | `gesture.progress_cancelled`    | [`GestureFlow::ProgressCancelled`]      |
//! | `gesture.activated`             | [`GestureFlow::Activated`]              |
//! | `gesture.activation_cancelled`  | [`GestureFlow::ActivationCancelled`]    |
//! | `ability.deactivated`           | [`GestureFlow::AbilityDeactivated`]     |
//!
//! Patterns use NATS-style wildcards: `*` matches one token, `>` matches one
//! or more trailing tokens. `gesture.*` sees every gesture flow; `>` sees all.
//!
//! The bus itself lives behind the `flows` cargo feature (on by default), the
//! only part of the crate that needs tokio. Without it the dispatcher still
//! builds [`GestureFlow`] values and drops them.

#[cfg(feature = "flows")]
use std::sync::Arc;
#[cfg(feature = "flows")]
use std::time::Instant;

use shiro_types::{Hand, ItemKind, PlayerId};
#[cfg(feature = "flows")]
use tokio::sync::broadcast;

use crate::dispatcher::ActivationTarget;

/// Check if a subject matches a NATS-style pattern.
pub fn matches_pattern(pattern: &str, subject: &str) -> bool {
    let pattern_tokens: Vec<&str> = pattern.split('.').collect();
    let subject_tokens: Vec<&str> = subject.split('.').collect();

    let mut pi = 0;
    let mut si = 0;

    while pi < pattern_tokens.len() && si < subject_tokens.len() {
        match pattern_tokens[pi] {
            // `>` is only valid last and swallows the rest
            ">" => return pi == pattern_tokens.len() - 1,
            "*" => {
                pi += 1;
                si += 1;
            }
            token => {
                if token != subject_tokens[si] {
                    return false;
                }
                pi += 1;
                si += 1;
            }
        }
    }

    pi == pattern_tokens.len() && si == subject_tokens.len()
}

/// What the dispatcher did with one input.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureFlow {
    Progress {
        player: PlayerId,
        current: u32,
        max: u32,
        hand: Hand,
        kind: ItemKind,
    },
    ProgressCancelled {
        player: PlayerId,
        current: u32,
        by: String,
    },
    Activated {
        player: PlayerId,
        count: u32,
        hand: Hand,
        kind: ItemKind,
        target: ActivationTarget,
    },
    ActivationCancelled {
        player: PlayerId,
        count: u32,
        by: String,
    },
    AbilityDeactivated {
        player: PlayerId,
        ability: String,
    },
}

impl GestureFlow {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "gesture.progress",
            Self::ProgressCancelled { .. } => "gesture.progress_cancelled",
            Self::Activated { .. } => "gesture.activated",
            Self::ActivationCancelled { .. } => "gesture.activation_cancelled",
            Self::AbilityDeactivated { .. } => "ability.deactivated",
        }
    }

    pub fn player(&self) -> PlayerId {
        match self {
            Self::Progress { player, .. }
            | Self::ProgressCancelled { player, .. }
            | Self::Activated { player, .. }
            | Self::ActivationCancelled { player, .. }
            | Self::AbilityDeactivated { player, .. } => *player,
        }
    }
}

#[cfg(feature = "flows")]
#[derive(Clone, Debug)]
pub struct FlowMessage {
    pub subject: &'static str,
    pub payload: GestureFlow,
    pub timestamp: Instant,
}

#[cfg(feature = "flows")]
impl FlowMessage {
    pub fn new(payload: GestureFlow) -> Self {
        Self {
            subject: payload.subject(),
            payload,
            timestamp: Instant::now(),
        }
    }
}

#[cfg(feature = "flows")]
/// Broadcast bus for [`GestureFlow`]s.
#[derive(Debug, Clone)]
pub struct FlowBus {
    tx: broadcast::Sender<FlowMessage>,
    capacity: usize,
}

#[cfg(feature = "flows")]
pub type SharedFlowBus = Arc<FlowBus>;

#[cfg(feature = "flows")]
pub fn shared_flow_bus(capacity: usize) -> SharedFlowBus {
    Arc::new(FlowBus::new(capacity))
}

#[cfg(feature = "flows")]
impl FlowBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish a flow. Returns how many subscribers it reached (0 is fine).
    pub fn publish(&self, payload: GestureFlow) -> usize {
        self.tx.send(FlowMessage::new(payload)).unwrap_or(0)
    }

    pub fn subscribe(&self, pattern: &str) -> Subscription {
        Subscription {
            pattern: pattern.to_string(),
            rx: self.tx.subscribe(),
        }
    }
}

#[cfg(feature = "flows")]
/// A pattern-filtered view of the bus.
pub struct Subscription {
    pattern: String,
    rx: broadcast::Receiver<FlowMessage>,
}

#[cfg(feature = "flows")]
impl Subscription {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Next matching message. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<FlowMessage> {
        loop {
            match self.rx.recv().await {
                Ok(msg) if matches_pattern(&self.pattern, msg.subject) => return Some(msg),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(pattern = %self.pattern, lagged = n, "gesture flow subscription lagged");
                }
            }
        }
    }

    /// Next matching message if one is already queued.
    pub fn try_recv(&mut self) -> Option<FlowMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(msg) if matches_pattern(&self.pattern, msg.subject) => return Some(msg),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!(pattern = %self.pattern, lagged = n, "gesture flow subscription lagged");
                }
            }
        }
    }
}

#[cfg(feature = "flows")]
impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}
