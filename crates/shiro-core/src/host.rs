//! Seams to the host game server.
//!
//! The core never touches game state directly. It reads hands and writes
//! replacement items through an [`ItemResolver`], and shows progress through a
//! [`NotificationSink`]. Both are called synchronously on the thread that is
//! dispatching the input event.

use shiro_types::{Hand, ItemSnapshot, PlayerId};

use crate::render::DisplayPayload;

pub trait ItemResolver: Send + Sync {
    /// Item in the main hand, `None` for an empty hand.
    fn main_hand_item(&self, player: PlayerId) -> Option<ItemSnapshot>;

    /// Item in the off hand, `None` for an empty hand.
    fn off_hand_item(&self, player: PlayerId) -> Option<ItemSnapshot>;

    /// Replace the item held in `hand`.
    fn set_hand_item(&self, player: PlayerId, hand: Hand, item: ItemSnapshot);

    fn hand_item(&self, player: PlayerId, hand: Hand) -> Option<ItemSnapshot> {
        match hand {
            Hand::Main => self.main_hand_item(player),
            Hand::Off => self.off_hand_item(player),
        }
    }
}

/// Delivers a transient message (action bar, HUD line) to a player.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, player: PlayerId, payload: &DisplayPayload);
}
