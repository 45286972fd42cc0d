//! Shared player and item types for shiro.
//!
//! This crate has **no internal shiro dependencies**. It is a pure leaf crate that
//! the detection core builds on. Hosts embedding the core translate their own
//! player handles and item stacks into these types at the boundary.
//!
//! # Key Types
//!
//! |------------------|-----------------------------------------------|
//! | Type             | Purpose                                       |
//! |------------------|-----------------------------------------------|
//! | [`PlayerId`]     | Opaque, stable player identity (UUID)         |
//! | [`Hand`]         | Which hand holds an item (main / off)         |
//! | [`ItemKind`]     | Namespaced item type key (`core:blaze_rod`)   |
//! | [`ItemSnapshot`] | Immutable view of the stack held in a hand    |
//! |------------------|-----------------------------------------------|

pub mod ids;
pub mod item;

pub use ids::PlayerId;
pub use item::{Hand, ItemKind, ItemKindError, ItemSnapshot};

/// Current time as Unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
