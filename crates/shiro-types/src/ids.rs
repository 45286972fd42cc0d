//! Typed player identifier.
//!
//! `PlayerId` wraps a UUID. It's the sole key for all per-player state in the
//! core, so it must be stable for the lifetime of a player and never reused
//! across distinct players. Hosts usually convert their own UUIDs with
//! `PlayerId::from(uuid)`; `PlayerId::new()` mints a fresh UUIDv7 for tests and
//! synthetic players.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A player identifier (UUID, any version).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(uuid::Uuid);

impl PlayerId {
    /// Create a new time-ordered ID (UUIDv7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// First 8 hex characters. For log lines only, not lookup.
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }

    /// Parse from a hex string (32 chars, no hyphens) or standard UUID format.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        uuid::Uuid::parse_str(s).map(Self)
    }

    /// The raw 16 bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for PlayerId {
    fn from(u: uuid::Uuid) -> Self {
        Self(u)
    }
}

impl From<PlayerId> for uuid::Uuid {
    fn from(id: PlayerId) -> uuid::Uuid {
        id.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Full UUID with hyphens for log readability
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.short())
    }
}
