//! Item and hand types.
//!
//! An [`ItemKind`] is the type key that legacy handlers are registered under
//! (`core:blaze_rod`). An [`ItemSnapshot`] is what a hand held at the moment
//! an input was processed; it is immutable, so replacing an item means
//! building a new snapshot and writing it back through the host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Namespace assumed when a kind is written without one.
pub const DEFAULT_NAMESPACE: &str = "core";

/// Which hand an item is held in.
#[derive(
    Clone,
    Copy,
    Debug,
    Hash,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum Hand {
    #[serde(rename = "main_hand")]
    #[strum(serialize = "main_hand")]
    Main,
    #[serde(rename = "off_hand")]
    #[strum(serialize = "off_hand")]
    Off,
}

impl Hand {
    /// Resolution order when looking for an item of interest.
    pub const PRIORITY: [Hand; 2] = [Hand::Main, Hand::Off];
}

/// Error from parsing an item kind key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemKindError {
    #[error("item kind is empty")]
    Empty,
    #[error("item kind '{0}' has an empty namespace or path")]
    MissingPart(String),
    #[error("item kind '{key}' contains invalid character {ch:?}")]
    InvalidChar { key: String, ch: char },
}

/// Namespaced item type key, always stored as `namespace:path` in lowercase.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKind(String);

impl ItemKind {
    /// Parse and normalise a kind key. `"Blaze_Rod"` becomes `"core:blaze_rod"`.
    pub fn parse(raw: &str) -> Result<Self, ItemKindError> {
        let key = raw.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(ItemKindError::Empty);
        }

        let (namespace, path) = match key.split_once(':') {
            Some((ns, path)) => (ns.to_string(), path.to_string()),
            None => (DEFAULT_NAMESPACE.to_string(), key.clone()),
        };
        if namespace.is_empty() || path.is_empty() {
            return Err(ItemKindError::MissingPart(key));
        }

        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/');
        if let Some(ch) = namespace.chars().chain(path.chars()).find(|c| !allowed(*c)) {
            return Err(ItemKindError::InvalidChar { key, ch });
        }

        Ok(Self(format!("{namespace}:{path}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn path(&self) -> &str {
        self.0.split_once(':').map(|(_, p)| p).unwrap_or(&self.0)
    }
}

impl FromStr for ItemKind {
    type Err = ItemKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ItemKind {
    type Error = ItemKindError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ItemKind> for String {
    fn from(kind: ItemKind) -> String {
        kind.0
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKind({})", self.0)
    }
}

/// Immutable view of the stack held in one hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub kind: ItemKind,
    pub amount: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ItemSnapshot {
    /// A single item of the given kind with no custom name.
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            amount: 1,
            display_name: None,
        }
    }

    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn is_kind(&self, kind: &ItemKind) -> bool {
        &self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_namespace() {
        let kind = ItemKind::parse("Blaze_Rod").unwrap();
        assert_eq!(kind.as_str(), "core:blaze_rod");
        assert_eq!(kind.namespace(), "core");
        assert_eq!(kind.path(), "blaze_rod");
    }

    #[test]
    fn test_parse_keeps_explicit_namespace() {
        let kind = ItemKind::parse("  mymod:wands/fire  ").unwrap();
        assert_eq!(kind.as_str(), "mymod:wands/fire");
        assert_eq!(kind.namespace(), "mymod");
        assert_eq!(kind.path(), "wands/fire");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ItemKind::parse("   "), Err(ItemKindError::Empty));
        assert!(matches!(ItemKind::parse(":rod"), Err(ItemKindError::MissingPart(_))));
        assert!(matches!(ItemKind::parse("core:"), Err(ItemKindError::MissingPart(_))));
        assert!(matches!(
            ItemKind::parse("core:blaze rod"),
            Err(ItemKindError::InvalidChar { ch: ' ', .. })
        ));
    }

    #[test]
    fn test_equal_after_normalisation() {
        assert_eq!(
            ItemKind::parse("BLAZE_ROD").unwrap(),
            "core:blaze_rod".parse::<ItemKind>().unwrap()
        );
    }

    #[test]
    fn test_serde_rejects_invalid_kind() {
        let bad: Result<ItemKind, _> = serde_json::from_str("\"bad kind\"");
        assert!(bad.is_err());

        let good: ItemKind = serde_json::from_str("\"stick\"").unwrap();
        assert_eq!(good.as_str(), "core:stick");
    }

    #[test]
    fn test_hand_strings() {
        assert_eq!(Hand::Main.to_string(), "main_hand");
        assert_eq!("off_hand".parse::<Hand>().unwrap(), Hand::Off);
        assert_eq!(serde_json::to_string(&Hand::Off).unwrap(), "\"off_hand\"");
        assert_eq!(Hand::PRIORITY, [Hand::Main, Hand::Off]);
    }

    #[test]
    fn test_snapshot_builders() {
        let kind = ItemKind::parse("stick").unwrap();
        let item = ItemSnapshot::new(kind.clone())
            .with_amount(3)
            .with_display_name("Wand of Sneaking");
        assert_eq!(item.amount, 3);
        assert_eq!(item.display_name.as_deref(), Some("Wand of Sneaking"));
        assert!(item.is_kind(&kind));
    }
}
